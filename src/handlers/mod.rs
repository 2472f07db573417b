pub mod auth;
pub mod cookies;
pub mod products;
pub mod users;
