// User inspection endpoints (admin only). Mounted behind guard_api +
// guard_admin, so an identity is already attached and role-checked.
use actix_web::{get, web, HttpResponse, Result};

use crate::db::Database;
use crate::models::auth::{PublicUser, UserRecord};
use crate::types::ApiEnvelope;

#[get("/users")]
pub async fn list_users(db: web::Data<Database>) -> Result<HttpResponse> {
    let users: Vec<UserRecord> = db
        .list("users")
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let public: Vec<PublicUser> = users.iter().map(UserRecord::public).collect();
    let count = public.len();
    let data = serde_json::to_value(public).map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(ApiEnvelope::ok_list(data, count)))
}

#[get("/users/{user_id}")]
pub async fn get_user(path: web::Path<String>, db: web::Data<Database>) -> Result<HttpResponse> {
    let user_id = path.into_inner();

    let user: Option<UserRecord> = db
        .get("users", &user_id)
        .map_err(actix_web::error::ErrorInternalServerError)?;

    match user {
        Some(user) => {
            let data = serde_json::to_value(user.public())
                .map_err(actix_web::error::ErrorInternalServerError)?;
            Ok(HttpResponse::Ok().json(ApiEnvelope::ok(data)))
        }
        None => Ok(HttpResponse::NotFound().json(ApiEnvelope::fail("User not found"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::auth::tests::make_test_config;
    use crate::handlers::auth::{guard_admin, guard_api, issue_claims, make_token};
    use crate::models::auth::UserRecord;
    use actix_web::{test, App};
    use tempfile::tempdir;

    #[actix_web::test]
    async fn admin_lists_users_without_hashes() {
        let dir = tempdir().unwrap();
        let cfg = make_test_config();
        let db = Database::new(dir.path().join("sled").to_str().unwrap()).unwrap();

        let admin = UserRecord::new_admin("Root", "root@test.dev", "hash".into());
        let user = UserRecord::new_user("Plain", "plain@test.dev", "hash".into());
        db.insert("users", &admin.id, &admin).unwrap();
        db.insert("users", &user.id, &user).unwrap();
        let token = make_token(&cfg, &issue_claims(&cfg, &admin)).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(cfg))
                .wrap(actix_web::middleware::from_fn(guard_admin))
                .wrap(actix_web::middleware::from_fn(guard_api))
                .service(list_users)
                .service(get_user),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/users")
            .insert_header(("authorization", format!("Bearer {}", token)))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 2);
        for entry in body["data"].as_array().unwrap() {
            assert!(entry.get("passwordHash").is_none());
        }

        let req = test::TestRequest::get()
            .uri(&format!("/users/{}", user.id))
            .insert_header(("authorization", format!("Bearer {}", token)))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["email"], "plain@test.dev");

        let req = test::TestRequest::get()
            .uri("/users/missing-id")
            .insert_header(("authorization", format!("Bearer {}", token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}
