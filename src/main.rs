// PartsDesk - admin back-office for auto-parts listings
use actix_cors::Cors;
use actix_files::Files;
use actix_web::{
    error::JsonPayloadError,
    middleware::Logger,
    web::{self, JsonConfig},
    App, HttpResponse, HttpServer, Responder,
};

mod cli;
mod client;
mod config;
mod db;
mod handlers;
mod logging;
mod middleware;
mod models;
mod routes;
mod types;
mod validation;

use cli::Cli;
use db::Database;
use types::ApiEnvelope;

/// API index route
async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "name": "PartsDesk API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Malformed JSON bodies answer in the same envelope as everything else
fn json_error_handler(err: JsonPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    let body =
        HttpResponse::BadRequest().json(ApiEnvelope::fail(format!("Invalid JSON: {}", err)));
    actix_web::error::InternalError::from_response(err, body).into()
}

fn print_product_line(p: &models::product::ProductRecord) {
    println!("{}  {}  {:.2}  [{}]", p.id, p.name, p.price, p.category);
}

async fn run_remote_command(
    client: &mut client::ApiClient,
    action: &cli::RemoteCommands,
) -> anyhow::Result<()> {
    use models::product::{CreateProductRequest, UpdateProductRequest};

    match action {
        cli::RemoteCommands::Register { name, email, password } => {
            let user = client.register(name, email, password).await?;
            println!("✓ Registered {} ({}, role {})", user.name, user.email, user.role);
        }
        cli::RemoteCommands::Login { email, password } => {
            let user = client.login(email, password).await?;
            println!("✓ Signed in as {} ({})", user.name, user.email);
        }
        cli::RemoteCommands::Logout => {
            client.logout().await?;
            println!("✓ Signed out");
        }
        cli::RemoteCommands::Whoami => {
            let user = client.me().await?;
            println!("{}  {}  role={}", user.id, user.email, user.role);
        }
        cli::RemoteCommands::Products => {
            let products = client.list_products().await?;
            for p in &products {
                print_product_line(p);
            }
            println!("{} product(s)", products.len());
        }
        cli::RemoteCommands::Show { id } => {
            let product = client.get_product(id).await?;
            println!("{}", serde_json::to_string_pretty(&product)?);
        }
        cli::RemoteCommands::Add(args) => {
            let mut body = serde_json::json!({
                "name": args.name,
                "price": args.price,
                "category": args.category,
                "stock": args.stock,
            });
            if let Some(description) = &args.description {
                body["description"] = serde_json::json!(description);
            }
            if let Some(brand) = &args.brand {
                body["brand"] = serde_json::json!(brand);
            }
            let payload: CreateProductRequest = serde_json::from_value(body)?;
            let product = client.create_product(payload).await?;
            print_product_line(&product);
        }
        cli::RemoteCommands::Set(args) => {
            let payload = UpdateProductRequest {
                name: args.name.clone(),
                price: args.price,
                category: args.category.clone(),
                stock: args.stock,
                in_stock: args.in_stock,
                ..Default::default()
            };
            let product = client.update_product(&args.id, payload).await?;
            print_product_line(&product);
        }
        cli::RemoteCommands::Rm { id } => {
            client.delete_product(id).await?;
            println!("✓ Deleted {}", id);
        }
    }
    Ok(())
}

fn hash_password_for_cli(password: &str) -> String {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
    use rand_core::OsRng;

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("Failed to hash password")
        .to_string()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse_args();

    logging::init_logging(cli.verbose).expect("Failed to initialize logging");
    logging::print_build_info();

    let mut cfg = config::load_config_from_file(&cli.config);
    if let Some(port) = cli.port {
        cfg.server.port = port;
    }
    if let Some(host) = &cli.host {
        cfg.server.host = host.clone();
    }

    if let Some(command) = &cli.command {
        match command {
            cli::Commands::Serve => {}
            cli::Commands::User { action } => match action {
                cli::UserCommands::AddAdmin(args) => {
                    let db = Database::new(&cfg.sled_path).expect("Failed to open database");

                    let email = args.email.trim().to_lowercase();
                    let users: Vec<models::auth::UserRecord> =
                        db.list("users").unwrap_or_default();
                    if users.iter().any(|u| u.email == email) {
                        eprintln!("Error: account with email '{}' already exists", email);
                        std::process::exit(2);
                    }

                    let hash = hash_password_for_cli(&args.password);
                    let admin = models::auth::UserRecord::new_admin(&args.name, &email, hash);
                    db.insert("users", &admin.id, &admin)
                        .expect("Failed to insert admin account");

                    println!("✓ Admin account created: {}", email);
                    println!("  ID: {}", admin.id);
                    return Ok(());
                }
            },
            cli::Commands::Db { action } => match action {
                cli::DbCommands::Test => {
                    println!("Testing document store...");
                    let _db = Database::new(&cfg.sled_path).expect("Failed to open database");
                    println!("✓ Document store opened at {}", cfg.sled_path);
                    return Ok(());
                }
            },
            cli::Commands::Remote { api, store, action } => {
                let mut client = client::ApiClient::new(api, std::path::Path::new(store))
                    .expect("Failed to open client store");
                let outcome = run_remote_command(&mut client, action).await;
                if client.needs_login() {
                    eprintln!("Session expired; run `partsdesk remote login`");
                }
                if let Err(e) = outcome {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
                return Ok(());
            }
        }
    }

    let database = Database::new(&cfg.sled_path).expect("Failed to open database");

    let bind_address = format!("{}:{}", cfg.server.host, cfg.server.port);
    logging::log_server_startup(&cfg.server.host, cfg.server.port);
    log::info!("Document store path: {}", cfg.sled_path);

    let db_data = web::Data::new(database);
    let cfg_data = web::Data::new(cfg.clone());
    let cors_origins = cfg.cors_origins.clone();

    HttpServer::new(move || {
        let origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req| {
                let origin_str = origin.to_str().unwrap_or("");
                config::is_origin_allowed(&origins, origin_str)
            })
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(
                JsonConfig::default()
                    .limit(1024 * 1024)
                    .error_handler(json_error_handler),
            )
            .app_data(db_data.clone())
            .app_data(cfg_data.clone())
            .wrap(middleware::security::SecurityHeaders)
            .wrap(cors)
            .wrap(Logger::default())
            .service(routes::health::healthz)
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .route("/", web::get().to(index))
                    // Credential endpoints stay public
                    .service(
                        web::scope("/auth")
                            .service(handlers::auth::register)
                            .service(handlers::auth::login)
                            .service(handlers::auth::logout)
                            .service(handlers::auth::me),
                    )
                    // Everything below requires a resolved identity
                    .service(
                        web::scope("")
                            .wrap(actix_web::middleware::from_fn(handlers::auth::guard_api))
                            .service(handlers::products::list_products)
                            .service(handlers::products::get_product)
                            .service(handlers::products::create_product)
                            .service(handlers::products::update_product)
                            .service(handlers::products::delete_product)
                            .service(
                                web::scope("")
                                    .wrap(actix_web::middleware::from_fn(
                                        handlers::auth::guard_admin,
                                    ))
                                    .service(handlers::users::list_users)
                                    .service(handlers::users::get_user),
                            ),
                    ),
            )
            // Dashboard bundle and SPA fallback (must be last)
            .service(
                Files::new("/", "./static")
                    .index_file("index.html")
                    .default_handler(web::to(routes::static_files::spa_fallback)),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}
