// handlers/auth.rs
//
// Token issuing/verification and the authentication gate. Tokens are HS256
// JWTs signed with the configured secret. Verification failures are never
// distinguished to the caller: expired, tampered and malformed tokens all
// produce the same rejection.
use actix_web::{post, get, web, HttpResponse, Result, HttpRequest, HttpMessage};
use actix_web::body::BoxBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{SaltString, PasswordHash};
use rand_core::OsRng;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use chrono::Utc;
use serde_json::json;

use crate::config::AppConfig;
use crate::db::Database;
use crate::handlers::cookies::{clear_auth_cookie, extract_token, set_auth_cookie};
use crate::models::auth::{Claims, LoginRequest, RegisterRequest, Role, UserRecord};
use crate::types::{ApiEnvelope, AuthResponse};

pub const NOT_AUTHORIZED: &str = "Not authorized to access this route";

type HmacSha256 = Hmac<Sha256>;

fn base64url(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

fn sign_hs256(secret: &[u8], header_b64: &str, payload_b64: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    let signing_input = format!("{}.{}", header_b64, payload_b64);
    mac.update(signing_input.as_bytes());
    let sig = mac.finalize().into_bytes();
    base64url(&sig)
}

fn verify_hs256(secret: &[u8], token: &str) -> Option<serde_json::Value> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let (h, p, s) = (parts[0], parts[1], parts[2]);
    let sig = URL_SAFE_NO_PAD.decode(s).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(format!("{}.{}", h, p).as_bytes());
    // Constant-time tag comparison
    mac.verify_slice(&sig).ok()?;
    // Header must at least be valid JSON; only the payload is consumed.
    let _header: serde_json::Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(h).ok()?).ok()?;
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(p).ok()?).ok()
}

/// Build the claim set for a freshly authenticated user.
pub fn issue_claims(cfg: &AppConfig, user: &UserRecord) -> Claims {
    let now = Utc::now();
    Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        role: user.role,
        iss: cfg.security.token_iss.clone(),
        aud: cfg.security.token_aud.clone(),
        iat: now.timestamp(),
        exp: now.timestamp() + cfg.security.token_ttl_seconds as i64,
    }
}

pub fn make_token(cfg: &AppConfig, claims: &Claims) -> Option<String> {
    let header = json!({"alg": "HS256", "typ": "JWT"});
    let header_b64 = base64url(&serde_json::to_vec(&header).ok()?);
    let payload_b64 = base64url(&serde_json::to_vec(claims).ok()?);
    let sig = sign_hs256(
        cfg.security.jwt_secret.as_bytes(),
        &header_b64,
        &payload_b64,
    );
    Some(format!("{}.{}.{}", header_b64, payload_b64, sig))
}

/// Verify signature, issuer/audience and expiry. Expiry policy: the token is
/// rejected from the exact expiry instant (`now >= exp`), plus an optional
/// configured leeway (zero by default).
pub fn validate_token(cfg: &AppConfig, token: &str) -> Option<Claims> {
    let payload = verify_hs256(cfg.security.jwt_secret.as_bytes(), token)?;
    let claims: Claims = serde_json::from_value(payload).ok()?;
    if claims.iss != cfg.security.token_iss || claims.aud != cfg.security.token_aud {
        return None;
    }
    let now = Utc::now().timestamp();
    if now >= claims.exp + cfg.security.token_leeway_seconds as i64 {
        return None;
    }
    Some(claims)
}

/// The identity the auth gate attaches to the request after resolving the
/// token subject against the user collection.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&UserRecord> for AuthIdentity {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Typed role check, meaningful only after `guard_api` attached an identity.
pub fn authorize(identity: &AuthIdentity, allowed: &[Role]) -> Result<(), String> {
    if identity.role.is_allowed(allowed) {
        Ok(())
    } else {
        Err(format!(
            "User role {} is not authorized to access this route",
            identity.role
        ))
    }
}

fn hash_password(password: &str) -> Result<String, actix_web::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| actix_web::error::ErrorInternalServerError("hash error"))?
        .to_string())
}

fn auth_response(
    cfg: &AppConfig,
    user: &UserRecord,
    created: bool,
) -> Result<HttpResponse> {
    let claims = issue_claims(cfg, user);
    let token = make_token(cfg, &claims)
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("token error"))?;

    let body = AuthResponse {
        success: true,
        token: token.clone(),
        user: serde_json::to_value(user.public())
            .map_err(actix_web::error::ErrorInternalServerError)?,
    };
    let response = if created {
        HttpResponse::Created().json(body)
    } else {
        HttpResponse::Ok().json(body)
    };
    Ok(set_auth_cookie(
        response,
        token,
        cfg.security.token_ttl_seconds as i64,
        cfg.security.cookie_secure,
    ))
}

#[post("/register")]
pub async fn register(
    db: web::Data<Database>,
    cfg: web::Data<AppConfig>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    use crate::validation as v;

    let email = body.email.trim().to_lowercase();

    if body.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiEnvelope::fail("Please add a name")));
    }
    if let Err(e) = v::validate_email_strict(&email) {
        return Ok(HttpResponse::BadRequest().json(ApiEnvelope::fail(e)));
    }
    if let Err(e) = v::password_strength(&body.password) {
        return Ok(HttpResponse::BadRequest().json(ApiEnvelope::fail(e)));
    }

    let users: Vec<UserRecord> = db.list("users").unwrap_or_default();
    if users.iter().any(|u| u.email == email) {
        return Ok(HttpResponse::Conflict().json(ApiEnvelope::fail("Email already registered")));
    }

    let hash = hash_password(&body.password)?;
    // The first account on a fresh store becomes the admin.
    let user = if users.is_empty() {
        UserRecord::new_admin(&body.name, &email, hash)
    } else {
        UserRecord::new_user(&body.name, &email, hash)
    };
    db.insert("users", &user.id, &user)
        .map_err(|_| actix_web::error::ErrorInternalServerError("db error"))?;

    auth_response(&cfg, &user, true)
}

#[post("/login")]
pub async fn login(
    db: web::Data<Database>,
    cfg: web::Data<AppConfig>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let email = body.email.trim().to_lowercase();

    if email.is_empty() || body.password.is_empty() || body.password.len() > 128 {
        return Ok(HttpResponse::BadRequest().json(ApiEnvelope::fail("Invalid credentials")));
    }

    let users: Vec<UserRecord> = db.list("users").unwrap_or_default();
    if let Some(u) = users.iter().find(|u| u.email == email) {
        let parsed = PasswordHash::new(&u.password_hash)
            .map_err(|_| actix_web::error::ErrorInternalServerError("hash read error"))?;
        if Argon2::default()
            .verify_password(body.password.as_bytes(), &parsed)
            .is_ok()
        {
            return auth_response(&cfg, u, false);
        }
    }
    // Generic error to prevent user enumeration
    Ok(HttpResponse::Unauthorized().json(ApiEnvelope::fail("Invalid email or password")))
}

#[post("/logout")]
pub async fn logout() -> Result<HttpResponse> {
    Ok(clear_auth_cookie(HttpResponse::NoContent().finish()))
}

#[get("/me")]
pub async fn me(
    db: web::Data<Database>,
    cfg: web::Data<AppConfig>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Some(tok) = extract_token(&req) {
        if let Some(claims) = validate_token(&cfg, &tok) {
            // Token subject may have been deleted since issuance
            if let Ok(Some(user)) = db.get::<UserRecord>("users", &claims.sub) {
                return Ok(HttpResponse::Ok().json(ApiEnvelope::ok(
                    serde_json::to_value(user.public())
                        .map_err(actix_web::error::ErrorInternalServerError)?,
                )));
            }
        }
    }
    Ok(HttpResponse::Unauthorized().json(ApiEnvelope::fail(NOT_AUTHORIZED)))
}

fn unauthorized(req: ServiceRequest) -> ServiceResponse<BoxBody> {
    let (req, _pl) = req.into_parts();
    let resp = HttpResponse::Unauthorized().json(ApiEnvelope::fail(NOT_AUTHORIZED));
    ServiceResponse::new(req, resp.map_into_boxed_body())
}

/// Authentication gate for protected scopes. Extracts the token (header
/// first, cookie second), verifies it, resolves the subject against the user
/// collection and attaches the resulting identity to the request. Any failed
/// step ends the request with a uniform 401 before the handler runs.
pub async fn guard_api(
    req: ServiceRequest,
    next: actix_web::middleware::Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, actix_web::Error> {
    let cfg = req.app_data::<web::Data<AppConfig>>().cloned();
    let db = req.app_data::<web::Data<Database>>().cloned();
    if let (Some(cfg), Some(db)) = (cfg, db) {
        if let Some(tok) = extract_token(req.request()) {
            if let Some(claims) = validate_token(&cfg, &tok) {
                let user: Option<UserRecord> = db.get("users", &claims.sub).unwrap_or(None);
                if let Some(user) = user {
                    req.extensions_mut().insert(AuthIdentity::from(&user));
                    return next.call(req).await;
                }
            }
        }
    }
    Ok(unauthorized(req))
}

/// Role gate for admin-only scopes; must be chained after `guard_api`.
pub async fn guard_admin(
    req: ServiceRequest,
    next: actix_web::middleware::Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, actix_web::Error> {
    let identity = req.extensions().get::<AuthIdentity>().cloned();
    match identity {
        Some(identity) => match authorize(&identity, &[Role::Admin]) {
            Ok(()) => next.call(req).await,
            Err(message) => {
                let (req, _pl) = req.into_parts();
                let resp = HttpResponse::Forbidden().json(ApiEnvelope::fail(message));
                Ok(ServiceResponse::new(req, resp.map_into_boxed_body()))
            }
        },
        None => Ok(unauthorized(req)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{LoggingConfig, SecurityConfig, ServerConfig};
    use actix_web::{test, App};
    use tempfile::tempdir;

    pub(crate) fn make_test_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "localhost".into(),
                port: 0,
                name: "test".into(),
            },
            sled_path: "test.db".into(),
            cors_origins: vec![],
            logging: LoggingConfig {
                level: "info".into(),
                file_enabled: false,
                file_path: None,
            },
            security: SecurityConfig {
                jwt_secret: "test_secret".into(),
                token_iss: "test_iss".into(),
                token_aud: "test_aud".into(),
                token_ttl_seconds: 3600,
                token_leeway_seconds: 0,
                cookie_secure: false,
            },
        }
    }

    fn make_test_user() -> UserRecord {
        UserRecord::new_user("Test User", "test@example.com", "unused-hash".into())
    }

    #[test]
    async fn test_token_roundtrip() {
        let cfg = make_test_config();
        let user = make_test_user();
        let claims = issue_claims(&cfg, &user);
        let token = make_token(&cfg, &claims).expect("make token");
        let decoded = validate_token(&cfg, &token).expect("validate token");
        assert_eq!(decoded.sub, user.id);
        assert_eq!(decoded.email, user.email);
        assert_eq!(decoded.role, Role::User);
    }

    #[test]
    async fn test_expired_token_rejected() {
        let cfg = make_test_config();
        let user = make_test_user();
        let mut claims = issue_claims(&cfg, &user);
        claims.exp = Utc::now().timestamp() - 10;
        let token = make_token(&cfg, &claims).unwrap();
        assert!(validate_token(&cfg, &token).is_none());
    }

    #[test]
    async fn test_token_invalid_at_exact_expiry() {
        let cfg = make_test_config();
        let user = make_test_user();
        let mut claims = issue_claims(&cfg, &user);
        claims.exp = Utc::now().timestamp();
        let token = make_token(&cfg, &claims).unwrap();
        assert!(validate_token(&cfg, &token).is_none());
    }

    #[test]
    async fn test_tampered_token_rejected() {
        let cfg = make_test_config();
        let user = make_test_user();
        let claims = issue_claims(&cfg, &user);
        let mut token = make_token(&cfg, &claims).unwrap();
        token.push('x'); // tamper
        assert!(validate_token(&cfg, &token).is_none());
        assert!(validate_token(&cfg, "not-a-token").is_none());
    }

    #[test]
    async fn test_forged_signatures_rejected() {
        let cfg = make_test_config();
        let user = make_test_user();
        let token = make_token(&cfg, &issue_claims(&cfg, &user)).unwrap();
        let (body, sig) = token.rsplit_once('.').unwrap();

        // Signature sharing every byte but the last with the real tag
        let mut forged_sig: Vec<u8> = URL_SAFE_NO_PAD.decode(sig).unwrap();
        let last = forged_sig.len() - 1;
        forged_sig[last] ^= 0x01;
        let forged = format!("{}.{}", body, base64url(&forged_sig));
        assert!(validate_token(&cfg, &forged).is_none());

        // Truncated and non-base64 tags
        assert!(validate_token(&cfg, &format!("{}.{}", body, &sig[..sig.len() - 4])).is_none());
        assert!(validate_token(&cfg, &format!("{}.!!!", body)).is_none());
    }

    #[test]
    async fn test_wrong_audience_rejected() {
        let cfg = make_test_config();
        let user = make_test_user();
        let mut claims = issue_claims(&cfg, &user);
        claims.aud = "someone_else".into();
        let token = make_token(&cfg, &claims).unwrap();
        assert!(validate_token(&cfg, &token).is_none());
    }

    #[test]
    async fn test_authorize_role_membership() {
        let user = make_test_user();
        let identity = AuthIdentity::from(&user);
        assert!(authorize(&identity, &[Role::User, Role::Admin]).is_ok());
        let err = authorize(&identity, &[Role::Admin]).unwrap_err();
        assert!(err.contains("user"));
    }

    async fn protected_probe(req: HttpRequest) -> HttpResponse {
        match req.extensions().get::<AuthIdentity>().cloned() {
            Some(identity) => HttpResponse::Ok().json(json!({ "id": identity.id })),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    fn guarded_app_parts(dir: &tempfile::TempDir) -> (Database, AppConfig) {
        let cfg = make_test_config();
        let db = Database::new(dir.path().join("sled").to_str().unwrap()).unwrap();
        (db, cfg)
    }

    #[actix_web::test]
    async fn guard_rejects_missing_token() {
        let dir = tempdir().unwrap();
        let (db, cfg) = guarded_app_parts(&dir);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(cfg))
                .wrap(actix_web::middleware::from_fn(guard_api))
                .route("/p", web::get().to(protected_probe)),
        )
        .await;

        let req = test::TestRequest::get().uri("/p").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], NOT_AUTHORIZED);
    }

    #[actix_web::test]
    async fn guard_resolves_identity_and_prefers_header() {
        let dir = tempdir().unwrap();
        let (db, cfg) = guarded_app_parts(&dir);
        let user = make_test_user();
        db.insert("users", &user.id, &user).unwrap();
        let token = make_token(&cfg, &issue_claims(&cfg, &user)).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(cfg))
                .wrap(actix_web::middleware::from_fn(guard_api))
                .route("/p", web::get().to(protected_probe)),
        )
        .await;

        // Valid header together with a garbage cookie: header must win.
        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header(("authorization", format!("Bearer {}", token)))
            .cookie(actix_web::cookie::Cookie::new("token", "garbage"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["id"], user.id);
    }

    #[actix_web::test]
    async fn guard_rejects_deleted_identity() {
        let dir = tempdir().unwrap();
        let (db, cfg) = guarded_app_parts(&dir);
        // Token for a user that was never stored (or deleted since issuance)
        let ghost = make_test_user();
        let token = make_token(&cfg, &issue_claims(&cfg, &ghost)).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(cfg))
                .wrap(actix_web::middleware::from_fn(guard_api))
                .route("/p", web::get().to(protected_probe)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header(("authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn admin_gate_rejects_plain_users() {
        let dir = tempdir().unwrap();
        let (db, cfg) = guarded_app_parts(&dir);
        let user = make_test_user();
        db.insert("users", &user.id, &user).unwrap();
        let token = make_token(&cfg, &issue_claims(&cfg, &user)).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(cfg))
                .wrap(actix_web::middleware::from_fn(guard_admin))
                .wrap(actix_web::middleware::from_fn(guard_api))
                .route("/admin", web::get().to(protected_probe)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header(("authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn e2e_register_login_me() {
        let dir = tempdir().unwrap();
        let (db, cfg) = guarded_app_parts(&dir);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(cfg))
                .service(register)
                .service(login)
                .service(logout)
                .service(me),
        )
        .await;

        let reg = RegisterRequest {
            name: "First Admin".into(),
            email: "admin@test.dev".into(),
            password: "secret123A".into(),
        };
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(&reg)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let reg_resp: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(reg_resp["success"], true);
        // First account becomes the admin
        assert_eq!(reg_resp["user"]["role"], "admin");
        assert!(reg_resp["user"].get("passwordHash").is_none());
        let token = reg_resp["token"].as_str().unwrap().to_string();

        let me_req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("authorization", format!("Bearer {}", token)))
            .to_request();
        let me_resp: serde_json::Value = test::call_and_read_body_json(&app, me_req).await;
        assert_eq!(me_resp["data"]["email"], "admin@test.dev");

        let login_req = LoginRequest {
            email: "admin@test.dev".into(),
            password: "secret123A".into(),
        };
        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(&login_req)
            .to_request();
        let login_resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(login_resp.get("token").is_some());

        // Wrong password: generic 401
        let bad = LoginRequest {
            email: "admin@test.dev".into(),
            password: "wrong-password1".into(),
        };
        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(&bad)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn register_rejects_duplicate_email() {
        let dir = tempdir().unwrap();
        let (db, cfg) = guarded_app_parts(&dir);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(cfg))
                .service(register),
        )
        .await;

        let reg = RegisterRequest {
            name: "One".into(),
            email: "dup@test.dev".into(),
            password: "secret123A".into(),
        };
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(&reg)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(&reg)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);
    }
}
