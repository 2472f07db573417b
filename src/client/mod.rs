// Data-access layer for the dashboard.
//
// Every product operation talks to the REST API first and degrades to the
// persisted snapshot when the call fails, so the dashboard keeps rendering
// the last known-good data without the server. Auth calls never degrade.
pub mod cache;
pub mod session;

use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::Utc;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::warn;

use crate::models::auth::PublicUser;
use crate::models::product::{CreateProductRequest, ProductRecord, UpdateProductRequest};

use cache::ProductCache;
use session::SessionContext;

#[derive(Debug)]
pub enum RequestFailure {
    /// Connection refused, DNS failure, timeout and friends.
    Transport(reqwest::Error),
    /// The server answered with a non-2xx status.
    Http { status: StatusCode, message: String },
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFailure::Transport(e) => write!(f, "request failed: {}", e),
            RequestFailure::Http { status, message } => {
                write!(f, "server returned {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for RequestFailure {}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    pub session: SessionContext,
    cache: ProductCache,
}

impl ApiClient {
    /// `store_path` is the client-side sled store holding both the session
    /// and the product snapshot.
    pub fn new(base_url: &str, store_path: &Path) -> Result<Self> {
        let db = sled::open(store_path)?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session: SessionContext::load(&db)?,
            cache: ProductCache::open(&db)?,
        })
    }

    pub fn needs_login(&self) -> bool {
        self.session.needs_login()
    }

    /// One request against the API. Attaches the bearer token when a session
    /// exists. A 401 on anything but the credential endpoints invalidates
    /// the stored session so the UI can route to the login screen.
    async fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> std::result::Result<Value, RequestFailure> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, &url);
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(RequestFailure::Transport)?;
        let status = response.status();
        let text = response.text().await.map_err(RequestFailure::Transport)?;
        // 204 responses and proxy error pages carry no JSON body
        let value: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(value);
        }

        let credential_endpoint = path == "/api/auth/login" || path == "/api/auth/register";
        if status == StatusCode::UNAUTHORIZED && !credential_endpoint {
            if let Err(e) = self.session.invalidate() {
                warn!("could not persist expired session: {}", e);
            }
        }

        let message = value["message"]
            .as_str()
            .unwrap_or("request rejected")
            .to_string();
        Err(RequestFailure::Http { status, message })
    }

    fn store_session(&mut self, body: &Value) -> Result<PublicUser> {
        let token = body["token"]
            .as_str()
            .ok_or_else(|| anyhow!("response carried no token"))?
            .to_string();
        let user: PublicUser = serde_json::from_value(body["user"].clone())?;
        self.session.establish(token, user.clone())?;
        Ok(user)
    }

    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> Result<PublicUser> {
        let body = self
            .request(
                Method::POST,
                "/api/auth/register",
                Some(json!({ "name": name, "email": email, "password": password })),
            )
            .await?;
        self.store_session(&body)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<PublicUser> {
        let body = self
            .request(
                Method::POST,
                "/api/auth/login",
                Some(json!({ "email": email, "password": password })),
            )
            .await?;
        self.store_session(&body)
    }

    /// Best-effort server-side logout; the local session is dropped either way.
    pub async fn logout(&mut self) -> Result<()> {
        if let Err(e) = self.request(Method::POST, "/api/auth/logout", None).await {
            warn!("logout request failed: {}", e);
        }
        self.session.clear()
    }

    pub async fn me(&mut self) -> Result<PublicUser> {
        let body = self.request(Method::GET, "/api/auth/me", None).await?;
        Ok(serde_json::from_value(body["data"].clone())?)
    }

    /// Fetch the caller's products. A successful fetch overwrites the cached
    /// snapshot wholesale; any failure serves the last snapshot instead.
    pub async fn list_products(&mut self) -> Result<Vec<ProductRecord>> {
        match self.request(Method::GET, "/api/products", None).await {
            Ok(body) => {
                let products: Vec<ProductRecord> = serde_json::from_value(body["data"].clone())?;
                self.cache.replace_all(&products)?;
                Ok(products)
            }
            Err(failure) => {
                warn!("product fetch degraded to cache: {}", failure);
                Ok(self.cache.snapshot())
            }
        }
    }

    /// Fetch one product. On failure the cached snapshot is scanned; when the
    /// id is not cached either, the original failure propagates.
    pub async fn get_product(&mut self, id: &str) -> Result<ProductRecord> {
        let path = format!("/api/products/{}", id);
        match self.request(Method::GET, &path, None).await {
            Ok(body) => Ok(serde_json::from_value(body["data"].clone())?),
            Err(failure) => match self.cache.find(id) {
                Some(product) => {
                    warn!("product read degraded to cache: {}", failure);
                    Ok(product)
                }
                None => Err(failure.into()),
            },
        }
    }

    /// Create a product. On failure a local placeholder record is synthesized
    /// and appended to the snapshot so the dashboard can keep going; the
    /// placeholder id is time-derived and prefixed `local-`. Without a known
    /// session user there is no owner to stamp on the placeholder and the
    /// failure propagates instead.
    pub async fn create_product(&mut self, payload: CreateProductRequest) -> Result<ProductRecord> {
        let body = serde_json::to_value(&payload)?;
        match self.request(Method::POST, "/api/products", Some(body)).await {
            Ok(body) => {
                let product: ProductRecord = serde_json::from_value(body["data"].clone())?;
                self.cache.upsert(&product)?;
                Ok(product)
            }
            Err(failure) => {
                let Some(owner) = self.session.user().map(|u| u.id.clone()) else {
                    return Err(failure.into());
                };
                warn!("product create kept locally: {}", failure);
                let mut placeholder = payload.into_record(&owner);
                placeholder.id = format!("local-{}", Utc::now().timestamp_millis());
                self.cache.append(&placeholder)?;
                Ok(placeholder)
            }
        }
    }

    /// Update a product. On failure the submitted fields are applied to the
    /// cached record with a client-side updated timestamp; an id that is not
    /// cached propagates the failure.
    pub async fn update_product(
        &mut self,
        id: &str,
        payload: UpdateProductRequest,
    ) -> Result<ProductRecord> {
        let path = format!("/api/products/{}", id);
        let body = serde_json::to_value(&payload)?;
        match self.request(Method::PUT, &path, Some(body)).await {
            Ok(body) => {
                let product: ProductRecord = serde_json::from_value(body["data"].clone())?;
                self.cache.upsert(&product)?;
                Ok(product)
            }
            Err(failure) => match self.cache.find(id) {
                Some(mut cached) => {
                    warn!("product update kept locally: {}", failure);
                    payload.apply_to(&mut cached);
                    cached.updated_at = Some(Utc::now().to_rfc3339());
                    self.cache.upsert(&cached)?;
                    Ok(cached)
                }
                None => Err(failure.into()),
            },
        }
    }

    /// Delete a product. The cached record is dropped regardless of the
    /// server outcome, so the dashboard never resurrects a deleted row from
    /// the snapshot.
    pub async fn delete_product(&mut self, id: &str) -> Result<()> {
        let result = self
            .request(Method::DELETE, &format!("/api/products/{}", id), None)
            .await;
        self.cache.remove(id)?;
        if let Err(failure) = result {
            warn!("product delete not confirmed by server: {}", failure);
        }
        Ok(())
    }
}
