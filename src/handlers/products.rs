// Product CRUD, scoped to the owning identity.
//
// Every read filters on the owner; every write looks the record up by id AND
// owner first. A record that exists but belongs to someone else is reported
// as not found, never as forbidden, so callers cannot probe for foreign ids.
use actix_web::{delete, get, post, put, web, HttpMessage, HttpRequest, HttpResponse, Result};

use crate::db::Database;
use crate::handlers::auth::{AuthIdentity, NOT_AUTHORIZED};
use crate::models::product::{CreateProductRequest, ProductRecord, UpdateProductRequest};
use crate::types::ApiEnvelope;
use crate::validation as v;

pub const PRODUCTS: &str = "products";

fn identity(req: &HttpRequest) -> Option<AuthIdentity> {
    req.extensions().get::<AuthIdentity>().cloned()
}

fn no_identity() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiEnvelope::fail(NOT_AUTHORIZED))
}

fn store_error(e: anyhow::Error) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiEnvelope::fail(e.to_string()))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiEnvelope::fail("Product not found"))
}

/// Fetch a product by id, only if it is owned by `owner_id`.
fn find_owned(db: &Database, id: &str, owner_id: &str) -> anyhow::Result<Option<ProductRecord>> {
    let record: Option<ProductRecord> = db.get(PRODUCTS, id)?;
    Ok(record.filter(|p| p.user == owner_id))
}

#[get("/products")]
pub async fn list_products(db: web::Data<Database>, req: HttpRequest) -> Result<HttpResponse> {
    let Some(identity) = identity(&req) else {
        return Ok(no_identity());
    };

    let products: Vec<ProductRecord> = match db.list(PRODUCTS) {
        Ok(all) => all,
        Err(e) => return Ok(store_error(e)),
    };
    let mine: Vec<ProductRecord> = products
        .into_iter()
        .filter(|p| p.user == identity.id)
        .collect();

    let count = mine.len();
    let data = serde_json::to_value(mine).map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(ApiEnvelope::ok_list(data, count)))
}

#[get("/products/{id}")]
pub async fn get_product(
    path: web::Path<String>,
    db: web::Data<Database>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(identity) = identity(&req) else {
        return Ok(no_identity());
    };

    let product = match find_owned(&db, &path.into_inner(), &identity.id) {
        Ok(Some(p)) => p,
        Ok(None) => return Ok(not_found()),
        Err(e) => return Ok(store_error(e)),
    };

    let data = serde_json::to_value(product).map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(data)))
}

#[post("/products")]
pub async fn create_product(
    body: web::Json<CreateProductRequest>,
    db: web::Data<Database>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(identity) = identity(&req) else {
        return Ok(no_identity());
    };

    if let Err(e) = v::validate_new_product(&body) {
        return Ok(HttpResponse::BadRequest().json(ApiEnvelope::fail(e)));
    }

    // Owner is always the acting identity, whatever the payload said.
    let record = body.into_inner().into_record(&identity.id);
    if let Err(e) = db.insert(PRODUCTS, &record.id, &record) {
        return Ok(store_error(e));
    }

    let data = serde_json::to_value(record).map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(HttpResponse::Created().json(ApiEnvelope::ok(data)))
}

#[put("/products/{id}")]
pub async fn update_product(
    path: web::Path<String>,
    body: web::Json<UpdateProductRequest>,
    db: web::Data<Database>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(identity) = identity(&req) else {
        return Ok(no_identity());
    };

    if let Err(e) = v::validate_product_update(&body) {
        return Ok(HttpResponse::BadRequest().json(ApiEnvelope::fail(e)));
    }

    let id = path.into_inner();
    let mut record = match find_owned(&db, &id, &identity.id) {
        Ok(Some(p)) => p,
        Ok(None) => return Ok(not_found()),
        Err(e) => return Ok(store_error(e)),
    };

    body.apply_to(&mut record);
    if let Err(e) = db.update(PRODUCTS, &id, &record) {
        return Ok(store_error(e));
    }

    let data = serde_json::to_value(record).map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(data)))
}

#[delete("/products/{id}")]
pub async fn delete_product(
    path: web::Path<String>,
    db: web::Data<Database>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(identity) = identity(&req) else {
        return Ok(no_identity());
    };

    let id = path.into_inner();
    match find_owned(&db, &id, &identity.id) {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(not_found()),
        Err(e) => return Ok(store_error(e)),
    }

    if let Err(e) = db.delete(PRODUCTS, &id) {
        return Ok(store_error(e));
    }

    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(serde_json::json!({}))))
}
