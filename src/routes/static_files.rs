// Dashboard bundle serving with SPA fallback
use actix_files::NamedFile;
use actix_web::{HttpRequest, Result};
use std::path::PathBuf;

/// SPA fallback - serve index.html for non-API routes.
/// This enables HTML5 history mode routing in the dashboard.
pub async fn spa_fallback(req: HttpRequest) -> Result<NamedFile> {
    let path: PathBuf = req.match_info().query("tail").parse()?;

    // Don't fallback for API routes or static assets
    let path_str = path.to_str().unwrap_or("");
    if path_str.starts_with("api/") || path_str.starts_with("assets/") {
        return Err(actix_web::error::ErrorNotFound("Not found"));
    }

    let index_path = PathBuf::from("./static/index.html");
    NamedFile::open_async(index_path)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)
}
