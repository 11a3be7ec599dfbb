use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path, Query},
    routing::{get, patch, post, put},
};
use serde_json::json;

use carkeeper_core::NewsId;
use carkeeper_news::NewsContent;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn public() -> Router {
    Router::new()
        .route("/news", get(list_news))
        .route("/news/:id", get(get_news))
}

/// Staff routes. Same paths as the public reads, other methods.
pub fn protected() -> Router {
    Router::new()
        .route("/news", post(create_news))
        .route("/news/:id", put(update_news).delete(delete_news))
        .route("/news/:id/publish", patch(publish_news))
        .route("/news/:id/unpublish", patch(unpublish_news))
}

fn news_id(raw: &str) -> Result<NewsId, axum::response::Response> {
    dto::parse_id(raw, "news id").map_err(errors::service_error_to_response)
}

pub async fn list_news(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::NewsQuery>,
) -> axum::response::Response {
    dto::respond(services.news(query.is_published).await)
}

pub async fn get_news(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match news_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(services.news_item(id).await)
}

pub async fn create_news(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    dto::JsonBody(body): dto::JsonBody<NewsContent>,
) -> axum::response::Response {
    match services.create_news(&principal, body).await {
        Ok(n) => dto::created(n),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_news(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    dto::JsonBody(body): dto::JsonBody<NewsContent>,
) -> axum::response::Response {
    let id = match news_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(services.update_news(&principal, id, body).await)
}

pub async fn publish_news(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match news_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(services.publish_news(&principal, id).await)
}

pub async fn unpublish_news(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match news_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(services.unpublish_news(&principal, id).await)
}

pub async fn delete_news(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match news_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.delete_news(&principal, id).await {
        Ok(()) => dto::ok(json!({ "news_id": id, "deleted": true })),
        Err(e) => errors::service_error_to_response(e),
    }
}
