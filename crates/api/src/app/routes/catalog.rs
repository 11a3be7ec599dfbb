use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path, Query},
    routing::get,
};

use carkeeper_core::{BrandId, ModelId, TrimId};

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;

pub fn public() -> Router {
    Router::new()
        .route("/catalog/brands", get(list_brands))
        .route("/catalog/models", get(list_models))
        .route("/catalog/generations", get(list_generations))
        .route("/catalog/trims", get(list_trims))
        .route("/catalog/trims/:id", get(get_trim))
        .route("/catalog/engine-types", get(list_engine_types))
        .route("/catalog/transmissions", get(list_transmissions))
        .route("/catalog/drive-types", get(list_drive_types))
}

pub async fn list_brands(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    dto::respond(services.brands().await)
}

pub async fn list_models(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ModelsQuery>,
) -> axum::response::Response {
    let brand_id: BrandId = match dto::required_id(query.brand_id.as_deref(), "brand_id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    dto::respond(services.models(brand_id).await)
}

pub async fn list_generations(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::GenerationsQuery>,
) -> axum::response::Response {
    let model_id: ModelId = match dto::required_id(query.model_id.as_deref(), "model_id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    dto::respond(services.generations(model_id).await)
}

pub async fn list_trims(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::TrimsQuery>,
) -> axum::response::Response {
    let filter = query.into_filter();
    dto::respond(services.trims(&filter).await)
}

pub async fn get_trim(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TrimId = match dto::parse_id(&id, "trim id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    dto::respond(services.trim(id).await)
}

pub async fn list_engine_types(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    dto::respond(services.engine_types().await)
}

pub async fn list_transmissions(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    dto::respond(services.transmissions().await)
}

pub async fn list_drive_types(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    dto::respond(services.drive_types().await)
}
