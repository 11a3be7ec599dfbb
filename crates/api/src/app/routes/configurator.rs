use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path, Query},
    routing::{get, post},
};
use serde_json::json;

use carkeeper_configurator::ConfigurationDraft;
use carkeeper_core::{ConfigurationId, TrimId};

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn protected() -> Router {
    Router::new()
        .route("/configurator/colors", get(list_colors))
        .route("/configurator/options", get(list_options))
        .route("/configurator/configurations", post(create_configuration))
        .route(
            "/configurator/configurations/:id",
            get(get_configuration)
                .put(update_configuration)
                .delete(delete_configuration),
        )
}

pub async fn list_colors(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::AvailabilityQuery>,
) -> axum::response::Response {
    dto::respond(services.colors(query.is_available).await)
}

pub async fn list_options(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::OptionsQuery>,
) -> axum::response::Response {
    let trim_id: TrimId = match dto::required_id(query.trim_id.as_deref(), "trim_id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    dto::respond(services.options_for_trim(trim_id).await)
}

pub async fn create_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    dto::JsonBody(body): dto::JsonBody<ConfigurationDraft>,
) -> axum::response::Response {
    match services.create_configuration(&principal, body).await {
        Ok(c) => dto::created(c),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ConfigurationId = match dto::parse_id(&id, "configuration id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    dto::respond(services.configuration(&principal, id).await)
}

pub async fn update_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    dto::JsonBody(body): dto::JsonBody<dto::UpdateConfigurationRequest>,
) -> axum::response::Response {
    let id: ConfigurationId = match dto::parse_id(&id, "configuration id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    let update = match body.into_update() {
        Ok(u) => u,
        Err(e) => return errors::service_error_to_response(e),
    };
    dto::respond(services.update_configuration(&principal, id, update).await)
}

pub async fn delete_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ConfigurationId = match dto::parse_id(&id, "configuration id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    match services.delete_configuration(&principal, id).await {
        Ok(()) => dto::ok(json!({ "configuration_id": id, "deleted": true })),
        Err(e) => errors::service_error_to_response(e),
    }
}
