use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    routing::get,
};

use carkeeper_core::UserCarId;
use carkeeper_servicing::RegisterCar;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn protected() -> Router {
    Router::new()
        .route("/profile/cars", get(list_cars).post(register_car))
        .route("/profile/cars/:id", get(get_car))
        .route("/profile/configurations", get(list_configurations))
}

pub async fn list_cars(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    dto::respond(services.user_cars(&principal).await)
}

pub async fn register_car(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    dto::JsonBody(body): dto::JsonBody<RegisterCar>,
) -> axum::response::Response {
    match services.register_car(&principal, body).await {
        Ok(car) => dto::created(car),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_car(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserCarId = match dto::parse_id(&id, "car id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    dto::respond(services.user_car(&principal, id).await)
}

pub async fn list_configurations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    dto::respond(services.configurations_for_user(&principal).await)
}
