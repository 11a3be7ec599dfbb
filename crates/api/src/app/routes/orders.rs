use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    routing::{get, patch, post},
};

use carkeeper_core::OrderId;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn protected() -> Router {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", patch(update_order_status))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    dto::JsonBody(body): dto::JsonBody<dto::CreateOrderRequest>,
) -> axum::response::Response {
    match services.place_order(&principal, body.configuration_id).await {
        Ok(order) => dto::created(order),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    dto::respond(services.orders_for_user(&principal).await)
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match dto::parse_id(&id, "order id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    dto::respond(services.order(&principal, id).await)
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    dto::JsonBody(body): dto::JsonBody<dto::StatusRequest>,
) -> axum::response::Response {
    let id: OrderId = match dto::parse_id(&id, "order id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    dto::respond(services.set_order_status(&principal, id, &body.status).await)
}
