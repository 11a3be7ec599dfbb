use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path, Query},
    routing::{get, patch, post},
};

use carkeeper_core::AppointmentId;
use carkeeper_servicing::BookAppointment;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn public() -> Router {
    Router::new()
        .route("/service/types", get(list_service_types))
        .route("/service/branches", get(list_branches))
}

pub fn protected() -> Router {
    Router::new()
        .route("/service/user-cars", get(list_user_cars))
        .route("/service/appointments", post(book_appointment).get(list_appointments))
        .route("/service/appointments/:id", get(get_appointment))
        .route("/service/appointments/:id/cancel", patch(cancel_appointment))
}

pub async fn list_service_types(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ServiceTypesQuery>,
) -> axum::response::Response {
    dto::respond(
        services
            .service_types(query.category.as_deref(), query.is_available)
            .await,
    )
}

pub async fn list_branches(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::BranchesQuery>,
) -> axum::response::Response {
    dto::respond(services.branches(query.is_active).await)
}

pub async fn list_user_cars(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    dto::respond(services.user_cars(&principal).await)
}

pub async fn book_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    dto::JsonBody(body): dto::JsonBody<BookAppointment>,
) -> axum::response::Response {
    match services.book_appointment(&principal, body).await {
        Ok(a) => dto::created(a),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_appointments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    dto::respond(services.appointments_for_user(&principal).await)
}

pub async fn get_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AppointmentId = match dto::parse_id(&id, "appointment id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    dto::respond(services.appointment(&principal, id).await)
}

pub async fn cancel_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AppointmentId = match dto::parse_id(&id, "appointment id") {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };
    dto::respond(services.cancel_appointment(&principal, id).await)
}
