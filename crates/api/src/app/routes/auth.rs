use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};

use carkeeper_auth::RegisterUser;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn public() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn protected() -> Router {
    Router::new().route("/auth/me", get(me))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    dto::JsonBody(body): dto::JsonBody<RegisterUser>,
) -> axum::response::Response {
    match services.register(body).await {
        Ok(user) => dto::created(user),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    dto::JsonBody(body): dto::JsonBody<dto::LoginRequest>,
) -> axum::response::Response {
    dto::respond(services.login(&body.email, &body.password).await)
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    dto::respond(services.me(&principal).await)
}
