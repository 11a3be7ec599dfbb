//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: one method per operation, on top of the store
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/query DTOs and the response envelope
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use carkeeper_auth::{Hs256Jwt, JwtValidator};
use carkeeper_infra::Store;

use crate::config::{AppConfig, CorsOrigins};
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig, store: Arc<dyn Store>) -> Router {
    let jwt = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes(), config.jwt_ttl()));
    let services = Arc::new(services::AppServices::new(store, jwt.clone()));
    build_router(services, jwt, &config.cors_origins)
}

/// Router over already-built services.
pub fn build_router(
    services: Arc<services::AppServices>,
    jwt: Arc<dyn JwtValidator>,
    cors: &CorsOrigins,
) -> Router {
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require a valid bearer token.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::public_router().merge(protected))
        .layer(Extension(services))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let layer = match origins {
        CorsOrigins::Any => {
            tracing::warn!("CORS: allowing all origins");
            CorsLayer::permissive()
        }
        CorsOrigins::List(list) => {
            let allowed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => Some(hv),
                    Err(e) => {
                        tracing::warn!(%origin, error = %e, "CORS: skipping invalid origin");
                        None
                    }
                })
                .collect();
            CorsLayer::new().allow_origin(allowed)
        }
    };

    layer
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use carkeeper_infra::{InMemoryStore, demo};
    use tower::ServiceExt;

    fn app() -> Router {
        let store = InMemoryStore::new();
        demo::seed(&store);
        let config = AppConfig::from_lookup(|_| None).unwrap();
        build_app(&config, Arc::new(store))
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let res = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn catalog_is_public_but_configurator_is_not() {
        let res = app()
            .oneshot(Request::get("/api/catalog/brands").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app()
            .oneshot(Request::get("/api/configurator/colors").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn news_reads_are_public_and_writes_are_not() {
        let res = app()
            .oneshot(Request::get("/api/news").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app()
            .oneshot(
                Request::post("/api/news")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title":"t","content":"c"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
