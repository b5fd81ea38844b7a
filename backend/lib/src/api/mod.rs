//! HTTP API of the ComputerChan backend

pub mod handlers;
pub mod routes;
pub mod validation;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method,
    },
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::Services;

/// Creates the axum application with all routes and middleware
pub fn create_app(services: Services) -> Router {
    let router = routes::routes(services);

    // the login UI is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .allow_credentials(false);

    router.layer(cors).layer(TraceLayer::new_for_http())
}

#[cfg(any(test, feature = "mocks"))]
/// Create an application over mock services
pub fn mock_app() -> Router {
    create_app(Services::mocks())
}
