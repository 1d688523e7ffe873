pub mod auth;
pub mod forms;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod upload;

pub use middleware::require_auth;
pub use rest::ApiDoc;

use crate::adapters::blob::UPLOADS_ROUTE;
use auth::{login_handler, logout_handler, signup_handler};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use rest::{
    create_tasting_handler, delete_tasting_handler, get_tasting_handler, list_tastings_handler,
    tasting_ranking_handler, update_tasting_handler,
};
use state::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::warn;
use upload::upload_handler;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application router: the `/api` endpoints, the uploaded
/// files under `/uploads`, and the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let config = app_state.config.clone();

    let mut cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => warn!("Ignoring invalid CORS_ORIGIN '{}': {}", config.cors_origin, e),
    }

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/upload", post(upload_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/tastings",
            get(list_tastings_handler).post(create_tasting_handler),
        )
        .route("/tastings/ranking", get(tasting_ranking_handler))
        .route(
            "/tastings/{id}",
            get(get_tasting_handler)
                .patch(update_tasting_handler)
                .delete(delete_tasting_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .with_state(app_state);

    Router::new()
        .nest("/api", api_router)
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&config.upload_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
