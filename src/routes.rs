use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::config::Config;
use crate::handlers;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    let protected_routes = Router::new()
        // Account
        .route(
            "/api/me",
            get(handlers::auth::me)
                .put(handlers::auth::update_profile)
                .delete(handlers::auth::delete_account),
        )
        .route("/api/me/password", put(handlers::auth::change_password))
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Attribute catalog
        .route("/api/categories", get(handlers::catalog::list_categories))
        .route("/api/attributes", get(handlers::catalog::list_attributes))
        .route("/api/catalog", get(handlers::catalog::get_catalog))
        // Daily responses
        .route("/api/responses", get(handlers::responses::get_response))
        .route(
            "/api/responses/history",
            get(handlers::responses::list_responses),
        )
        .route("/api/responses/rating", put(handlers::responses::put_rating))
        .route(
            "/api/responses/attributes",
            put(handlers::responses::put_attributes),
        )
        // Journal
        .route(
            "/api/journal",
            get(handlers::journal::list_entries).post(handlers::journal::create_entry),
        )
        .route("/api/journal/export", get(handlers::journal::export_entries))
        .route("/api/journal/feed/next", post(handlers::journal::feed_next))
        .route("/api/journal/feed/reset", post(handlers::journal::feed_reset))
        .route(
            "/api/journal/:id",
            get(handlers::journal::get_entry)
                .put(handlers::journal::update_entry)
                .delete(handlers::journal::delete_entry),
        )
        // Sleep
        .route(
            "/api/sleep",
            get(handlers::sleep::list_sleep_entries).post(handlers::sleep::create_sleep_entry),
        )
        .route(
            "/api/sleep/:id",
            axum::routing::delete(handlers::sleep::delete_sleep_entry),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors_layer(&state.config))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = std::iter::once(&config.frontend_url)
        .chain(config.cors_extra_origins.iter())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
