use axum::{
    http::{header, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod chat;
pub mod error;
pub mod extract;
pub mod ferries;
pub mod middleware;
pub mod state;
pub mod webhooks;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // everything but health and the payment webhook needs a bearer token
    let authenticated = Router::new()
        .merge(bookings::routes())
        .merge(ferries::routes())
        .merge(chat::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_actor,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(webhooks::routes())
        .merge(authenticated)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
