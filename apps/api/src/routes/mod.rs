pub mod health;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::assets::handlers as assets;
use crate::completion::handlers as completion;
use crate::forms::handlers as forms;
use crate::forms::SESSION_HEADER;
use crate::state::AppState;

/// Single origin when configured, any origin otherwise. Methods and headers are fixed;
/// the session header is allowed so browser clients can keep their forms apart.
pub fn cors_layer(allowed_origin: Option<HeaderValue>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(SESSION_HEADER),
        ]);

    match allowed_origin {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_origin(Any),
    }
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/chat", post(completion::handle_chat))
        .route("/generate-persona", post(forms::handle_generate_persona))
        .route("/generate-pdf", get(forms::handle_generate_pdf))
        .route("/content-generation", post(forms::handle_content_generation))
        .route(
            "/generate-social-posts",
            get(assets::handle_social_posts),
        )
        .layer(cors)
        .with_state(state)
}
