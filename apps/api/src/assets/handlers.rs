use axum::{extract::State, Json};
use serde_json::Value;

use crate::assets::AssetKind;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /generate-social-posts
pub async fn handle_social_posts(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let posts = state.assets.load(AssetKind::SocialPosts).await?;
    Ok(Json(posts))
}
