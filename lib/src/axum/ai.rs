use axum::routing::post;
use axum::{Extension, Json};

use crate::studio::{CompanionRequest, PoemRequest};
use crate::Result;

use super::{Router, StudioExt};

pub fn router() -> Router {
    Router::new()
        .route("/api/poem", post(poem))
        .route("/api/companion", post(companion))
}

#[derive(Serialize)]
pub struct PoemResponse {
    pub poem: String,
}

#[derive(Serialize)]
pub struct CompanionResponse {
    pub message: String,
}

pub async fn poem(
    Extension(studio): StudioExt,
    Json(request): Json<PoemRequest>,
) -> Result<Json<PoemResponse>> {
    let poem = studio.poem(&request).await?;
    Ok(Json(PoemResponse { poem }))
}

pub async fn companion(
    Extension(studio): StudioExt,
    Json(request): Json<CompanionRequest>,
) -> Json<CompanionResponse> {
    Json(CompanionResponse {
        message: studio.companion(&request).await,
    })
}
