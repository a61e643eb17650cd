use axum::extract::Path;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json};

use crate::Result;

use super::image::{GeneratedResponse, ImageForm};
use super::{Router, StoreExt, StudioExt};

pub fn router() -> Router {
    Router::new()
        .route("/api/memories", get(memory_images))
        .route(
            "/api/memories/:memory_id/image",
            get(memory_image).put(save_memory_image),
        )
        .route(
            "/api/memories/:memory_id/image/generate",
            post(reimagine_memory),
        )
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReimagineForm {
    #[serde(default)]
    pub hint: String,
}

pub async fn memory_images(Extension(store): StoreExt) -> Response {
    store.memory_images().await.into_response()
}

pub async fn memory_image(
    Path(memory_id): Path<String>,
    Extension(store): StoreExt,
) -> Response {
    store.memory_image(&memory_id).await.into_response()
}

pub async fn save_memory_image(
    Path(memory_id): Path<String>,
    Extension(store): StoreExt,
    Json(form): Json<ImageForm>,
) -> Result<Response> {
    form.validate()?;
    Ok(store
        .save_memory_image(&memory_id, &form.image_data_uri, &form.prompt)
        .await
        .into_response())
}

pub async fn reimagine_memory(
    Path(memory_id): Path<String>,
    Extension(studio): StudioExt,
    Json(form): Json<ReimagineForm>,
) -> Result<Json<GeneratedResponse>> {
    let generated = studio.reimagine_memory(&memory_id, &form.hint).await?;
    Ok(Json(generated.into()))
}
