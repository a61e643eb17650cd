use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json};

use crate::gallery::Snapshot;
use crate::image::{DataUri, ImageId, StoredImage};
use crate::store::Outcome;
use crate::{ErrorKind, Result};

use super::{GalleryExt, Router, StoreExt, StudioExt};

pub fn router() -> Router {
    Router::new()
        .route("/api/images", get(gallery).post(save_image))
        .route("/api/images/generate", post(generate_image))
        .route("/image/:id", get(image))
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageForm {
    pub image_data_uri: String,
    pub prompt: String,
}

impl ImageForm {
    pub fn validate(&self) -> Result<()> {
        if self.image_data_uri.trim().is_empty() {
            return Err(ErrorKind::BadInput("image data is required".to_string()).into());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GenerateForm {
    pub prompt: String,
}

/// Result of a generate-and-save request. The image is returned even when it
/// couldn't be saved, together with a warning to show.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResponse {
    pub image_data_uri: String,
    pub saved: Option<StoredImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<crate::studio::Generated> for GeneratedResponse {
    fn from(generated: crate::studio::Generated) -> Self {
        let warning = generated
            .saved
            .reason()
            .map(|reason| format!("image generated, but not saved: {}", reason.message()));
        Self {
            image_data_uri: generated.image_data_uri,
            saved: generated.saved.into_option(),
            warning,
        }
    }
}

pub async fn gallery(Extension(gallery): GalleryExt) -> Json<Snapshot> {
    Json(gallery.snapshot().await)
}

pub async fn save_image(
    Extension(store): StoreExt,
    Json(form): Json<ImageForm>,
) -> Result<Response> {
    form.validate()?;
    Ok(match store.save_image(&form.image_data_uri, &form.prompt).await {
        Outcome::Value(image) => (StatusCode::CREATED, Json(image)).into_response(),
        outcome => outcome.into_response(),
    })
}

pub async fn generate_image(
    Extension(studio): StudioExt,
    Json(form): Json<GenerateForm>,
) -> Result<Json<GeneratedResponse>> {
    let generated = studio.generate_and_save(&form.prompt).await?;
    Ok(Json(generated.into()))
}

/// Serves the decoded bytes of a gallery image.
pub async fn image(Path(id): Path<ImageId>, Extension(store): StoreExt) -> Result<Response> {
    let image = match store.image(id).await {
        Outcome::Value(image) => image,
        outcome => return Ok(outcome.into_response()),
    };
    let data = DataUri::parse(&image.image_data_uri)?;
    let content_type = data
        .mime
        .parse::<mime::Mime>()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);
    Ok((
        AppendHeaders([
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", image.download_name()),
            ),
        ]),
        data.bytes,
    )
        .into_response())
}
