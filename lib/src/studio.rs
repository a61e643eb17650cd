//! Flows that combine the generative service with the image store.
//!
//! Generation failures are returned to the caller and nothing is stored.
//! Storage failures after a successful generation are reported alongside the
//! generated image so the caller can still show it.

use std::sync::Arc;

use crate::ai::{prompts, Generator};
use crate::image::StoredImage;
use crate::store::{ImageStore, Outcome};
use crate::{ErrorKind, Result};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoemRequest {
    pub months_together: u32,
    pub user_name: String,
    pub partner_name: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionRequest {
    pub milestone: Option<String>,
    pub user_interaction: Option<String>,
}

/// A freshly generated image and what happened when it was stored.
#[derive(Clone, Debug)]
pub struct Generated {
    pub image_data_uri: String,
    pub saved: Outcome<StoredImage>,
}

#[derive(Clone)]
pub struct Studio {
    generator: Arc<dyn Generator>,
    store: ImageStore,
}

impl Studio {
    pub fn new(generator: Arc<dyn Generator>, store: ImageStore) -> Self {
        Self { generator, store }
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    /// Paints an image from free text and adds it to the gallery.
    pub async fn generate_and_save(&self, prompt: &str) -> Result<Generated> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ErrorKind::BadInput("please enter a prompt to generate an image".to_string()).into());
        }

        let image_data_uri = self.generator.image(&prompts::studio_image(prompt)).await?;
        let saved = self.store.save_image(&image_data_uri, prompt).await;
        if saved.is_unavailable() {
            tracing::warn!("image generated but not saved to the gallery");
        }
        Ok(Generated {
            image_data_uri,
            saved,
        })
    }

    /// Paints a new image for a memory card and puts it in the memory's slot,
    /// replacing the previous one.
    pub async fn reimagine_memory(&self, memory_id: &str, hint: &str) -> Result<Generated> {
        if memory_id.trim().is_empty() {
            return Err(ErrorKind::BadInput("memory id must not be empty".to_string()).into());
        }
        let image_data_uri = self.generator.image(&prompts::memory_image(hint)).await?;
        let saved = self
            .store
            .save_memory_image(memory_id, &image_data_uri, hint)
            .await;
        Ok(Generated {
            image_data_uri,
            saved,
        })
    }

    pub async fn poem(&self, request: &PoemRequest) -> Result<String> {
        self.generator
            .text(&prompts::poem(
                request.months_together,
                &request.user_name,
                &request.partner_name,
            ))
            .await
    }

    /// Short affectionate message for a milestone or an interaction. Never
    /// fails: a fallback message stands in when generation does.
    pub async fn companion(&self, request: &CompanionRequest) -> String {
        let prompt = prompts::companion(
            request.milestone.as_deref(),
            request.user_interaction.as_deref(),
        );
        match self.generator.text(&prompt).await {
            Ok(message) if !message.trim().is_empty() => message,
            Ok(_) => {
                tracing::error!("companion prompt returned empty output");
                prompts::COMPANION_EMPTY_FALLBACK.to_string()
            }
            Err(e) => {
                tracing::error!("companion message failed: {e}");
                prompts::COMPANION_ERROR_FALLBACK.to_string()
            }
        }
    }
}
