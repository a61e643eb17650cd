//! Generative service used to write texts and paint images from prompts.
//!
//! The service is an opaque collaborator. Callers provide their own
//! fallback when it fails and never store anything in that case.

mod gemini;
mod mock;
pub mod prompts;

pub use gemini::GeminiGenerator;
pub use mock::{MockGenerator, PIXEL_PNG};

use std::sync::Arc;

use async_trait::async_trait;

use crate::{Config, Result};

#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates text for the prompt.
    async fn text(&self, prompt: &str) -> Result<String>;

    /// Generates an image for the prompt, returned as a data uri.
    async fn image(&self, prompt: &str) -> Result<String>;
}

/// Builds the generator selected by the config: canned responses in dev mock
/// mode, the remote service otherwise.
pub fn from_config(config: &Config) -> Result<Arc<dyn Generator>> {
    if config.dev.enabled && config.dev.mock {
        tracing::info!("using mock generator");
        return Ok(Arc::new(MockGenerator::new()));
    }
    if config.generation.api_key.is_empty() {
        tracing::warn!("generation api key is not set, generation requests will fail");
    }
    Ok(Arc::new(GeminiGenerator::new(&config.generation)?))
}
