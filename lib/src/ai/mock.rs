use std::sync::Mutex;

use async_trait::async_trait;

use crate::{ErrorKind, Result};

use super::Generator;

/// Transparent 1x1 png.
pub const PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Generator returning canned responses, for dev mode and tests.
#[derive(Debug)]
pub struct MockGenerator {
    reply: String,
    failing: bool,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::with_reply("Every day with you is my favourite day.")
    }

    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            failing: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Generator that fails every request.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn record(&self, prompt: &str) -> Result<()> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if self.failing {
            return Err(ErrorKind::Generation("mock generator set to fail".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn text(&self, prompt: &str) -> Result<String> {
        self.record(prompt)?;
        Ok(self.reply.clone())
    }

    async fn image(&self, prompt: &str) -> Result<String> {
        self.record(prompt)?;
        Ok(PIXEL_PNG.to_string())
    }
}
