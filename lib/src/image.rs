//! Generated images as handed out to the presentation layer, and the
//! documents they are persisted as.

use base64::Engine;
use chrono::{DateTime, Utc};

use crate::db::Collectable;
use crate::{ErrorKind, Result};

pub type ImageId = uuid::Uuid;

/// An image as seen by the rest of the application.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub id: ImageId,
    pub image_data_uri: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredImage {
    pub fn from_document(id: ImageId, document: ImageDocument) -> Self {
        Self {
            id,
            image_data_uri: document.image_data_uri,
            prompt: document.prompt,
            memory_id: document.memory_id,
            created_at: document.created_at,
        }
    }

    /// File name offered when the image is downloaded.
    pub fn download_name(&self) -> String {
        download_file_name(&self.prompt)
    }
}

/// Persisted shape of an image. The identifier lives outside the document,
/// in the storage key or in the slot wrapper.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ImageDocument {
    pub image_data_uri: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub memory_id: Option<String>,
}

impl ImageDocument {
    /// New document stamped with the current time.
    pub fn new(image_data_uri: &str, prompt: &str, memory_id: Option<&str>) -> Self {
        Self {
            image_data_uri: image_data_uri.to_string(),
            prompt: prompt.to_string(),
            created_at: Utc::now(),
            memory_id: memory_id.map(str::to_string),
        }
    }
}

impl Collectable for ImageDocument {
    fn get_collection_name() -> &'static str {
        "generated_images"
    }
}

/// Entry of the memory slot collection, keyed by the memory id.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SlotDocument {
    pub id: ImageId,
    pub image: ImageDocument,
}

impl Collectable for SlotDocument {
    fn get_collection_name() -> &'static str {
        "memory_images"
    }
}

impl From<SlotDocument> for StoredImage {
    fn from(slot: SlotDocument) -> Self {
        StoredImage::from_document(slot.id, slot.image)
    }
}

/// Decoded `data:` URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    /// Parses `data:[<mime>][;base64],<payload>`.
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| ErrorKind::BadInput("not a data uri".to_string()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| ErrorKind::BadInput("data uri without payload".to_string()))?;

        let (mime, is_base64) = match meta.strip_suffix(";base64") {
            Some(mime) => (mime, true),
            None => (meta, false),
        };
        let mime = match mime.split(';').next() {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => "text/plain".to_string(),
        };

        let bytes = if is_base64 {
            base64::engine::general_purpose::STANDARD.decode(payload.trim())?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Self { mime, bytes })
    }

    /// Builds a base64 data uri.
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!(
            "data:{};base64,{}",
            mime,
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }
}

/// `ai-generated-<prompt start>.png`, whitespace turned into underscores.
pub fn download_file_name(prompt: &str) -> String {
    let stem = prompt
        .chars()
        .take(20)
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect::<String>();
    if stem.is_empty() {
        "ai-generated-image.png".to_string()
    } else {
        format!("ai-generated-{stem}.png")
    }
}
