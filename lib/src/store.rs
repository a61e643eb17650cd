//! Image persistence: the generic gallery collection and the per-memory
//! image slots.
//!
//! Store operations never return an error. Each one resolves to an
//! [`Outcome`] that tells callers whether they got a value, whether there
//! was simply nothing there, or whether storage could not be reached. The
//! cause of any failure is logged here, so callers only decide what to show.

use std::sync::Arc;

use chrono::Utc;

use crate::db::{Collectable, ConnectionManager, Database};
use crate::image::{ImageDocument, ImageId, SlotDocument, StoredImage};
use crate::{Error, ErrorKind, Result};

/// Result of a store operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    Value(T),
    NotFound,
    Unavailable(Reason),
}

/// Why storage could not serve a request.
///
/// The detail strings carry storage internals such as paths. They show up
/// in logs and in `Display`, but only the kind is serialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reason {
    NotConfigured,
    Connection(String),
    Storage(String),
    BadInput(String),
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::NotConfigured => write!(f, "storage is not configured"),
            Reason::Connection(e) => write!(f, "storage connection failed: {e}"),
            Reason::Storage(e) => write!(f, "storage error: {e}"),
            Reason::BadInput(e) => write!(f, "bad input: {e}"),
        }
    }
}

impl Reason {
    pub fn kind(&self) -> &'static str {
        match self {
            Reason::NotConfigured => "not_configured",
            Reason::Connection(_) => "connection",
            Reason::Storage(_) => "storage",
            Reason::BadInput(_) => "bad_input",
        }
    }

    /// Message safe to show outside the process. Only rejected input is
    /// echoed back.
    pub fn message(&self) -> String {
        match self {
            Reason::NotConfigured => "storage is not configured".to_string(),
            Reason::Connection(_) => "storage is unreachable".to_string(),
            Reason::Storage(_) => "storage failed to complete the request".to_string(),
            Reason::BadInput(msg) => format!("bad input: {msg}"),
        }
    }
}

impl serde::Serialize for Reason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Reason", 1)?;
        state.serialize_field("kind", self.kind())?;
        state.end()
    }
}

impl From<&Error> for Reason {
    fn from(e: &Error) -> Self {
        match &e.kind {
            ErrorKind::NotConfigured => Reason::NotConfigured,
            ErrorKind::Connection(_)
            | ErrorKind::Config(_)
            | ErrorKind::UrlParseError(_)
            | ErrorKind::TaskJoin(_) => Reason::Connection(e.kind.to_string()),
            ErrorKind::BadInput(msg) => Reason::BadInput(msg.clone()),
            kind => Reason::Storage(kind.to_string()),
        }
    }
}

impl<T> Outcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Collapses `NotFound` and `Unavailable` into `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Outcome::Unavailable(_))
    }

    pub fn reason(&self) -> Option<&Reason> {
        match self {
            Outcome::Unavailable(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Value(v) => Outcome::Value(f(v)),
            Outcome::NotFound => Outcome::NotFound,
            Outcome::Unavailable(reason) => Outcome::Unavailable(reason),
        }
    }
}

impl<T: Default> Outcome<T> {
    /// The value, or `T::default()` when there is none.
    pub fn unwrap_or_default(self) -> T {
        self.into_option().unwrap_or_default()
    }
}

impl<T> From<Result<Option<T>>> for Outcome<T> {
    fn from(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(v)) => Outcome::Value(v),
            Ok(None) => Outcome::NotFound,
            Err(e) => Outcome::Unavailable(Reason::from(&e)),
        }
    }
}

/// Image store sharing one [`ConnectionManager`].
#[derive(Clone, Debug)]
pub struct ImageStore {
    connections: Arc<ConnectionManager>,
}

impl ImageStore {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Saves a newly generated gallery image.
    #[tracing::instrument(skip_all, fields(prompt = %prompt))]
    pub async fn save_image(&self, image_data_uri: &str, prompt: &str) -> Outcome<StoredImage> {
        let result = self.try_save_image(image_data_uri, prompt).await;
        if let Ok(image) = &result {
            tracing::info!(id = %image.id, "image saved");
        }
        log_failure("save image", result.map(Some))
    }

    /// All gallery images, newest first.
    pub async fn images(&self) -> Outcome<Vec<StoredImage>> {
        log_failure("list images", self.try_images().await.map(Some))
    }

    /// A single gallery image by id.
    pub async fn image(&self, id: ImageId) -> Outcome<StoredImage> {
        log_failure("get image", self.try_image(id).await)
    }

    /// Saves the image for a memory slot, replacing the slot's current image
    /// if there is one. The slot keeps its id across replacements.
    ///
    /// `memory_id` is taken as is, so ids differing only in surrounding
    /// whitespace are different slots. A blank id is rejected.
    #[tracing::instrument(skip_all, fields(memory_id = %memory_id))]
    pub async fn save_memory_image(
        &self,
        memory_id: &str,
        image_data_uri: &str,
        prompt: &str,
    ) -> Outcome<StoredImage> {
        let result = self
            .try_save_memory_image(memory_id, image_data_uri, prompt)
            .await;
        if let Ok(image) = &result {
            tracing::info!(id = %image.id, "memory image saved");
        }
        log_failure("save memory image", result.map(Some))
    }

    /// Current image of a memory slot.
    pub async fn memory_image(&self, memory_id: &str) -> Outcome<StoredImage> {
        log_failure("get memory image", self.try_memory_image(memory_id).await)
    }

    /// Images of all memory slots, newest first.
    pub async fn memory_images(&self) -> Outcome<Vec<StoredImage>> {
        log_failure("list memory images", self.try_memory_images().await.map(Some))
    }

    async fn db(&self) -> Result<Database> {
        self.connections.acquire().await
    }

    async fn try_save_image(&self, image_data_uri: &str, prompt: &str) -> Result<StoredImage> {
        let db = self.db().await?;
        let id = ImageId::new_v4();
        let document = ImageDocument::new(image_data_uri, prompt, None);
        db.insert_new(ImageDocument::get_collection_name(), id, &document)?;
        Ok(StoredImage::from_document(id, document))
    }

    async fn try_images(&self) -> Result<Vec<StoredImage>> {
        let db = self.db().await?;
        let mut images = db
            .get_collection_at::<ImageDocument>(ImageDocument::get_collection_name())?
            .into_iter()
            .map(|(key, document)| Ok(StoredImage::from_document(ImageId::from_slice(&key)?, document)))
            .collect::<Result<Vec<_>>>()?;
        // Stable sort: equal timestamps keep the storage order.
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(images)
    }

    async fn try_image(&self, id: ImageId) -> Result<Option<StoredImage>> {
        let db = self.db().await?;
        Ok(db
            .get_at::<ImageDocument>(ImageDocument::get_collection_name(), id)?
            .map(|document| StoredImage::from_document(id, document)))
    }

    async fn try_save_memory_image(
        &self,
        memory_id: &str,
        image_data_uri: &str,
        prompt: &str,
    ) -> Result<StoredImage> {
        let memory_id = slot_key(memory_id)?;
        let db = self.db().await?;
        let slot = db.upsert_at(
            SlotDocument::get_collection_name(),
            memory_id,
            |existing: Option<SlotDocument>| SlotDocument {
                id: existing.map(|slot| slot.id).unwrap_or_else(ImageId::new_v4),
                image: ImageDocument {
                    image_data_uri: image_data_uri.to_string(),
                    prompt: prompt.to_string(),
                    created_at: Utc::now(),
                    memory_id: Some(memory_id.to_string()),
                },
            },
        )?;
        Ok(slot.into())
    }

    async fn try_memory_image(&self, memory_id: &str) -> Result<Option<StoredImage>> {
        let memory_id = slot_key(memory_id)?;
        let db = self.db().await?;
        Ok(db
            .get_at::<SlotDocument>(SlotDocument::get_collection_name(), memory_id)?
            .map(StoredImage::from))
    }

    async fn try_memory_images(&self) -> Result<Vec<StoredImage>> {
        let db = self.db().await?;
        let mut images = db
            .get_collection_at::<SlotDocument>(SlotDocument::get_collection_name())?
            .into_iter()
            .map(|(_, slot)| StoredImage::from(slot))
            .collect::<Vec<_>>();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(images)
    }
}

/// Memory ids are used verbatim as slot keys. Only blank ids are rejected.
fn slot_key(memory_id: &str) -> Result<&str> {
    if memory_id.trim().is_empty() {
        return Err(ErrorKind::BadInput("memory id must not be empty".to_string()).into());
    }
    Ok(memory_id)
}

fn log_failure<T>(operation: &str, result: Result<Option<T>>) -> Outcome<T> {
    if let Err(e) = &result {
        match e.kind {
            // Already reported once by the connection manager.
            ErrorKind::NotConfigured => tracing::debug!("{operation}: {e}"),
            _ => tracing::error!("{operation} failed: {e}"),
        }
    }
    Outcome::from(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    fn store(uri: Option<&str>) -> ImageStore {
        ImageStore::new(Arc::new(ConnectionManager::new(&config::Database {
            uri: uri.map(str::to_string),
        })))
    }

    #[tokio::test]
    async fn save_then_list() {
        let store = store(Some("mem:"));
        let before = Utc::now();
        let saved = store
            .save_image("data:image/png;base64,AAAA", "sunset castle")
            .await
            .into_option()
            .unwrap();
        let after = Utc::now();

        assert_eq!(saved.image_data_uri, "data:image/png;base64,AAAA");
        assert_eq!(saved.prompt, "sunset castle");
        assert!(saved.memory_id.is_none());
        assert!(saved.created_at >= before && saved.created_at <= after);

        let images = store.images().await.unwrap_or_default();
        assert_eq!(images.first(), Some(&saved));
    }

    #[tokio::test]
    async fn image_by_id() {
        let store = store(Some("mem:"));
        let saved = store.save_image("data:,a", "a").await.into_option().unwrap();
        assert_eq!(store.image(saved.id).await, Outcome::Value(saved));
        assert_eq!(store.image(ImageId::new_v4()).await, Outcome::NotFound);
    }

    #[tokio::test]
    async fn upsert_keeps_one_record_per_slot() {
        let store = store(Some("mem:"));
        let first = store
            .save_memory_image("first-date", "data:,one", "candles")
            .await
            .into_option()
            .unwrap();
        let second = store
            .save_memory_image("first-date", "data:,two", "candles again")
            .await
            .into_option()
            .unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.created_at >= first.created_at);

        let current = store.memory_image("first-date").await.into_option().unwrap();
        assert_eq!(current.image_data_uri, "data:,two");
        assert_eq!(current.prompt, "candles again");
        assert_eq!(current.memory_id.as_deref(), Some("first-date"));
        assert_eq!(store.memory_images().await.unwrap_or_default().len(), 1);
    }

    #[tokio::test]
    async fn unknown_slot_is_not_found() {
        let store = store(Some("mem:"));
        assert_eq!(store.memory_image("never").await, Outcome::NotFound);
    }

    #[tokio::test]
    async fn blank_memory_id_is_rejected() {
        let store = store(Some("mem:"));
        let outcome = store.save_memory_image("  ", "data:,x", "x").await;
        assert!(matches!(outcome.reason(), Some(Reason::BadInput(_))));
        assert_eq!(store.connections().connects(), 0);
    }

    #[tokio::test]
    async fn memory_ids_are_not_trimmed() {
        let store = store(Some("mem:"));
        let padded = store
            .save_memory_image(" m1 ", "data:,padded", "padded")
            .await
            .into_option()
            .unwrap();
        let plain = store
            .save_memory_image("m1", "data:,plain", "plain")
            .await
            .into_option()
            .unwrap();

        assert_ne!(padded.id, plain.id);
        assert_eq!(padded.memory_id.as_deref(), Some(" m1 "));
        assert_eq!(
            store.memory_image(" m1 ").await.into_option().map(|i| i.prompt),
            Some("padded".to_string())
        );
        assert_eq!(store.memory_images().await.unwrap_or_default().len(), 2);
    }

    #[tokio::test]
    async fn unconfigured_store_degrades() {
        let store = store(None);
        let unavailable = Some(&Reason::NotConfigured);

        assert_eq!(store.save_image("data:,x", "x").await.reason(), unavailable);
        assert_eq!(store.images().await.reason(), unavailable);
        assert_eq!(
            store.save_memory_image("m", "data:,x", "x").await.reason(),
            unavailable
        );
        assert_eq!(store.memory_image("m").await.reason(), unavailable);
        assert!(store.images().await.unwrap_or_default().is_empty());
        assert!(store.memory_image("m").await.into_option().is_none());
    }

    #[test]
    fn reason_from_error_kind() {
        let reason = Reason::from(&Error::new(ErrorKind::Connection("refused".into())));
        assert!(matches!(reason, Reason::Connection(_)));
        let reason = Reason::from(&Error::new(ErrorKind::DbError("boom".into())));
        assert_eq!(reason, Reason::Storage("db error: boom".to_string()));
        assert_eq!(Reason::NotConfigured.to_string(), "storage is not configured");
    }

    #[test]
    fn reason_serializes_kind_only() {
        let reason = Reason::Connection("could not acquire lock on \"/var/lib/embrace/db\"".into());
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "connection" }));
        assert!(!reason.message().contains("/var/lib"));
        assert!(reason.to_string().contains("/var/lib"));

        let json = serde_json::to_value(Reason::BadInput("memory id must not be empty".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "bad_input" }));
    }
}
