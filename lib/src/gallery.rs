use crate::image::StoredImage;
use crate::store::{ImageStore, Outcome, Reason};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    Ok,
    Unavailable,
}

/// Gallery contents as handed to the page: always a list, plus whether it
/// could actually be read.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub status: Status,
    pub images: Vec<StoredImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
}

impl From<Outcome<Vec<StoredImage>>> for Snapshot {
    fn from(outcome: Outcome<Vec<StoredImage>>) -> Self {
        match outcome {
            Outcome::Value(images) => Snapshot {
                status: Status::Ok,
                images,
                reason: None,
            },
            Outcome::NotFound => Snapshot {
                status: Status::Ok,
                images: Vec::new(),
                reason: None,
            },
            Outcome::Unavailable(reason) => Snapshot {
                status: Status::Unavailable,
                images: Vec::new(),
                reason: Some(reason),
            },
        }
    }
}

/// Read side of the generic image collection, as shown on the site.
#[derive(Clone, Debug)]
pub struct Gallery {
    store: ImageStore,
    preview_count: usize,
}

impl Gallery {
    pub fn new(store: ImageStore, config: &crate::config::Gallery) -> Self {
        Self {
            store,
            preview_count: config.preview_count,
        }
    }

    /// All images newest first, or why they couldn't be read.
    pub async fn refresh(&self) -> Outcome<Vec<StoredImage>> {
        self.store.images().await
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.refresh().await.into()
    }

    /// All images newest first. Empty when storage is unavailable.
    pub async fn images(&self) -> Vec<StoredImage> {
        self.refresh().await.unwrap_or_default()
    }

    /// The few newest images shown before the full gallery is opened.
    pub async fn preview(&self) -> Vec<StoredImage> {
        self.preview_snapshot().await.images
    }

    /// Same as [`snapshot`](Self::snapshot), cut down to the preview.
    pub async fn preview_snapshot(&self) -> Snapshot {
        let mut snapshot = self.snapshot().await;
        snapshot.images.truncate(self.preview_count);
        snapshot
    }

    pub async fn latest(&self) -> Option<StoredImage> {
        self.images().await.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config;
    use crate::db::ConnectionManager;

    fn gallery(uri: Option<&str>, preview_count: usize) -> Gallery {
        let manager = ConnectionManager::new(&config::Database {
            uri: uri.map(str::to_string),
        });
        Gallery::new(
            ImageStore::new(Arc::new(manager)),
            &config::Gallery { preview_count },
        )
    }

    #[tokio::test]
    async fn newest_first_and_preview() {
        let gallery = gallery(Some("mem:"), 2);
        for prompt in ["one", "two", "three"] {
            gallery
                .store
                .save_image(&format!("data:,{prompt}"), prompt)
                .await
                .into_option()
                .unwrap();
        }

        let images = gallery.images().await;
        assert_eq!(images.len(), 3);
        assert!(images
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));

        let preview = gallery.preview().await;
        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0], images[0]);
        assert_eq!(gallery.latest().await, Some(images[0].clone()));

        let snapshot = gallery.preview_snapshot().await;
        assert_eq!(snapshot.status, Status::Ok);
        assert_eq!(snapshot.images, preview);
    }

    #[tokio::test]
    async fn unavailable_storage_shows_empty_gallery() {
        let gallery = gallery(None, 2);
        assert!(gallery.refresh().await.is_unavailable());
        assert!(gallery.images().await.is_empty());
        assert!(gallery.preview().await.is_empty());
        assert!(gallery.latest().await.is_none());
        assert_eq!(gallery.preview_snapshot().await.status, Status::Unavailable);

        let snapshot = gallery.snapshot().await;
        assert_eq!(snapshot.status, Status::Unavailable);
        assert_eq!(snapshot.reason, Some(Reason::NotConfigured));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"]["kind"], "not_configured");
        assert_eq!(json["images"], serde_json::json!([]));
    }
}
