use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

use tokio::sync::Mutex;
use url::Url;

use crate::{config, ErrorKind, Result};

use super::Database;

/// Where the document store lives, as parsed from the connection string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// Process-local database removed when the last handle is dropped.
    Temporary,
    Path(PathBuf),
}

impl Location {
    /// Parses a connection string.
    ///
    /// Accepted forms are `mem:`, `sled:<path>`, `sled://<path>`,
    /// `file:///<path>` and a bare filesystem path.
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        let url = match Url::parse(uri) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Ok(Location::Path(PathBuf::from(uri)))
            }
            Err(e) => return Err(e.into()),
        };

        match url.scheme() {
            "mem" | "memory" => Ok(Location::Temporary),
            "sled" => {
                let path = format!("{}{}", url.host_str().unwrap_or(""), url.path());
                if path.is_empty() {
                    return Err(ErrorKind::Config(format!("missing path in `{uri}`")).into());
                }
                Ok(Location::Path(PathBuf::from(path)))
            }
            "file" => url
                .to_file_path()
                .map(Location::Path)
                .map_err(|_| ErrorKind::Config(format!("invalid file path in `{uri}`")).into()),
            scheme => Err(ErrorKind::Config(format!("unsupported database scheme `{scheme}`")).into()),
        }
    }
}

/// Owns the single database handle shared by all store operations.
///
/// The handle is opened lazily on first [`acquire`](Self::acquire) and reused
/// for as long as it passes the liveness probe. A handle that went away is
/// discarded and reopened once per call; failures leave the slot empty so
/// the next call starts over.
#[derive(Debug)]
pub struct ConnectionManager {
    uri: Option<String>,
    slot: Mutex<Option<Database>>,
    missing_uri: Once,
    connects: AtomicUsize,
}

impl ConnectionManager {
    pub fn new(settings: &config::Database) -> Self {
        Self {
            uri: settings.uri().map(str::to_string),
            slot: Mutex::new(None),
            missing_uri: Once::new(),
            connects: AtomicUsize::new(0),
        }
    }

    /// Manager with no connection string, for which every acquisition fails
    /// with [`ErrorKind::NotConfigured`].
    pub fn disabled() -> Self {
        Self::new(&config::Database::default())
    }

    pub fn is_configured(&self) -> bool {
        self.uri.is_some()
    }

    /// Number of connections opened over the lifetime of the manager.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::Relaxed)
    }

    /// Returns a usable database handle, connecting or reconnecting if
    /// needed.
    pub async fn acquire(&self) -> Result<Database> {
        let Some(uri) = self.uri.as_deref() else {
            self.missing_uri.call_once(|| {
                tracing::warn!(
                    "database connection string is not set, images will not be stored \
                    (set `database.uri` in the config or the DATABASE__URI env var)"
                );
            });
            return Err(ErrorKind::NotConfigured.into());
        };

        // Holding the lock across the connect keeps concurrent callers from
        // opening a second handle.
        let mut slot = self.slot.lock().await;
        if let Some(db) = slot.as_ref() {
            if db.is_alive() {
                return Ok(db.clone());
            }
            tracing::warn!("database connection lost, reconnecting");
            db.close();
            *slot = None;
        }

        match self.connect(uri).await {
            Ok(db) => {
                *slot = Some(db.clone());
                Ok(db)
            }
            Err(e) => {
                tracing::error!("failed to connect to database: {e}");
                Err(e)
            }
        }
    }

    /// Drops the current handle. The next acquisition reconnects.
    pub async fn disconnect(&self) {
        if let Some(db) = self.slot.lock().await.take() {
            if let Err(e) = db.flush() {
                tracing::warn!("failed flushing database on disconnect: {e}");
            }
            db.close();
            tracing::debug!("database handle released");
        }
    }

    async fn connect(&self, uri: &str) -> Result<Database> {
        let location = Location::parse(uri)?;
        tracing::info!(?location, "opening database");

        let db = tokio::task::spawn_blocking(move || Database::open(&location))
            .await?
            .map_err(|e| ErrorKind::Connection(e.kind.to_string()))?;

        self.connects.fetch_add(1, Ordering::Relaxed);
        tracing::info!("database connection established");
        Ok(db)
    }
}
