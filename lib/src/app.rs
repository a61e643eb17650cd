use std::sync::Arc;

use crate::ai::{self, Generator};
use crate::db::ConnectionManager;
use crate::{Config, Gallery, ImageStore, Result, Studio};

/// Application state assembled from the config. Owns the connection manager
/// and hands clones of the store and flows to whoever serves requests.
#[derive(Clone)]
pub struct App {
    pub config: Arc<Config>,
    pub connections: Arc<ConnectionManager>,
    pub store: ImageStore,
    pub gallery: Gallery,
    pub studio: Studio,
}

impl App {
    /// Builds the state with the generator selected by the config.
    pub fn new(config: Config) -> Result<Self> {
        let generator = ai::from_config(&config)?;
        Ok(Self::with_generator(config, generator))
    }

    pub fn with_generator(config: Config, generator: Arc<dyn Generator>) -> Self {
        let connections = Arc::new(ConnectionManager::new(&config.database));
        let store = ImageStore::new(connections.clone());
        let gallery = Gallery::new(store.clone(), &config.gallery);
        let studio = Studio::new(generator, store.clone());
        Self {
            config: Arc::new(config),
            connections,
            store,
            gallery,
            studio,
        }
    }

    /// Releases the database handle.
    pub async fn shutdown(&self) {
        self.connections.disconnect().await;
    }
}
