use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};

use crate::{Error, ErrorKind, Result};

use super::{decode, encode, Location};

#[derive(Clone, Debug)]
pub struct SledDb {
    inner: sled::Db,
    closed: Arc<AtomicBool>,
}

impl SledDb {
    /// Opens the database at the given location. Blocks while sled recovers
    /// its log, so async callers should run it on the blocking pool.
    pub fn open(location: &Location) -> Result<Self> {
        let config = match location {
            Location::Temporary => sled::Config::new().temporary(true),
            Location::Path(path) => sled::Config::new().path(path),
        };
        let inner = config.open()?;
        Ok(Self {
            inner,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Liveness probe used before a cached handle is reused.
    pub fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && self.inner.size_on_disk().is_ok()
    }

    /// Marks this handle, and every clone of it, as no longer usable.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn flush(&self) -> Result<usize> {
        Ok(self.inner.flush()?)
    }

    fn tree(&self, collection: &str) -> Result<sled::Tree> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ErrorKind::Connection("database handle was closed".to_string()).into());
        }
        Ok(self.inner.open_tree(collection)?)
    }

    /// Gets an entry by key from the collection specified by name.
    pub fn get_at<T: DeserializeOwned>(
        &self,
        collection: &str,
        key: impl AsRef<[u8]>,
    ) -> Result<Option<T>> {
        let tree = self.tree(collection)?;
        match tree.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Gets all entries of the collection in storage key order, together
    /// with their raw keys.
    ///
    /// Entries that fail to decode are skipped, so a single damaged document
    /// doesn't hide the rest of the collection.
    pub fn get_collection_at<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<(Vec<u8>, T)>> {
        let tree = self.tree(collection)?;
        let mut out = Vec::new();
        for entry in tree.iter() {
            let (key, bytes) = entry?;
            match decode::<T>(&bytes) {
                Ok(value) => out.push((key.to_vec(), value)),
                Err(e) => tracing::warn!(collection, "skipping undecodable entry: {e}"),
            }
        }
        Ok(out)
    }

    /// Inserts a new entry. Fails instead of overwriting if the key is
    /// already taken.
    pub fn insert_new<T: Serialize>(
        &self,
        collection: &str,
        key: impl AsRef<[u8]>,
        value: &T,
    ) -> Result<()> {
        let tree = self.tree(collection)?;
        let encoded = encode(value)?;
        match tree.compare_and_swap(key, None as Option<&[u8]>, Some(encoded))? {
            Ok(()) => Ok(()),
            Err(_) => Err(ErrorKind::DbError(format!(
                "key already taken in collection {}",
                collection
            ))
            .into()),
        }
    }

    /// Atomically replaces the entry under `key` with the value produced from
    /// the current one (`None` if absent) and returns what was written.
    ///
    /// Runs as a sled transaction, so concurrent upserts of the same key are
    /// serialized and `f` may be called more than once.
    pub fn upsert_at<T, F>(&self, collection: &str, key: impl AsRef<[u8]>, f: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(Option<T>) -> T,
    {
        let tree = self.tree(collection)?;
        let key = key.as_ref();

        let result = tree.transaction(|tx| {
            let existing = match tx.get(key)? {
                Some(bytes) => match decode::<T>(&bytes) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!(collection, "replacing undecodable entry: {e}");
                        None
                    }
                },
                None => None,
            };
            let value = f(existing);
            let encoded = encode(&value).map_err(ConflictableTransactionError::Abort)?;
            tx.insert(key, encoded)?;
            Ok(value)
        });

        match result {
            Ok(value) => Ok(value),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(Error::from(e)),
        }
    }

    /// Returns the number of entries in the collection.
    pub fn len_at(&self, collection: &str) -> Result<usize> {
        Ok(self.tree(collection)?.len())
    }

    pub fn clear_at(&self, collection: &str) -> Result<()> {
        let tree = self.tree(collection)?;
        tree.clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp() -> SledDb {
        SledDb::open(&Location::Temporary).unwrap()
    }

    #[test]
    fn insert_new_refuses_to_overwrite() {
        let db = temp();
        db.insert_new("things", b"a", &"first".to_string()).unwrap();
        assert!(db.insert_new("things", b"a", &"second".to_string()).is_err());
        assert_eq!(
            db.get_at::<String>("things", b"a").unwrap().as_deref(),
            Some("first")
        );
    }

    #[test]
    fn upsert_sees_previous_value() {
        let db = temp();
        let first = db.upsert_at("counters", b"k", |old: Option<u32>| old.unwrap_or(0) + 1).unwrap();
        let second = db.upsert_at("counters", b"k", |old: Option<u32>| old.unwrap_or(0) + 1).unwrap();
        assert_eq!((first, second), (1, 2));
        assert_eq!(db.len_at("counters").unwrap(), 1);
    }

    #[test]
    fn closed_handle_is_not_alive() {
        let db = temp();
        let clone = db.clone();
        assert!(clone.is_alive());
        db.close();
        assert!(!clone.is_alive());
        assert!(clone.get_at::<String>("things", b"a").is_err());
    }
}
