//! Document store plumbing.
//!
//! Collections are sled trees addressed by name; values are `pot`-encoded
//! documents. The [`ConnectionManager`] hands out a shared [`Database`]
//! handle and re-establishes it when it goes away.

mod connection;
mod sled;

pub use connection::{ConnectionManager, Location};
pub use sled::SledDb as Database;

use crate::Result;

pub trait Collectable {
    fn get_collection_name() -> &'static str;
}

pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let t: T = pot::from_slice(bytes)?;
    Ok(t)
}

pub fn encode<T: serde::Serialize>(item: &T) -> Result<Vec<u8>> {
    let bytes = pot::to_vec(item)?;
    Ok(bytes)
}
