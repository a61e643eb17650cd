//! Storage and presentation of AI generated pictures: a gallery of free-form
//! images and one replaceable image per memory card, kept in an embedded
//! document store that is opened lazily and reconnected on demand.

#[macro_use]
extern crate serde_derive;

pub mod ai;
pub mod app;
#[cfg(feature = "axum")]
pub mod axum;
pub mod config;
pub mod db;
pub mod error;
pub mod gallery;
pub mod image;
pub mod store;
pub mod studio;
pub mod tracing;

pub use app::App;
pub use config::Config;
pub use db::{ConnectionManager, Database};
pub use error::{Error, ErrorKind, Result};
pub use gallery::Gallery;
pub use image::{DataUri, ImageId, StoredImage};
pub use store::{ImageStore, Outcome, Reason};
pub use studio::Studio;
