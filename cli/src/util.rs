use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use embrace::{Config, ConnectionManager, DataUri, ImageStore, StoredImage};

/// Store backed by the configured database, with tracing set up for
/// one-off commands.
pub fn store(config: &Config) -> ImageStore {
    if let Err(e) = embrace::tracing::init(config) {
        eprintln!("failed to initialize tracing: {e}");
    }
    ImageStore::new(Arc::new(ConnectionManager::new(&config.database)))
}

/// Reads an image file into a data uri, taking the mime type from the file
/// extension.
pub async fn read_image(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed reading {}", path.display()))?;
    Ok(DataUri::encode(mime_for(path), &bytes))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub fn print_image(image: &StoredImage) {
    println!(
        "{}  {}  {}  {}",
        image.id,
        image.created_at.format("%Y-%m-%d %H:%M:%S"),
        image.memory_id.as_deref().unwrap_or("-"),
        image.prompt
    );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
