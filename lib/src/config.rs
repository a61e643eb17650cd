use std::net::SocketAddr;

use serde::de::DeserializeOwned;

use crate::Result;

pub static CONFIG_FILE: &str = "embrace.toml";

/// Application configuration.
///
/// # Sensible defaults
///
/// `Config::default()` gives a runnable setup: the server listens on
/// `127.0.0.1:8080`, assets are served from `./assets` and the database is
/// left unconfigured, which keeps the gallery and memory slots disabled
/// without failing startup.
///
/// Using the *struct update syntax* one can initialize a new `Config`, making
/// a few changes right in the definition.
///
/// ```ignore
/// let cfg = Config {
///     database: Database {
///         uri: Some("mem:".to_string()),
///     },
///     ..Default::default()
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    pub version: String,

    /// Address on which to serve the application. Defaults to
    /// `127.0.0.1:8080`.
    pub address: SocketAddr,

    pub assets: Assets,
    pub tracing: Tracing,

    pub database: Database,
    pub generation: Generation,
    pub gallery: Gallery,

    /// Development mode configuration.
    pub dev: DevMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            assets: Assets::default(),
            tracing: Tracing::default(),
            database: Database::default(),
            generation: Generation::default(),
            gallery: Gallery::default(),
            dev: DevMode::default(),
        }
    }
}

/// Loads application config from toml file at default location.
pub fn load<T: DeserializeOwned>() -> Result<T> {
    load_from(CONFIG_FILE)
}

/// Loads application config from toml file at standard path using provided
/// name.
///
/// For example for `name` == `embrace.toml` we will load both `embrace.toml`
/// and `secret.embrace.toml` from the current directory. Environment
/// variables override both, with `__` separating nested keys, e.g.
/// `DATABASE__URI=sled:./db`.
pub fn load_from<T: DeserializeOwned>(name: impl AsRef<str>) -> Result<T> {
    let config = config::Config::builder()
        .add_source(config::File::with_name(name.as_ref()))
        .add_source(config::File::with_name(&format!("secret.{}", name.as_ref())).required(false))
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix_separator("__"),
        )
        .build()?;

    let config: T = config.try_deserialize()?;

    Ok(config)
}

/// Loads application config from multiple toml files at given paths.
pub fn load_from_many<T: DeserializeOwned>(paths: &[impl AsRef<str>]) -> Result<T> {
    let mut builder = config::Config::builder().add_source(
        config::Environment::default()
            .separator("__")
            .prefix_separator("__"),
    );

    for path in paths {
        builder = builder.add_source(config::File::with_name(path.as_ref()));
    }
    let config = builder.build()?;

    let config: T = config.try_deserialize()?;

    Ok(config)
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Assets {
    /// Flag for enabling the asset serving service, serving assets from
    /// filesystem directory based on provided path.
    pub serve: bool,
    /// Path to the assets directory to be accessed at runtime. Defaults to
    /// `./assets`. Note that the path here is relative to current working
    /// directory.
    pub path: String,
}

impl Default for Assets {
    fn default() -> Self {
        Self {
            serve: true,
            path: "assets".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Tracing {
    pub enabled: bool,

    pub mode: crate::tracing::Mode,
    pub level: crate::tracing::Level,

    pub loki_address: String,
    pub loki_token: String,
}

impl Default for Tracing {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: crate::tracing::Mode::default(),
            level: crate::tracing::Level::default(),
            loki_address: "".to_string(),
            loki_token: "".to_string(),
        }
    }
}

/// Document store settings.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Database {
    /// Connection string, e.g. `sled:./db` or `mem:`. When absent every
    /// store operation degrades to its "not saved" / empty / none result.
    pub uri: Option<String>,
}

impl Database {
    /// Returns the connection string if one is set and not blank.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Generative service settings.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Generation {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    /// Request timeout applied by the http client.
    pub timeout_secs: u64,
}

impl Default for Generation {
    fn default() -> Self {
        Self {
            api_key: "".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            text_model: "gemini-2.0-flash".to_string(),
            image_model: "gemini-2.0-flash-exp".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Gallery {
    /// Number of images shown before the full gallery is opened.
    pub preview_count: usize,
}

impl Default for Gallery {
    fn default() -> Self {
        Self { preview_count: 2 }
    }
}

/// NOTE: make sure to disable on production.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DevMode {
    /// Global switch for all dev mode items.
    pub enabled: bool,
    /// Replaces the generative service with canned responses.
    pub mock: bool,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_leave_database_unconfigured() {
        let config = Config::default();
        assert!(config.database.uri().is_none());
        assert_eq!(config.gallery.preview_count, 2);
        assert_eq!(config.address.port(), 8080);
    }

    #[test]
    fn blank_uri_counts_as_absent() {
        let db = Database {
            uri: Some("   ".to_string()),
        };
        assert!(db.uri().is_none());

        let db = Database {
            uri: Some(" mem: ".to_string()),
        };
        assert_eq!(db.uri(), Some("mem:"));
    }

    #[test]
    fn loads_partial_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "address = \"127.0.0.1:9999\"\n\n[database]\nuri = \"mem:\"\n\n[gallery]\npreview_count = 5"
        )
        .unwrap();

        let config: Config = load_from_many(&[path.to_string_lossy()]).unwrap();
        assert_eq!(config.address.port(), 9999);
        assert_eq!(config.database.uri(), Some("mem:"));
        assert_eq!(config.gallery.preview_count, 5);
        assert_eq!(config.assets.path, "assets");
    }
}
