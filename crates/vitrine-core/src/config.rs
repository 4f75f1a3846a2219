//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and then layered
//! with environment variables (see [`Config::apply_env`]). Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadsConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup.
    ///
    /// Recognized keys: `HOST`, `PORT`, `PUBLIC_DIR`, `MAX_UPLOAD_BYTES`,
    /// `DB_HOST`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_POOL_SIZE`,
    /// `UPLOADS_DIR`, `IMAGE_MODE`, `UPLOAD_MODE`. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = get("PUBLIC_DIR") {
            self.server.public_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", &v)?;
        }

        if let Some(v) = get("DB_HOST") {
            self.database.host = Some(v);
        }
        if let Some(v) = get("DB_USER") {
            self.database.user = Some(v);
        }
        if let Some(v) = get("DB_PASSWORD") {
            self.database.password = Some(v);
        }
        if let Some(v) = get("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = get("DB_POOL_SIZE") {
            self.database.pool_size = parse_var("DB_POOL_SIZE", &v)?;
        }

        if let Some(v) = get("UPLOADS_DIR") {
            self.uploads.dir = PathBuf::from(v);
        }
        if let Some(v) = get("IMAGE_MODE") {
            self.uploads.image_mode = parse_var("IMAGE_MODE", &v)?;
        }
        if let Some(v) = get("UPLOAD_MODE") {
            self.uploads.upload_mode = parse_var("UPLOAD_MODE", &v)?;
        }

        Ok(())
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.database.pool_size == 0 {
            warnings.push("database.pool_size is 0; using 1 connection".into());
        }

        for (field, value) in [
            ("database.host", &self.database.host),
            ("database.user", &self.database.user),
            ("database.password", &self.database.password),
        ] {
            if value.is_some() {
                warnings.push(format!(
                    "{field} is set but ignored by the embedded SQLite backend"
                ));
            }
        }

        if self.server.max_upload_bytes == 0 {
            warnings.push("server.max_upload_bytes is 0; every upload will be rejected".into());
        }

        if let Some(ref dir) = self.server.public_dir {
            if !dir.exists() {
                warnings.push(format!("server.public_dir {} does not exist", dir.display()));
            }
        }

        warnings
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Validation(format!("invalid value for {key} ({value:?}): {e}")))
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Optional directory of static assets served at the site root.
    pub public_dir: Option<PathBuf>,
    /// Maximum accepted request body size for uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            public_dir: None,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// Storage backend settings.
///
/// `host`, `user` and `password` are accepted for compatibility with
/// server-based deployments; the embedded SQLite backend only uses `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Database name; doubles as the SQLite file name.
    pub name: String,
    /// Maximum number of pooled connections.
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: None,
            user: None,
            password: None,
            name: "vitrine".into(),
            pool_size: 10,
        }
    }
}

impl DatabaseConfig {
    /// Path of the SQLite database file.
    ///
    /// A bare name gets a `.db` extension; anything with an extension or a
    /// directory component is used as-is.
    pub fn sqlite_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.name);
        if path.extension().is_some() {
            path
        } else {
            path.with_extension("db")
        }
    }
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// How uploaded image bytes are turned into a stored asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Decode, bound the width, re-encode as JPEG.
    #[default]
    Optimize,
    /// Store the uploaded bytes verbatim.
    Passthrough,
}

impl FromStr for ImageMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "optimize" => Ok(Self::Optimize),
            "passthrough" | "raw" => Ok(Self::Passthrough),
            other => Err(format!("expected 'optimize' or 'passthrough', got '{other}'")),
        }
    }
}

/// Where multipart file parts are buffered while a request is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    #[default]
    Memory,
    /// Spool to a temporary file inside the uploads directory.
    Disk,
}

impl FromStr for UploadMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "disk" => Ok(Self::Disk),
            other => Err(format!("expected 'memory' or 'disk', got '{other}'")),
        }
    }
}

/// Upload storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    /// Directory where stored images live; served at `/uploads`.
    pub dir: PathBuf,
    pub image_mode: ImageMode,
    pub upload_mode: UploadMode,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./public/uploads"),
            image_mode: ImageMode::Optimize,
            upload_mode: UploadMode::Memory,
        }
    }
}
