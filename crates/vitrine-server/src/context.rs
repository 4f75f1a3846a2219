//! Application context shared across route handlers via Axum state.

use std::sync::Arc;

use vitrine_core::config::Config;
use vitrine_core::Result;
use vitrine_db::pool::{init_pool, DbPool};
use vitrine_media::ImageProcessor;

use crate::catalog::CatalogService;

/// Central state for the server. Cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub catalog: CatalogService,
}

impl AppContext {
    /// Assemble a context from an already-initialized pool.
    pub fn new(config: Config, db: DbPool) -> Self {
        let processor =
            ImageProcessor::new(config.uploads.dir.clone(), config.uploads.image_mode);
        let catalog = CatalogService::new(db.clone(), processor);
        Self {
            db,
            config: Arc::new(config),
            catalog,
        }
    }

    /// Open the database and uploads directory described by `config`.
    ///
    /// Creates the database file's parent directory and the uploads
    /// directory when they are missing.
    pub fn open(config: Config) -> Result<Self> {
        let db_path = config.database.sqlite_path();
        let existed = db_path.exists();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
                tracing::info!("Created database directory {}", parent.display());
            }
        }

        let db_str = db_path.to_string_lossy();
        let db = init_pool(&db_str, config.database.pool_size)?;
        if existed {
            tracing::info!("Database opened (existing) at {db_str}");
        } else {
            tracing::info!("Database created (new) at {db_str}");
        }

        let ctx = Self::new(config, db);
        ctx.catalog.processor().ensure_dir()?;
        tracing::info!(
            dir = %ctx.config.uploads.dir.display(),
            mode = ?ctx.config.uploads.image_mode,
            "Uploads directory ready"
        );
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_database_and_uploads_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.name = dir.path().join("data/catalog").to_string_lossy().into_owned();
        config.database.pool_size = 2;
        config.uploads.dir = dir.path().join("public/uploads");

        let ctx = AppContext::open(config).unwrap();
        assert!(dir.path().join("data/catalog.db").exists());
        assert!(dir.path().join("public/uploads").is_dir());
        assert_eq!(ctx.db.max_size(), 2);
    }
}
