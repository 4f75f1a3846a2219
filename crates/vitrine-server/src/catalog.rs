//! Catalog service: orchestrates image processing and record persistence.
//!
//! Every mutating operation that involves a file processes and stores it
//! *before* touching the database, so a record can only ever point at a file
//! that was written successfully. When the database write then fails, the
//! fresh file is removed on a best-effort basis.

use std::time::Duration;

use rusqlite::Connection;
use vitrine_core::{Error, Result};
use vitrine_db::models::ImageRecord;
use vitrine_db::pool::{get_conn, DbPool};
use vitrine_db::queries::images;
use vitrine_media::{ImageProcessor, StoredImage, Upload};

/// Field values for a create or update request.
#[derive(Debug, Default)]
pub struct ImageInput {
    pub title: String,
    pub brand: String,
    pub image: Option<Upload>,
}

/// High-level catalog operations shared by the HTTP handlers and the CLI.
#[derive(Clone)]
pub struct CatalogService {
    db: DbPool,
    processor: ImageProcessor,
}

impl CatalogService {
    pub fn new(db: DbPool, processor: ImageProcessor) -> Self {
        Self { db, processor }
    }

    pub fn processor(&self) -> &ImageProcessor {
        &self.processor
    }

    /// List records, optionally restricted to an exact brand.
    ///
    /// A blank or whitespace-only filter means "no filter"; any other value
    /// is matched byte for byte.
    pub async fn list(&self, brand: Option<&str>) -> Result<Vec<ImageRecord>> {
        let brand = active_filter(brand).map(String::from);
        self.with_conn(move |conn| images::list_images(conn, brand.as_deref()))
            .await
    }

    /// Distinct brands for the listing filter.
    pub async fn brands(&self) -> Result<Vec<String>> {
        self.with_conn(images::list_brands).await
    }

    /// Fetch one record.
    pub async fn get(&self, id: i64) -> Result<ImageRecord> {
        self.with_conn(move |conn| images::get_image(conn, id))
            .await?
            .ok_or_else(|| Error::not_found("image", id))
    }

    /// Create a record. Title, brand and an image are all required.
    pub async fn create(&self, input: ImageInput) -> Result<ImageRecord> {
        let (title, brand) = required_fields(&input, true)?;
        let Some(upload) = input.image else {
            return Err(Error::Validation("image is required".into()));
        };

        let stored = self.processor.process(upload).await?;
        let path = stored.public_path.clone();

        let result = self
            .with_conn(move |conn| images::create_image(conn, &title, &brand, &path))
            .await;

        match result {
            Ok(record) => {
                tracing::info!(
                    id = record.id,
                    brand = %record.brand,
                    image_path = %record.image_path,
                    "Created image record"
                );
                Ok(record)
            }
            Err(e) => {
                self.discard(&stored);
                Err(e)
            }
        }
    }

    /// Update title and brand, and replace the image when one is supplied.
    ///
    /// Fails with `NotFound` when no record has this ID.
    pub async fn update(&self, id: i64, input: ImageInput) -> Result<ImageRecord> {
        let (title, brand) = required_fields(&input, false)?;

        let stored = match input.image {
            Some(upload) => Some(self.processor.process(upload).await?),
            None => None,
        };
        let path = stored.as_ref().map(|s| s.public_path.clone());

        let result = self
            .with_conn(move |conn| {
                if !images::update_image(conn, id, &title, &brand, path.as_deref())? {
                    return Err(Error::not_found("image", id));
                }
                images::get_image(conn, id)?.ok_or_else(|| Error::not_found("image", id))
            })
            .await;

        match result {
            Ok(record) => {
                tracing::info!(
                    id,
                    image_replaced = stored.is_some(),
                    "Updated image record"
                );
                Ok(record)
            }
            Err(e) => {
                if let Some(ref stored) = stored {
                    self.discard(stored);
                }
                Err(e)
            }
        }
    }

    /// Delete a record. The stored file is left in place.
    ///
    /// Fails with `NotFound` when no record has this ID, so a repeated
    /// delete behaves exactly like deleting an ID that never existed.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let deleted = self
            .with_conn(move |conn| images::delete_image(conn, id))
            .await?;
        if !deleted {
            return Err(Error::not_found("image", id));
        }
        tracing::info!(id, "Deleted image record");
        Ok(())
    }

    /// Find stored files that no record references and, unless `dry_run`,
    /// delete them. Returns the orphaned file names.
    ///
    /// Files written less than `grace` ago are skipped: they may belong to a
    /// create or update that has stored its image but not yet committed the
    /// record.
    pub async fn sweep_orphans(&self, dry_run: bool, grace: Duration) -> Result<Vec<String>> {
        let referenced = self.with_conn(images::list_image_paths).await?;
        let processor = self.processor.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            let referenced: std::collections::HashSet<String> = referenced.into_iter().collect();
            let mut orphans = Vec::new();

            for name in processor.stored_files()? {
                let public = format!("{}/{name}", vitrine_media::PUBLIC_PREFIX);
                if referenced.contains(&public) {
                    continue;
                }
                let age = processor.file_age(&name)?;
                if age < grace {
                    tracing::debug!(
                        file = %name,
                        age_secs = age.as_secs(),
                        "Skipping recent upload"
                    );
                    continue;
                }
                if !dry_run {
                    processor.remove(&public)?;
                }
                orphans.push(name);
            }

            tracing::info!(count = orphans.len(), dry_run, "Orphan sweep finished");
            Ok(orphans)
        })
        .await
        .map_err(|e| Error::Internal(format!("spawn_blocking join error: {e}")))?
    }

    /// Run a query on a pooled connection off the async runtime.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            f(&conn)
        })
        .await
        .map_err(|e| Error::Internal(format!("spawn_blocking join error: {e}")))?
    }

    /// Remove a file written for a write that did not commit.
    ///
    /// A file that overwrote an existing one may be referenced by another
    /// record, so it is left alone.
    fn discard(&self, stored: &StoredImage) {
        if stored.replaced {
            tracing::warn!(
                file = %stored.file_name,
                "Keeping overwritten upload after failed write"
            );
            return;
        }
        match self.processor.remove(&stored.public_path) {
            Ok(_) => tracing::debug!(file = %stored.file_name, "Removed unreferenced upload"),
            Err(e) => {
                tracing::warn!(file = %stored.file_name, "Failed to remove upload: {e}")
            }
        }
    }
}

/// The brand filter to apply, or `None` when the input is blank.
pub fn active_filter(brand: Option<&str>) -> Option<&str> {
    brand.filter(|b| !b.trim().is_empty())
}

/// Trimmed title and brand, or a validation error naming what is missing.
fn required_fields(input: &ImageInput, image_required: bool) -> Result<(String, String)> {
    let title = input.title.trim();
    let brand = input.brand.trim();

    let mut missing = Vec::new();
    if title.is_empty() {
        missing.push("title");
    }
    if brand.is_empty() {
        missing.push("brand");
    }
    if image_required && input.image.is_none() {
        missing.push("image");
    }

    if missing.is_empty() {
        Ok((title.to_string(), brand.to_string()))
    } else {
        Err(Error::Validation(format!(
            "Missing required field(s): {}",
            missing.join(", ")
        )))
    }
}
