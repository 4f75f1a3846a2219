//! Multipart form extraction for the add and edit forms.
//!
//! Text fields are buffered. The `image` file field is either buffered in
//! memory or streamed chunk by chunk into a spool file inside the uploads
//! directory, depending on [`UploadMode`].

use axum::extract::multipart::{Field, Multipart, MultipartError};
use tokio::io::AsyncWriteExt;
use vitrine_core::config::UploadMode;
use vitrine_core::{Error, Result};
use vitrine_media::{ImageProcessor, Upload};

use crate::catalog::ImageInput;

/// Name of the file field in the add and edit forms.
pub const IMAGE_FIELD: &str = "image";

/// Read the catalog form out of a multipart body.
///
/// A file field submitted without a file name, or with no bytes, counts as
/// "no image". Unknown fields are skipped.
pub async fn read_image_form(
    mut multipart: Multipart,
    mode: UploadMode,
    processor: &ImageProcessor,
) -> Result<ImageInput> {
    let mut input = ImageInput::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => input.title = field.text().await.map_err(malformed)?,
            "brand" => input.brand = field.text().await.map_err(malformed)?,
            IMAGE_FIELD => input.image = read_file(field, mode, processor).await?,
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(input)
}

async fn read_file(
    field: Field<'_>,
    mode: UploadMode,
    processor: &ImageProcessor,
) -> Result<Option<Upload>> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    if file_name.is_empty() {
        // Drain so the browser's empty file part doesn't count as an upload.
        field.bytes().await.map_err(malformed)?;
        return Ok(None);
    }

    let upload = match mode {
        UploadMode::Memory => {
            let bytes = field.bytes().await.map_err(malformed)?;
            if bytes.is_empty() {
                return Ok(None);
            }
            Upload::in_memory(file_name, bytes)
        }
        UploadMode::Disk => {
            let Some(upload) = spool_field(field, file_name, processor).await? else {
                return Ok(None);
            };
            upload
        }
    };

    Ok(Some(upload))
}

/// Stream a file field into a spool file. The spool is deleted on drop, so
/// an early return leaves nothing behind.
async fn spool_field(
    mut field: Field<'_>,
    file_name: String,
    processor: &ImageProcessor,
) -> Result<Option<Upload>> {
    let spool = processor.spool()?;
    let mut file = tokio::fs::File::from_std(spool.as_file().try_clone()?);

    let mut written: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        return Ok(None);
    }

    tracing::debug!(file = %file_name, bytes = written, "Spooled upload to disk");
    Ok(Some(Upload::spooled(file_name, spool)))
}

fn malformed(e: MultipartError) -> Error {
    Error::Validation(format!("Could not read the submitted form: {}", e.body_text()))
}
