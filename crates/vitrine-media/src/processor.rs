//! Filesystem-level image storage with optional optimization.
//!
//! In [`ImageMode::Optimize`] an upload is decoded, scaled down to at most
//! [`MAX_WIDTH`] pixels wide and re-encoded as JPEG at [`JPEG_QUALITY`]. In
//! [`ImageMode::Passthrough`] the uploaded bytes are written unchanged.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tempfile::NamedTempFile;
use vitrine_core::config::ImageMode;
use vitrine_core::{Error, Result};

use crate::naming::{unique_file_name, unique_jpeg_file_name};
use crate::upload::{Upload, UploadData};

/// Widest stored image, in pixels. Narrower images are never upscaled.
pub const MAX_WIDTH: u32 = 800;

/// JPEG quality used when re-encoding.
pub const JPEG_QUALITY: u8 = 85;

/// URL prefix under which the uploads directory is served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Prefix of in-flight spool files; hidden so directory listings skip them.
const SPOOL_PREFIX: &str = ".upload-";

/// Result of storing one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// File name inside the uploads directory.
    pub file_name: String,
    /// Public path, `/uploads/<file_name>`.
    pub public_path: String,
    /// Stored dimensions; `None` in passthrough mode.
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Size of the written file in bytes.
    pub size: u64,
    /// A file with the same name already existed and was overwritten.
    pub replaced: bool,
}

/// Owner of the uploads directory.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    uploads_dir: PathBuf,
    mode: ImageMode,
}

impl ImageProcessor {
    pub fn new(uploads_dir: PathBuf, mode: ImageMode) -> Self {
        Self { uploads_dir, mode }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn mode(&self) -> ImageMode {
        self.mode
    }

    /// Create the uploads directory if it is missing.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.uploads_dir)?;
        Ok(())
    }

    /// Open a fresh spool file inside the uploads directory.
    ///
    /// Spooling next to the final destination lets passthrough storage
    /// persist the file with a rename instead of a copy.
    pub fn spool(&self) -> Result<NamedTempFile> {
        let file = tempfile::Builder::new()
            .prefix(SPOOL_PREFIX)
            .tempfile_in(&self.uploads_dir)?;
        Ok(file)
    }

    /// Store an upload under a freshly generated unique name.
    ///
    /// In optimize mode the name ends in `.jpg`; in passthrough mode it keeps
    /// the client's extension. Decoding and encoding run on the blocking
    /// thread pool.
    pub async fn process(&self, upload: Upload) -> Result<StoredImage> {
        let file_name = match self.mode {
            ImageMode::Optimize => unique_jpeg_file_name(&upload.original_name),
            ImageMode::Passthrough => unique_file_name(&upload.original_name),
        };
        let processor = self.clone();

        tokio::task::spawn_blocking(move || processor.store_as(upload, &file_name))
            .await
            .map_err(|e| Error::Internal(format!("spawn_blocking join error: {e}")))?
    }

    /// Store an upload as `file_name` inside the uploads directory.
    ///
    /// Writes exactly one file and never touches existing ones other than a
    /// same-named file, which is overwritten.
    pub fn store_as(&self, upload: Upload, file_name: &str) -> Result<StoredImage> {
        let dest = self.uploads_dir.join(file_name);
        let replaced = dest.exists();

        let (width, height) = match self.mode {
            ImageMode::Optimize => {
                let data = upload.read_bytes()?;
                let (jpeg, width, height) = optimize(&data)?;
                std::fs::write(&dest, jpeg)?;
                (Some(width), Some(height))
            }
            ImageMode::Passthrough => {
                match upload.data {
                    UploadData::Memory(bytes) => std::fs::write(&dest, &bytes)?,
                    UploadData::Spooled(file) => {
                        file.persist(&dest).map_err(|e| Error::from(e.error))?;
                    }
                }
                (None, None)
            }
        };

        let size = std::fs::metadata(&dest)?.len();

        tracing::debug!(
            file = %dest.display(),
            mode = ?self.mode,
            width,
            height,
            size,
            replaced,
            "Stored upload"
        );

        Ok(StoredImage {
            file_name: file_name.to_string(),
            public_path: public_path(file_name),
            width,
            height,
            size,
            replaced,
        })
    }

    /// Map a public `/uploads/...` path back to a file in the uploads
    /// directory. Returns `None` for paths outside the uploads prefix.
    pub fn resolve(&self, public: &str) -> Option<PathBuf> {
        let name = public
            .strip_prefix(PUBLIC_PREFIX)?
            .strip_prefix('/')?;
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(self.uploads_dir.join(name))
    }

    /// Delete the file behind a public path.
    ///
    /// Returns `Ok(false)` if the path does not map into the uploads
    /// directory or the file is already gone.
    pub fn remove(&self, public: &str) -> Result<bool> {
        let Some(path) = self.resolve(public) else {
            return Ok(false);
        };
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Time since a stored file was last written.
    ///
    /// A modification time in the future counts as zero age.
    pub fn file_age(&self, file_name: &str) -> Result<Duration> {
        let modified = std::fs::metadata(self.uploads_dir.join(file_name))?.modified()?;
        Ok(SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO))
    }

    /// Names of all stored files, skipping hidden files and directories.
    pub fn stored_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.uploads_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Public path for a stored file name.
fn public_path(file_name: &str) -> String {
    format!("{PUBLIC_PREFIX}/{file_name}")
}

/// Decode `data`, bound its width to [`MAX_WIDTH`] and encode it as JPEG.
///
/// Returns the JPEG bytes and the output dimensions.
pub fn optimize(data: &[u8]) -> Result<(Vec<u8>, u32, u32)> {
    let img = image::load_from_memory(data).map_err(Error::processing)?;
    let img = bound_width(img, MAX_WIDTH);

    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(Error::processing)?;

    Ok((buf, rgb.width(), rgb.height()))
}

/// Scale down to `max_width` preserving aspect ratio; never scales up.
fn bound_width(img: DynamicImage, max_width: u32) -> DynamicImage {
    if img.width() <= max_width {
        return img;
    }
    img.resize(max_width, u32::MAX, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    use image::{ImageFormat, RgbImage, RgbaImage};

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 10, 10]))),
            ImageFormat::Jpeg,
        )
    }

    fn png_rgba(width: u32, height: u32) -> Vec<u8> {
        encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                width,
                height,
                image::Rgba([0, 0, 255, 128]),
            )),
            ImageFormat::Png,
        )
    }

    fn processor(mode: ImageMode) -> (tempfile::TempDir, ImageProcessor) {
        let dir = tempfile::tempdir().unwrap();
        let processor = ImageProcessor::new(dir.path().join("uploads"), mode);
        processor.ensure_dir().unwrap();
        (dir, processor)
    }

    #[test]
    fn narrow_image_is_not_upscaled() {
        let (_jpeg, w, h) = optimize(&jpeg(500, 300)).unwrap();
        assert_eq!((w, h), (500, 300));
    }

    #[test]
    fn wide_image_is_bounded() {
        let (bytes, w, h) = optimize(&png_rgba(1600, 800)).unwrap();
        assert_eq!((w, h), (800, 400));

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!((decoded.width(), decoded.height()), (800, 400));
    }

    #[test]
    fn exact_max_width_is_untouched() {
        let (_jpeg, w, h) = optimize(&jpeg(800, 10)).unwrap();
        assert_eq!((w, h), (800, 10));
    }

    #[test]
    fn garbage_is_processing_error() {
        let err = optimize(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Processing(_)));
    }

    #[test]
    fn store_as_optimizes() {
        let (_dir, processor) = processor(ImageMode::Optimize);
        let upload = Upload::in_memory("wide.png", png_rgba(1200, 600));

        let stored = processor.store_as(upload, "1_wide.png").unwrap();
        assert_eq!(stored.public_path, "/uploads/1_wide.png");
        assert_eq!(stored.width, Some(800));
        assert_eq!(stored.height, Some(400));

        let written = std::fs::read(processor.uploads_dir().join("1_wide.png")).unwrap();
        assert_eq!(written.len() as u64, stored.size);
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn store_as_failed_decode_writes_nothing() {
        let (_dir, processor) = processor(ImageMode::Optimize);
        let upload = Upload::in_memory("bad.png", b"nope".to_vec());

        let err = processor.store_as(upload, "1_bad.png").unwrap_err();
        assert!(matches!(err, Error::Processing(_)));
        assert!(processor.stored_files().unwrap().is_empty());
    }

    #[test]
    fn store_as_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let processor = ImageProcessor::new(dir.path().join("absent"), ImageMode::Optimize);

        let err = processor
            .store_as(Upload::in_memory("a.jpg", jpeg(10, 10)), "1_a.jpg")
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn passthrough_keeps_bytes() {
        let (_dir, processor) = processor(ImageMode::Passthrough);
        let raw = b"not even an image".to_vec();

        let stored = processor
            .store_as(Upload::in_memory("notes.txt", raw.clone()), "1_notes.txt")
            .unwrap();
        assert_eq!(stored.width, None);
        assert_eq!(
            std::fs::read(processor.uploads_dir().join("1_notes.txt")).unwrap(),
            raw
        );
    }

    #[test]
    fn passthrough_persists_spool_file() {
        let (_dir, processor) = processor(ImageMode::Passthrough);
        let mut spool = processor.spool().unwrap();
        spool.write_all(b"spooled bytes").unwrap();
        let spool_path = spool.path().to_path_buf();

        let stored = processor
            .store_as(Upload::spooled("a.bin", spool), "1_a.bin")
            .unwrap();
        assert_eq!(stored.size, 13);
        assert!(!spool_path.exists());
        assert_eq!(processor.stored_files().unwrap(), vec!["1_a.bin"]);
    }

    #[test]
    fn optimize_reads_spool_file() {
        let (_dir, processor) = processor(ImageMode::Optimize);
        let mut spool = processor.spool().unwrap();
        spool.write_all(&jpeg(40, 20)).unwrap();

        let stored = processor
            .store_as(Upload::spooled("s.jpg", spool), "1_s.jpg")
            .unwrap();
        assert_eq!(stored.width, Some(40));
        assert_eq!(processor.stored_files().unwrap(), vec!["1_s.jpg"]);
    }

    #[tokio::test]
    async fn process_generates_unique_name() {
        let (_dir, processor) = processor(ImageMode::Optimize);

        let stored = processor
            .process(Upload::in_memory("Model A.jpg", jpeg(50, 30)))
            .await
            .unwrap();
        assert!(stored.public_path.starts_with("/uploads/"));
        assert!(stored.file_name.ends_with("_Model_A.jpg"));
        assert!(processor.resolve(&stored.public_path).unwrap().exists());
    }

    #[tokio::test]
    async fn optimized_png_gets_jpg_name() {
        let (_dir, processor) = processor(ImageMode::Optimize);

        let stored = processor
            .process(Upload::in_memory("wide.png", png_rgba(1000, 500)))
            .await
            .unwrap();
        assert!(stored.file_name.ends_with("_wide.jpg"));

        // The extension now agrees with the bytes, so path-based decoding works.
        let decoded = image::open(processor.resolve(&stored.public_path).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 400));
    }

    #[tokio::test]
    async fn passthrough_keeps_original_extension() {
        let (_dir, processor) = processor(ImageMode::Passthrough);

        let stored = processor
            .process(Upload::in_memory("wide.png", png_rgba(10, 10)))
            .await
            .unwrap();
        assert!(stored.file_name.ends_with("_wide.png"));
    }

    #[test]
    fn overwrite_is_reported() {
        let (_dir, processor) = processor(ImageMode::Passthrough);

        let first = processor
            .store_as(Upload::in_memory("a", b"x".to_vec()), "1_a")
            .unwrap();
        let second = processor
            .store_as(Upload::in_memory("a", b"y".to_vec()), "1_a")
            .unwrap();
        assert!(!first.replaced);
        assert!(second.replaced);
    }

    #[test]
    fn fresh_file_has_small_age() {
        let (_dir, processor) = processor(ImageMode::Passthrough);
        processor
            .store_as(Upload::in_memory("a", b"x".to_vec()), "1_a")
            .unwrap();

        assert!(processor.file_age("1_a").unwrap() < Duration::from_secs(60));
        assert!(matches!(processor.file_age("missing"), Err(Error::Io { .. })));
    }

    #[test]
    fn resolve_rejects_foreign_paths() {
        let (_dir, processor) = processor(ImageMode::Optimize);
        assert!(processor.resolve("/uploads/1_a.jpg").is_some());
        assert!(processor.resolve("/static/1_a.jpg").is_none());
        assert!(processor.resolve("/uploads/../secret").is_none());
        assert!(processor.resolve("/uploads/").is_none());
        assert!(processor.resolve("/uploadsx/a").is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let (_dir, processor) = processor(ImageMode::Passthrough);
        processor
            .store_as(Upload::in_memory("a", b"x".to_vec()), "1_a")
            .unwrap();

        assert!(processor.remove("/uploads/1_a").unwrap());
        assert!(!processor.remove("/uploads/1_a").unwrap());
        assert!(!processor.remove("/elsewhere/1_a").unwrap());
    }

    #[test]
    fn stored_files_skips_spool_files() {
        let (_dir, processor) = processor(ImageMode::Passthrough);
        let _spool = processor.spool().unwrap();
        processor
            .store_as(Upload::in_memory("b", b"x".to_vec()), "2_b")
            .unwrap();

        assert_eq!(processor.stored_files().unwrap(), vec!["2_b"]);
    }
}
