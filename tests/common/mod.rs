//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temporary
//! uploads directory, and a full [`AppContext`]. The [`TestHarness::with_server`]
//! constructors start Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use reqwest::multipart::{Form, Part};

use vitrine_core::config::Config;
use vitrine_db::models::ImageRecord;
use vitrine_db::pool::{init_memory_pool, DbPool};
use vitrine_server::context::AppContext;
use vitrine_server::router::build_router;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary uploads directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness from `config`; the uploads directory is always
    /// redirected into a fresh temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        config.uploads.dir = dir.path().join("uploads");
        std::fs::create_dir_all(&config.uploads.dir).expect("failed to create uploads dir");

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, db.clone());

        Self { ctx, db, dir }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> vitrine_db::pool::PooledConnection {
        vitrine_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// All records currently stored.
    pub fn records(&self) -> Vec<ImageRecord> {
        vitrine_db::queries::images::list_images(&self.conn(), None).expect("list failed")
    }

    /// Absolute path of a stored `/uploads/...` file.
    pub fn stored_path(&self, public: &str) -> PathBuf {
        self.ctx
            .catalog
            .processor()
            .resolve(public)
            .expect("path outside uploads dir")
    }

    /// Names of all files in the uploads directory.
    pub fn stored_files(&self) -> Vec<String> {
        self.ctx
            .catalog
            .processor()
            .stored_files()
            .expect("failed to list uploads")
    }
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build client")
}

/// Encode a solid-colour RGB image.
pub fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        image::Rgb([30, 120, 200]),
    ));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("encode failed");
    buf.into_inner()
}

/// Encode a translucent RGBA PNG.
pub fn png_rgba(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([200, 20, 20, 100]),
    ));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).expect("encode failed");
    buf.into_inner()
}

/// A JPEG file part for [`form`].
pub fn jpeg(name: &str, width: u32, height: u32) -> Option<(&str, Vec<u8>)> {
    Some((name, encoded(width, height, ImageFormat::Jpeg)))
}

/// A PNG file part for [`form`].
pub fn png(name: &str, width: u32, height: u32) -> Option<(&str, Vec<u8>)> {
    Some((name, encoded(width, height, ImageFormat::Png)))
}

/// Multipart form with the catalog fields and an optional image.
pub fn form(title: &str, brand: &str, image: Option<(&str, Vec<u8>)>) -> Form {
    let form = Form::new()
        .text("title", title.to_string())
        .text("brand", brand.to_string());
    match image {
        Some((name, bytes)) => form.part("image", Part::bytes(bytes).file_name(name.to_string())),
        None => form,
    }
}

/// Submit the add form and return the response.
pub async fn post_add(addr: SocketAddr, form: Form) -> reqwest::Response {
    client()
        .post(format!("http://{addr}/add"))
        .multipart(form)
        .send()
        .await
        .expect("request failed")
}

/// Submit the edit form for `id` and return the response.
pub async fn post_edit(addr: SocketAddr, id: i64, form: Form) -> reqwest::Response {
    client()
        .post(format!("http://{addr}/edit/{id}"))
        .multipart(form)
        .send()
        .await
        .expect("request failed")
}
