//! vitrine-db: database access and persistence layer.
//!
//! This crate provides SQLite-backed storage for catalog records with r2d2
//! connection pooling, embedded migrations, a typed model, and query
//! functions.
//!
//! # Example
//!
//! ```
//! use vitrine_db::pool::{init_memory_pool, get_conn};
//! use vitrine_db::queries::images;
//!
//! let pool = init_memory_pool().unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let record = images::create_image(&conn, "Model A", "Acme", "/uploads/1_a.jpg").unwrap();
//! assert_eq!(images::list_images(&conn, Some("Acme")).unwrap().len(), 1);
//! # let _ = record;
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
