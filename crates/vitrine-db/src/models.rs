//! Rust structs mapping to database tables.

use serde::Serialize;

/// One catalog entry: a titled, branded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub id: i64,
    pub title: String,
    pub brand: String,
    /// Public path of the stored asset, e.g. `/uploads/1700000000000_a.jpg`.
    pub image_path: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ImageRecord {
    /// Build from a row selected with [`crate::queries::images::COLS`].
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            brand: row.get(2)?,
            image_path: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}
