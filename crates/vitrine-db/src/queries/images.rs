//! Catalog record CRUD operations.
//!
//! Every statement is parameterized; caller-supplied values never reach the
//! SQL text.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use vitrine_core::{Error, Result};

use crate::models::ImageRecord;

/// Column list matching [`ImageRecord::from_row`].
pub const COLS: &str = "id, title, brand, image_path, created_at, updated_at";

/// List records, optionally restricted to an exact `brand` match.
///
/// No `ORDER BY` is applied; rows come back in the backend's natural order.
pub fn list_images(conn: &Connection, brand: Option<&str>) -> Result<Vec<ImageRecord>> {
    let rows = match brand {
        Some(brand) => {
            let q = format!("SELECT {COLS} FROM images WHERE brand = ?1");
            let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
            let rows = stmt
                .query_map([brand], ImageRecord::from_row)
                .map_err(|e| Error::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::database(e.to_string()))?;
            rows
        }
        None => {
            let q = format!("SELECT {COLS} FROM images");
            let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
            let rows = stmt
                .query_map([], ImageRecord::from_row)
                .map_err(|e| Error::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::database(e.to_string()))?;
            rows
        }
    };
    Ok(rows)
}

/// Get a record by ID.
pub fn get_image(conn: &Connection, id: i64) -> Result<Option<ImageRecord>> {
    let q = format!("SELECT {COLS} FROM images WHERE id = ?1");
    conn.query_row(&q, [id], ImageRecord::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Insert a new record and return it with its assigned ID.
pub fn create_image(
    conn: &Connection,
    title: &str,
    brand: &str,
    image_path: &str,
) -> Result<ImageRecord> {
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO images (title, brand, image_path, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        rusqlite::params![title, brand, image_path, now],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(ImageRecord {
        id: conn.last_insert_rowid(),
        title: title.to_string(),
        brand: brand.to_string(),
        image_path: image_path.to_string(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Update title and brand, and `image_path` when one is given.
///
/// Returns `false` when no row has the given ID.
pub fn update_image(
    conn: &Connection,
    id: i64,
    title: &str,
    brand: &str,
    image_path: Option<&str>,
) -> Result<bool> {
    let now = Utc::now().to_rfc3339();

    let n = match image_path {
        Some(path) => conn.execute(
            "UPDATE images SET title = ?1, brand = ?2, image_path = ?3, updated_at = ?4
             WHERE id = ?5",
            rusqlite::params![title, brand, path, now, id],
        ),
        None => conn.execute(
            "UPDATE images SET title = ?1, brand = ?2, updated_at = ?3 WHERE id = ?4",
            rusqlite::params![title, brand, now, id],
        ),
    }
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(n > 0)
}

/// Delete a record by ID. Returns `false` when no row had that ID.
pub fn delete_image(conn: &Connection, id: i64) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM images WHERE id = ?1", [id])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Distinct brand values, sorted.
pub fn list_brands(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT brand FROM images ORDER BY brand")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Every `image_path` currently referenced by a record.
pub fn list_image_paths(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT image_path FROM images")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
