//! Uploaded file payloads.

use bytes::Bytes;
use std::path::Path;
use tempfile::NamedTempFile;

/// Where the bytes of an upload currently live.
#[derive(Debug)]
pub enum UploadData {
    /// Fully buffered in memory.
    Memory(Bytes),
    /// Spooled to a temporary file; removed on drop unless persisted.
    Spooled(NamedTempFile),
}

/// A file received from a client, with the name the client gave it.
#[derive(Debug)]
pub struct Upload {
    pub original_name: String,
    pub data: UploadData,
}

impl Upload {
    /// An upload buffered in memory.
    pub fn in_memory(original_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            data: UploadData::Memory(bytes.into()),
        }
    }

    /// An upload already written to a temporary file.
    pub fn spooled(original_name: impl Into<String>, file: NamedTempFile) -> Self {
        Self {
            original_name: original_name.into(),
            data: UploadData::Spooled(file),
        }
    }

    /// Read the full contents regardless of where they live.
    pub fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.data {
            UploadData::Memory(bytes) => Ok(bytes.to_vec()),
            UploadData::Spooled(file) => std::fs::read(file.path()),
        }
    }

    /// Path of the spool file, if any.
    pub fn spool_path(&self) -> Option<&Path> {
        match &self.data {
            UploadData::Memory(_) => None,
            UploadData::Spooled(file) => Some(file.path()),
        }
    }
}
