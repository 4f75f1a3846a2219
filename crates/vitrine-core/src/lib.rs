//! vitrine-core: shared error type and application configuration.
//!
//! This crate is the foundational dependency for the other vitrine crates.
//! It provides the unified [`Error`] that every layer funnels its failures
//! into, and the [`config::Config`] tree loaded at startup.

pub mod config;
pub mod error;

pub use error::{Error, Result};
