//! Core data structures for beat_tiles
//!
//! This crate provides the read-only tile catalog consumed by the pulse engine:
//! - `PropertyValue` / `TileProperty` - Typed key/value tile properties
//! - `TileDefinition` - A single tile with its image and properties
//! - `Tileset` - A named collection of tile definitions
//! - `TilesetCatalog` - Several tilesets addressed by global `TileId`
//! - `TileCatalog` - Lookup trait implemented by catalogs

mod catalog;
mod tileset;
mod value;

pub use catalog::{TileCatalog, TileId, TilesetCatalog};
pub use tileset::{TileDefinition, TileImage, TileKind, Tileset, PULSE_CLASS};
pub use value::{PropertyType, PropertyValue, TileProperty};

use thiserror::Error;

/// Errors that can occur when loading or validating tilesets
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read tileset: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse tileset JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid tileset '{tileset}': {reason}")]
    InvalidTileset { tileset: String, reason: String },
    #[error("Invalid property '{name}': {reason}")]
    InvalidProperty { name: String, reason: String },
}
