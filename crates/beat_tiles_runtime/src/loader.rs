//! Asset loader for tileset catalog files
//!
//! Loads `.tiles.json` files as [`TileCatalogAsset`]s. With Bevy's
//! `file_watcher` feature (the `hot-reload` feature of this crate) edits to a
//! tileset are picked up while the game runs and the pulse profiles are
//! rebuilt.
//!
//! # Example
//!
//! ```rust,ignore
//! use bevy::prelude::*;
//! use beat_tiles_runtime::PulseCatalogs;
//!
//! fn setup(asset_server: Res<AssetServer>, mut catalogs: ResMut<PulseCatalogs>) {
//!     catalogs.push(asset_server.load("tilesets/tutorial.tiles.json"));
//! }
//! ```

use beat_tiles_core::{CatalogError, Tileset};
use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, LoadContext};
use bevy::prelude::*;
use thiserror::Error;

/// A tileset loaded through the asset server
#[derive(Asset, TypePath, Debug, Clone)]
pub struct TileCatalogAsset(pub Tileset);

/// Error type for tileset loading failures
#[derive(Debug, Error)]
pub enum TilesetLoadError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid tileset: {0}")]
    Catalog(#[from] CatalogError),
}

/// Asset loader for tileset JSON files
#[derive(Default, TypePath)]
pub struct TileCatalogLoader;

impl AssetLoader for TileCatalogLoader {
    type Asset = TileCatalogAsset;
    type Settings = ();
    type Error = TilesetLoadError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;

        let tileset = Tileset::from_json_slice(&bytes)?;
        debug!(
            "Loaded tileset '{}' ({} tiles, {} pulse) from {}",
            tileset.name,
            tileset.tiles.len(),
            tileset.pulse_tiles().count(),
            load_context.path()
        );
        Ok(TileCatalogAsset(tileset))
    }

    fn extensions(&self) -> &[&str] {
        &["tiles.json"]
    }
}
