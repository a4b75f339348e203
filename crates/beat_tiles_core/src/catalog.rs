//! Tile catalog: global tile ids across several tilesets

use crate::{CatalogError, TileDefinition, Tileset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Global tile id. `0` is the empty tile; tilesets are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u32);

impl TileId {
    pub const EMPTY: TileId = TileId(0);

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only lookup of tile definitions by global id
pub trait TileCatalog {
    /// Get the definition for a global tile id
    fn definition_for(&self, tile: TileId) -> Option<&TileDefinition>;

    /// Iterate over every definition with its global id
    fn definitions(&self) -> impl Iterator<Item = (TileId, &TileDefinition)> + '_;
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    first_gid: u32,
    tileset: Tileset,
}

/// Catalog made of tilesets laid out one after another in the global id space
#[derive(Debug, Clone, Default)]
pub struct TilesetCatalog {
    entries: Vec<CatalogEntry>,
}

impl TilesetCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tileset after the existing ones and return its first global id.
    ///
    /// Fails if any of the tileset's ids would fall outside the global id
    /// space.
    pub fn add_tileset(&mut self, tileset: Tileset) -> Result<TileId, CatalogError> {
        let out_of_range = |tileset: &Tileset| CatalogError::InvalidTileset {
            tileset: tileset.name.clone(),
            reason: "tile ids do not fit in the global id space".to_string(),
        };

        let first_gid = match self.entries.last() {
            Some(e) => e.first_gid.checked_add(e.tileset.id_span().max(1)),
            None => Some(1),
        };
        let Some(first_gid) = first_gid else {
            return Err(out_of_range(&tileset));
        };
        let max_local = tileset.tiles.iter().map(|t| t.id).max().unwrap_or(0);
        if first_gid.checked_add(max_local).is_none() {
            return Err(out_of_range(&tileset));
        }

        self.entries.push(CatalogEntry { first_gid, tileset });
        Ok(TileId(first_gid))
    }

    /// Builder-style variant of `add_tileset`
    pub fn with_tileset(mut self, tileset: Tileset) -> Result<Self, CatalogError> {
        self.add_tileset(tileset)?;
        Ok(self)
    }

    /// Get the number of tilesets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog has no tilesets
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a tileset by name
    pub fn get_tileset(&self, name: &str) -> Option<&Tileset> {
        self.entries
            .iter()
            .find(|e| e.tileset.name == name)
            .map(|e| &e.tileset)
    }

    /// Get the global id of a tile given its tileset name and local id
    pub fn tile_id(&self, tileset: &str, local_id: u32) -> Option<TileId> {
        let entry = self.entries.iter().find(|e| e.tileset.name == tileset)?;
        entry.tileset.get_tile(local_id)?;
        Some(TileId(entry.first_gid + local_id))
    }

    /// Convert a global id to (tileset, local id)
    /// Returns None for the empty tile and ids before the first tileset
    pub fn resolve(&self, tile: TileId) -> Option<(&Tileset, u32)> {
        if tile.is_empty() {
            return None;
        }
        let idx = self.entries.partition_point(|e| e.first_gid <= tile.0);
        let entry = self.entries.get(idx.checked_sub(1)?)?;
        Some((&entry.tileset, tile.0 - entry.first_gid))
    }
}

impl TileCatalog for TilesetCatalog {
    fn definition_for(&self, tile: TileId) -> Option<&TileDefinition> {
        let (tileset, local_id) = self.resolve(tile)?;
        tileset.get_tile(local_id)
    }

    fn definitions(&self) -> impl Iterator<Item = (TileId, &TileDefinition)> + '_ {
        self.entries.iter().flat_map(|entry| {
            entry
                .tileset
                .tiles
                .iter()
                .map(move |tile| (TileId(entry.first_gid + tile.id), tile))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TileImage, PULSE_CLASS};

    fn tileset(name: &str, ids: &[u32]) -> Tileset {
        let mut tileset = Tileset::new(name, 32, 32);
        for &id in ids {
            tileset.add_tile(
                TileDefinition::new(id, TileImage::new(format!("{name}_{id}.png"), 32, 32))
                    .with_class(PULSE_CLASS),
            );
        }
        tileset
    }

    #[test]
    fn test_global_ids_follow_tileset_spans() {
        let mut catalog = TilesetCatalog::new();
        // Collection tilesets may leave gaps in their local ids
        assert_eq!(catalog.add_tileset(tileset("Tutorial", &[17, 18, 22])).unwrap(), TileId(1));
        assert_eq!(catalog.add_tileset(tileset("Art", &[0, 1])).unwrap(), TileId(24));
        assert_eq!(catalog.len(), 2);

        let (set, local) = catalog.resolve(TileId(18)).unwrap();
        assert_eq!(set.name, "Tutorial");
        assert_eq!(local, 17);

        let (set, local) = catalog.resolve(TileId(25)).unwrap();
        assert_eq!(set.name, "Art");
        assert_eq!(local, 1);

        assert!(catalog.resolve(TileId::EMPTY).is_none());
    }

    #[test]
    fn test_definition_lookup() {
        let catalog = TilesetCatalog::new()
            .with_tileset(tileset("Tutorial", &[17, 18]))
            .unwrap()
            .with_tileset(tileset("Art", &[0]))
            .unwrap();

        let id = catalog.tile_id("Tutorial", 18).unwrap();
        assert_eq!(id, TileId(19));
        assert_eq!(catalog.definition_for(id).unwrap().image.source, "Tutorial_18.png");

        // Hole inside the Tutorial range
        assert!(catalog.definition_for(TileId(5)).is_none());
        assert!(catalog.tile_id("Tutorial", 5).is_none());
        assert!(catalog.tile_id("Missing", 0).is_none());
        assert!(catalog.definition_for(TileId(100)).is_none());
    }

    #[test]
    fn test_definitions_iterates_all_tilesets() {
        let catalog = TilesetCatalog::new()
            .with_tileset(tileset("Tutorial", &[17, 18]))
            .unwrap()
            .with_tileset(tileset("Art", &[0]))
            .unwrap();

        let ids: Vec<TileId> = catalog.definitions().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![TileId(18), TileId(19), TileId(20)]);
    }

    #[test]
    fn test_empty_tileset_still_takes_an_id() {
        let mut catalog = TilesetCatalog::new();
        assert_eq!(catalog.add_tileset(Tileset::new("Empty", 16, 16)).unwrap(), TileId(1));
        assert_eq!(catalog.add_tileset(tileset("Next", &[0])).unwrap(), TileId(2));
        assert!(catalog.get_tileset("Empty").unwrap().tiles.is_empty());
    }

    #[test]
    fn test_rejects_ids_past_the_global_range() {
        let mut catalog = TilesetCatalog::new();
        catalog.add_tileset(Tileset::new("Empty", 16, 16)).unwrap();

        let err = catalog.add_tileset(tileset("Huge", &[u32::MAX])).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTileset { ref tileset, .. } if tileset == "Huge"));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.definitions().count(), 0);

        // The largest id that still fits is accepted; nothing fits after it
        catalog.add_tileset(tileset("Edge", &[u32::MAX - 2])).unwrap();
        assert_eq!(
            catalog.definitions().map(|(id, _)| id).collect::<Vec<_>>(),
            vec![TileId(u32::MAX)]
        );
        assert!(catalog.add_tileset(tileset("Next", &[0])).is_err());
    }
}
