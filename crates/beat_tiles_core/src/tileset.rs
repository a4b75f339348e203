//! Tileset and tile definitions

use crate::{CatalogError, PropertyType, PropertyValue, TileProperty};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use uuid::Uuid;

/// Tile class marking a definition that pulses to the beat
pub const PULSE_CLASS: &str = "Pulse";

/// Source image of a tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileImage {
    /// Path to the image file (relative to the tileset file)
    pub source: String,
    pub width: u32,
    pub height: u32,
}

impl TileImage {
    pub fn new(source: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            source: source.into(),
            width,
            height,
        }
    }
}

/// Behavior family of a tile, selected by its declared class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Drawn as-is
    Static,
    /// Grows and shrinks with the music
    Pulse,
}

impl TileKind {
    /// Get the kind for a tile class string
    pub fn from_class(class: Option<&str>) -> Self {
        match class {
            Some(PULSE_CLASS) => TileKind::Pulse,
            _ => TileKind::Static,
        }
    }
}

/// A single tile in a tileset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    /// Tile id, local to its tileset
    pub id: u32,
    /// Declared class (e.g. "Pulse")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    pub image: TileImage,
    /// Properties in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<TileProperty>,
}

impl TileDefinition {
    /// Create a new tile definition without class or properties
    pub fn new(id: u32, image: TileImage) -> Self {
        Self {
            id,
            class: None,
            image,
            properties: Vec::new(),
        }
    }

    /// Set the declared class of this tile
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set a property, replacing any existing value with the same name
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set_property(name, value);
        self
    }

    /// Set a property, replacing any existing value with the same name
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        let property = TileProperty::new(name, value);
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => existing.value = property.value,
            None => self.properties.push(property),
        }
    }

    /// Pixel width of the tile
    pub fn width(&self) -> u32 {
        self.image.width
    }

    /// Pixel height of the tile
    pub fn height(&self) -> u32 {
        self.image.height
    }

    /// Behavior family of this tile
    pub fn kind(&self) -> TileKind {
        TileKind::from_class(self.class.as_deref())
    }

    /// Check if this tile pulses to the beat
    pub fn is_pulse(&self) -> bool {
        self.kind() == TileKind::Pulse
    }

    /// Get a property by name
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Get a float property
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.property(name).and_then(|v| v.as_float())
    }

    /// Get an integer property
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.property(name).and_then(|v| v.as_int())
    }

    /// Get a boolean property
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.property(name).and_then(|v| v.as_bool())
    }

    /// Get a string property
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(|v| v.as_string())
    }
}

/// A named collection of tile definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tileset {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    /// Grid cell size in pixels; individual tile images may differ
    pub tile_width: u32,
    pub tile_height: u32,
    #[serde(default)]
    pub tiles: Vec<TileDefinition>,
}

impl Tileset {
    /// Create a new empty tileset
    pub fn new(name: impl Into<String>, tile_width: u32, tile_height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            tile_width,
            tile_height,
            tiles: Vec::new(),
        }
    }

    /// Parse a tileset from a JSON string and validate it
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let tileset: Tileset = serde_json::from_str(json)?;
        tileset.validate()?;
        Ok(tileset)
    }

    /// Parse a tileset from JSON bytes and validate it
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, CatalogError> {
        let tileset: Tileset = serde_json::from_slice(bytes)?;
        tileset.validate()?;
        Ok(tileset)
    }

    /// Load a tileset from a JSON file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read(path)?;
        Self::from_json_slice(&content)
    }

    /// Serialize this tileset to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a tile definition, replacing any tile with the same id
    pub fn add_tile(&mut self, tile: TileDefinition) {
        match self.tiles.iter_mut().find(|t| t.id == tile.id) {
            Some(existing) => *existing = tile,
            None => self.tiles.push(tile),
        }
    }

    /// Get a tile by its local id
    pub fn get_tile(&self, id: u32) -> Option<&TileDefinition> {
        self.tiles.iter().find(|t| t.id == id)
    }

    /// Number of ids this tileset occupies (highest local id + 1)
    pub fn id_span(&self) -> u32 {
        self.tiles.iter().map(|t| t.id.saturating_add(1)).max().unwrap_or(0)
    }

    /// Iterate over tiles that pulse to the beat
    pub fn pulse_tiles(&self) -> impl Iterator<Item = &TileDefinition> {
        self.tiles.iter().filter(|t| t.is_pulse())
    }

    /// Check that tile ids are unique and that every property name keeps
    /// one value type across the tileset
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen_ids = HashSet::new();
        let mut property_types: HashMap<&str, PropertyType> = HashMap::new();

        for tile in &self.tiles {
            if !seen_ids.insert(tile.id) {
                return Err(CatalogError::InvalidTileset {
                    tileset: self.name.clone(),
                    reason: format!("duplicate tile id {}", tile.id),
                });
            }

            for property in &tile.properties {
                let ty = property.value.property_type();
                let expected = *property_types.entry(property.name.as_str()).or_insert(ty);
                if expected != ty {
                    return Err(CatalogError::InvalidTileset {
                        tileset: self.name.clone(),
                        reason: format!(
                            "tile {} property '{}' is {} but earlier tiles declare {}",
                            tile.id,
                            property.name,
                            ty.name(),
                            expected.name()
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}
