//! beat_tiles_pulse - Beat-synchronized pulse animation for tiles
//!
//! Tiles whose definition declares the `Pulse` class grow and shrink with the
//! music. This crate turns a shared beat clock plus a population of placed
//! tiles into one scale multiplier per tile per frame.
//!
//! # Usage
//!
//! ```rust,ignore
//! use beat_tiles_core::{TilesetCatalog, Tileset};
//! use beat_tiles_pulse::{AnimatorConfig, PlacementId, PulseEngine};
//!
//! let catalog = TilesetCatalog::new().with_tileset(Tileset::load(path)?)?;
//! let mut engine = PulseEngine::new(120.0, AnimatorConfig::default())?;
//! engine.load_catalog(&catalog);
//!
//! engine.register_tile(PlacementId(1), arrow_tile)?;
//!
//! // Every frame
//! for (placement, scale) in engine.update(delta_secs, Some(music_position_secs)) {
//!     // draw the tile at base size * scale, about its center
//! }
//! ```

mod animator;
mod clock;
mod command;
mod config;
mod engine;
mod instance;
mod profile;

pub use animator::{PulseAnimator, Tick};
pub use clock::{BeatClock, Reconcile, DEFAULT_BPM};
pub use command::{command_channel, AnimatorCommand, CommandReceiver, CommandSender};
pub use config::{AnimationConfig, AnimatorConfig, ClockConfig, DecayReference, PhaseAnchor};
pub use engine::PulseEngine;
pub use instance::{InstanceHandle, InstanceState, PlacementId, PulseInstance};
pub use profile::{
    build_profile, ProfileId, ProfileTable, PulseProfile, TileBehavior, PULSE_PER_BEAT,
    PULSE_SCALE, SHRINK_RATE,
};

use beat_tiles_core::PropertyType;
use thiserror::Error;

/// Errors reported by the pulse engine
///
/// None of these are raised from the per-frame tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PulseError {
    #[error("Invalid pulse profile for tile {tile}: {issue}")]
    InvalidProfile { tile: u32, issue: ProfileIssue },
    #[error("Placement {0} is already registered")]
    DuplicatePlacement(PlacementId),
    #[error("Unknown pulse profile {0}")]
    UnknownProfile(ProfileId),
    #[error("Tempo must be a positive number of beats per minute, got {0}")]
    InvalidTempo(f64),
    #[error("Beat position must be a finite non-negative number, got {0}")]
    InvalidBeat(f64),
}

/// Reason a tile definition could not become a pulse profile
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileIssue {
    #[error("tile class is {class:?}, not \"Pulse\"")]
    NotPulse { class: Option<String> },
    #[error("missing property '{0}'")]
    MissingProperty(&'static str),
    #[error("property '{property}' must be a float, found {}", .found.name())]
    WrongType {
        property: &'static str,
        found: PropertyType,
    },
    #[error("property '{property}' is {value}, expected {expected}")]
    OutOfRange {
        property: &'static str,
        value: f64,
        expected: &'static str,
    },
}

/// Errors that can occur when loading animator configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
