//! beat_tiles - Beat-synchronized pulse animation for tile-based rhythm games
//!
//! Re-exports the tileset model, the pulse engine and (with the default
//! `runtime` feature) the Bevy plugin.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use beat_tiles::prelude::*;
//! use bevy::prelude::*;
//!
//! App::new()
//!     .add_plugins(DefaultPlugins)
//!     .add_plugins(PulseRuntimePlugin::default())
//!     .run();
//! ```
//!
//! Without Bevy, drive a [`pulse::PulseEngine`] directly:
//!
//! ```rust,ignore
//! use beat_tiles::prelude::*;
//!
//! let catalog = TilesetCatalog::new().with_tileset(Tileset::load(path)?)?;
//! let mut engine = PulseEngine::new(120.0, AnimatorConfig::default())?;
//! engine.load_catalog(&catalog);
//! ```

pub use beat_tiles_core as core;
pub use beat_tiles_pulse as pulse;

#[cfg(feature = "runtime")]
pub use beat_tiles_runtime as runtime;

/// Commonly used types
pub mod prelude {
    pub use beat_tiles_core::{
        TileCatalog, TileDefinition, TileId, TileImage, Tileset, TilesetCatalog,
    };
    pub use beat_tiles_pulse::{
        AnimatorConfig, BeatClock, PlacementId, PulseEngine, PulseError, PulseProfile,
    };

    #[cfg(feature = "runtime")]
    pub use beat_tiles_runtime::{
        MusicPlayback, PulseCatalogs, PulseRuntimePlugin, PulseSet, PulseTile, TilePulses,
    };
}
