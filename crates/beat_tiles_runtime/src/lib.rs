//! beat_tiles_runtime - Bevy integration for beat-synchronized pulse tiles
//!
//! Add [`PulseRuntimePlugin`], queue tileset catalogs through
//! [`PulseCatalogs`] and mark placed tiles with [`PulseTile`]. Each frame the
//! plugin advances the beat clock, keeps the animator's placements in step
//! with the world and writes the pulse scale into each tile's `Transform`.
//!
//! # Example
//!
//! ```rust,ignore
//! use bevy::prelude::*;
//! use beat_tiles_core::TileId;
//! use beat_tiles_runtime::{PulseCatalogs, PulseRuntimePlugin, PulseTile};
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(PulseRuntimePlugin { bpm: 128.0, ..default() })
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(
//!     mut commands: Commands,
//!     asset_server: Res<AssetServer>,
//!     mut catalogs: ResMut<PulseCatalogs>,
//! ) {
//!     catalogs.push(asset_server.load("tilesets/tutorial.tiles.json"));
//!     commands.spawn((PulseTile { tile: TileId(18) }, Transform::default()));
//! }
//! ```

pub mod loader;

pub use loader::{TileCatalogAsset, TileCatalogLoader, TilesetLoadError};

use beat_tiles_core::{CatalogError, TileId, TilesetCatalog};
use beat_tiles_pulse::{AnimatorConfig, BeatClock, PlacementId, PulseEngine, DEFAULT_BPM};
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use std::collections::HashMap;

/// Plugin that drives pulse tiles from a shared beat clock
#[derive(Debug, Clone)]
pub struct PulseRuntimePlugin {
    /// Song tempo in beats per minute
    pub bpm: f64,
    pub config: AnimatorConfig,
}

impl Default for PulseRuntimePlugin {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            config: AnimatorConfig::default(),
        }
    }
}

impl Plugin for PulseRuntimePlugin {
    fn build(&self, app: &mut App) {
        let clock = BeatClock::new(self.bpm).unwrap_or_else(|err| {
            warn!("{}; falling back to {} bpm", err, DEFAULT_BPM);
            BeatClock::default()
        });

        app.init_asset::<TileCatalogAsset>()
            .init_asset_loader::<TileCatalogLoader>()
            .insert_resource(TilePulses(PulseEngine::from_clock(
                clock,
                self.config.clone(),
            )))
            .init_resource::<PulsePlacements>()
            .init_resource::<PulseCatalogs>()
            .add_systems(
                Update,
                (
                    reload_tile_catalogs,
                    sync_music_clock,
                    retire_pulse_tiles,
                    register_pulse_tiles,
                    apply_pulse_scale,
                )
                    .chain()
                    .in_set(PulseSet),
            );
    }
}

/// System set containing every pulse system; order gameplay that reads
/// pulsed transforms after it
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PulseSet;

/// The pulse engine shared by all pulse systems
///
/// Pause, seek or change tempo through `clock_mut()`.
#[derive(Resource, Deref, DerefMut, Debug)]
pub struct TilePulses(pub PulseEngine);

/// Marks a placed tile that pulses when its catalog definition says so
///
/// The entity needs a `Transform`; its scale when the component is added is
/// the rest scale the pulse multiplies.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTile {
    pub tile: TileId,
}

/// Authoritative playback position of the current song
///
/// Insert and update this from the audio backend; while present the beat
/// clock is reconciled against it every frame.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct MusicPlayback {
    pub position_secs: f64,
}

/// Tileset catalogs feeding the pulse engine, in global id order
#[derive(Resource, Debug, Default)]
pub struct PulseCatalogs {
    handles: Vec<Handle<TileCatalogAsset>>,
}

impl PulseCatalogs {
    /// Append a tileset; its ids follow those of the tilesets already queued
    pub fn push(&mut self, handle: Handle<TileCatalogAsset>) {
        self.handles.push(handle);
    }

    pub fn handles(&self) -> &[Handle<TileCatalogAsset>] {
        &self.handles
    }

    fn contains(&self, id: AssetId<TileCatalogAsset>) -> bool {
        self.handles.iter().any(|h| h.id() == id)
    }

    /// Build the catalog once every queued tileset is loaded.
    ///
    /// Returns `Ok(None)` while any tileset is still loading.
    pub fn build(
        &self,
        assets: &Assets<TileCatalogAsset>,
    ) -> Result<Option<TilesetCatalog>, CatalogError> {
        let mut catalog = TilesetCatalog::new();
        for handle in &self.handles {
            let Some(asset) = assets.get(handle) else {
                return Ok(None);
            };
            catalog.add_tileset(asset.0.clone())?;
        }
        Ok(Some(catalog))
    }
}

#[derive(Debug, Clone, Copy)]
struct Placed {
    entity: Entity,
    base_scale: Vec3,
}

/// Maps pulse placements to the entities that carry them
#[derive(Resource, Debug, Default)]
pub struct PulsePlacements {
    placed: HashMap<PlacementId, Placed>,
}

impl PulsePlacements {
    /// Placement id used for an entity
    pub fn placement_of(entity: Entity) -> PlacementId {
        PlacementId(entity.to_bits())
    }

    /// Track an entity with its rest scale
    pub fn insert(&mut self, entity: Entity, base_scale: Vec3) -> PlacementId {
        let placement = Self::placement_of(entity);
        self.placed.insert(placement, Placed { entity, base_scale });
        placement
    }

    /// Stop tracking an entity, returning its placement and rest scale
    pub fn remove(&mut self, entity: Entity) -> Option<(PlacementId, Vec3)> {
        let placement = Self::placement_of(entity);
        self.placed
            .remove(&placement)
            .map(|placed| (placement, placed.base_scale))
    }

    pub fn entity(&self, placement: PlacementId) -> Option<Entity> {
        self.placed.get(&placement).map(|p| p.entity)
    }

    pub fn base_scale(&self, placement: PlacementId) -> Option<Vec3> {
        self.placed.get(&placement).map(|p| p.base_scale)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.placed.contains_key(&Self::placement_of(entity))
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }
}

fn register_placement(
    engine: &mut PulseEngine,
    placement: PlacementId,
    entity: Entity,
    tile: TileId,
) {
    match engine.register_tile(placement, tile) {
        Ok(Some(_)) => {}
        Ok(None) => debug!("Tile {} on {:?} does not pulse", tile, entity),
        Err(err) => warn!("Could not register pulse tile on {:?}: {}", entity, err),
    }
}

/// Rebuild pulse profiles when a queued tileset finishes loading or changes
pub fn reload_tile_catalogs(
    mut events: MessageReader<AssetEvent<TileCatalogAsset>>,
    assets: Res<Assets<TileCatalogAsset>>,
    catalogs: Res<PulseCatalogs>,
    placements: Res<PulsePlacements>,
    mut pulses: ResMut<TilePulses>,
    tiles: Query<(Entity, &PulseTile)>,
) {
    let mut changed = false;
    for event in events.read() {
        let id = match event {
            AssetEvent::Added { id }
            | AssetEvent::LoadedWithDependencies { id }
            | AssetEvent::Modified { id } => *id,
            _ => continue,
        };
        changed |= catalogs.contains(id);
    }
    if !changed || catalogs.handles.is_empty() {
        return;
    }

    // Wait until every tileset is in so global ids stay stable
    let catalog = match catalogs.build(&assets) {
        Ok(Some(catalog)) => catalog,
        Ok(None) => return,
        Err(err) => {
            warn!("Pulse catalog not rebuilt: {}", err);
            return;
        }
    };

    let rejected = pulses.load_catalog(&catalog);
    info!(
        "Pulse catalog rebuilt from {} tileset(s), {} profile(s), {} rejected",
        catalog.len(),
        pulses.animator().profiles().len(),
        rejected.len()
    );

    for (entity, tile) in tiles.iter() {
        if placements.contains(entity) {
            let placement = PulsePlacements::placement_of(entity);
            register_placement(&mut pulses, placement, entity, tile.tile);
        }
    }
}

/// Advance the beat clock by the frame time, reconciling against
/// [`MusicPlayback`] when present
pub fn sync_music_clock(
    time: Res<Time>,
    music: Option<Res<MusicPlayback>>,
    mut pulses: ResMut<TilePulses>,
) {
    let position = music.map(|m| m.position_secs);
    pulses.advance_clock(time.delta_secs_f64(), position);
}

/// Retire placements whose entity lost its [`PulseTile`] or was despawned
pub fn retire_pulse_tiles(
    mut removed: RemovedComponents<PulseTile>,
    mut pulses: ResMut<TilePulses>,
    mut placements: ResMut<PulsePlacements>,
    mut transforms: Query<&mut Transform>,
) {
    for entity in removed.read() {
        let Some((placement, base_scale)) = placements.remove(entity) else {
            continue;
        };
        pulses.retire_instance(placement);

        // Still alive without the marker: leave it at rest
        if let Ok(mut transform) = transforms.get_mut(entity) {
            transform.scale = base_scale;
        }
    }
}

/// Register newly placed pulse tiles at the current beat
pub fn register_pulse_tiles(
    mut pulses: ResMut<TilePulses>,
    mut placements: ResMut<PulsePlacements>,
    query: Query<(Entity, &PulseTile, &Transform), Added<PulseTile>>,
) {
    for (entity, tile, transform) in query.iter() {
        let placement = placements.insert(entity, transform.scale);
        register_placement(&mut pulses, placement, entity, tile.tile);
    }
}

/// Tick the animator and write each scale into the tile's transform
pub fn apply_pulse_scale(
    mut pulses: ResMut<TilePulses>,
    placements: Res<PulsePlacements>,
    mut transforms: Query<&mut Transform, With<PulseTile>>,
) {
    for (placement, scale) in pulses.tick() {
        let Some(placed) = placements.placed.get(&placement) else {
            continue;
        };
        if let Ok(mut transform) = transforms.get_mut(placed.entity) {
            transform.scale = placed.base_scale * scale as f32;
        }
    }
}
