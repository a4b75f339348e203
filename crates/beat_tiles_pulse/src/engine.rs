//! Pulse engine: beat clock + animator + configuration driven once per frame

use crate::{
    AnimatorCommand, AnimatorConfig, BeatClock, CommandReceiver, InstanceHandle, PlacementId,
    ProfileId, ProfileTable, PulseAnimator, PulseError, Reconcile, Tick,
};
use beat_tiles_core::{TileCatalog, TileId};

/// Everything needed to animate pulse tiles for one level
#[derive(Debug, Clone)]
pub struct PulseEngine {
    clock: BeatClock,
    animator: PulseAnimator,
    config: AnimatorConfig,
}

impl PulseEngine {
    /// Create an engine with no profiles at the given tempo
    pub fn new(bpm: f64, config: AnimatorConfig) -> Result<Self, PulseError> {
        Ok(Self::from_clock(BeatClock::new(bpm)?, config))
    }

    /// Create an engine around an existing clock
    pub fn from_clock(clock: BeatClock, config: AnimatorConfig) -> Self {
        Self {
            clock,
            animator: PulseAnimator::new(ProfileTable::new(), config.animation),
            config,
        }
    }

    /// Builder-style variant of `load_catalog` that discards rejections
    /// (they are logged)
    pub fn with_catalog(mut self, catalog: &impl TileCatalog) -> Self {
        self.load_catalog(catalog);
        self
    }

    /// Build profiles for a catalog, replacing the current ones.
    ///
    /// Existing instances retire. Returns the tiles whose pulse properties
    /// were rejected; those tiles behave as static.
    pub fn load_catalog(&mut self, catalog: &impl TileCatalog) -> Vec<(TileId, PulseError)> {
        let (profiles, rejected) = ProfileTable::from_catalog(catalog);
        self.animator.replace_profiles(profiles);
        rejected
    }

    pub fn clock(&self) -> &BeatClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut BeatClock {
        &mut self.clock
    }

    pub fn animator(&self) -> &PulseAnimator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut PulseAnimator {
        &mut self.animator
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AnimatorConfig) {
        self.animator.set_config(config.animation);
        self.config = config;
    }

    pub fn current_beat(&self) -> f64 {
        self.clock.current_beat()
    }

    /// Register a placed catalog tile at the current beat
    pub fn register_tile(
        &mut self,
        placement: PlacementId,
        tile: TileId,
    ) -> Result<Option<InstanceHandle>, PulseError> {
        let beat = self.clock.current_beat();
        self.animator.register_tile(placement, tile, beat)
    }

    /// Register a placement with an explicit profile at the current beat
    pub fn register_instance(
        &mut self,
        placement: PlacementId,
        profile: ProfileId,
    ) -> Result<InstanceHandle, PulseError> {
        let beat = self.clock.current_beat();
        self.animator.register_instance(placement, profile, beat)
    }

    pub fn retire_instance(&mut self, placement: PlacementId) {
        self.animator.retire_instance(placement);
    }

    /// Apply one queued command
    pub fn apply(&mut self, command: AnimatorCommand) -> Result<(), PulseError> {
        match command {
            AnimatorCommand::Register { placement, profile } => {
                self.register_instance(placement, profile).map(|_| ())
            }
            AnimatorCommand::RegisterTile { placement, tile } => {
                self.register_tile(placement, tile).map(|_| ())
            }
            AnimatorCommand::Retire(placement) => {
                self.retire_instance(placement);
                Ok(())
            }
            AnimatorCommand::SetTempo(bpm) => self.clock.set_tempo(bpm),
            AnimatorCommand::SyncAudio(position_secs) => {
                self.clock.reconcile(position_secs, &self.config.clock);
                Ok(())
            }
        }
    }

    /// Drain and apply every queued command.
    ///
    /// Failed commands are logged and returned; they never stop the drain.
    pub fn apply_commands(&mut self, receiver: &CommandReceiver) -> Vec<PulseError> {
        let mut errors = Vec::new();
        for command in receiver.drain() {
            if let Err(err) = self.apply(command) {
                log::warn!("Dropped pulse command: {}", err);
                errors.push(err);
            }
        }
        errors
    }

    /// Accumulate `delta_secs` and correct drift against the audio position
    /// if one is known. Returns the new beat.
    pub fn advance_clock(&mut self, delta_secs: f64, audio_position_secs: Option<f64>) -> f64 {
        self.clock.advance(delta_secs);
        if let Some(position) = audio_position_secs {
            if self.clock.reconcile(position, &self.config.clock) == Reconcile::Snapped {
                log::info!("Pulse clock resynced to beat {:.3}", self.clock.current_beat());
            }
        }
        self.clock.current_beat()
    }

    /// Tick every instance at the current beat without moving the clock
    pub fn tick(&mut self) -> Tick<'_> {
        self.animator.tick(self.clock.current_beat())
    }

    /// Advance one frame: move the clock, then tick every instance
    pub fn update(&mut self, delta_secs: f64, audio_position_secs: Option<f64>) -> Tick<'_> {
        self.advance_clock(delta_secs, audio_position_secs);
        self.tick()
    }
}
