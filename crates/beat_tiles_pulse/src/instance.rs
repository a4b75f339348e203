//! Per-placement pulse state

use crate::{AnimationConfig, DecayReference, PhaseAnchor, ProfileId, PulseProfile};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a placed tile, supplied by the world/level system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementId(pub u64);

impl fmt::Display for PlacementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a pulse instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Registered, not ticked yet
    Spawned,
    /// Scale follows the pulse
    Animating,
    /// Retired; reported once more with its last scale
    Retiring,
    /// Reported after retirement; dropped at the next maintenance pass
    Removed,
}

/// Handle returned by registration
///
/// Handles of an earlier registration of the same placement resolve to
/// nothing once the placement is registered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    pub placement: PlacementId,
    pub(crate) serial: u64,
}

/// A placed, animating tile
#[derive(Debug, Clone, PartialEq)]
pub struct PulseInstance {
    placement: PlacementId,
    profile: ProfileId,
    spawn_beat: f64,
    current_scale: f64,
    state: InstanceState,
    serial: u64,
}

impl PulseInstance {
    pub(crate) fn new(placement: PlacementId, profile: ProfileId, spawn_beat: f64, serial: u64) -> Self {
        Self {
            placement,
            profile,
            spawn_beat,
            current_scale: 1.0,
            state: InstanceState::Spawned,
            serial,
        }
    }

    pub fn placement(&self) -> PlacementId {
        self.placement
    }

    pub fn profile(&self) -> ProfileId {
        self.profile
    }

    /// Beat at which this instance started pulsing
    pub fn spawn_beat(&self) -> f64 {
        self.spawn_beat
    }

    /// Last computed scale multiplier (1.0 before the first tick)
    pub fn current_scale(&self) -> f64 {
        self.current_scale
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn handle(&self) -> InstanceHandle {
        InstanceHandle {
            placement: self.placement,
            serial: self.serial,
        }
    }

    /// Spawned or animating; retired instances are not alive
    pub fn is_alive(&self) -> bool {
        matches!(self.state, InstanceState::Spawned | InstanceState::Animating)
    }

    /// Beats since spawn, zero if `current_beat` is before the spawn beat
    pub fn elapsed_beats(&self, current_beat: f64) -> f64 {
        (current_beat - self.spawn_beat).max(0.0)
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    /// Recompute the scale for `current_beat`
    pub(crate) fn update(
        &mut self,
        profile: &PulseProfile,
        current_beat: f64,
        config: &AnimationConfig,
    ) -> f64 {
        // Registered ahead of a stale beat: rest until time catches up
        self.current_scale = if current_beat < self.spawn_beat || !current_beat.is_finite() {
            1.0
        } else {
            let elapsed = self.elapsed_beats(current_beat);
            let phase_beats = match config.phase_anchor {
                PhaseAnchor::Spawn => elapsed,
                PhaseAnchor::Song => current_beat,
            };
            let decay_beats = match config.decay_reference {
                DecayReference::SinceSpawn => elapsed,
                DecayReference::SongBeat => current_beat,
            };
            profile.scale_with(phase_beats, decay_beats)
        };
        self.state = InstanceState::Animating;
        self.current_scale
    }

    /// Start retiring. Returns false if already retiring or removed.
    pub(crate) fn retire(&mut self) -> bool {
        if self.is_alive() {
            self.state = InstanceState::Retiring;
            true
        } else {
            false
        }
    }

    pub(crate) fn mark_removed(&mut self) {
        self.state = InstanceState::Removed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PulseProfile {
        PulseProfile::new(1.0, 1.1, 0.01).unwrap()
    }

    #[test]
    fn test_new_instance_is_at_rest() {
        let instance = PulseInstance::new(PlacementId(4), ProfileId(0), 2.0, 0);
        assert_eq!(instance.current_scale(), 1.0);
        assert_eq!(instance.state(), InstanceState::Spawned);
        assert!(instance.is_alive());
        assert_eq!(instance.elapsed_beats(1.0), 0.0);
        assert_eq!(instance.elapsed_beats(3.5), 1.5);
    }

    #[test]
    fn test_update_measures_from_spawn() {
        let mut instance = PulseInstance::new(PlacementId(1), ProfileId(0), 10.0, 0);
        let config = AnimationConfig::default();

        assert_eq!(instance.update(&profile(), 10.0, &config), 1.0);
        assert_eq!(instance.state(), InstanceState::Animating);
        let scale = instance.update(&profile(), 10.5, &config);
        assert!((scale - 1.0995).abs() < 1e-12);
    }

    #[test]
    fn test_future_spawn_rests() {
        let mut instance = PulseInstance::new(PlacementId(1), ProfileId(0), 10.0, 0);
        let config = AnimationConfig {
            decay_reference: DecayReference::SongBeat,
            phase_anchor: PhaseAnchor::Song,
        };
        assert_eq!(instance.update(&profile(), 9.5, &config), 1.0);
    }

    #[test]
    fn test_song_anchor_joins_shared_pulse() {
        let config = AnimationConfig {
            decay_reference: DecayReference::SinceSpawn,
            phase_anchor: PhaseAnchor::Song,
        };
        let no_decay = PulseProfile::new(1.0, 1.5, 0.0).unwrap();
        let mut early = PulseInstance::new(PlacementId(1), ProfileId(0), 0.0, 0);
        let mut late = PulseInstance::new(PlacementId(2), ProfileId(0), 7.25, 1);

        assert_eq!(
            early.update(&no_decay, 7.5, &config),
            late.update(&no_decay, 7.5, &config)
        );
        assert_eq!(late.current_scale(), 1.5);
    }

    #[test]
    fn test_song_beat_decay_fades_in_lockstep() {
        let config = AnimationConfig {
            decay_reference: DecayReference::SongBeat,
            phase_anchor: PhaseAnchor::Spawn,
        };
        let fast_decay = PulseProfile::new(1.0, 1.5, 0.1).unwrap();
        let mut late = PulseInstance::new(PlacementId(2), ProfileId(0), 20.0, 0);

        // Song beat 20.5 is past the point where amplitude reaches zero
        assert_eq!(late.update(&fast_decay, 20.5, &config), 1.0);

        let mut fresh = PulseInstance::new(PlacementId(3), ProfileId(0), 20.0, 1);
        let scale = fresh.update(&fast_decay, 20.5, &AnimationConfig::default());
        assert!((scale - 1.475).abs() < 1e-12);
    }

    #[test]
    fn test_retire_once() {
        let mut instance = PulseInstance::new(PlacementId(1), ProfileId(0), 0.0, 0);
        assert!(instance.retire());
        assert!(!instance.retire());
        assert_eq!(instance.state(), InstanceState::Retiring);
        assert!(!instance.is_alive());
    }
}
