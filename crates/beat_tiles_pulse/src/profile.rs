//! Pulse profiles: validated pulse parameters shared by every placed tile of a type

use crate::{ProfileIssue, PulseError};
use beat_tiles_core::{PropertyValue, TileCatalog, TileDefinition, TileId, TileKind};
use std::collections::HashMap;
use std::fmt;

/// Number of grow/shrink cycles per beat
pub const PULSE_PER_BEAT: &str = "pulsePerBeat";
/// Peak size multiplier
pub const PULSE_SCALE: &str = "pulseScale";
/// Fraction of the pulse amplitude lost per elapsed beat
pub const SHRINK_RATE: &str = "shrinkRate";

/// Immutable pulse parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseProfile {
    pulses_per_beat: f64,
    peak_scale: f64,
    decay_per_beat: f64,
}

impl PulseProfile {
    /// Create a profile, checking `pulses_per_beat > 0`, `peak_scale >= 1`
    /// and `decay_per_beat >= 0`
    pub fn new(
        pulses_per_beat: f64,
        peak_scale: f64,
        decay_per_beat: f64,
    ) -> Result<Self, ProfileIssue> {
        if !(pulses_per_beat.is_finite() && pulses_per_beat > 0.0) {
            return Err(ProfileIssue::OutOfRange {
                property: PULSE_PER_BEAT,
                value: pulses_per_beat,
                expected: "a positive number",
            });
        }
        if !(peak_scale.is_finite() && peak_scale >= 1.0) {
            return Err(ProfileIssue::OutOfRange {
                property: PULSE_SCALE,
                value: peak_scale,
                expected: "a number >= 1.0",
            });
        }
        if !(decay_per_beat.is_finite() && decay_per_beat >= 0.0) {
            return Err(ProfileIssue::OutOfRange {
                property: SHRINK_RATE,
                value: decay_per_beat,
                expected: "a non-negative number",
            });
        }
        Ok(Self {
            pulses_per_beat,
            peak_scale,
            decay_per_beat,
        })
    }

    pub fn pulses_per_beat(&self) -> f64 {
        self.pulses_per_beat
    }

    pub fn peak_scale(&self) -> f64 {
        self.peak_scale
    }

    pub fn decay_per_beat(&self) -> f64 {
        self.decay_per_beat
    }

    /// Beats for one full grow/shrink cycle
    pub fn cycle_beats(&self) -> f64 {
        1.0 / self.pulses_per_beat
    }

    /// Scale `elapsed_beats` after the pulse started
    pub fn scale_at(&self, elapsed_beats: f64) -> f64 {
        self.scale_with(elapsed_beats, elapsed_beats)
    }

    /// Scale with separate clocks for the cycle phase and the decay.
    ///
    /// Negative inputs count as zero and non-finite ones give the rest scale.
    /// The result is always within `[1.0, peak_scale]`.
    pub fn scale_with(&self, phase_beats: f64, decay_beats: f64) -> f64 {
        if !phase_beats.is_finite() || !decay_beats.is_finite() {
            return 1.0;
        }
        let phase_beats = phase_beats.max(0.0);
        let decay_beats = decay_beats.max(0.0);

        let cycle_phase = (phase_beats * self.pulses_per_beat).fract();
        let triangle = 1.0 - (2.0 * cycle_phase - 1.0).abs();
        let decay = (1.0 - self.decay_per_beat * decay_beats).max(0.0);

        (1.0 + (self.peak_scale - 1.0) * triangle * decay).clamp(1.0, self.peak_scale)
    }
}

fn float_property(definition: &TileDefinition, name: &'static str) -> Result<f64, ProfileIssue> {
    match definition.property(name) {
        None => Err(ProfileIssue::MissingProperty(name)),
        Some(PropertyValue::Float(f)) => Ok(*f),
        Some(PropertyValue::Int(i)) => Ok(*i as f64),
        Some(other) => Err(ProfileIssue::WrongType {
            property: name,
            found: other.property_type(),
        }),
    }
}

/// Build the pulse profile declared by a tile definition
pub fn build_profile(definition: &TileDefinition) -> Result<PulseProfile, PulseError> {
    let profile = || -> Result<PulseProfile, ProfileIssue> {
        if definition.kind() != TileKind::Pulse {
            return Err(ProfileIssue::NotPulse {
                class: definition.class.clone(),
            });
        }
        PulseProfile::new(
            float_property(definition, PULSE_PER_BEAT)?,
            float_property(definition, PULSE_SCALE)?,
            float_property(definition, SHRINK_RATE)?,
        )
    };

    profile().map_err(|issue| PulseError::InvalidProfile {
        tile: definition.id,
        issue,
    })
}

/// Index of a profile in a [`ProfileTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileId(pub u32);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a tile behaves once placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileBehavior {
    Static,
    Pulse(ProfileId),
}

/// Read-only table of pulse profiles, with the tile-to-profile mapping
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    profiles: Vec<PulseProfile>,
    by_tile: HashMap<TileId, ProfileId>,
}

impl ProfileTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build profiles for every pulse tile in a catalog.
    ///
    /// Tiles with malformed pulse properties are left out (they behave as
    /// static tiles) and returned with the reason.
    pub fn from_catalog(catalog: &impl TileCatalog) -> (Self, Vec<(TileId, PulseError)>) {
        let mut table = Self::new();
        let mut rejected = Vec::new();

        for (tile, definition) in catalog.definitions() {
            if !definition.is_pulse() {
                continue;
            }
            match build_profile(definition) {
                Ok(profile) => {
                    let id = table.insert(profile);
                    table.by_tile.insert(tile, id);
                }
                Err(err) => {
                    log::warn!("Tile {} will not pulse: {}", tile, err);
                    rejected.push((tile, err));
                }
            }
        }

        log::debug!(
            "Built {} pulse profiles for {} tiles",
            table.profiles.len(),
            table.by_tile.len()
        );
        (table, rejected)
    }

    /// Add a profile, reusing the id of an identical one
    pub fn insert(&mut self, profile: PulseProfile) -> ProfileId {
        if let Some(pos) = self.profiles.iter().position(|p| *p == profile) {
            return ProfileId(pos as u32);
        }
        self.profiles.push(profile);
        ProfileId(self.profiles.len() as u32 - 1)
    }

    /// Make a tile use a profile
    pub fn bind_tile(&mut self, tile: TileId, profile: ProfileId) -> Result<(), PulseError> {
        if self.get(profile).is_none() {
            return Err(PulseError::UnknownProfile(profile));
        }
        self.by_tile.insert(tile, profile);
        Ok(())
    }

    /// Get a profile by id
    pub fn get(&self, id: ProfileId) -> Option<&PulseProfile> {
        self.profiles.get(id.0 as usize)
    }

    /// Get the profile used by a tile, if it pulses
    pub fn profile_for_tile(&self, tile: TileId) -> Option<ProfileId> {
        self.by_tile.get(&tile).copied()
    }

    /// Get the behavior of a tile
    pub fn behavior(&self, tile: TileId) -> TileBehavior {
        match self.profile_for_tile(tile) {
            Some(id) => TileBehavior::Pulse(id),
            None => TileBehavior::Static,
        }
    }

    /// Number of distinct profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
