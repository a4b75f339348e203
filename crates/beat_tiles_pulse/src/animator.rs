//! Pulse animator: owns the active instances and advances them each frame

use crate::{
    AnimationConfig, InstanceHandle, InstanceState, PlacementId, ProfileId, ProfileTable,
    PulseError, PulseInstance, TileBehavior,
};
use beat_tiles_core::TileId;
use std::collections::HashMap;
use std::iter::FusedIterator;

/// Owns every live [`PulseInstance`] and the profiles they read
///
/// All calls happen on the frame thread; hand off requests from other threads
/// through a [`crate::CommandSender`].
#[derive(Debug, Clone, Default)]
pub struct PulseAnimator {
    profiles: ProfileTable,
    config: AnimationConfig,
    instances: Vec<PulseInstance>,
    index: HashMap<PlacementId, usize>,
    next_serial: u64,
    needs_purge: bool,
}

impl PulseAnimator {
    /// Create an animator reading the given profiles
    pub fn new(profiles: ProfileTable, config: AnimationConfig) -> Self {
        Self {
            profiles,
            config,
            ..Default::default()
        }
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Change the animation flags; applies from the next tick
    pub fn set_config(&mut self, config: AnimationConfig) {
        self.config = config;
    }

    /// Swap in a new profile table. Every live instance is retired since its
    /// profile id refers to the old table.
    pub fn replace_profiles(&mut self, profiles: ProfileTable) {
        for instance in &mut self.instances {
            instance.retire();
        }
        self.profiles = profiles;
    }

    /// Number of instances in the active set, including retiring ones
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of alive (not retiring) instances
    pub fn live_count(&self) -> usize {
        self.instances.iter().filter(|i| i.is_alive()).count()
    }

    /// Check if a placement is registered and alive
    pub fn is_registered(&self, placement: PlacementId) -> bool {
        self.instance(placement).is_some_and(|i| i.is_alive())
    }

    /// Get the instance for a placement, alive or retiring
    pub fn instance(&self, placement: PlacementId) -> Option<&PulseInstance> {
        self.index.get(&placement).map(|&idx| &self.instances[idx])
    }

    /// Get the instance a handle was issued for
    pub fn get(&self, handle: InstanceHandle) -> Option<&PulseInstance> {
        self.instance(handle.placement)
            .filter(|i| i.serial() == handle.serial)
    }

    /// Iterate over the active set
    pub fn instances(&self) -> impl Iterator<Item = &PulseInstance> {
        self.instances.iter()
    }

    /// Start animating a placement from `current_beat`.
    ///
    /// Fails if the placement is already registered and alive; the existing
    /// instance is left untouched. A retiring instance for the same placement
    /// is replaced.
    pub fn register_instance(
        &mut self,
        placement: PlacementId,
        profile: ProfileId,
        current_beat: f64,
    ) -> Result<InstanceHandle, PulseError> {
        if self.profiles.get(profile).is_none() {
            return Err(PulseError::UnknownProfile(profile));
        }
        if !current_beat.is_finite() {
            return Err(PulseError::InvalidBeat(current_beat));
        }

        let serial = self.next_serial;
        let instance = PulseInstance::new(placement, profile, current_beat, serial);
        let handle = instance.handle();

        match self.index.get(&placement) {
            Some(&idx) if self.instances[idx].is_alive() => {
                return Err(PulseError::DuplicatePlacement(placement));
            }
            Some(&idx) => {
                log::debug!("Placement {} re-registered while retiring", placement);
                self.instances[idx] = instance;
            }
            None => {
                self.index.insert(placement, self.instances.len());
                self.instances.push(instance);
            }
        }

        self.next_serial += 1;
        log::debug!(
            "Registered placement {} with profile {} at beat {:.3}",
            placement,
            profile,
            current_beat
        );
        Ok(handle)
    }

    /// Register a placed tile by catalog id.
    ///
    /// Returns `Ok(None)` for tiles that do not pulse (static, unknown, or
    /// quarantined at load).
    pub fn register_tile(
        &mut self,
        placement: PlacementId,
        tile: TileId,
        current_beat: f64,
    ) -> Result<Option<InstanceHandle>, PulseError> {
        match self.profiles.behavior(tile) {
            TileBehavior::Static => Ok(None),
            TileBehavior::Pulse(profile) => self
                .register_instance(placement, profile, current_beat)
                .map(Some),
        }
    }

    /// Retire a placement. Unknown or already retired placements are ignored.
    pub fn retire_instance(&mut self, placement: PlacementId) {
        if let Some(&idx) = self.index.get(&placement) {
            if self.instances[idx].retire() {
                log::debug!("Retiring placement {}", placement);
            }
        }
    }

    /// Drop every instance immediately (level unload)
    pub fn clear(&mut self) {
        self.instances.clear();
        self.index.clear();
        self.needs_purge = false;
    }

    /// Advance every instance to `current_beat`.
    ///
    /// The returned iterator yields `(placement, scale)` for each live
    /// instance, plus one last report for each retiring instance with the
    /// scale it had. Retired instances leave the active set when the iterator
    /// is dropped.
    pub fn tick(&mut self, current_beat: f64) -> Tick<'_> {
        self.purge_removed();
        Tick {
            animator: self,
            beat: current_beat,
            cursor: 0,
        }
    }

    fn purge_removed(&mut self) {
        if !self.needs_purge {
            return;
        }
        self.instances
            .retain(|i| i.state() != InstanceState::Removed);
        self.index.clear();
        for (idx, instance) in self.instances.iter().enumerate() {
            self.index.insert(instance.placement(), idx);
        }
        self.needs_purge = false;
    }

    /// Advance the instance at `idx`; `report_retiring` decides whether a
    /// retiring instance is consumed (reported) by this visit
    fn visit(&mut self, idx: usize, beat: f64, report_retiring: bool) -> Option<(PlacementId, f64)> {
        let instance = &mut self.instances[idx];
        match instance.state() {
            InstanceState::Spawned | InstanceState::Animating => {
                let scale = match self.profiles.get(instance.profile()) {
                    Some(profile) => instance.update(profile, beat, &self.config),
                    None => instance.current_scale(),
                };
                Some((instance.placement(), scale))
            }
            InstanceState::Retiring if report_retiring => {
                instance.mark_removed();
                self.needs_purge = true;
                Some((instance.placement(), instance.current_scale()))
            }
            InstanceState::Retiring | InstanceState::Removed => None,
        }
    }
}

/// One frame of pulse updates, produced by [`PulseAnimator::tick`]
///
/// Single pass, not restartable. Dropping it early still advances the
/// remaining live instances; retiring instances that were not reached are
/// reported by the next tick instead.
pub struct Tick<'a> {
    animator: &'a mut PulseAnimator,
    beat: f64,
    cursor: usize,
}

impl Tick<'_> {
    /// Beat this tick advances to
    pub fn beat(&self) -> f64 {
        self.beat
    }
}

impl Iterator for Tick<'_> {
    type Item = (PlacementId, f64);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.animator.instances.len() {
            let idx = self.cursor;
            self.cursor += 1;
            if let Some(item) = self.animator.visit(idx, self.beat, true) {
                return Some(item);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.animator.instances.len() - self.cursor;
        (0, Some(remaining))
    }
}

impl FusedIterator for Tick<'_> {}

impl Drop for Tick<'_> {
    fn drop(&mut self) {
        while self.cursor < self.animator.instances.len() {
            let idx = self.cursor;
            self.cursor += 1;
            self.animator.visit(idx, self.beat, false);
        }
        self.animator.purge_removed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecayReference, PhaseAnchor, PulseProfile};

    fn animator() -> (PulseAnimator, ProfileId) {
        let mut profiles = ProfileTable::new();
        let id = profiles.insert(PulseProfile::new(1.0, 1.1, 0.01).unwrap());
        (PulseAnimator::new(profiles, AnimationConfig::default()), id)
    }

    fn collect(animator: &mut PulseAnimator, beat: f64) -> Vec<(PlacementId, f64)> {
        animator.tick(beat).collect()
    }

    #[test]
    fn test_register_and_tick() {
        let (mut animator, profile) = animator();
        let handle = animator
            .register_instance(PlacementId(1), profile, 0.0)
            .unwrap();
        assert_eq!(animator.get(handle).unwrap().current_scale(), 1.0);

        let frame = collect(&mut animator, 0.0);
        assert_eq!(frame, vec![(PlacementId(1), 1.0)]);

        let frame = collect(&mut animator, 0.5);
        assert_eq!(frame.len(), 1);
        assert!((frame[0].1 - 1.0995).abs() < 1e-12);
        assert_eq!(
            animator.instance(PlacementId(1)).unwrap().state(),
            InstanceState::Animating
        );
    }

    #[test]
    fn test_late_spawn_starts_its_own_cycle() {
        let (mut animator, profile) = animator();
        animator.register_instance(PlacementId(1), profile, 0.0).unwrap();
        animator.register_instance(PlacementId(2), profile, 3.5).unwrap();

        let frame = collect(&mut animator, 3.5);
        assert!(frame[0].1 > 1.0);
        assert_eq!(frame[1], (PlacementId(2), 1.0));
    }

    #[test]
    fn test_instance_registered_ahead_of_stale_beat_rests() {
        let (mut animator, profile) = animator();
        animator.register_instance(PlacementId(1), profile, 8.0).unwrap();
        assert_eq!(collect(&mut animator, 7.5), vec![(PlacementId(1), 1.0)]);
        assert!(collect(&mut animator, 8.5)[0].1 > 1.0);
    }

    #[test]
    fn test_non_finite_beat_ticks_at_rest() {
        let (mut animator, profile) = animator();
        animator.register_instance(PlacementId(1), profile, 0.0).unwrap();
        assert_eq!(collect(&mut animator, f64::INFINITY), vec![(PlacementId(1), 1.0)]);
        assert_eq!(collect(&mut animator, f64::NAN), vec![(PlacementId(1), 1.0)]);
        assert!(collect(&mut animator, 0.5)[0].1 > 1.0);
    }

    #[test]
    fn test_duplicate_placement_rejected() {
        let (mut animator, profile) = animator();
        let first = animator.register_instance(PlacementId(7), profile, 1.0).unwrap();
        collect(&mut animator, 1.25);
        let before = animator.instance(PlacementId(7)).unwrap().clone();

        assert_eq!(
            animator.register_instance(PlacementId(7), profile, 2.0),
            Err(PulseError::DuplicatePlacement(PlacementId(7)))
        );
        assert_eq!(animator.len(), 1);
        assert_eq!(animator.get(first), Some(&before));
    }

    #[test]
    fn test_unknown_profile_rejected() {
        let (mut animator, _) = animator();
        assert_eq!(
            animator.register_instance(PlacementId(1), ProfileId(9), 0.0),
            Err(PulseError::UnknownProfile(ProfileId(9)))
        );
        assert!(animator.register_instance(PlacementId(1), ProfileId(0), f64::NAN).is_err());
        assert!(animator.is_empty());
    }

    #[test]
    fn test_retired_instance_reported_once_more() {
        let (mut animator, profile) = animator();
        animator.register_instance(PlacementId(1), profile, 0.0).unwrap();
        animator.register_instance(PlacementId(2), profile, 0.0).unwrap();
        let frame = collect(&mut animator, 0.25);
        let last_scale = frame[0].1;

        animator.retire_instance(PlacementId(1));
        assert!(!animator.is_registered(PlacementId(1)));
        assert_eq!(animator.len(), 2);

        // Final report keeps the scale it had, no popping mid-pulse
        let frame = collect(&mut animator, 0.5);
        assert_eq!(frame[0], (PlacementId(1), last_scale));
        assert_eq!(frame.len(), 2);
        assert_eq!(animator.len(), 1);

        let frame = collect(&mut animator, 0.75);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].0, PlacementId(2));
    }

    #[test]
    fn test_retire_is_idempotent() {
        let (mut animator, profile) = animator();
        animator.register_instance(PlacementId(1), profile, 0.0).unwrap();

        animator.retire_instance(PlacementId(1));
        animator.retire_instance(PlacementId(1));
        assert_eq!(collect(&mut animator, 1.0).len(), 1);
        assert!(animator.is_empty());

        // Retiring after removal is still a no-op
        animator.retire_instance(PlacementId(1));
        assert!(collect(&mut animator, 2.0).is_empty());
    }

    #[test]
    fn test_retire_unknown_placement_is_noop() {
        let (mut animator, profile) = animator();
        animator.register_instance(PlacementId(1), profile, 0.0).unwrap();
        animator.retire_instance(PlacementId(99));
        assert_eq!(animator.len(), 1);
        assert_eq!(animator.live_count(), 1);
    }

    #[test]
    fn test_reregister_while_retiring_replaces() {
        let (mut animator, profile) = animator();
        let old = animator.register_instance(PlacementId(1), profile, 0.0).unwrap();
        animator.retire_instance(PlacementId(1));

        let new = animator.register_instance(PlacementId(1), profile, 2.0).unwrap();
        assert_ne!(old, new);
        assert!(animator.get(old).is_none());
        assert_eq!(animator.get(new).unwrap().spawn_beat(), 2.0);
        assert_eq!(animator.len(), 1);
        assert_eq!(collect(&mut animator, 2.0), vec![(PlacementId(1), 1.0)]);
    }

    #[test]
    fn test_dropping_tick_early_keeps_state_consistent() {
        let (mut animator, profile) = animator();
        for id in 0..4 {
            animator.register_instance(PlacementId(id), profile, 0.0).unwrap();
        }
        animator.retire_instance(PlacementId(3));

        // Only look at the first instance
        let first = animator.tick(0.5).next();
        assert_eq!(first.map(|(id, _)| id), Some(PlacementId(0)));

        // Unvisited live instances were still advanced
        assert!(animator.instance(PlacementId(2)).unwrap().current_scale() > 1.0);
        // The unreached retiring instance is reported by the next tick
        let frame = collect(&mut animator, 0.75);
        assert_eq!(frame.len(), 4);
        assert_eq!(frame[3].0, PlacementId(3));
        assert_eq!(animator.len(), 3);
    }

    #[test]
    fn test_removal_keeps_index_consistent() {
        let (mut animator, profile) = animator();
        for id in 0..5 {
            animator.register_instance(PlacementId(id), profile, 0.0).unwrap();
        }
        animator.retire_instance(PlacementId(0));
        animator.retire_instance(PlacementId(2));
        collect(&mut animator, 0.5);

        assert_eq!(animator.len(), 3);
        for id in [1, 3, 4] {
            assert_eq!(
                animator.instance(PlacementId(id)).unwrap().placement(),
                PlacementId(id)
            );
        }
        assert!(animator.instance(PlacementId(2)).is_none());
        assert!(animator.register_instance(PlacementId(2), profile, 1.0).is_ok());
    }

    #[test]
    fn test_register_tile_skips_static_tiles() {
        let (mut animator, profile) = animator();
        let mut profiles = animator.profiles().clone();
        profiles.bind_tile(TileId(5), profile).unwrap();
        animator = PulseAnimator::new(profiles, AnimationConfig::default());

        assert!(animator
            .register_tile(PlacementId(1), TileId(5), 0.0)
            .unwrap()
            .is_some());
        assert!(animator
            .register_tile(PlacementId(2), TileId(6), 0.0)
            .unwrap()
            .is_none());
        assert_eq!(animator.len(), 1);
    }

    #[test]
    fn test_replace_profiles_retires_everything() {
        let (mut animator, profile) = animator();
        animator.register_instance(PlacementId(1), profile, 0.0).unwrap();
        collect(&mut animator, 0.5);

        animator.replace_profiles(ProfileTable::new());
        assert_eq!(animator.live_count(), 0);
        // Retiring instances still report without touching the new table
        assert_eq!(collect(&mut animator, 1.0).len(), 1);
        assert!(animator.is_empty());
    }

    #[test]
    fn test_clear_drops_immediately() {
        let (mut animator, profile) = animator();
        animator.register_instance(PlacementId(1), profile, 0.0).unwrap();
        animator.clear();
        assert!(animator.is_empty());
        assert!(collect(&mut animator, 1.0).is_empty());
    }

    #[test]
    fn test_config_flags_apply_on_next_tick() {
        let (mut animator, profile) = animator();
        animator.register_instance(PlacementId(1), profile, 99.75).unwrap();
        // Song beat 100.25 with decay 0.01/beat: amplitude is zero
        animator.set_config(AnimationConfig {
            decay_reference: DecayReference::SongBeat,
            phase_anchor: PhaseAnchor::Spawn,
        });
        assert_eq!(collect(&mut animator, 100.25), vec![(PlacementId(1), 1.0)]);

        animator.set_config(AnimationConfig::default());
        assert!(collect(&mut animator, 100.25)[0].1 > 1.0);
    }
}
