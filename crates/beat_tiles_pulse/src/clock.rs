//! Beat clock: wall/audio time to a continuous beat position

use crate::{ClockConfig, PulseError};

/// Outcome of reconciling the clock against the audio position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconcile {
    /// The clock kept its value (paused, or the audio was slightly behind)
    Held,
    /// The clock moved forward to the audio-derived beat
    Nudged,
    /// The drift exceeded the resync threshold and the clock jumped
    Snapped,
}

/// Tempo used when none is given
pub const DEFAULT_BPM: f64 = 120.0;

/// Converts elapsed seconds into a monotonically increasing beat count
///
/// The beat count only goes backward through [`BeatClock::seek`] (or a
/// [`Reconcile::Snapped`] resync, which is a seek).
#[derive(Debug, Clone, PartialEq)]
pub struct BeatClock {
    bpm: f64,
    beat: f64,
    paused: bool,
    /// Song time (seconds) and beat at which the current tempo took effect
    anchor_secs: f64,
    anchor_beat: f64,
}

fn check_tempo(bpm: f64) -> Result<(), PulseError> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(())
    } else {
        Err(PulseError::InvalidTempo(bpm))
    }
}

impl Default for BeatClock {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            beat: 0.0,
            paused: false,
            anchor_secs: 0.0,
            anchor_beat: 0.0,
        }
    }
}

impl BeatClock {
    /// Create a running clock at beat 0
    pub fn new(bpm: f64) -> Result<Self, PulseError> {
        check_tempo(bpm)?;
        Ok(Self {
            bpm,
            ..Self::default()
        })
    }

    /// Tempo in beats per minute
    pub fn tempo(&self) -> f64 {
        self.bpm
    }

    /// Length of one beat in seconds at the current tempo
    pub fn beat_duration_secs(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Current beat position
    pub fn current_beat(&self) -> f64 {
        self.beat
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Change the rate of future accumulation. Beats already counted are kept.
    ///
    /// Audio positions after the change are mapped at the new tempo from the
    /// song time of the current beat.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), PulseError> {
        check_tempo(bpm)?;
        if bpm != self.bpm {
            log::debug!("Beat clock tempo {} -> {} bpm at beat {:.3}", self.bpm, bpm, self.beat);
            self.anchor_secs += (self.beat - self.anchor_beat) * 60.0 / self.bpm;
            self.anchor_beat = self.beat;
        }
        self.bpm = bpm;
        Ok(())
    }

    /// Accumulate `delta_secs` of playback and return the current beat.
    ///
    /// Does nothing while paused. Negative or non-finite deltas count as zero.
    pub fn advance(&mut self, delta_secs: f64) -> f64 {
        if !self.paused && delta_secs.is_finite() && delta_secs > 0.0 {
            self.beat += delta_secs * self.bpm / 60.0;
        }
        self.beat
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Jump to a beat position, forward or backward
    pub fn seek(&mut self, beat: f64) -> Result<(), PulseError> {
        if !beat.is_finite() || beat < 0.0 {
            return Err(PulseError::InvalidBeat(beat));
        }
        self.beat = beat;
        Ok(())
    }

    /// Beat position corresponding to an audio playback position, after
    /// latency compensation.
    ///
    /// Positions are mapped at the current tempo from the point where it took
    /// effect; without tempo changes that is the track start.
    pub fn beat_at_position(&self, position_secs: f64, config: &ClockConfig) -> f64 {
        let secs = position_secs - config.audio_latency_secs - config.visual_latency_secs;
        let beat = self.anchor_beat + (secs.max(0.0) - self.anchor_secs) * self.bpm / 60.0;
        beat.max(0.0)
    }

    /// Correct drift against an authoritative audio position.
    ///
    /// Small backward differences are ignored so jitter in the reported
    /// position never moves the beat backward; larger drift in either
    /// direction snaps the clock to the audio.
    pub fn reconcile(&mut self, position_secs: f64, config: &ClockConfig) -> Reconcile {
        if self.paused || !position_secs.is_finite() {
            return Reconcile::Held;
        }

        let target = self.beat_at_position(position_secs, config);
        let drift = target - self.beat;
        if drift.abs() > config.resync_threshold_beats {
            log::debug!(
                "Beat clock drifted {:.3} beats from audio, snapping to {:.3}",
                drift,
                target
            );
            self.beat = target;
            Reconcile::Snapped
        } else if drift > 0.0 {
            self.beat = target;
            Reconcile::Nudged
        } else {
            Reconcile::Held
        }
    }
}
