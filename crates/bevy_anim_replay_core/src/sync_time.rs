use std::fmt;

use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use serde::{Deserialize, Serialize};

/// A position on a sync track: the index of a sync event plus how far through that event we are.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
pub struct SyncTrackTime {
    pub event_idx: i32,
    /// Normalized, `0.0..1.0`
    pub percentage_through: f32,
}

impl SyncTrackTime {
    pub fn new(event_idx: i32, percentage_through: f32) -> Self {
        Self {
            event_idx,
            percentage_through,
        }
    }

    /// Moves this time forward by `delta` seconds on a looping track with the given event
    /// durations. Leftover time carries over into the following events.
    ///
    /// Durations must all be positive. An empty track or a delta that is not a positive finite
    /// number leaves the time unchanged. Whole loops of the track are skipped.
    pub fn advanced(self, delta: f32, durations: &[f32]) -> Self {
        if durations.is_empty() || !(delta > 0. && delta.is_finite()) {
            return self;
        }

        let count = durations.len() as i32;
        let mut event_idx = self.event_idx.rem_euclid(count);
        let mut percentage = self.percentage_through;
        let track_duration: f32 = durations.iter().sum();
        let mut remaining = if delta >= track_duration {
            delta % track_duration
        } else {
            delta
        };

        // At most one lap plus the current event is left to walk.
        for _ in 0..=count {
            let duration = durations[event_idx as usize];
            let left_in_event = (1. - percentage) * duration;
            if remaining < left_in_event {
                percentage += remaining / duration;
                break;
            }
            remaining -= left_in_event;
            event_idx = (event_idx + 1) % count;
            percentage = 0.;
        }

        Self {
            event_idx,
            percentage_through: percentage,
        }
    }

    /// Phase over the whole track, `0.0..1.0`
    pub fn track_phase(&self, event_count: usize) -> f32 {
        if event_count == 0 {
            return 0.;
        }
        (self.event_idx as f32 + self.percentage_through) / event_count as f32
    }
}

impl fmt::Display for SyncTrackTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "( {}, {:.2}% )",
            self.event_idx,
            self.percentage_through * 100.
        )
    }
}

/// Bounds of one graph update, in sync track time.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
pub struct SyncTrackTimeRange {
    pub start: SyncTrackTime,
    pub end: SyncTrackTime,
}

impl SyncTrackTimeRange {
    pub fn new(start: SyncTrackTime, end: SyncTrackTime) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for SyncTrackTimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}
