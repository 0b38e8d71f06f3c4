use serde::{Deserialize, Serialize};

use crate::keystroke::KeystrokeEvent;

/// Derived timings for one submission.
///
/// Built by a single scan over adjacent event pairs:
/// - every pair contributes `next.time - current.time` to `hold_times`
/// - a press immediately followed by a release also contributes the same
///   difference to `flight_times`, the two timestamps to
///   `press_release_timings` and the two key names to `key_combinations`
///
/// Durations are not clamped, so out-of-order timestamps give negative values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingProfile {
    pub hold_times: Vec<f64>,
    pub flight_times: Vec<f64>,
    pub press_release_timings: Vec<(f64, f64)>,
    pub key_combinations: Vec<(String, String)>,
}

impl TimingProfile {
    pub fn from_events(events: &[KeystrokeEvent]) -> Self {
        let mut profile = TimingProfile::default();

        for pair in events.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            let elapsed = next.time - current.time;
            profile.hold_times.push(elapsed);

            if current.is_press() && next.is_release() {
                profile.flight_times.push(elapsed);
                profile.press_release_timings.push((current.time, next.time));
                profile
                    .key_combinations
                    .push((current.key.clone(), next.key.clone()));
            }
        }

        profile
    }

    pub fn total_hold_time(&self) -> f64 {
        self.hold_times.iter().sum()
    }

    pub fn total_flight_time(&self) -> f64 {
        self.flight_times.iter().sum()
    }

    pub fn press_release_count(&self) -> usize {
        self.press_release_timings.len()
    }

    pub fn key_combination_count(&self) -> usize {
        self.key_combinations.len()
    }
}
