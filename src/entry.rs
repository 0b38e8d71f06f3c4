use serde::{Deserialize, Serialize};

use crate::timing::TimingProfile;

/// Column headers of the persisted table, in sheet order.
pub const COLUMNS: [&str; 11] = [
    "ID",
    "Username",
    "Email",
    "Hold Times",
    "Flight Times",
    "Press/Release Timings",
    "Key Combinations",
    "Total Hold Time",
    "Total Flight Time",
    "Total Press/Release Timings",
    "Total Key Combinations",
];

/// One row of the keystroke table.
///
/// Totals are stored rather than recomputed so a reloaded row reports exactly
/// what was written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u32,
    pub username: String,
    pub email: String,
    pub hold_times: Vec<f64>,
    pub flight_times: Vec<f64>,
    pub press_release_timings: Vec<(f64, f64)>,
    pub key_combinations: Vec<(String, String)>,
    pub total_hold_time: f64,
    pub total_flight_time: f64,
    pub total_press_release_timings: usize,
    pub total_key_combinations: usize,
}

impl Entry {
    pub fn new(id: u32, username: &str, email: &str, profile: TimingProfile) -> Self {
        Entry {
            id,
            username: username.to_string(),
            email: email.to_string(),
            total_hold_time: profile.total_hold_time(),
            total_flight_time: profile.total_flight_time(),
            total_press_release_timings: profile.press_release_count(),
            total_key_combinations: profile.key_combination_count(),
            hold_times: profile.hold_times,
            flight_times: profile.flight_times,
            press_release_timings: profile.press_release_timings,
            key_combinations: profile.key_combinations,
        }
    }
}
