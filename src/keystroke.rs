use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Direction of a single key event as reported by the browser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    /// `keydown`
    Press,
    /// `keyup`
    Release,
}

/// One raw event captured by the form's client-side script.
///
/// `time` is a millisecond timestamp. Browsers report it as a float, so it is
/// kept as `f64` and never rounded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeystrokeEvent {
    pub key: String,
    pub action: KeyAction,
    pub time: f64,
}

impl KeystrokeEvent {
    pub fn new(key: impl Into<String>, action: KeyAction, time: f64) -> Self {
        KeystrokeEvent {
            key: key.into(),
            action,
            time,
        }
    }

    pub fn press(key: impl Into<String>, time: f64) -> Self {
        Self::new(key, KeyAction::Press, time)
    }

    pub fn release(key: impl Into<String>, time: f64) -> Self {
        Self::new(key, KeyAction::Release, time)
    }

    pub fn is_press(&self) -> bool {
        self.action == KeyAction::Press
    }

    pub fn is_release(&self) -> bool {
        self.action == KeyAction::Release
    }
}

/// Decode the `keystrokes` form field.
///
/// The field is a JSON array of `{key, action, time}` objects. Order is kept
/// exactly as submitted.
///
/// # Errors
/// * `Error::Keystrokes` if the text is not valid JSON, an object lacks a
///   field, or `action` is neither `"press"` nor `"release"`
pub fn parse_keystrokes(json: &str) -> Result<Vec<KeystrokeEvent>> {
    let events: Vec<KeystrokeEvent> = serde_json::from_str(json)?;
    Ok(events)
}
