/*!
# Keystroke Form

A small web form that records keystroke timings and keeps them in a
spreadsheet.

## Overview

The browser records every `keydown` and `keyup` in a text box as a
`{key, action, time}` event and posts the list together with a username and
an email address. The server reduces the events to timing statistics, gives
the email a stable numeric ID and appends a row to `keystrokes.xlsx`.

## Architecture

### Frontend
- Single HTML page rendered with handlebars (`src/static/index.html`)
- Inline script collecting key events into a hidden form field

### Backend
- **Timing reducer** - one pass over adjacent event pairs producing hold
  times, flight times, press/release pairs and key combinations
- **Identity map** - email to ID, IDs handed out in increasing order
- **Keystroke store** - in-memory table guarded by a mutex and flushed to
  disk after each submission

### Data Persistence Layer
- One worksheet, one header row, one row per submission
- List columns stored as JSON text
- Written to a temporary file and renamed into place

## Modules

- **keystroke**: raw event type and form field decoding
- **timing**: timing reducer
- **identity**: email to ID assignment
- **entry**: table row and column headers
- **store**: table, identity map and backing file together
- **saving**: XLSX writer
- **loader**: XLSX reader
- **app**: routes and handlers (`web` feature)
- **config**, **logging**, **error**: ambient plumbing

## REST API Endpoints

- `GET /` - the form, echoing an optional `success_message` query parameter
- `POST /submit` - record a submission, then redirect back to `/`
- `GET /download` - the current table as an `.xlsx` attachment
*/

#[cfg(feature = "web")]
pub mod app;
pub mod config;
pub mod entry;
pub mod error;
pub mod identity;
pub mod keystroke;
pub mod loader;
pub mod logging;
pub mod saving;
pub mod store;
pub mod timing;

pub use config::Config;
pub use entry::Entry;
pub use error::{Error, Result};
pub use identity::IdentityMap;
pub use keystroke::{KeyAction, KeystrokeEvent, parse_keystrokes};
pub use logging::{Verbosity, init_logging};
pub use store::KeystrokeStore;
pub use timing::TimingProfile;
