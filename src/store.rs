//! In-memory keystroke table backed by a spreadsheet file.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::entry::Entry;
use crate::error::Result;
use crate::identity::IdentityMap;
use crate::keystroke::KeystrokeEvent;
use crate::loader;
use crate::saving;
use crate::timing::TimingProfile;

/// The keystroke table and the email to ID map built over it.
///
/// Every successful [`KeystrokeStore::submit`] rewrites the whole file.
/// Callers sharing a store across threads wrap it in a mutex so that
/// assigning an ID, appending the row and flushing happen as one step.
#[derive(Debug)]
pub struct KeystrokeStore {
    path: PathBuf,
    entries: Vec<Entry>,
    identities: IdentityMap,
}

impl KeystrokeStore {
    /// Open the table stored at `path`.
    ///
    /// A missing file gives an empty table and nothing is written until the
    /// first submission. Any other read failure is returned.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            loader::from_excel(&path)?
        } else {
            debug!(path = %path.display(), "no spreadsheet yet, starting empty");
            Vec::new()
        };

        let identities =
            IdentityMap::from_rows(entries.iter().map(|e| (e.email.as_str(), e.id)));

        info!(
            rows = entries.len(),
            users = identities.len(),
            next_id = identities.next_id(),
            path = %path.display(),
            "keystroke table loaded"
        );

        Ok(KeystrokeStore {
            path,
            entries,
            identities,
        })
    }

    /// Record one form submission and flush the table.
    ///
    /// The email keeps its existing ID when it has one. A resubmission still
    /// appends a fresh row, so the table can hold several rows per ID.
    ///
    /// A row that cannot be written is never kept: an oversized cell is
    /// rejected before anything changes, and a failed flush drops the row
    /// again and hands a fresh ID back, so memory always matches the file.
    pub fn submit(
        &mut self,
        username: &str,
        email: &str,
        events: &[KeystrokeEvent],
    ) -> Result<&Entry> {
        let profile = TimingProfile::from_events(events);
        let (id, is_new) = self.identities.assign(email)?;
        let entry = Entry::new(id, username, email, profile);

        if let Err(err) = saving::check_entry(&entry) {
            self.rollback(email, id, is_new);
            return Err(err);
        }

        info!(
            id,
            new_user = is_new,
            events = events.len(),
            pairs = entry.total_press_release_timings,
            "recording submission"
        );

        self.entries.push(entry);
        if let Err(err) = self.flush() {
            warn!(id, error = %err, "flush failed, dropping submission");
            self.entries.pop();
            self.rollback(email, id, is_new);
            return Err(err);
        }

        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    fn rollback(&mut self, email: &str, id: u32, is_new: bool) {
        if is_new {
            self.identities.revoke(email, id);
        }
    }

    /// Write the whole table to the backing file.
    pub fn flush(&self) -> Result<()> {
        saving::save_entries(&self.entries, &self.path)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn id_for(&self, email: &str) -> Option<u32> {
        self.identities.get(email)
    }

    pub fn next_id(&self) -> u32 {
        self.identities.next_id()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
