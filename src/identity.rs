use std::collections::HashMap;

use crate::error::{Error, Result};

/// Email to ID assignment.
///
/// IDs start at 1 and only ever grow. An email keeps the ID it was first
/// given for as long as this map lives.
#[derive(Clone, Debug)]
pub struct IdentityMap {
    ids: HashMap<String, u32>,
    next_id: u32,
}

impl Default for IdentityMap {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityMap {
    pub fn new() -> Self {
        IdentityMap {
            ids: HashMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild the map from persisted `(email, id)` rows.
    ///
    /// The counter resumes at the largest ID seen plus one, stopping at
    /// `u32::MAX`. When an email appears on several rows the last one wins.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut map = Self::new();
        for (email, id) in rows {
            map.ids.insert(email.to_string(), id);
            if id >= map.next_id {
                map.next_id = id.saturating_add(1);
            }
        }
        map
    }

    /// Return the ID for `email`, assigning the next one if it is new.
    ///
    /// The flag is `true` when a fresh ID was handed out.
    ///
    /// # Errors
    /// * `Error::IdsExhausted` once the counter has reached `u32::MAX`
    pub fn assign(&mut self, email: &str) -> Result<(u32, bool)> {
        if let Some(&id) = self.ids.get(email) {
            return Ok((id, false));
        }

        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(Error::IdsExhausted)?;
        self.ids.insert(email.to_string(), id);
        Ok((id, true))
    }

    /// Take back `id` from `email` if it was the most recent fresh assignment.
    pub fn revoke(&mut self, email: &str, id: u32) {
        if self.ids.get(email) == Some(&id) && self.next_id.checked_sub(1) == Some(id) {
            self.ids.remove(email);
            self.next_id = id;
        }
    }

    pub fn get(&self, email: &str) -> Option<u32> {
        self.ids.get(email).copied()
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_emails_get_sequential_ids() {
        let mut ids = IdentityMap::new();
        assert_eq!(ids.assign("ada@example.com").unwrap(), (1, true));
        assert_eq!(ids.assign("alan@example.com").unwrap(), (2, true));
        assert_eq!(ids.next_id(), 3);
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_repeated_email_reuses_id() {
        let mut ids = IdentityMap::new();
        let (first, _) = ids.assign("ada@example.com").unwrap();
        ids.assign("alan@example.com").unwrap();
        assert_eq!(ids.assign("ada@example.com").unwrap(), (first, false));
        assert_eq!(ids.next_id(), 3);
    }

    #[test]
    fn test_from_rows_resumes_after_max() {
        let rows = vec![("a@x.io", 4), ("b@x.io", 2), ("a@x.io", 4)];
        let mut ids = IdentityMap::from_rows(rows);

        assert_eq!(ids.next_id(), 5);
        assert_eq!(ids.get("b@x.io"), Some(2));
        assert_eq!(ids.assign("c@x.io").unwrap(), (5, true));
        assert_eq!(ids.assign("a@x.io").unwrap(), (4, false));
    }

    #[test]
    fn test_from_no_rows_starts_at_one() {
        let ids = IdentityMap::from_rows(std::iter::empty());
        assert!(ids.is_empty());
        assert_eq!(ids.next_id(), 1);
    }

    #[test]
    fn test_emails_are_case_sensitive() {
        let mut ids = IdentityMap::new();
        ids.assign("Ada@example.com").unwrap();
        assert_eq!(ids.get("ada@example.com"), None);
    }

    #[test]
    fn test_max_id_does_not_overflow() {
        let mut ids = IdentityMap::from_rows(vec![("last@x.io", u32::MAX)]);

        assert_eq!(ids.next_id(), u32::MAX);
        assert_eq!(ids.assign("last@x.io").unwrap(), (u32::MAX, false));
        assert!(matches!(ids.assign("new@x.io"), Err(Error::IdsExhausted)));
        assert_eq!(ids.get("new@x.io"), None);
    }

    #[test]
    fn test_revoke_undoes_latest_assignment() {
        let mut ids = IdentityMap::new();
        ids.assign("ada@example.com").unwrap();
        let (id, _) = ids.assign("alan@example.com").unwrap();

        ids.revoke("alan@example.com", id);
        assert_eq!(ids.get("alan@example.com"), None);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.assign("grace@example.com").unwrap(), (2, true));
    }

    #[test]
    fn test_revoke_leaves_older_assignments() {
        let mut ids = IdentityMap::new();
        ids.assign("ada@example.com").unwrap();
        ids.assign("alan@example.com").unwrap();

        ids.revoke("ada@example.com", 1);
        assert_eq!(ids.get("ada@example.com"), Some(1));
        assert_eq!(ids.next_id(), 3);
    }
}
