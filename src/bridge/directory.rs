//! Static contact directory.
//!
//! Maps messenger ids to display names (individuals) and IRC channel
//! names (groups). Built once from configuration and shared read-only.

use std::collections::{BTreeSet, HashMap};

use crate::common::error::{RouteError, RouteResult};
use crate::config::types::ContactEntry;

/// Prefix marking a messenger id as a group/channel contact.
pub const CHANNEL_MARKER: char = '#';

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: String,
    pub display_name: String,
}

impl Contact {
    pub fn is_channel(&self) -> bool {
        self.id.starts_with(CHANNEL_MARKER)
    }
}

/// Bidirectional id <-> name lookup.
#[derive(Debug, Default)]
pub struct ContactDirectory {
    /// Entries in configuration order; name lookups scan this.
    contacts: Vec<Contact>,
    /// Index: id -> position in `contacts`.
    by_id: HashMap<String, usize>,
}

impl ContactDirectory {
    /// Build a directory from configured entries.
    ///
    /// Duplicate ids keep the first entry.
    pub fn new(entries: &[ContactEntry]) -> Self {
        let mut contacts = Vec::with_capacity(entries.len());
        let mut by_id = HashMap::with_capacity(entries.len());

        for entry in entries {
            if by_id.contains_key(&entry.id) {
                continue;
            }
            by_id.insert(entry.id.clone(), contacts.len());
            contacts.push(Contact {
                id: entry.id.clone(),
                display_name: entry.name.clone(),
            });
        }

        Self { contacts, by_id }
    }

    pub fn lookup_name_by_id(&self, id: &str) -> RouteResult<&str> {
        self.by_id
            .get(id)
            .map(|&i| self.contacts[i].display_name.as_str())
            .ok_or_else(|| RouteError::contact(id))
    }

    /// Case-insensitive exact match on display name; the first entry wins.
    pub fn lookup_id_by_name(&self, name: &str) -> RouteResult<&str> {
        let wanted = name.to_lowercase();
        self.contacts
            .iter()
            .find(|c| c.display_name.to_lowercase() == wanted)
            .map(|c| c.id.as_str())
            .ok_or_else(|| RouteError::contact(name))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Ids of every group/channel contact.
    pub fn channel_ids(&self) -> BTreeSet<&str> {
        self.channels().map(|c| c.id.as_str()).collect()
    }

    /// IRC channels to join, in configuration order.
    pub fn channels_to_join(&self) -> Vec<&str> {
        self.channels().map(|c| c.display_name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    fn channels(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter().filter(|c| c.is_channel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str) -> ContactEntry {
        ContactEntry {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn make_directory() -> ContactDirectory {
        ContactDirectory::new(&[
            entry("123", "Bob"),
            entry("#dev", "groupA"),
            entry("456", "Alice"),
            entry("#ops", "#ops-chan"),
        ])
    }

    #[test]
    fn test_lookup_name_by_id() {
        let directory = make_directory();
        assert_eq!(directory.lookup_name_by_id("123").unwrap(), "Bob");
        assert!(matches!(
            directory.lookup_name_by_id("999"),
            Err(RouteError::NotFound { .. })
        ));
    }

    #[test]
    fn test_lookup_id_by_name_is_case_insensitive() {
        let directory = make_directory();
        assert_eq!(directory.lookup_id_by_name("Alice").unwrap(), "456");
        assert_eq!(
            directory.lookup_id_by_name("ALICE").unwrap(),
            directory.lookup_id_by_name("Alice").unwrap()
        );
        assert_eq!(directory.lookup_id_by_name("GROUPA").unwrap(), "#dev");
    }

    #[test]
    fn test_lookup_id_by_name_not_found() {
        let directory = make_directory();
        assert!(directory.lookup_id_by_name("Carol").is_err());
        assert!(directory.lookup_id_by_name("Ali").is_err());
    }

    #[test]
    fn test_duplicate_names_resolve_to_first() {
        let directory = ContactDirectory::new(&[entry("111", "Sam"), entry("222", "sam")]);
        assert_eq!(directory.lookup_id_by_name("SAM").unwrap(), "111");
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let directory = ContactDirectory::new(&[entry("111", "Sam"), entry("111", "Other")]);
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.lookup_name_by_id("111").unwrap(), "Sam");
    }

    #[test]
    fn test_channel_ids() {
        let directory = make_directory();
        let ids: Vec<&str> = directory.channel_ids().into_iter().collect();
        assert_eq!(ids, vec!["#dev", "#ops"]);
    }

    #[test]
    fn test_channels_to_join() {
        let directory = make_directory();
        assert_eq!(directory.channels_to_join(), vec!["groupA", "#ops-chan"]);
        assert!(ContactDirectory::default().channels_to_join().is_empty());
    }
}
