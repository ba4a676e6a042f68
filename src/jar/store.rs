//! In-memory entry store: canonical host → entry id → entry

use super::entry::{file_order, Entry};
use crate::codec::{CodecError, EncryptionKey};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub(crate) struct EntryStore {
    hosts: BTreeMap<String, BTreeMap<String, Entry>>,
}

impl EntryStore {
    pub(crate) fn len(&self) -> usize {
        self.hosts.values().map(BTreeMap::len).sum()
    }

    pub(crate) fn get(&self, host: &str, id: &str) -> Option<&Entry> {
        self.hosts.get(host).and_then(|submap| submap.get(id))
    }

    pub(crate) fn get_mut(&mut self, host: &str, id: &str) -> Option<&mut Entry> {
        self.hosts.get_mut(host).and_then(|submap| submap.get_mut(id))
    }

    /// Insert or replace unconditionally
    pub(crate) fn insert(&mut self, entry: Entry) {
        self.hosts
            .entry(entry.canonical_host.clone())
            .or_default()
            .insert(entry.id(), entry);
    }

    /// Merge one entry; the newer `updated` wins. Returns whether it was taken.
    pub(crate) fn merge(&mut self, entry: Entry) -> bool {
        let submap = self.hosts.entry(entry.canonical_host.clone()).or_default();
        let id = entry.id();
        let newer = submap
            .get(&id)
            .is_none_or(|existing| entry.updated > existing.updated);
        if newer {
            submap.insert(id, entry);
        }
        newer
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.hosts.values_mut().flat_map(BTreeMap::values_mut)
    }

    /// Drop entries that expired at or before `now`. Returns how many.
    pub(crate) fn delete_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.len();
        for submap in self.hosts.values_mut() {
            submap.retain(|_, e| !e.is_expired(now));
        }
        self.hosts.retain(|_, submap| !submap.is_empty());
        before - self.len()
    }

    /// Every entry in file order
    pub(crate) fn all_entries(&self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .hosts
            .values()
            .flat_map(BTreeMap::values)
            .cloned()
            .collect();
        entries.sort_by(file_order);
        entries
    }

    /// Persistent entries in file order, values sealed under `key` if given
    pub(crate) fn persistent_entries(
        &self,
        key: Option<&EncryptionKey>,
    ) -> Result<Vec<Entry>, CodecError> {
        let mut entries = Vec::new();
        for entry in self.hosts.values().flat_map(BTreeMap::values) {
            if !entry.persistent {
                continue;
            }
            let mut entry = entry.clone();
            if let Some(key) = key {
                if !entry.is_sealed() {
                    entry.encrypted_value = key.encrypt(&entry.value)?;
                }
                entry.value.clear();
            }
            entries.push(entry);
        }
        entries.sort_by(file_order);
        Ok(entries)
    }
}
