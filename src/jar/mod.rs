//! Cookie jar shared between processes through a single JSON file
//!
//! A [`Jar`] keeps entries in memory, grouped by canonical host, behind a
//! mutex. [`Jar::save`] and [`Jar::load`] reconcile that state with the file
//! on disk while holding a cross-process [`FileLock`](crate::lock::FileLock):
//!
//! ```text
//! Save: Idle -> LockAcquired -> Merged -> Rewritten -> Released
//! Load: Idle -> LockAcquired -> Merged -> Released
//! ```
//!
//! Save always merges the current file into memory before truncating and
//! rewriting it, so concurrent writers never lose each other's updates. The
//! newer `Updated` timestamp wins a merge.
//!
//! # Example
//!
//! ```rust,no_run
//! use crumbjar::jar::{Entry, Jar, JarOptions};
//! use chrono::{Duration, Utc};
//!
//! let jar = Jar::open(JarOptions::new().with_path("cookies.json"))?;
//! let now = Utc::now();
//! jar.set_entry(Entry::new("example.com", "/", "sid", "abc", now + Duration::days(7), now));
//! jar.save()?;
//! # Ok::<(), crumbjar::JarError>(())
//! ```

mod entry;
mod persist;
mod store;

pub use entry::{canonical_host, file_order, Entry};

use crate::codec::{CodecError, EncryptionKey};
use crate::error::{JarError, JarResult};
use crate::lock::FileLocker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use entry::entry_id;
use std::sync::{Mutex, MutexGuard, PoisonError};
use store::EntryStore;
use tracing::{debug, warn};

/// When encrypted values read from disk are decrypted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecryptPolicy {
    /// Decrypt while merging; undecryptable entries are skipped
    #[default]
    Eager,
    /// Keep ciphertext in memory, decrypt in [`Jar::value_of`]
    Lazy,
}

impl fmt::Display for DecryptPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager => write!(f, "eager"),
            Self::Lazy => write!(f, "lazy"),
        }
    }
}

/// A non-fatal problem found while reading a cookie file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Valid JSON that is not an array of entries (older format)
    DiscardedFormat { reason: String },
    /// The file could not be read or parsed during a save; its content was ignored
    UnreadableFile { reason: String },
    /// An entry whose value could not be decrypted was skipped
    UndecryptableEntry { id: String, reason: CodecError },
    /// An entry without a canonical host was skipped
    MissingHost { id: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiscardedFormat { reason } => {
                write!(f, "discarding cookies in invalid format: {}", reason)
            }
            Self::UnreadableFile { reason } => {
                write!(f, "cannot read cookie file to merge it; ignoring it: {}", reason)
            }
            Self::UndecryptableEntry { id, reason } => {
                write!(f, "skipping cookie {}: {}", id, reason)
            }
            Self::MissingHost { id } => write!(f, "skipping cookie {} without host", id),
        }
    }
}

/// Outcome of a load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries taken from the file
    pub merged: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcome of a save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Entries taken from the file before rewriting it
    pub merged: usize,
    /// Expired entries dropped
    pub purged: usize,
    /// Entries written
    pub written: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Construction options for a [`Jar`]
#[derive(Debug, Clone, Default)]
pub struct JarOptions {
    /// Cookie file; `None` keeps the jar in memory only
    pub path: Option<PathBuf>,
    /// Key used to encrypt values at rest
    pub key: Option<EncryptionKey>,
    pub decrypt: DecryptPolicy,
    pub locker: FileLocker,
}

impl JarOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_key(mut self, key: EncryptionKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_decrypt(mut self, policy: DecryptPolicy) -> Self {
        self.decrypt = policy;
        self
    }

    pub fn with_locker(mut self, locker: FileLocker) -> Self {
        self.locker = locker;
        self
    }
}

/// Persistent cookie jar
///
/// The store mutex is always taken before the file lock and held for the
/// whole load or save, so calls within one process never interleave.
#[derive(Debug)]
pub struct Jar {
    path: Option<PathBuf>,
    key: Option<EncryptionKey>,
    decrypt: DecryptPolicy,
    locker: FileLocker,
    store: Mutex<EntryStore>,
}

impl Jar {
    /// Create an empty jar without touching the disk
    pub fn new(options: JarOptions) -> Self {
        Self {
            path: options.path,
            key: options.key,
            decrypt: options.decrypt,
            locker: options.locker,
            store: Mutex::new(EntryStore::default()),
        }
    }

    /// Create a jar and load its cookie file
    pub fn open(options: JarOptions) -> JarResult<Self> {
        let jar = Self::new(options);
        let report = jar.load()?;
        debug!("Opened jar with {} entries", report.merged);
        Ok(jar)
    }

    /// Cookie file backing this jar
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether values are encrypted at rest
    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }

    pub fn decrypt_policy(&self) -> DecryptPolicy {
        self.decrypt
    }

    fn store(&self) -> MutexGuard<'_, EntryStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of entries in memory, including session cookies
    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace an entry
    ///
    /// Fills `canonical_host` from the domain when empty.
    pub fn set_entry(&self, mut entry: Entry) {
        if entry.canonical_host.is_empty() {
            entry.canonical_host = canonical_host(&entry.domain);
        }
        self.store().insert(entry);
    }

    /// Look up an entry by identity
    pub fn get(&self, domain: &str, path: &str, name: &str) -> Option<Entry> {
        self.store()
            .get(&canonical_host(domain), &entry_id(domain, path, name))
            .cloned()
    }

    /// Delete a cookie
    ///
    /// The entry is kept as an expired tombstone stamped `now`, so it beats
    /// older copies during the next merge and is purged by the next save.
    /// Returns whether the cookie existed.
    pub fn remove(&self, domain: &str, path: &str, name: &str, now: DateTime<Utc>) -> bool {
        let id = entry_id(domain, path, name);
        let mut store = self.store();
        let Some(entry) = store.get_mut(&canonical_host(domain), &id) else {
            return false;
        };
        entry.expires = DateTime::<Utc>::UNIX_EPOCH;
        entry.updated = now;
        true
    }

    /// Delete every cookie, see [`Jar::remove`]
    pub fn remove_all(&self, now: DateTime<Utc>) -> usize {
        let mut store = self.store();
        let mut removed = 0;
        for entry in store.entries_mut() {
            entry.expires = DateTime::<Utc>::UNIX_EPOCH;
            entry.updated = now;
            removed += 1;
        }
        removed
    }

    /// Drop entries expired at `now` from memory
    pub fn delete_expired(&self, now: DateTime<Utc>) -> usize {
        self.store().delete_expired(now)
    }

    /// Merge entries into the jar; the newer `updated` wins
    ///
    /// Entries without a canonical host, or whose value cannot be decrypted
    /// under the eager policy, are skipped and reported.
    pub fn merge(&self, entries: Vec<Entry>) -> (usize, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let merged = self.merge_into(&mut self.store(), entries, &mut diagnostics);
        (merged, diagnostics)
    }

    fn merge_into(
        &self,
        store: &mut EntryStore,
        entries: Vec<Entry>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> usize {
        let mut merged = 0;
        for mut entry in entries {
            if entry.canonical_host.is_empty() {
                note(diagnostics, Diagnostic::MissingHost { id: entry.id() });
                continue;
            }

            if let (Some(key), DecryptPolicy::Eager) = (&self.key, self.decrypt) {
                if !entry.encrypted_value.is_empty() {
                    match key.decrypt(&entry.encrypted_value) {
                        Ok(value) => {
                            entry.value = value;
                            entry.encrypted_value.clear();
                        }
                        Err(reason) => {
                            note(
                                diagnostics,
                                Diagnostic::UndecryptableEntry {
                                    id: entry.id(),
                                    reason,
                                },
                            );
                            continue;
                        }
                    }
                }
            }

            if store.merge(entry) {
                merged += 1;
            }
        }
        merged
    }

    /// All entries in file order, as held in memory
    pub fn entries(&self) -> Vec<Entry> {
        self.store().all_entries()
    }

    /// Plaintext value of an entry, decrypting it if it is sealed
    pub fn value_of(&self, entry: &Entry) -> JarResult<String> {
        if !entry.is_sealed() {
            return Ok(entry.value.clone());
        }
        let key = self.key.as_ref().ok_or(JarError::KeyMissing)?;
        Ok(key.decrypt(&entry.encrypted_value)?)
    }

    /// JSON of every persistent entry exactly as a save would write it
    pub fn to_json(&self) -> JarResult<String> {
        let entries = self.store().persistent_entries(self.key.as_ref())?;
        Ok(serde_json::to_string(&entries)?)
    }

    /// Save at the current time, see [`Jar::save_at`]
    pub fn save(&self) -> JarResult<SaveReport> {
        self.save_at(Utc::now())
    }

    /// Load at the current time, see [`Jar::load_at`]
    pub fn load(&self) -> JarResult<LoadReport> {
        self.load_at(Utc::now())
    }
}

fn note(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    warn!("{}", diagnostic);
    diagnostics.push(diagnostic);
}
