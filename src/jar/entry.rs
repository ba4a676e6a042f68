//! Cookie entry record as stored in the jar and on disk

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single cookie
///
/// Field names serialize in PascalCase so files stay compatible with other
/// readers of the same jar format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Entry {
    pub name: String,

    /// Plaintext value. Empty on disk when the jar encrypts values.
    pub value: String,

    /// `v01`-prefixed ciphertext of the value
    #[serde(skip_serializing_if = "String::is_empty")]
    pub encrypted_value: String,

    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,

    /// Survives process restarts (false for session cookies)
    pub persistent: bool,

    pub host_only: bool,
    pub expires: DateTime<Utc>,
    pub creation: DateTime<Utc>,
    pub last_access: DateTime<Utc>,

    /// Last modification; the newer entry wins a merge
    pub updated: DateTime<Utc>,

    /// Primary key for grouping and sorting, see [`canonical_host`]
    pub canonical_host: String,
}

impl Entry {
    /// Create a persistent cookie stamped with `now`
    pub fn new(
        domain: impl Into<String>,
        path: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
        expires: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let domain = domain.into();
        Self {
            canonical_host: canonical_host(&domain),
            name: name.into(),
            value: value.into(),
            domain,
            path: path.into(),
            persistent: true,
            expires,
            creation: now,
            last_access: now,
            updated: now,
            ..Self::default()
        }
    }

    /// Mark the entry as a session cookie
    pub fn session(mut self) -> Self {
        self.persistent = false;
        self
    }

    /// Unique id within a host: `domain;path;name`
    pub fn id(&self) -> String {
        entry_id(&self.domain, &self.path, &self.name)
    }

    /// Whether the entry has expired at `now` (expiry at exactly `now` counts)
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    /// Whether the value is only available in encrypted form
    pub fn is_sealed(&self) -> bool {
        self.value.is_empty() && !self.encrypted_value.is_empty()
    }
}

pub(crate) fn entry_id(domain: &str, path: &str, name: &str) -> String {
    format!("{};{};{}", domain, path, name)
}

/// File order: canonical host ascending, then longer (more specific) paths
/// first, then id for a stable result
pub fn file_order(a: &Entry, b: &Entry) -> Ordering {
    a.canonical_host
        .cmp(&b.canonical_host)
        .then_with(|| b.path.len().cmp(&a.path.len()))
        .then_with(|| a.id().cmp(&b.id()))
}

/// Normalize a host or cookie domain into the key used to group entries
///
/// Lowercases, strips a leading dot (domain cookies), a trailing dot (fully
/// qualified names) and IPv6 brackets.
pub fn canonical_host(host: &str) -> String {
    let host = host.trim();
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    let host = host.strip_prefix('.').unwrap_or(host);
    let host = host.strip_suffix('.').unwrap_or(host);
    host.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn canonical_host_normalizes() {
        assert_eq!(canonical_host("Example.COM"), "example.com");
        assert_eq!(canonical_host(".example.com"), "example.com");
        assert_eq!(canonical_host("example.com."), "example.com");
        assert_eq!(canonical_host("[::1]"), "::1");
        assert_eq!(canonical_host(""), "");
    }

    #[test]
    fn entry_id() {
        let e = Entry::new("example.com", "/a", "sid", "1", at(100), at(0));
        assert_eq!(e.id(), "example.com;/a;sid");
        assert_eq!(e.canonical_host, "example.com");
        assert!(e.persistent);
        assert!(!e.clone().session().persistent);
    }

    #[test]
    fn expiry_is_inclusive() {
        let now = at(1_000);
        let e = Entry::new("a.com", "/", "n", "v", now, at(0));
        assert!(e.is_expired(now));
        assert!(!e.is_expired(now - Duration::seconds(1)));
    }

    #[test]
    fn file_order_sorts_host_then_path_length() {
        let now = at(0);
        let mut entries = vec![
            Entry::new("b.com", "/", "x", "", at(9), now),
            Entry::new("a.com", "/", "x", "", at(9), now),
            Entry::new("a.com", "/long/path", "x", "", at(9), now),
            Entry::new("a.com", "/p", "x", "", at(9), now),
        ];
        entries.sort_by(file_order);
        let order: Vec<_> = entries
            .iter()
            .map(|e| format!("{}{}", e.canonical_host, e.path))
            .collect();
        assert_eq!(order, ["a.com/long/path", "a.com/p", "a.com/", "b.com/"]);
    }

    #[test]
    fn serializes_pascal_case_and_skips_empty_ciphertext() {
        let e = Entry::new("a.com", "/", "n", "v", at(10), at(0));
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["Name"], "n");
        assert_eq!(json["CanonicalHost"], "a.com");
        assert!(json.get("EncryptedValue").is_none());

        let parsed: Entry = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, e);
    }

    #[test]
    fn deserializes_sparse_records() {
        let e: Entry = serde_json::from_str(
            r#"{"Name":"n","Domain":"a.com","Path":"/","Persistent":true,
                "Expires":"2030-01-01T00:00:00Z","CanonicalHost":"a.com"}"#,
        )
        .unwrap();
        assert_eq!(e.name, "n");
        assert!(e.value.is_empty());
        assert!(!e.is_sealed());
    }
}
