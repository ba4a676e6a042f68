//! Load and save transactions against the cookie file

use super::store::EntryStore;
use super::{note, Diagnostic, Entry, Jar, LoadReport, SaveReport};
use crate::error::{JarError, JarResult};
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info};

/// Result of decoding the first JSON value of a cookie file
#[derive(Debug)]
enum Decoded {
    Empty,
    Entries(Vec<Entry>),
    /// Valid JSON in some other shape
    Discarded(String),
}

/// Decode exactly one JSON value from `reader`
///
/// An empty stream is not an error. Anything that is not JSON at all is.
fn decode_entries<R: Read>(reader: R) -> Result<Decoded, serde_json::Error> {
    let mut stream = serde_json::Deserializer::from_reader(reader).into_iter::<serde_json::Value>();
    let value = match stream.next() {
        None => return Ok(Decoded::Empty),
        Some(value) => value?,
    };
    Ok(match serde_json::from_value::<Vec<Entry>>(value) {
        Ok(entries) => Decoded::Entries(entries),
        Err(e) => Decoded::Discarded(e.to_string()),
    })
}

fn parent_missing(path: &Path) -> bool {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => !parent.exists(),
        _ => false,
    }
}

fn read_decoded(path: &Path, file: File) -> JarResult<Decoded> {
    decode_entries(BufReader::new(file)).map_err(|e| {
        if e.is_io() {
            JarError::io(format!("reading cookie file {}", path.display()), e.into())
        } else {
            JarError::Format {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Write `entries` as one JSON array followed by a newline
fn write_entries<W: Write>(mut writer: W, entries: &[Entry], path: &Path) -> JarResult<()> {
    let context = || format!("writing cookie file {}", path.display());
    serde_json::to_writer(&mut writer, entries).map_err(|e| {
        if e.is_io() {
            JarError::io(context(), e.into())
        } else {
            JarError::Json(e)
        }
    })?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|e| JarError::io(context(), e))
}

fn open_for_update(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

impl Jar {
    /// Merge the cookie file into memory
    ///
    /// Returns an empty report without locking when the file's directory does
    /// not exist yet, or when the file itself is missing or empty. Nothing is
    /// purged here: expired entries, tombstones included, stay in memory until
    /// the next save so they still win the merge against older copies on disk.
    ///
    /// # Errors
    ///
    /// - [`JarError::LockTimeout`] if another process holds the lock too long
    /// - [`JarError::Format`] if the file is not JSON at all
    /// - [`JarError::Io`] on any other filesystem failure
    pub fn load_at(&self, _now: DateTime<Utc>) -> JarResult<LoadReport> {
        let Some(path) = self.path.as_deref() else {
            return Ok(LoadReport::default());
        };
        let mut store = self.store();
        self.merge_path(&mut store, path)
    }

    /// Merge a foreign cookie file without locking it
    ///
    /// The file is only read. Unlike [`Jar::load`], a missing file is an error.
    pub fn import_from(&self, path: &Path) -> JarResult<LoadReport> {
        let file = File::open(path)
            .map_err(|e| JarError::io(format!("opening cookie file {}", path.display()), e))?;
        let decoded = read_decoded(path, file)?;
        let mut store = self.store();
        Ok(self.apply(&mut store, path, decoded))
    }

    fn merge_path(&self, store: &mut EntryStore, path: &Path) -> JarResult<LoadReport> {
        if parent_missing(path) {
            debug!("Directory for {} does not exist, nothing to load", path.display());
            return Ok(LoadReport::default());
        }

        let lock = self.locker.acquire(path)?;
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LoadReport::default()),
            Err(e) => {
                return Err(JarError::io(
                    format!("opening cookie file {}", path.display()),
                    e,
                ))
            }
        };
        let decoded = read_decoded(path, file)?;
        drop(lock);

        Ok(self.apply(store, path, decoded))
    }

    fn apply(&self, store: &mut EntryStore, path: &Path, decoded: Decoded) -> LoadReport {
        let mut report = LoadReport::default();
        match decoded {
            Decoded::Empty => {}
            Decoded::Entries(entries) => {
                report.merged = self.merge_into(store, entries, &mut report.diagnostics);
            }
            Decoded::Discarded(reason) => {
                note(&mut report.diagnostics, Diagnostic::DiscardedFormat { reason });
            }
        }
        debug!("Merged {} entries from {}", report.merged, path.display());
        report
    }

    /// Merge the cookie file into memory, purge expired entries and rewrite it
    ///
    /// Unreadable or corrupt file content is reported in the returned
    /// diagnostics and otherwise ignored: the jar's own entries are still
    /// written. A jar without a path saves nothing.
    ///
    /// # Errors
    ///
    /// - [`JarError::LockTimeout`] if another process holds the lock too long
    /// - [`JarError::Truncate`] if the file cannot be truncated
    /// - [`JarError::Io`] on any other filesystem failure
    pub fn save_at(&self, now: DateTime<Utc>) -> JarResult<SaveReport> {
        let Some(path) = self.path.as_deref() else {
            return Ok(SaveReport::default());
        };
        let mut store = self.store();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                JarError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }

        let lock = self.locker.acquire(path)?;
        let mut file = open_for_update(path)
            .map_err(|e| JarError::io(format!("opening cookie file {}", path.display()), e))?;

        let mut report = SaveReport::default();
        match decode_entries(BufReader::new(&file)) {
            Ok(Decoded::Empty) => {}
            Ok(Decoded::Entries(entries)) => {
                report.merged = self.merge_into(&mut store, entries, &mut report.diagnostics);
            }
            Ok(Decoded::Discarded(reason)) => {
                note(&mut report.diagnostics, Diagnostic::DiscardedFormat { reason });
            }
            Err(e) => {
                note(
                    &mut report.diagnostics,
                    Diagnostic::UnreadableFile {
                        reason: e.to_string(),
                    },
                );
            }
        }

        report.purged = store.delete_expired(now);
        let entries = store.persistent_entries(self.key.as_ref())?;

        file.set_len(0).map_err(|e| JarError::Truncate {
            path: path.to_path_buf(),
            source: e,
        })?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| JarError::io(format!("seeking {}", path.display()), e))?;

        write_entries(BufWriter::new(&file), &entries, path)?;
        file.sync_all()
            .map_err(|e| JarError::io(format!("syncing cookie file {}", path.display()), e))?;
        drop(lock);

        report.written = entries.len();
        info!(
            "Saved {} cookies to {} (merged {}, purged {})",
            report.written,
            path.display(),
            report.merged,
            report.purged
        );
        Ok(report)
    }
}
