//! Cross-process advisory file locking
//!
//! A [`FileLocker`] acquires an exclusive `flock`-style lock on an artifact
//! derived from the protected path, retrying a non-blocking attempt every poll
//! interval until a fixed deadline. Where the artifact lives and how it is
//! cleaned up is decided by a [`LockStrategy`]:
//!
//! | Strategy | Artifact | Release |
//! |----------|----------|---------|
//! | [`InPlace`] | the protected path itself | unlock + close |
//! | [`Sidecar`] | `<path>.lock` | unlock + close, then remove the artifact |
//!
//! [`native_strategy`] picks `Sidecar` on Windows (an open file cannot be
//! removed there, and locking the data file itself would block its rewrite)
//! and `InPlace` everywhere else.
//!
//! With `Sidecar`, a process removing the artifact can race another process
//! creating a fresh one. Lock hold times are a few milliseconds, so this is
//! accepted rather than solved.

use crate::error::{JarError, JarResult};
use fs2::FileExt;
use std::ffi::OsString;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default total time to wait for a lock
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Default delay between non-blocking lock attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Platform behaviour for lock artifacts
pub trait LockStrategy: fmt::Debug + Send + Sync {
    /// Path of the file that is actually locked for `path`
    fn artifact_path(&self, path: &Path) -> PathBuf;

    /// Release a held lock. `file` is the locked handle on `artifact`.
    fn release(&self, file: File, artifact: &Path) -> io::Result<()>;
}

/// Strategy for the platform this binary was built for
pub fn native_strategy() -> Arc<dyn LockStrategy> {
    if cfg!(windows) {
        Arc::new(Sidecar)
    } else {
        Arc::new(InPlace)
    }
}

/// Lock the protected file itself
#[derive(Debug, Clone, Copy, Default)]
pub struct InPlace;

impl LockStrategy for InPlace {
    fn artifact_path(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }

    fn release(&self, file: File, _artifact: &Path) -> io::Result<()> {
        let result = FileExt::unlock(&file);
        drop(file);
        result
    }
}

/// Lock a separate `<path>.lock` file and remove it on release
#[derive(Debug, Clone, Copy, Default)]
pub struct Sidecar;

impl LockStrategy for Sidecar {
    fn artifact_path(&self, path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn release(&self, file: File, artifact: &Path) -> io::Result<()> {
        // Close before removing: Windows refuses to delete an open file.
        let result = FileExt::unlock(&file);
        drop(file);
        if let Err(e) = std::fs::remove_file(artifact) {
            debug!("Could not remove lock artifact {}: {}", artifact.display(), e);
        }
        result
    }
}

/// Lock timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockConfig {
    /// Total time to wait before giving up
    pub timeout: Duration,
    /// Delay between attempts
    pub poll_interval: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Acquires [`FileLock`]s with a bounded wait
#[derive(Debug, Clone)]
pub struct FileLocker {
    strategy: Arc<dyn LockStrategy>,
    config: LockConfig,
}

impl FileLocker {
    /// Create a locker with an explicit strategy and timing
    pub fn new(strategy: Arc<dyn LockStrategy>, config: LockConfig) -> Self {
        Self { strategy, config }
    }

    /// Native strategy with default timing
    pub fn native() -> Self {
        Self::new(native_strategy(), LockConfig::default())
    }

    /// Timing used by this locker
    pub fn config(&self) -> LockConfig {
        self.config
    }

    /// Path of the lock artifact protecting `path`
    pub fn artifact_path(&self, path: &Path) -> PathBuf {
        self.strategy.artifact_path(path)
    }

    /// Acquire an exclusive lock protecting `path`
    ///
    /// Fails with [`JarError::LockTimeout`] if the lock is still held by
    /// someone else once the configured timeout has elapsed.
    pub fn acquire(&self, path: &Path) -> JarResult<FileLock> {
        let artifact = self.artifact_path(path);
        let file = open_artifact(&artifact).map_err(|e| {
            JarError::io(format!("opening lock file {}", artifact.display()), e)
        })?;

        let started = Instant::now();
        let deadline = started + self.config.timeout;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!(
                        "Locked {} after {} attempt(s) in {:?}",
                        artifact.display(),
                        attempts,
                        started.elapsed()
                    );
                    return Ok(FileLock {
                        file: Some(file),
                        artifact,
                        strategy: Arc::clone(&self.strategy),
                    });
                }
                Err(e) if is_contended(&e) => {
                    if Instant::now() >= deadline {
                        warn!(
                            "Gave up waiting for lock on {} after {:?}",
                            artifact.display(),
                            self.config.timeout
                        );
                        return Err(JarError::LockTimeout {
                            path: path.to_path_buf(),
                            waited: self.config.timeout,
                        });
                    }
                    thread::sleep(self.config.poll_interval);
                }
                Err(e) => {
                    return Err(JarError::io(
                        format!("locking {}", artifact.display()),
                        e,
                    ))
                }
            }
        }
    }
}

impl Default for FileLocker {
    fn default() -> Self {
        Self::native()
    }
}

fn open_artifact(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// A held exclusive lock, released on [`FileLock::release`] or drop
#[derive(Debug)]
pub struct FileLock {
    file: Option<File>,
    artifact: PathBuf,
    strategy: Arc<dyn LockStrategy>,
}

impl FileLock {
    /// Path of the locked artifact
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Release the lock, reporting any unlock failure
    pub fn release(mut self) -> io::Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(file) => self.strategy.release(file, &self.artifact),
            None => Ok(()),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = self.release_inner() {
            warn!("Failed to release lock {}: {}", self.artifact.display(), e);
        }
    }
}
