//! crumbjar - a cookie jar persisted to a file shared between processes
//!
//! Entries live in memory inside a [`jar::Jar`] and are reconciled with a
//! JSON file under a cross-process lock. Values can be encrypted at rest with
//! AES-GCM.

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod jar;
pub mod lock;
pub mod ui;

pub use error::{JarError, JarResult};
