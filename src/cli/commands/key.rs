//! Key commands - generate a key and identify the configured one

use crate::cli::args::KeygenArgs;
use crate::codec::EncryptionKey;
use crate::config::{self, Config};
use crate::error::{JarError, JarResult};

/// Print a fresh random key as hex
///
/// Only the key goes to stdout so the output can be redirected into a key
/// file directly.
pub fn keygen(args: KeygenArgs) -> JarResult<()> {
    let key = EncryptionKey::generate(args.bits)?;
    println!("{}", key.to_hex());
    Ok(())
}

/// Print the fingerprint of the configured key
pub fn fingerprint(config: &Config) -> JarResult<()> {
    let key = config::resolve_key(config)?.ok_or(JarError::KeyMissing)?;
    println!("{}", key.fingerprint());
    Ok(())
}
