//! Content-addressed blob placement
//!
//! An object's body lives at a path derived purely from the SHA-1 digest of
//! its name: `<root>/buckets/<bucket>/<hex[0:2]>/<hex[2:4]>/<hex[4:]>`. The
//! two-level fan-out bounds each bucket to 256x256 shard directories.
//! Distinct names hashing to the same digest are not detected.

use sha1::{Digest, Sha1};
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

/// Hex SHA-1 digest of an object name. Pure and infallible.
pub fn hash_object_name(name: &str) -> String {
    let digest = Sha1::digest(name.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// Derive the shard path for an object's body.
///
/// With `create`, the two intermediate shard directories are created
/// (idempotent). The final file is never created or checked here.
pub fn blob_path(root: &Path, bucket: &str, name: &str, create: bool) -> io::Result<PathBuf> {
    let digest = hash_object_name(name);
    let shard = root
        .join("buckets")
        .join(bucket)
        .join(&digest[0..2])
        .join(&digest[2..4]);

    if create {
        std::fs::create_dir_all(&shard)?;
    }

    Ok(shard.join(&digest[4..]))
}

/// Derive the directory backing a bucket, optionally creating it.
pub fn bucket_path(root: &Path, bucket: &str, create: bool) -> io::Result<PathBuf> {
    let path = root.join("buckets").join(bucket);

    if create {
        std::fs::create_dir_all(&path)?;
    }

    Ok(path)
}
