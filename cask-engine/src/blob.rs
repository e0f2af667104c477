//! Filesystem-backed byte storage for object bodies

use cask_core::Result;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Copy granularity for streaming request bodies to disk.
pub const WRITE_CHUNK_SIZE: usize = 128 * 1024;

/// Byte storage keyed by derived shard paths.
///
/// Path existence checks and NotFound classification live in [`crate::Store`],
/// which knows the bucket and object names behind a path.
pub struct BlobStore;

impl BlobStore {
    /// Stream `body` to `path` in fixed 128 KiB chunks, truncating any
    /// existing content in place. Returns the number of bytes written,
    /// which becomes the object's `Content-Length`.
    ///
    /// There is no temp file and no atomic rename: a reader racing this
    /// write can observe a short or partially written body. Inherited
    /// behavior, kept as-is; see DESIGN.md.
    pub fn write(path: &Path, body: &mut dyn Read) -> Result<u64> {
        let mut file = File::create(path)?;
        let mut buf = vec![0u8; WRITE_CHUNK_SIZE];
        let mut written: u64 = 0;

        loop {
            let n = body.read(&mut buf)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            written += n as u64;
        }

        file.flush()?;
        Ok(written)
    }

    /// Open a blob for streaming read.
    pub fn open(path: &Path) -> Result<File> {
        Ok(File::open(path)?)
    }

    /// Unlink a blob. Now-empty shard directories are not reclaimed.
    pub fn delete(path: &Path) -> Result<()> {
        std::fs::remove_file(path)?;
        Ok(())
    }
}
