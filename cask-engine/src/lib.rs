//! Storage engine for cask: content-addressed blobs, ordered metadata
//! index, and bucket lifecycle, behind one service object.

pub mod addressing;
pub mod blob;
pub mod buckets;
pub mod cursor;
pub mod index;

pub use blob::{BlobStore, WRITE_CHUNK_SIZE};
pub use buckets::BucketManager;
pub use index::{
    MetadataIndex, ObjectRecord, DEFAULT_CONTENT_ENCODING, DEFAULT_CONTENT_TYPE, PAGE_SIZE,
};

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use cask_core::*;

/// The storage service: one open metadata index plus the storage root,
/// constructed once at startup and passed explicitly into every request
/// handler. Cloning is cheap; the index handle is shared.
#[derive(Clone)]
pub struct Store {
    index: MetadataIndex,
    buckets: BucketManager,
    root: PathBuf,
}

impl Store {
    /// Open the store rooted at `root`, creating the root directory and the
    /// metadata index under `<root>/metadata` as needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;

        let index = MetadataIndex::open(&root.join("metadata"))?;
        let buckets = BucketManager::new(root.clone());

        Ok(Store {
            index,
            buckets,
            root,
        })
    }

    /// Create a temporary store for testing
    #[cfg(any(test, feature = "test-utils"))]
    pub fn temp() -> Result<(Self, tempfile::TempDir)> {
        let temp_dir = tempfile::tempdir()?;
        let store = Self::open(temp_dir.path())?;
        Ok((store, temp_dir))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &MetadataIndex {
        &self.index
    }

    pub fn buckets(&self) -> &BucketManager {
        &self.buckets
    }

    pub fn bucket_exists(&self, bucket: &BucketName) -> bool {
        self.buckets.exists(bucket)
    }

    pub fn create_bucket(&self, bucket: &BucketName) -> Result<()> {
        self.buckets.create(bucket)
    }

    pub fn delete_bucket(&self, bucket: &BucketName) -> Result<()> {
        self.buckets.delete(bucket)
    }

    /// Write the object body, then replace its metadata record.
    ///
    /// `supplied` carries the caller's `Content-Type`, `Content-Encoding`,
    /// and `X-Cask-*` headers; `Content-Length` and `Last-Modified` are
    /// computed here. The blob write and the metadata commit are not
    /// atomic: a crash between them leaves the two out of step. Blob-first
    /// ordering keeps committed metadata from describing a file that was
    /// never written.
    pub fn put_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
        body: &mut dyn Read,
        supplied: BTreeMap<String, String>,
    ) -> Result<u64> {
        self.require_bucket(bucket)?;

        let path = addressing::blob_path(&self.root, bucket.as_str(), name.as_str(), true)?;
        let written = BlobStore::write(&path, body)?;

        let mut fields = supplied;
        fields.insert("Content-Length".to_string(), written.to_string());
        fields.insert(
            "Last-Modified".to_string(),
            chrono::Utc::now().to_rfc3339(),
        );
        self.index.put_object_metadata(bucket, name, fields)?;

        Ok(written)
    }

    /// Open the object's blob for streaming and read its metadata record.
    pub fn get_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> Result<(File, BTreeMap<String, String>)> {
        self.require_bucket(bucket)?;
        let path = self.require_blob(bucket, name)?;
        let headers = self.index.get_object_metadata(bucket, name)?;
        Ok((BlobStore::open(&path)?, headers))
    }

    /// Metadata record only, with the same existence checks as a read.
    pub fn head_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> Result<BTreeMap<String, String>> {
        self.require_bucket(bucket)?;
        self.require_blob(bucket, name)?;
        self.index.get_object_metadata(bucket, name)
    }

    /// Remove the object's metadata rows, then unlink its blob. Not atomic.
    pub fn delete_object(&self, bucket: &BucketName, name: &ObjectName) -> Result<()> {
        self.require_bucket(bucket)?;
        let path = self.require_blob(bucket, name)?;
        self.index.delete_object_metadata(bucket, name)?;
        BlobStore::delete(&path)
    }

    /// One page (100 objects) of a bucket listing, resuming from `cursor`
    /// when given. Returns the records plus the continuation token iff
    /// unread objects remain.
    pub fn list_bucket(
        &self,
        bucket: &BucketName,
        cursor: Option<&str>,
    ) -> Result<(Vec<ObjectRecord>, Option<String>)> {
        self.require_bucket(bucket)?;

        let start = cursor.map(cursor::decode).transpose()?;
        let (records, next) = self
            .index
            .list_bucket(bucket, start.as_deref(), PAGE_SIZE)?;

        Ok((records, next.map(|prefix| cursor::encode(&prefix))))
    }

    fn require_bucket(&self, bucket: &BucketName) -> Result<()> {
        if self.buckets.exists(bucket) {
            Ok(())
        } else {
            Err(CaskError::BucketNotFound(bucket.to_string()))
        }
    }

    fn require_blob(&self, bucket: &BucketName, name: &ObjectName) -> Result<PathBuf> {
        let path = addressing::blob_path(&self.root, bucket.as_str(), name.as_str(), false)?;
        if path.exists() {
            Ok(path)
        } else {
            Err(CaskError::ObjectNotFound {
                bucket: bucket.to_string(),
                object: name.to_string(),
            })
        }
    }
}
