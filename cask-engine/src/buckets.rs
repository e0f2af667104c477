//! Bucket directory lifecycle

use cask_core::*;
use std::path::PathBuf;

use crate::addressing;

/// Bucket existence, creation, and recursive deletion.
///
/// A bucket is nothing but a directory under `<root>/buckets`; there is no
/// bucket-level metadata record.
#[derive(Clone)]
pub struct BucketManager {
    root: PathBuf,
}

impl BucketManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BucketManager { root: root.into() }
    }

    /// Directory presence check.
    pub fn exists(&self, bucket: &BucketName) -> bool {
        addressing::bucket_path(&self.root, bucket.as_str(), false)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Idempotent creation; creating an existing bucket is a no-op success.
    pub fn create(&self, bucket: &BucketName) -> Result<()> {
        addressing::bucket_path(&self.root, bucket.as_str(), true)?;
        Ok(())
    }

    /// Recursively remove the bucket's blob directory tree.
    ///
    /// The bucket's metadata rows are NOT removed and become orphaned.
    /// Inherited behavior, preserved deliberately; see DESIGN.md.
    pub fn delete(&self, bucket: &BucketName) -> Result<()> {
        let path = addressing::bucket_path(&self.root, bucket.as_str(), false)?;
        if !path.exists() {
            return Err(CaskError::BucketNotFound(bucket.to_string()));
        }
        std::fs::remove_dir_all(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_exists_delete() {
        let temp = tempfile::tempdir().unwrap();
        let buckets = BucketManager::new(temp.path());
        let name = BucketName::new("photos").unwrap();

        assert!(!buckets.exists(&name));
        buckets.create(&name).unwrap();
        assert!(buckets.exists(&name));

        // Creating twice succeeds with no error
        buckets.create(&name).unwrap();

        buckets.delete(&name).unwrap();
        assert!(!buckets.exists(&name));
    }

    #[test]
    fn test_delete_missing_bucket() {
        let temp = tempfile::tempdir().unwrap();
        let buckets = BucketManager::new(temp.path());
        let name = BucketName::new("absent").unwrap();

        assert!(matches!(
            buckets.delete(&name),
            Err(CaskError::BucketNotFound(_))
        ));
    }

    #[test]
    fn test_delete_removes_nested_blobs() {
        let temp = tempfile::tempdir().unwrap();
        let buckets = BucketManager::new(temp.path());
        let name = BucketName::new("photos").unwrap();

        buckets.create(&name).unwrap();
        let blob = addressing::blob_path(temp.path(), "photos", "cat.jpg", true).unwrap();
        std::fs::write(&blob, b"data").unwrap();

        buckets.delete(&name).unwrap();
        assert!(!blob.exists());
    }
}
