//! Core data models and types for cask

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;

/// Result type alias for cask operations
pub type Result<T> = std::result::Result<T, CaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_name_creation() {
        let bucket = BucketName::new("test-bucket").unwrap();
        assert_eq!(bucket.as_str(), "test-bucket");
    }

    #[test]
    fn test_bucket_name_validation() {
        // Valid bucket names
        assert!(BucketName::new("bucket").is_ok());
        assert!(BucketName::new("bucket-123").is_ok());
        assert!(BucketName::new("bucket_123").is_ok());
        assert!(BucketName::new("0b").is_ok());

        // Invalid bucket names
        assert!(BucketName::new("").is_err());
        assert!(BucketName::new("b").is_err());
        assert!(BucketName::new("bucket with spaces").is_err());
        assert!(BucketName::new("bucket/with/slashes").is_err());
        assert!(BucketName::new("-bucket").is_err());
        assert!(BucketName::new("bucket-").is_err());
        assert!(BucketName::new("_bucket_").is_err());
    }

    #[test]
    fn test_object_name_allows_slashes_and_colons() {
        assert!(ObjectName::new("photos/cat.jpg").is_ok());
        assert!(ObjectName::new("obj:with:colons").is_ok());
        assert!(ObjectName::new("").is_err());
    }
}
