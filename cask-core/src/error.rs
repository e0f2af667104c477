//! Error types for cask

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaskError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid bucket name: {0}")]
    InvalidBucketName(String),

    #[error("Invalid object name: {0}")]
    InvalidObjectName(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Object not found: {bucket}/{object}")]
    ObjectNotFound { bucket: String, object: String },

    #[error("Invalid continuation cursor")]
    InvalidCursor,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
