//! Ordered metadata index backed by fjall
//!
//! Each object's metadata is stored as one row per header under the
//! composite key `bucket:object:header-name`. Keys sort lexicographically
//! bucket-first, object-second, header-third, so all rows for one object
//! are contiguous. That contiguity is what makes the listing algorithm
//! correct: do not collapse the rows into a single serialized record
//! without redesigning the pagination in lockstep.

use fjall::{Config, PartitionCreateOptions, PersistMode, TxKeyspace, TxPartitionHandle};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use cask_core::*;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const DEFAULT_CONTENT_ENCODING: &str = "identity";

/// Fixed number of objects per listing page.
pub const PAGE_SIZE: usize = 100;

/// One listing record: `{"Key": <object name>, <header>: <value>, ...}`.
pub type ObjectRecord = serde_json::Map<String, Value>;

/// Ordered, durable key-value store holding per-object header rows.
///
/// fjall's single-writer transactions serialize metadata writers; readers
/// run on `read_tx` snapshots and never see uncommitted rows.
#[derive(Clone)]
pub struct MetadataIndex {
    keyspace: TxKeyspace,
    partition: TxPartitionHandle,
}

impl MetadataIndex {
    /// Open (or create) the index at the given directory.
    pub fn open(path: &Path) -> Result<Self> {
        let keyspace = Config::new(path)
            .open_transactional()
            .map_err(|e| CaskError::Storage(e.to_string()))?;

        let partition = keyspace
            .open_partition("headers", PartitionCreateOptions::default())
            .map_err(|e| CaskError::Storage(e.to_string()))?;

        Ok(MetadataIndex {
            keyspace,
            partition,
        })
    }

    /// Replace the object's metadata record with `fields`.
    ///
    /// Inside one write transaction: every existing row in the
    /// `bucket:object:` range is deleted, then one row per field is
    /// inserted. Headers not resupplied are dropped, never merged.
    /// A missing or blank `Content-Type` and a missing `Content-Encoding`
    /// are replaced with their defaults before insertion.
    pub fn put_object_metadata(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
        mut fields: BTreeMap<String, String>,
    ) -> Result<()> {
        apply_defaults(&mut fields);

        let prefix = object_prefix(bucket.as_str(), name.as_str());
        let mut tx = self.keyspace.write_tx();

        let mut stale = Vec::new();
        for item in tx.prefix(&self.partition, prefix.as_slice()) {
            let (key, _) = item.map_err(|e| CaskError::Storage(e.to_string()))?;
            stale.push(key);
        }
        for key in stale {
            tx.remove(&self.partition, key);
        }

        for (header, value) in &fields {
            tx.insert(
                &self.partition,
                row_key(bucket.as_str(), name.as_str(), header),
                value.as_bytes(),
            );
        }

        tx.commit().map_err(|e| CaskError::Storage(e.to_string()))?;
        self.persist()
    }

    /// Read the object's metadata record: a map seeded with the default
    /// `Content-Type` and `Content-Encoding`, overwritten per matched row.
    ///
    /// No matching rows yields the defaults alone; this call does not
    /// signal whether the object exists. Blob presence is checked
    /// separately by the caller.
    pub fn get_object_metadata(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> Result<BTreeMap<String, String>> {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string());
        headers.insert(
            "Content-Encoding".to_string(),
            DEFAULT_CONTENT_ENCODING.to_string(),
        );

        let prefix = object_prefix(bucket.as_str(), name.as_str());
        let tx = self.keyspace.read_tx();

        for item in tx.prefix(&self.partition, prefix.as_slice()) {
            let (key, value) = item.map_err(|e| CaskError::Storage(e.to_string()))?;
            let (_, _, header) = split_row_key(&key)
                .ok_or_else(|| CaskError::Storage(format!("malformed index key: {:?}", &*key)))?;
            headers.insert(
                header.to_string(),
                String::from_utf8_lossy(&value).into_owned(),
            );
        }

        Ok(headers)
    }

    /// Delete every row in the object's range. No-op when none match.
    pub fn delete_object_metadata(&self, bucket: &BucketName, name: &ObjectName) -> Result<()> {
        let prefix = object_prefix(bucket.as_str(), name.as_str());
        let mut tx = self.keyspace.write_tx();

        let mut stale = Vec::new();
        for item in tx.prefix(&self.partition, prefix.as_slice()) {
            let (key, _) = item.map_err(|e| CaskError::Storage(e.to_string()))?;
            stale.push(key);
        }
        for key in stale {
            tx.remove(&self.partition, key);
        }

        tx.commit().map_err(|e| CaskError::Storage(e.to_string()))?;
        self.persist()
    }

    /// Number of stored rows for one object.
    pub fn row_count(&self, bucket: &BucketName, name: &ObjectName) -> Result<usize> {
        let prefix = object_prefix(bucket.as_str(), name.as_str());
        let tx = self.keyspace.read_tx();

        let mut count = 0;
        for item in tx.prefix(&self.partition, prefix.as_slice()) {
            item.map_err(|e| CaskError::Storage(e.to_string()))?;
            count += 1;
        }
        Ok(count)
    }

    /// One page of a bucket listing.
    ///
    /// Seeks to `start` when given (a previously issued continuation
    /// prefix), else to the bucket's base prefix, then walks rows in key
    /// order. Rows for one object are contiguous, so headers merge into
    /// the last record until a new object name appears. Hitting the
    /// page-size cap on a fresh object stops iteration and returns that
    /// object's composite prefix as the continuation; running off the end
    /// of the bucket returns none. Exactly `page_size` objects therefore
    /// yield a full page with no continuation.
    pub fn list_bucket(
        &self,
        bucket: &BucketName,
        start: Option<&[u8]>,
        page_size: usize,
    ) -> Result<(Vec<ObjectRecord>, Option<Vec<u8>>)> {
        let base = bucket_prefix(bucket.as_str());
        let seek = start.map(<[u8]>::to_vec).unwrap_or_else(|| base.clone());

        let tx = self.keyspace.read_tx();
        let mut records: Vec<ObjectRecord> = Vec::new();
        let mut next: Option<Vec<u8>> = None;

        for item in tx.range(&self.partition, seek..) {
            let (key, value) = item.map_err(|e| CaskError::Storage(e.to_string()))?;
            if !key.starts_with(&base) {
                break;
            }

            let (_, object, header) = split_row_key(&key)
                .ok_or_else(|| CaskError::Storage(format!("malformed index key: {:?}", &*key)))?;
            let header_value = String::from_utf8_lossy(&value).into_owned();

            if let Some(last) = records
                .last_mut()
                .filter(|r| r.get("Key").and_then(Value::as_str) == Some(object))
            {
                last.insert(header.to_string(), Value::String(header_value));
                continue;
            }

            if records.len() == page_size {
                next = Some(object_prefix(bucket.as_str(), object));
                break;
            }

            let mut record = ObjectRecord::new();
            record.insert("Key".to_string(), Value::String(object.to_string()));
            record.insert(header.to_string(), Value::String(header_value));
            records.push(record);
        }

        Ok((records, next))
    }

    /// Flush and sync the keyspace to disk.
    pub fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(|e| CaskError::Storage(e.to_string()))
    }
}

fn apply_defaults(fields: &mut BTreeMap<String, String>) {
    let blank = fields
        .get("Content-Type")
        .map(|v| v.is_empty())
        .unwrap_or(true);
    if blank {
        fields.insert("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string());
    }

    fields
        .entry("Content-Encoding".to_string())
        .or_insert_with(|| DEFAULT_CONTENT_ENCODING.to_string());
}

/// `"<bucket>:"` — every row of one bucket shares this prefix.
pub(crate) fn bucket_prefix(bucket: &str) -> Vec<u8> {
    format!("{}:", bucket).into_bytes()
}

/// `"<bucket>:<object>:"` — every row of one object shares this prefix.
pub(crate) fn object_prefix(bucket: &str, object: &str) -> Vec<u8> {
    format!("{}:{}:", bucket, object).into_bytes()
}

fn row_key(bucket: &str, object: &str, header: &str) -> Vec<u8> {
    format!("{}:{}:{}", bucket, object, header).into_bytes()
}

/// Decode a row key into (bucket, object, header).
///
/// Object names may contain `:`; header names never do. The first colon
/// bounds the bucket, the last bounds the header name, and the object name
/// is the verbatim middle.
fn split_row_key(key: &[u8]) -> Option<(&str, &str, &str)> {
    let key = std::str::from_utf8(key).ok()?;
    let (bucket, rest) = key.split_once(':')?;
    let (object, header) = rest.rsplit_once(':')?;
    Some((bucket, object, header))
}
