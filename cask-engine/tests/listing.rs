//! Integration tests for bucket listing and cursor pagination

use std::collections::BTreeMap;

use cask_core::*;
use cask_engine::{ObjectRecord, Store, PAGE_SIZE};

fn make_bucket(store: &Store, name: &str) -> BucketName {
    let bucket = BucketName::new(name).unwrap();
    store.create_bucket(&bucket).unwrap();
    bucket
}

fn put(store: &Store, bucket: &BucketName, name: &str, headers: &[(&str, &str)]) {
    let object = ObjectName::new(name).unwrap();
    let supplied: BTreeMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    store
        .put_object(bucket, &object, &mut &b"x"[..], supplied)
        .unwrap();
}

fn seed(store: &Store, bucket: &BucketName, count: usize) {
    for i in 0..count {
        put(store, bucket, &format!("item-{:04}", i), &[]);
    }
}

fn keys(records: &[ObjectRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r["Key"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn under_cap_is_a_single_page() {
    let (store, _temp) = Store::temp().unwrap();
    let bucket = make_bucket(&store, "stuff");
    seed(&store, &bucket, 99);

    let (records, cursor) = store.list_bucket(&bucket, None).unwrap();
    assert_eq!(records.len(), 99);
    assert!(cursor.is_none());
}

#[test]
fn exactly_page_size_yields_no_continuation() {
    let (store, _temp) = Store::temp().unwrap();
    let bucket = make_bucket(&store, "stuff");
    seed(&store, &bucket, PAGE_SIZE);

    let (records, cursor) = store.list_bucket(&bucket, None).unwrap();
    assert_eq!(records.len(), PAGE_SIZE);
    assert!(cursor.is_none());
}

#[test]
fn one_over_page_size_yields_one_continuation() {
    let (store, _temp) = Store::temp().unwrap();
    let bucket = make_bucket(&store, "stuff");
    seed(&store, &bucket, PAGE_SIZE + 1);

    let (page1, cursor) = store.list_bucket(&bucket, None).unwrap();
    assert_eq!(page1.len(), PAGE_SIZE);
    let cursor = cursor.expect("expected a continuation");

    let (page2, end) = store.list_bucket(&bucket, Some(&cursor)).unwrap();
    assert_eq!(keys(&page2), vec!["item-0100".to_string()]);
    assert!(end.is_none());
}

#[test]
fn pages_ascend_in_consecutive_chunks() {
    let (store, _temp) = Store::temp().unwrap();
    let bucket = make_bucket(&store, "stuff");
    let total = 250;
    seed(&store, &bucket, total);

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let (records, next) = store.list_bucket(&bucket, cursor.as_deref()).unwrap();
        assert!(records.len() <= PAGE_SIZE);
        seen.extend(keys(&records));
        match next {
            Some(token) => cursor = Some(token),
            None => break,
        }
    }

    assert_eq!(seen.len(), total);
    let expected: Vec<String> = (0..total).map(|i| format!("item-{:04}", i)).collect();
    assert_eq!(seen, expected, "keys must ascend lexicographically");
}

#[test]
fn records_carry_all_headers_of_an_object() {
    let (store, _temp) = Store::temp().unwrap();
    let bucket = make_bucket(&store, "photos");
    put(
        &store,
        &bucket,
        "cat.jpg",
        &[
            ("Content-Type", "image/jpeg"),
            ("X-Cask-Owner", "alice"),
            ("X-Cask-Color", "tabby"),
        ],
    );

    let (records, cursor) = store.list_bucket(&bucket, None).unwrap();
    assert!(cursor.is_none());
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record["Key"], "cat.jpg");
    assert_eq!(record["Content-Type"], "image/jpeg");
    assert_eq!(record["X-Cask-Owner"], "alice");
    assert_eq!(record["X-Cask-Color"], "tabby");
    assert!(record.contains_key("Content-Length"));
    assert!(record.contains_key("Last-Modified"));
}

#[test]
fn empty_bucket_lists_empty_page() {
    let (store, _temp) = Store::temp().unwrap();
    let bucket = make_bucket(&store, "empty");

    let (records, cursor) = store.list_bucket(&bucket, None).unwrap();
    assert!(records.is_empty());
    assert!(cursor.is_none());
}

#[test]
fn listing_missing_bucket_fails_before_any_scan() {
    let (store, _temp) = Store::temp().unwrap();
    let bucket = BucketName::new("absent").unwrap();

    assert!(matches!(
        store.list_bucket(&bucket, None),
        Err(CaskError::BucketNotFound(_))
    ));
}

#[test]
fn colon_object_names_list_verbatim() {
    let (store, _temp) = Store::temp().unwrap();
    let bucket = make_bucket(&store, "misc");
    put(&store, &bucket, "a:b:c", &[]);
    put(&store, &bucket, "plain", &[]);

    let (records, _) = store.list_bucket(&bucket, None).unwrap();
    assert_eq!(keys(&records), vec!["a:b:c".to_string(), "plain".to_string()]);
}

#[test]
fn buckets_do_not_leak_into_each_other() {
    // "stuff" rows must not appear when listing "stu", and vice versa,
    // even though one bucket name prefixes the other.
    let (store, _temp) = Store::temp().unwrap();
    let long = make_bucket(&store, "stuff");
    let short = make_bucket(&store, "stu");
    put(&store, &long, "in-long", &[]);
    put(&store, &short, "in-short", &[]);

    let (records, _) = store.list_bucket(&short, None).unwrap();
    assert_eq!(keys(&records), vec!["in-short".to_string()]);

    let (records, _) = store.list_bucket(&long, None).unwrap();
    assert_eq!(keys(&records), vec!["in-long".to_string()]);
}

#[test]
fn invalid_cursor_is_rejected() {
    let (store, _temp) = Store::temp().unwrap();
    let bucket = make_bucket(&store, "stuff");

    assert!(matches!(
        store.list_bucket(&bucket, Some("not base64!!")),
        Err(CaskError::InvalidCursor)
    ));
}
