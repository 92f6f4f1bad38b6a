use super::*;
use serde_json::json;

#[test]
fn key_order_insensitive() {
    let a = json!({"a": 1, "b": 2});
    let b = json!({"b": 2, "a": 1});
    assert_eq!(spec_hash(&a), spec_hash(&b));
}

#[test]
fn nested_objects_are_canonicalized() {
    let a = json!({"outer": {"z": 1, "a": 2}, "list": [1, 2, 3]});
    let b = json!({"list": [1, 2, 3], "outer": {"a": 2, "z": 1}});
    assert_eq!(spec_hash(&a), spec_hash(&b));
}

#[test]
fn array_order_is_significant() {
    let a = json!({"list": [1, 2, 3]});
    let b = json!({"list": [3, 2, 1]});
    assert_ne!(spec_hash(&a), spec_hash(&b));
}

#[test]
fn hash_is_stable_hex_sha256_length() {
    let h = spec_hash(&json!({"owner": "o", "repo": "r"}));
    assert_eq!(h.len(), 64);
    assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
}
