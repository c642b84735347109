use crate::field::{Field, FieldTag};
use crate::value::{normalize, Value};
use std::collections::HashMap;
use std::sync::RwLock;

/// Key prefix that routes a field into the label mapping instead of the
/// ordinary field set. Stripped before storage.
pub const LABEL_PREFIX: &str = "labels.";

/// Key of the single namespaced field that carries the merged label
/// mapping on entries handed to the local sink.
pub const LABELS_KEY: &str = "labels";

/// Thread-safe string-to-string label mapping.
///
/// One instance lives for a whole logger scope (permanent labels, shared
/// with descendant scopes) and one per core instance (temporary labels,
/// reset after every write). Entries appear atomically: a reader never
/// observes a key without its value.
#[derive(Debug, Default)]
pub struct LabelStore {
    inner: RwLock<HashMap<String, String>>,
}

impl LabelStore {
    pub fn new() -> Self {
        LabelStore::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(key.into(), value.into());
    }

    /// Copy of all entries under the store's own read lock.
    pub fn snapshot(&self) -> HashMap<String, String> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    /// Copies every entry of `other` into self. A duplicate key is
    /// overwritten whole, last writer wins.
    pub fn merge(&self, other: &LabelStore) {
        let entries = other.snapshot();
        if entries.is_empty() {
            return;
        }
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.extend(entries);
    }

    pub fn reset(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.clear();
    }

    pub fn is_empty(&self) -> bool {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.is_empty()
    }
}

/// Build a field that the classifier routes into the label mapping.
pub fn label(key: &str, value: impl Into<String>) -> Field {
    Field::str(format!("{}{}", LABEL_PREFIX, key), value)
}

/// Single namespaced field carrying a full label mapping.
pub fn labels_field(labels: &HashMap<String, String>) -> Field {
    let map: serde_json::Map<String, serde_json::Value> = labels
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();
    Field::object(LABELS_KEY, serde_json::Value::Object(map))
}

/// Partition a field sequence into a label store and the remaining
/// ordinary fields, preserving the ordinary fields' relative order.
///
/// Label-prefixed fields have the prefix stripped and their value rendered
/// as text; one whose value has no textual rendering is dropped silently
/// so a bad label can never fail the surrounding write.
pub fn split_label_fields(fields: Vec<Field>) -> (LabelStore, Vec<Field>) {
    let store = LabelStore::new();
    let mut ordinary = Vec::with_capacity(fields.len());

    for field in fields {
        if !field.key.starts_with(LABEL_PREFIX) {
            ordinary.push(field);
            continue;
        }
        if let Some(text) = label_text(&field) {
            store.set(&field.key[LABEL_PREFIX.len()..], text);
        }
    }

    (store, ordinary)
}

const fn has_text_form(tag: FieldTag) -> bool {
    matches!(
        tag,
        FieldTag::Str
            | FieldTag::Bool
            | FieldTag::Int8
            | FieldTag::Int16
            | FieldTag::Int32
            | FieldTag::Int64
            | FieldTag::Uint8
            | FieldTag::Uint16
            | FieldTag::Uint32
            | FieldTag::Uint64
            | FieldTag::Float32
            | FieldTag::Float64
            | FieldTag::ByteString
            | FieldTag::Duration
            | FieldTag::Time
            | FieldTag::Stringer
            | FieldTag::Error
    )
}

fn label_text(field: &Field) -> Option<String> {
    if !has_text_form(field.tag) {
        return None;
    }
    match normalize(field)? {
        Value::Str(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Uint(u) => Some(u.to_string()),
        Value::Float(x) => Some(x.to_string()),
        Value::Duration(d) => Some(d.to_string()),
        Value::Timestamp(t) => Some(t.to_rfc3339()),
        Value::Bytes(b) => String::from_utf8(b).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn classification_is_a_pure_partition() {
        let fields = vec![
            label("env", "prod"),
            Field::str("user", "x"),
            label("region", "eu"),
            Field::i64("status", 200),
        ];

        let (store, ordinary) = split_label_fields(fields);

        let labels = store.snapshot();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("env").map(String::as_str), Some("prod"));
        assert_eq!(labels.get("region").map(String::as_str), Some("eu"));

        let keys: Vec<&str> = ordinary.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["user", "status"]);
    }

    #[test]
    fn non_string_label_values_convert_to_text() {
        let fields = vec![
            Field::i64("labels.status", 200),
            Field::bool("labels.ok", true),
        ];
        let (store, ordinary) = split_label_fields(fields);
        assert!(ordinary.is_empty());

        let labels = store.snapshot();
        assert_eq!(labels.get("status").map(String::as_str), Some("200"));
        assert_eq!(labels.get("ok").map(String::as_str), Some("true"));
    }

    #[test]
    fn inconvertible_label_values_are_dropped_silently() {
        let fields = vec![
            Field::object("labels.meta", serde_json::json!({"a": 1})),
            Field::binary("labels.blob", vec![0, 159]),
            label("kept", "yes"),
        ];
        let (store, ordinary) = split_label_fields(fields);
        assert!(ordinary.is_empty());

        let labels = store.snapshot();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get("kept").map(String::as_str), Some("yes"));
    }

    #[test]
    fn merge_is_last_writer_wins() {
        let a = LabelStore::new();
        a.set("k", "old");
        a.set("only_a", "1");

        let b = LabelStore::new();
        b.set("k", "new");

        a.merge(&b);
        let snap = a.snapshot();
        assert_eq!(snap.get("k").map(String::as_str), Some("new"));
        assert_eq!(snap.get("only_a").map(String::as_str), Some("1"));
    }

    #[test]
    fn reset_clears_everything() {
        let store = LabelStore::new();
        store.set("a", "1");
        store.reset();
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_merges_lose_no_entries() {
        let shared = Arc::new(LabelStore::new());
        let mut handles = Vec::new();

        for t in 0..8 {
            let shared = Arc::clone(&shared);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    let other = LabelStore::new();
                    other.set(format!("k{}-{}", t, i), "v");
                    shared.merge(&other);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(shared.snapshot().len(), 8 * 50);
    }
}
