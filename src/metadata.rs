//! Metadata association by (model, key) pairs.
//!
//! Every bitmap carries a [`MetadataStore`]: a flat map from a metadata
//! model plus a string key to a tag value. Models partition the key space
//! the way image files do — EXIF tags and IPTC datasets never collide even
//! when they share a key name. The decode path fills the `Iptc` model from
//! embedded IPTC-IIM records (see `engine::iptc`); everything else is
//! caller-managed.
//!
//! Lookups hand out owned [`Tag`] clones rather than references into the
//! store, so callers can hold results across later edits of the same frame.

use std::collections::BTreeMap;

/// Which metadata namespace a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataModel {
    /// Free-form comments (e.g. a PNG tEXt comment).
    Comments,
    /// EXIF main directory.
    Exif,
    /// IPTC-IIM application record.
    Iptc,
    /// Adobe XMP packet.
    Xmp,
    /// Application-defined keys that belong to no file-format namespace.
    Custom,
}

/// A tag payload: text for the common case, raw bytes for opaque blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl TagValue {
    /// The text payload, or `None` for byte blobs.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(text) => Some(text),
            TagValue::Bytes(_) => None,
        }
    }
}

/// A keyed metadata entry, as handed back by lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: TagValue,
}

/// Per-bitmap metadata: (model, key) → value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataStore {
    tags: BTreeMap<(MetadataModel, String), TagValue>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tags stored under one model.
    pub fn count(&self, model: MetadataModel) -> usize {
        self.tags.keys().filter(|(m, _)| *m == model).count()
    }

    /// Clone out the tag stored under (model, key), if any.
    pub fn get(&self, model: MetadataModel, key: &str) -> Option<Tag> {
        self.tags.get(&(model, key.to_string())).map(|value| Tag {
            key: key.to_string(),
            value: value.clone(),
        })
    }

    /// Insert or overwrite the tag under (model, key).
    pub fn set(&mut self, model: MetadataModel, key: impl Into<String>, value: TagValue) {
        self.tags.insert((model, key.into()), value);
    }

    /// Remove the tag under (model, key). Returns whether one was present.
    pub fn remove(&mut self, model: MetadataModel, key: &str) -> bool {
        self.tags.remove(&(model, key.to_string())).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_partition_the_key_space() {
        let mut store = MetadataStore::new();
        store.set(MetadataModel::Iptc, "Title", TagValue::Text("iptc".into()));
        store.set(MetadataModel::Xmp, "Title", TagValue::Text("xmp".into()));

        assert_eq!(store.count(MetadataModel::Iptc), 1);
        assert_eq!(store.count(MetadataModel::Xmp), 1);
        assert_eq!(
            store.get(MetadataModel::Iptc, "Title").unwrap().value,
            TagValue::Text("iptc".into())
        );
    }

    #[test]
    fn get_clones_out_a_tag() {
        let mut store = MetadataStore::new();
        store.set(MetadataModel::Custom, "k", TagValue::Bytes(vec![1, 2]));

        let tag = store.get(MetadataModel::Custom, "k").unwrap();
        assert_eq!(tag.key, "k");
        assert_eq!(tag.value, TagValue::Bytes(vec![1, 2]));

        // the store is unaffected by whatever happens to the clone
        drop(tag);
        assert_eq!(store.count(MetadataModel::Custom), 1);
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut store = MetadataStore::new();
        store.set(MetadataModel::Custom, "k", TagValue::Text("a".into()));
        store.set(MetadataModel::Custom, "k", TagValue::Text("b".into()));

        assert_eq!(store.count(MetadataModel::Custom), 1);
        assert_eq!(
            store.get(MetadataModel::Custom, "k").unwrap().value.as_text(),
            Some("b")
        );
    }

    #[test]
    fn remove_reports_presence() {
        let mut store = MetadataStore::new();
        store.set(MetadataModel::Comments, "c", TagValue::Text("hi".into()));

        assert!(store.remove(MetadataModel::Comments, "c"));
        assert!(!store.remove(MetadataModel::Comments, "c"));
        assert_eq!(store.get(MetadataModel::Comments, "c"), None);
    }

    #[test]
    fn missing_key_is_none_not_error() {
        let store = MetadataStore::new();
        assert_eq!(store.get(MetadataModel::Exif, "absent"), None);
        assert_eq!(store.count(MetadataModel::Exif), 0);
    }
}
