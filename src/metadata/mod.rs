pub mod ffmetadata;

use serde::Serialize;
use serde::ser::SerializeMap;

/// Auto-generated tags that are noise on a merged file.
pub const NOISY_TAGS: [&str; 5] = ["track", "TLEN", "iTunPGAP", "iTunNORM", "TIT1"];

pub const DEFAULT_GENRE: &str = "Audiobook";

/// A value in a metadata layer: either set the key, or remove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Set(String),
    Delete,
}

/// An ordered set of key overrides. Setting an existing key replaces it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layer {
    entries: Vec<(String, MetaValue)>,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, MetaValue::Set(value.into()));
    }

    pub fn delete(&mut self, key: impl Into<String>) {
        self.insert(key, MetaValue::Delete);
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, MetaValue)> for Layer {
    fn from_iter<I: IntoIterator<Item = (K, MetaValue)>>(iter: I) -> Self {
        let mut layer = Layer::new();
        for (key, value) in iter {
            layer.insert(key, value);
        }
        layer
    }
}

/// The final tag set written to the output, in first-set order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    entries: Vec<(String, String)>,
}

impl Tags {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn apply(&mut self, key: &str, value: &MetaValue) {
        let existing = self.entries.iter().position(|(k, _)| k == key);
        match (value, existing) {
            (MetaValue::Set(v), Some(index)) => self.entries[index].1 = v.clone(),
            (MetaValue::Set(v), None) => self.entries.push((key.to_string(), v.clone())),
            (MetaValue::Delete, Some(index)) => {
                self.entries.remove(index);
            }
            (MetaValue::Delete, None) => {}
        }
    }
}

impl Serialize for Tags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Apply layers in order; later layers override or delete earlier keys.
pub fn merge<'a>(layers: impl IntoIterator<Item = &'a Layer>) -> Tags {
    let mut tags = Tags::default();
    for layer in layers {
        for (key, value) in layer.iter() {
            if key.trim().is_empty() {
                continue;
            }
            tags.apply(key, value);
        }
    }
    tags
}

/// Deletes tags that shouldn't carry over from a single source track.
pub fn cleanup_layer() -> Layer {
    NOISY_TAGS
        .iter()
        .map(|key| (*key, MetaValue::Delete))
        .collect()
}

/// Built-in defaults: audiobook genre, and title/album named after the book.
pub fn default_layer(title: &str) -> Layer {
    let mut layer = Layer::new();
    layer.set("genre", DEFAULT_GENRE);
    layer.set("title", title);
    layer.set("album", title);
    layer
}
