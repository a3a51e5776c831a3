//! Collection-keyed JSON payloads.
//!
//! Backends answer with `{ "<collection>": [ {field: value, ...}, ... ] }`.
//! [`CollectionData`] is that shape with collection order, record order and
//! record key order all preserved, so a redacted copy can be emitted in the
//! same layout the backend produced.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A single record: a JSON object with its original key order.
pub type Record = serde_json::Map<String, Value>;

/// A named, ordered list of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub name: String,
    pub records: Vec<Record>,
}

/// Ordered set of collections decoded from a backend body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionData {
    collections: Vec<Collection>,
}

impl CollectionData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a body, returning `None` when it is not collection-keyed JSON.
    #[must_use]
    pub fn from_slice(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// Append a collection.
    ///
    /// A collection that already exists has its records replaced.
    pub fn insert(&mut self, name: impl Into<String>, records: Vec<Record>) {
        let name = name.into();
        if let Some(existing) = self.collections.iter_mut().find(|c| c.name == name) {
            existing.records = records;
        } else {
            self.collections.push(Collection { name, records });
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_collection(mut self, name: impl Into<String>, records: Vec<Record>) -> Self {
        self.insert(name, records);
        self
    }

    #[must_use]
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Total number of records across all collections.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.collections.iter().map(|c| c.records.len()).sum()
    }

    /// Produce a copy with every record passed through `f`.
    #[must_use]
    pub fn map_records<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Record) -> Record,
    {
        Self {
            collections: self
                .collections
                .iter()
                .map(|c| Collection {
                    name: c.name.clone(),
                    records: c.records.iter().map(&mut f).collect(),
                })
                .collect(),
        }
    }
}

impl Serialize for CollectionData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.collections.len()))?;
        for c in &self.collections {
            map.serialize_entry(&c.name, &c.records)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CollectionData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CollectionDataVisitor)
    }
}

struct CollectionDataVisitor;

impl<'de> Visitor<'de> for CollectionDataVisitor {
    type Value = CollectionData;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping collection names to arrays of objects")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut collections: Vec<Collection> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(name) = access.next_key::<String>()? {
            if collections.iter().any(|c| c.name == name) {
                return Err(de::Error::custom(format!("duplicate collection `{name}`")));
            }
            let records = access.next_value::<Vec<Record>>()?;
            collections.push(Collection { name, records });
        }
        Ok(CollectionData { collections })
    }
}
