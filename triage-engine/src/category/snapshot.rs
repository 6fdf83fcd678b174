//! Category snapshots - the persisted JSON form of a store.
//!
//! Schema: `{"categories": {"<name>": {"examples": [...], "embedding": [...]}}}`.
//! Object key order follows creation order, and a bare `{}` restores an
//! empty store.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{CategoryError, CategoryStore};

/// Errors from snapshot encoding or restoring.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Malformed JSON or wrong shape
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON was well-formed but describes an impossible store
    #[error("invalid snapshot contents: {0}")]
    Category(#[from] CategoryError),
}

/// One category as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Example texts
    pub examples: Vec<String>,
    /// Centroid
    pub embedding: Vec<f32>,
}

/// Whole-store snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    /// Categories as `(name, record)` pairs in creation order
    #[serde(default, with = "ordered_categories")]
    pub categories: Vec<(String, CategoryRecord)>,
}

impl From<&CategoryStore> for CategorySnapshot {
    fn from(store: &CategoryStore) -> Self {
        Self {
            categories: store
                .iter()
                .map(|c| {
                    (
                        c.name().to_string(),
                        CategoryRecord {
                            examples: c.examples().to_vec(),
                            embedding: c.centroid().to_vec(),
                        },
                    )
                })
                .collect(),
        }
    }
}

impl TryFrom<CategorySnapshot> for CategoryStore {
    type Error = CategoryError;

    fn try_from(snapshot: CategorySnapshot) -> Result<Self, Self::Error> {
        let mut store = CategoryStore::new();
        for (name, record) in snapshot.categories {
            store.restore(name, record.examples, record.embedding)?;
        }
        Ok(store)
    }
}

impl CategoryStore {
    /// Snapshot of the current store.
    #[must_use]
    pub fn snapshot(&self) -> CategorySnapshot {
        CategorySnapshot::from(self)
    }

    /// Encode as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Restore from JSON produced by [`CategoryStore::to_json`].
    ///
    /// # Errors
    /// `Json` for malformed input, `Category` for duplicate names or
    /// mixed embedding dimensions.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: CategorySnapshot = serde_json::from_str(json)?;
        Ok(Self::try_from(snapshot)?)
    }
}

/// Serializes `Vec<(String, CategoryRecord)>` as a JSON object without
/// losing entry order.
mod ordered_categories {
    use super::*;

    pub fn serialize<S: Serializer>(
        entries: &[(String, CategoryRecord)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (name, record) in entries {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, CategoryRecord)>, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Vec<(String, CategoryRecord)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category name to record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, CategoryRecord>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
