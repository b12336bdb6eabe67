//! Root API state store.
//!
//! ```text
//! Store (namespace)
//!     ├── "storage" (namespace)
//!     │     ├── "type1"       (collection: id → StoredItem)
//!     │     └── "type2.test"  (collection: id → StoredItem)
//!     └── "ui" (namespace)
//!           └── "sidebarOpen" (other: true)
//! ```
//!
//! Slices that are not resources (flags, arrays, scalars) may sit anywhere
//! in the tree. Storage paths cannot resolve into them.
//!
//! The store is owned and mutated by the embedding application; this crate
//! only reads it while resolving schema maps and denormalizing.

use crate::error::SchemaMapError;
use crate::resource::StoredItem;
use crate::schema::StoragePath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// All stored items of one type, keyed by id.
pub type Collection = BTreeMap<String, StoredItem>;

/// A node of the store tree.
///
/// A JSON object whose every value is a resource (`id` and `type` strings)
/// reads as a collection; any other object reads as a namespace. An empty
/// object reads as an empty collection. Anything else is kept verbatim as
/// [`StoreNode::Other`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreNode {
    Collection(Collection),
    Namespace(BTreeMap<String, StoreNode>),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    root: BTreeMap<String, StoreNode>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn root(&self) -> &BTreeMap<String, StoreNode> {
        &self.root
    }

    /// Walk `path` to the collection it names.
    ///
    /// `resource_type` only labels the error.
    pub fn resolve(
        &self,
        resource_type: &str,
        path: &StoragePath,
    ) -> Result<&Collection, SchemaMapError> {
        let unresolved = |missing: &str| SchemaMapError::Unresolved {
            resource_type: resource_type.to_string(),
            path: path.to_string(),
            missing: missing.to_string(),
        };

        let Some((last, parents)) = path.segments().split_last() else {
            return Err(unresolved(""));
        };

        let mut namespace = &self.root;
        for (depth, segment) in parents.iter().enumerate() {
            match namespace.get(segment) {
                Some(StoreNode::Namespace(children)) => namespace = children,
                Some(StoreNode::Collection(collection)) if collection.is_empty() => {
                    return Err(unresolved(parents.get(depth + 1).unwrap_or(last)));
                }
                Some(StoreNode::Other(_)) => {
                    return Err(unresolved(parents.get(depth + 1).unwrap_or(last)));
                }
                Some(StoreNode::Collection(_)) => {
                    return Err(SchemaMapError::ThroughCollection {
                        resource_type: resource_type.to_string(),
                        path: path.to_string(),
                    });
                }
                None => return Err(unresolved(segment)),
            }
        }

        match namespace.get(last) {
            Some(StoreNode::Collection(collection)) => Ok(collection),
            Some(StoreNode::Namespace(_) | StoreNode::Other(_)) => {
                Err(SchemaMapError::NotACollection {
                    resource_type: resource_type.to_string(),
                    path: path.to_string(),
                })
            }
            None => Err(unresolved(last)),
        }
    }

    /// Insert or replace an item in the collection at `path`, creating
    /// intermediate namespaces as needed.
    ///
    /// Returns the previous item with the same id, if any.
    pub fn upsert_item(
        &mut self,
        path: &StoragePath,
        item: StoredItem,
    ) -> Result<Option<StoredItem>, SchemaMapError> {
        let resource_type = item.resource.resource_type.clone();
        let Some((last, parents)) = path.segments().split_last() else {
            return Err(SchemaMapError::Unresolved {
                resource_type,
                path: path.to_string(),
                missing: String::new(),
            });
        };

        let mut namespace = &mut self.root;
        for (depth, segment) in parents.iter().enumerate() {
            let node = namespace
                .entry(segment.clone())
                .or_insert_with(|| StoreNode::Namespace(BTreeMap::new()));
            if matches!(node, StoreNode::Collection(collection) if collection.is_empty()) {
                *node = StoreNode::Namespace(BTreeMap::new());
            }
            namespace = match node {
                StoreNode::Namespace(children) => children,
                StoreNode::Collection(_) => {
                    return Err(SchemaMapError::ThroughCollection {
                        resource_type,
                        path: path.to_string(),
                    });
                }
                StoreNode::Other(_) => {
                    return Err(SchemaMapError::Unresolved {
                        resource_type,
                        path: path.to_string(),
                        missing: parents.get(depth + 1).unwrap_or(last).clone(),
                    });
                }
            };
        }

        match namespace
            .entry(last.clone())
            .or_insert_with(|| StoreNode::Collection(Collection::new()))
        {
            StoreNode::Collection(collection) => {
                Ok(collection.insert(item.resource.id.clone(), item))
            }
            StoreNode::Namespace(_) | StoreNode::Other(_) => {
                Err(SchemaMapError::NotACollection {
                    resource_type,
                    path: path.to_string(),
                })
            }
        }
    }
}
