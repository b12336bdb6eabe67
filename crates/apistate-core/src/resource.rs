//! Resource form: flat `{id, type, attributes, relationships}` records.

use crate::status::StatusMarker;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A reference to another resource. Identifies the target, never contains it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

impl RelDescriptor {
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(&self.resource_type, &self.id)
    }
}

/// Resource linkage of a loaded relationship: one target or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    One(RelDescriptor),
    Many(Vec<RelDescriptor>),
}

/// One entry of `relationships`.
///
/// `data: None` means the relationship exists on the type but its target was
/// not included when the item was normalized.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<Linkage>,
}

impl Relationship {
    pub fn one(target: RelDescriptor) -> Self {
        Self {
            data: Some(Linkage::One(target)),
        }
    }

    pub fn many(targets: Vec<RelDescriptor>) -> Self {
        Self {
            data: Some(Linkage::Many(targets)),
        }
    }

    pub fn null() -> Self {
        Self { data: None }
    }
}

/// A resource in normalized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub relationships: BTreeMap<String, Relationship>,
}

impl NormalizedItem {
    /// An item with no attributes and no relationships.
    pub fn shell(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            attributes: Map::new(),
            relationships: BTreeMap::new(),
        }
    }

    pub fn descriptor(&self) -> RelDescriptor {
        RelDescriptor::new(&self.id, &self.resource_type)
    }
}

/// A normalized item as held by the store, with its status marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    #[serde(flatten)]
    pub resource: NormalizedItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<StatusMarker>,
}

impl StoredItem {
    pub fn new(resource: NormalizedItem, meta: Option<StatusMarker>) -> Self {
        Self { resource, meta }
    }
}

impl From<NormalizedItem> for StoredItem {
    fn from(resource: NormalizedItem) -> Self {
        Self::new(resource, None)
    }
}

/// Composite `(type, id)` identity of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub resource_type: String,
    pub id: String,
}

impl ResourceKey {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relationship_data_accepts_all_linkage_shapes() {
        let raw = json!({
            "author": { "data": { "id": "u1", "type": "user" } },
            "tags": { "data": [{ "id": "t1", "type": "tag" }, { "id": "t2", "type": "tag" }] },
            "editor": { "data": null },
            "reviewer": {}
        });

        let parsed: BTreeMap<String, Relationship> =
            serde_json::from_value(raw).expect("relationships must parse");

        assert_eq!(parsed["author"], Relationship::one(RelDescriptor::new("u1", "user")));
        assert_eq!(
            parsed["tags"],
            Relationship::many(vec![
                RelDescriptor::new("t1", "tag"),
                RelDescriptor::new("t2", "tag"),
            ])
        );
        assert_eq!(parsed["editor"], Relationship::null());
        assert_eq!(parsed["reviewer"], Relationship::null());
    }

    #[test]
    fn null_relationship_serializes_explicit_null() {
        let value = serde_json::to_value(Relationship::null()).expect("serialize");
        assert_eq!(value, json!({ "data": null }));
    }

    #[test]
    fn stored_item_reads_meta_marker() {
        let raw = json!({
            "id": "a1",
            "type": "article",
            "attributes": { "title": "Hello" },
            "meta": { "loading": false }
        });

        let item: StoredItem = serde_json::from_value(raw).expect("stored item must parse");

        assert_eq!(item.resource.descriptor(), RelDescriptor::new("a1", "article"));
        assert!(item.resource.relationships.is_empty());
        let meta = item.meta.expect("meta must be present");
        assert_eq!(meta.snapshot(), json!({ "loading": false }));
    }

    #[test]
    fn resource_key_displays_type_then_id() {
        assert_eq!(ResourceKey::new("type1", "type1Id1").to_string(), "type1:type1Id1");
    }
}
