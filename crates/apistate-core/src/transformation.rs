//! Transformation descriptors: which properties of a type are relationships.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Shape declaration for one resource type.
///
/// Relationship properties are read either as a list of names or as a map of
/// name to flag (`{"author": true}`); only names flagged `true` count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    #[serde(
        default,
        alias = "relationships",
        deserialize_with = "relationship_properties"
    )]
    pub relationship_properties: BTreeSet<String>,
}

fn relationship_properties<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Properties {
        Names(BTreeSet<String>),
        Flags(BTreeMap<String, bool>),
    }

    Ok(match Properties::deserialize(deserializer)? {
        Properties::Names(names) => names,
        Properties::Flags(flags) => flags
            .into_iter()
            .filter_map(|(name, flagged)| flagged.then_some(name))
            .collect(),
    })
}

impl Transformation {
    pub fn new<I, S>(relationship_properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            relationship_properties: relationship_properties.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_relationship(&self, property: &str) -> bool {
        self.relationship_properties.contains(property)
    }
}

/// Lookup of transformation descriptors by resource type.
pub trait TransformationRegistry {
    fn transformation(&self, resource_type: &str) -> Option<&Transformation>;
}

/// Classify `property` of `resource_type`.
///
/// `None` when the type has no descriptor: the property can be neither
/// attribute nor relationship, and the caller's unknown-type policy decides.
pub fn is_relationship<R>(registry: &R, resource_type: &str, property: &str) -> Option<bool>
where
    R: TransformationRegistry + ?Sized,
{
    registry
        .transformation(resource_type)
        .map(|transformation| transformation.is_relationship(property))
}

/// In-memory registry keyed by type name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transformations {
    by_type: BTreeMap<String, Transformation>,
}

impl Transformations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Transformations::insert`].
    pub fn with_relationships<I, S>(mut self, resource_type: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(resource_type, Transformation::new(properties));
        self
    }

    pub fn insert(
        &mut self,
        resource_type: impl Into<String>,
        transformation: Transformation,
    ) -> Option<Transformation> {
        self.by_type.insert(resource_type.into(), transformation)
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }
}

impl TransformationRegistry for Transformations {
    fn transformation(&self, resource_type: &str) -> Option<&Transformation> {
        self.by_type.get(resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_declared_properties_only() {
        let registry = Transformations::new().with_relationships("article", ["author", "comments"]);

        assert_eq!(is_relationship(&registry, "article", "author"), Some(true));
        assert_eq!(is_relationship(&registry, "article", "title"), Some(false));
    }

    #[test]
    fn unknown_type_is_unclassifiable() {
        let registry = Transformations::new().with_relationships("article", ["author"]);
        assert_eq!(is_relationship(&registry, "comment", "author"), None);
    }

    #[test]
    fn registry_parses_from_json() {
        let raw = r#"{
            "article": { "relationshipProperties": ["author"] },
            "comment": { "relationships": ["article"] },
            "tag": {}
        }"#;

        let registry: Transformations = serde_json::from_str(raw).expect("registry must parse");

        assert_eq!(registry.len(), 3);
        assert_eq!(is_relationship(&registry, "comment", "article"), Some(true));
        assert_eq!(is_relationship(&registry, "tag", "name"), Some(false));
    }

    #[test]
    fn registry_accepts_flag_maps() {
        let raw = r#"{
            "article": { "relationshipProperties": { "author": true, "editor": false } },
            "comment": { "relationships": { "article": true } }
        }"#;

        let registry: Transformations = serde_json::from_str(raw).expect("registry must parse");

        assert_eq!(is_relationship(&registry, "article", "author"), Some(true));
        assert_eq!(is_relationship(&registry, "article", "editor"), Some(false));
        assert_eq!(is_relationship(&registry, "comment", "article"), Some(true));

        let rendered = serde_json::to_value(&registry).expect("serialize");
        assert_eq!(
            rendered["article"]["relationshipProperties"],
            serde_json::json!(["author"])
        );
    }

    #[test]
    fn flag_values_must_be_booleans() {
        let raw = r#"{ "article": { "relationshipProperties": { "author": "yes" } } }"#;
        assert!(serde_json::from_str::<Transformations>(raw).is_err());
    }
}
