//! Raw item → resource form.
//!
//! Each property of a raw item is classified through the item type's
//! transformation descriptor: declared relationships become `{id, type}`
//! linkage, everything else is copied into `attributes`.

use crate::error::NormalizeError;
use crate::resource::{NormalizedItem, RelDescriptor, Relationship};
use crate::transformation::TransformationRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const ID: &str = "id";
const TYPE: &str = "type";

/// What to do with the properties of an item whose type has no descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTypePolicy {
    /// Drop every property: the result has empty attributes and relationships.
    #[default]
    Empty,
    /// Copy every property verbatim into `attributes`.
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Properties never copied into the result. `id` and `type` are always
    /// skipped whether listed or not.
    pub ignored: BTreeSet<String>,
    pub unknown_type: UnknownTypePolicy,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            ignored: [ID, TYPE].into_iter().map(String::from).collect(),
            unknown_type: UnknownTypePolicy::default(),
        }
    }
}

/// Normalizer bound to a transformation registry.
pub struct Normalizer<'r, R: ?Sized> {
    registry: &'r R,
    options: NormalizeOptions,
}

impl<'r, R> Normalizer<'r, R>
where
    R: TransformationRegistry + ?Sized,
{
    pub fn new(registry: &'r R) -> Self {
        Self::with_options(registry, NormalizeOptions::default())
    }

    pub fn with_options(registry: &'r R, options: NormalizeOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Normalize one raw item.
    ///
    /// With `picks`, only those properties (plus `id`/`type`) are considered.
    pub fn normalize_item(
        &self,
        item: &Value,
        picks: Option<&[&str]>,
    ) -> Result<NormalizedItem, NormalizeError> {
        let object = item.as_object().ok_or(NormalizeError::NotAnObject)?;
        let id = identity_field(object, ID)?;
        let resource_type = identity_field(object, TYPE)?;
        let mut normalized = NormalizedItem::shell(id, resource_type);

        let transformation = self.registry.transformation(resource_type);
        if transformation.is_none() {
            tracing::debug!(
                resource_type,
                id,
                policy = ?self.options.unknown_type,
                "no transformation registered for type"
            );
            if self.options.unknown_type == UnknownTypePolicy::Empty {
                return Ok(normalized);
            }
        }

        for (property, value) in object {
            if self.is_ignored(property) {
                continue;
            }
            if let Some(picks) = picks
                && !picks.contains(&property.as_str())
            {
                continue;
            }

            match transformation {
                Some(transformation) if transformation.is_relationship(property) => {
                    let relationship = normalize_relationship(property, value)?;
                    normalized
                        .relationships
                        .insert(property.clone(), relationship);
                }
                _ => {
                    normalized
                        .attributes
                        .insert(property.clone(), value.clone());
                }
            }
        }

        Ok(normalized)
    }

    /// Normalize items in order. No deduplication is performed.
    pub fn normalize_collection(
        &self,
        items: &[Value],
        picks: Option<&[&str]>,
    ) -> Result<Vec<NormalizedItem>, NormalizeError> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.normalize_item(item, picks)
                    .map_err(|source| NormalizeError::AtIndex {
                        index,
                        source: Box::new(source),
                    })
            })
            .collect()
    }

    fn is_ignored(&self, property: &str) -> bool {
        property == ID || property == TYPE || self.options.ignored.contains(property)
    }
}

/// [`Normalizer::normalize_item`] with default options.
pub fn normalize_item<R>(
    registry: &R,
    item: &Value,
    picks: Option<&[&str]>,
) -> Result<NormalizedItem, NormalizeError>
where
    R: TransformationRegistry + ?Sized,
{
    Normalizer::new(registry).normalize_item(item, picks)
}

/// [`Normalizer::normalize_collection`] with default options.
pub fn normalize_collection<R>(
    registry: &R,
    items: &[Value],
    picks: Option<&[&str]>,
) -> Result<Vec<NormalizedItem>, NormalizeError>
where
    R: TransformationRegistry + ?Sized,
{
    Normalizer::new(registry).normalize_collection(items, picks)
}

fn identity_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, NormalizeError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or(NormalizeError::MissingIdentity { field })
}

fn normalize_relationship(property: &str, value: &Value) -> Result<Relationship, NormalizeError> {
    match value {
        Value::Array(targets) => targets
            .iter()
            .map(|target| relationship_descriptor(property, target))
            .collect::<Result<Vec<_>, _>>()
            .map(Relationship::many),
        Value::Object(_) => relationship_descriptor(property, value).map(Relationship::one),
        // Not included in the payload, or a bare scalar we cannot resolve.
        _ => Ok(Relationship::null()),
    }
}

fn relationship_descriptor(property: &str, target: &Value) -> Result<RelDescriptor, NormalizeError> {
    let field = |name: &'static str| {
        target
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| NormalizeError::MissingRelationshipIdentity {
                property: property.to_string(),
                field: name,
            })
    };
    Ok(RelDescriptor::new(field(ID)?, field(TYPE)?))
}
