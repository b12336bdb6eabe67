//! # apistate-core
//!
//! Conversion between raw API payload items, a normalized per-type store, and
//! nested resource graphs.
//!
//! This crate provides:
//! - `normalize_item` / `normalize_collection`: raw item → resource form
//! - `Store` and `create_schemas_map`: per-type collections of one store snapshot
//! - `denormalize_item` / `denormalize_collection`: store → nested graph, with
//!   cycle-safe relationship resolution
//!
//! It intentionally does not own store mutation over time, fetching, or the
//! status marker lifecycle. Those concerns live in the embedding application.
//!
//! ## Data model
//!
//! ```text
//! raw item ──normalize──▶ NormalizedItem { id, type, attributes, relationships }
//!                               │  (stored by the application)
//!                               ▼
//! Store + StorageMap ──create_schemas_map──▶ SchemaMap
//!                                                │
//!                               denormalize ◀────┘
//!                                    │
//!                                    ▼
//!                     DenormalizedGraph (arena, shared identity on cycles)
//! ```

pub mod config;
pub mod denormalize;
pub mod error;
pub mod normalize;
pub mod resource;
pub mod schema;
pub mod status;
pub mod store;
pub mod transformation;

pub use config::{Config, DEFAULT_CONFIG_PATH};
pub use denormalize::{
    DenormalizedCollection, DenormalizedGraph, DenormalizedItem, DenormalizedNode, IdCollection,
    META_KEY, NodeId, RelationshipSlot, RenderOptions, SharedNodes, StateDenormalizer,
    denormalize_collection, denormalize_collection_with, denormalize_item, denormalize_item_with,
};
pub use error::{ConfigError, NormalizeError, RenderError, SchemaMapError, StoragePathError};
pub use normalize::{
    NormalizeOptions, Normalizer, UnknownTypePolicy, normalize_collection, normalize_item,
};
pub use resource::{Linkage, NormalizedItem, RelDescriptor, Relationship, ResourceKey, StoredItem};
pub use schema::{SchemaMap, StorageMap, StoragePath, create_schemas_map};
pub use status::StatusMarker;
pub use store::{Collection, Store, StoreNode};
pub use transformation::{
    Transformation, TransformationRegistry, Transformations, is_relationship,
};
