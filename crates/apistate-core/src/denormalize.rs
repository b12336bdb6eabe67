//! Normalized store → nested resource graph.
//!
//! Denormalization walks relationship linkage depth-first. Every node is
//! registered in the session's [`DenormalizedGraph`] under its `(type, id)`
//! key *before* its relationships are followed, so a revisit returns the
//! existing handle and cyclic linkage terminates with shared identity.
//!
//! A graph is one session: never reuse it across unrelated calls, or nodes
//! from the earlier call will be returned as if already visited.

use crate::error::{RenderError, SchemaMapError};
use crate::resource::{Linkage, ResourceKey};
use crate::schema::{SchemaMap, StorageMap, create_schemas_map};
use crate::status::StatusMarker;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Key under which status markers are rendered.
pub const META_KEY: &str = "meta";

/// Stable handle of a node inside one [`DenormalizedGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A resolved relationship property.
///
/// `None` entries are targets referenced by linkage but absent from the
/// store; sequences keep them in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipSlot {
    One(Option<NodeId>),
    Many(Vec<Option<NodeId>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DenormalizedNode {
    pub id: String,
    pub resource_type: String,
    pub attributes: Map<String, Value>,
    pub status: Option<StatusMarker>,
    /// Relationships whose linkage was `null` are omitted.
    pub relationships: BTreeMap<String, RelationshipSlot>,
}

impl DenormalizedNode {
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(&self.resource_type, &self.id)
    }

    pub fn relationship(&self, property: &str) -> Option<&RelationshipSlot> {
        self.relationships.get(property)
    }
}

/// Arena of denormalized nodes plus the visited index of one session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DenormalizedGraph {
    nodes: Vec<DenormalizedNode>,
    visited: HashMap<ResourceKey, NodeId>,
}

impl DenormalizedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, handle: NodeId) -> Option<&DenormalizedNode> {
        self.nodes.get(handle.0)
    }

    /// Handle of an already visited resource.
    pub fn lookup(&self, resource_type: &str, id: &str) -> Option<NodeId> {
        self.visited.get(&ResourceKey::new(resource_type, id)).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DenormalizedNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    fn register(&mut self, node: DenormalizedNode) -> NodeId {
        let handle = NodeId(self.nodes.len());
        self.visited.insert(node.key(), handle);
        self.nodes.push(node);
        handle
    }

    /// Render `handle` as a nested JSON tree with default [`RenderOptions`].
    ///
    /// Attributes are flattened next to `id` and `type`, status renders under
    /// `meta`. A node already being rendered further up the current branch is
    /// emitted as its `{id, type}` reference, which cuts cycles.
    ///
    /// Shared but acyclic nodes are rendered in full at every occurrence, so
    /// the output can grow exponentially with the depth of diamond-shaped
    /// linkage. Use [`DenormalizedGraph::render`] with
    /// [`SharedNodes::Reference`] or an object budget to bound it.
    pub fn to_value(&self, handle: NodeId) -> Result<Value, RenderError> {
        self.render(handle, &RenderOptions::default())
    }

    pub fn render(&self, handle: NodeId, options: &RenderOptions) -> Result<Value, RenderError> {
        Renderer::new(self, options).root(Some(handle))
    }
}

/// How nodes reached more than once within one rendered tree are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharedNodes {
    /// Render every occurrence in full.
    #[default]
    Expand,
    /// Render the first occurrence in full and later ones as `{id, type}`.
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub shared: SharedNodes,
    /// Maximum number of fully rendered objects per call; `None` is unbounded.
    pub max_objects: Option<usize>,
}

impl RenderOptions {
    pub fn references() -> Self {
        Self {
            shared: SharedNodes::Reference,
            max_objects: None,
        }
    }

    pub fn with_max_objects(mut self, limit: usize) -> Self {
        self.max_objects = Some(limit);
        self
    }
}

/// State of one render call. The object budget spans every root rendered
/// through the same renderer; the set of emitted nodes is per root.
struct Renderer<'g> {
    graph: &'g DenormalizedGraph,
    options: RenderOptions,
    on_path: HashSet<NodeId>,
    emitted: HashSet<NodeId>,
    objects: usize,
}

impl<'g> Renderer<'g> {
    fn new(graph: &'g DenormalizedGraph, options: &RenderOptions) -> Self {
        Self {
            graph,
            options: *options,
            on_path: HashSet::new(),
            emitted: HashSet::new(),
            objects: 0,
        }
    }

    fn root(&mut self, handle: Option<NodeId>) -> Result<Value, RenderError> {
        self.emitted.clear();
        self.target(handle)
    }

    fn target(&mut self, handle: Option<NodeId>) -> Result<Value, RenderError> {
        match handle {
            Some(handle) => self.node(handle),
            None => Ok(Value::Null),
        }
    }

    fn node(&mut self, handle: NodeId) -> Result<Value, RenderError> {
        let graph = self.graph;
        let Some(node) = graph.node(handle) else {
            return Ok(Value::Null);
        };
        let repeated =
            self.options.shared == SharedNodes::Reference && self.emitted.contains(&handle);
        if repeated || self.on_path.contains(&handle) {
            return Ok(json!({ "id": node.id, "type": node.resource_type }));
        }
        if let Some(limit) = self.options.max_objects
            && self.objects >= limit
        {
            return Err(RenderError::BudgetExceeded { limit });
        }
        self.objects += 1;
        self.on_path.insert(handle);
        self.emitted.insert(handle);

        let mut object = Map::new();
        insert_field(&mut object, node, "id", Value::String(node.id.clone()))?;
        insert_field(&mut object, node, "type", Value::String(node.resource_type.clone()))?;
        for (name, value) in &node.attributes {
            insert_field(&mut object, node, name, value.clone())?;
        }
        if let Some(status) = &node.status {
            insert_field(&mut object, node, META_KEY, status.snapshot())?;
        }
        for (property, slot) in &node.relationships {
            let value = match slot {
                RelationshipSlot::One(target) => self.target(*target)?,
                RelationshipSlot::Many(targets) => Value::Array(
                    targets
                        .iter()
                        .map(|target| self.target(*target))
                        .collect::<Result<_, _>>()?,
                ),
            };
            insert_field(&mut object, node, property, value)?;
        }

        self.on_path.remove(&handle);
        Ok(Value::Object(object))
    }
}

fn insert_field(
    object: &mut Map<String, Value>,
    node: &DenormalizedNode,
    field: &str,
    value: Value,
) -> Result<(), RenderError> {
    if object.contains_key(field) {
        return Err(RenderError::FieldClash {
            resource_type: node.resource_type.clone(),
            id: node.id.clone(),
            field: field.to_string(),
        });
    }
    object.insert(field.to_string(), value);
    Ok(())
}

/// Denormalize one resource into `visited`.
///
/// Returns `None` when `schemas` has no such resource.
pub fn denormalize_item_with(
    id: &str,
    resource_type: &str,
    schemas: &SchemaMap<'_>,
    visited: &mut DenormalizedGraph,
) -> Option<NodeId> {
    let Some(stored) = schemas.item(resource_type, id) else {
        tracing::debug!(resource_type, id, "resource not loaded");
        return None;
    };
    if let Some(handle) = visited.lookup(resource_type, id) {
        tracing::trace!(resource_type, id, "resource already visited");
        return Some(handle);
    }

    let resource = &stored.resource;
    let handle = visited.register(DenormalizedNode {
        id: resource.id.clone(),
        resource_type: resource.resource_type.clone(),
        attributes: resource.attributes.clone(),
        status: stored.meta.clone(),
        relationships: BTreeMap::new(),
    });
    // Stored id/type may differ from the collection key; index both.
    visited
        .visited
        .insert(ResourceKey::new(resource_type, id), handle);

    for (property, relationship) in &resource.relationships {
        let slot = match &relationship.data {
            None => continue,
            Some(Linkage::One(target)) => RelationshipSlot::One(denormalize_item_with(
                &target.id,
                &target.resource_type,
                schemas,
                visited,
            )),
            Some(Linkage::Many(targets)) => RelationshipSlot::Many(
                targets
                    .iter()
                    .map(|target| {
                        denormalize_item_with(&target.id, &target.resource_type, schemas, visited)
                    })
                    .collect(),
            ),
        };
        visited.nodes[handle.0]
            .relationships
            .insert(property.clone(), slot);
    }

    Some(handle)
}

/// Denormalize `ids` into `visited`, in order, sharing one visited index.
pub fn denormalize_collection_with<S>(
    ids: &[S],
    resource_type: &str,
    schemas: &SchemaMap<'_>,
    visited: &mut DenormalizedGraph,
) -> Vec<Option<NodeId>>
where
    S: AsRef<str>,
{
    ids.iter()
        .map(|id| denormalize_item_with(id.as_ref(), resource_type, schemas, visited))
        .collect()
}

/// A denormalized resource with the session graph that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct DenormalizedItem {
    graph: DenormalizedGraph,
    root: Option<NodeId>,
}

impl DenormalizedItem {
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self) -> Option<&DenormalizedNode> {
        self.root.and_then(|root| self.graph.node(root))
    }

    pub fn graph(&self) -> &DenormalizedGraph {
        &self.graph
    }

    /// `null` when the resource was not found.
    pub fn to_value(&self) -> Result<Value, RenderError> {
        self.render(&RenderOptions::default())
    }

    pub fn render(&self, options: &RenderOptions) -> Result<Value, RenderError> {
        Renderer::new(&self.graph, options).root(self.root)
    }
}

/// Denormalize one resource in a fresh session.
pub fn denormalize_item(id: &str, resource_type: &str, schemas: &SchemaMap<'_>) -> DenormalizedItem {
    let mut graph = DenormalizedGraph::new();
    let root = denormalize_item_with(id, resource_type, schemas, &mut graph);
    DenormalizedItem { graph, root }
}

/// Ids of one type, with the collection's own status marker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IdCollection {
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<StatusMarker>,
}

impl IdCollection {
    pub fn new<I, S>(ids: I, meta: Option<StatusMarker>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            meta,
        }
    }
}

impl From<Vec<String>> for IdCollection {
    fn from(ids: Vec<String>) -> Self {
        Self { ids, meta: None }
    }
}

/// Denormalized resources in input order, with collection-level status.
#[derive(Debug, Clone, PartialEq)]
pub struct DenormalizedCollection {
    graph: DenormalizedGraph,
    items: Vec<Option<NodeId>>,
    status: Option<StatusMarker>,
}

impl DenormalizedCollection {
    pub fn items(&self) -> &[Option<NodeId>] {
        &self.items
    }

    pub fn status(&self) -> Option<&StatusMarker> {
        self.status.as_ref()
    }

    pub fn graph(&self) -> &DenormalizedGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Node at `index`, `None` when out of range or not found.
    pub fn node(&self, index: usize) -> Option<&DenormalizedNode> {
        self.items
            .get(index)
            .copied()
            .flatten()
            .and_then(|handle| self.graph.node(handle))
    }

    /// JSON array of rendered items; unresolved ids render as `null`.
    pub fn to_value(&self) -> Result<Value, RenderError> {
        self.render(&RenderOptions::default())
    }

    /// Each item is its own tree for [`SharedNodes::Reference`]; the object
    /// budget covers the whole array.
    pub fn render(&self, options: &RenderOptions) -> Result<Value, RenderError> {
        let mut renderer = Renderer::new(&self.graph, options);
        self.items
            .iter()
            .map(|item| renderer.root(*item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

/// Denormalize a collection of ids in a fresh session.
pub fn denormalize_collection(
    ids: &IdCollection,
    resource_type: &str,
    schemas: &SchemaMap<'_>,
) -> DenormalizedCollection {
    let mut graph = DenormalizedGraph::new();
    let items = denormalize_collection_with(&ids.ids, resource_type, schemas, &mut graph);
    DenormalizedCollection {
        graph,
        items,
        status: ids.meta.clone(),
    }
}

/// Denormalizer bound to a store source and a storage map.
///
/// The store is fetched and the schema map resolved again on every call, so
/// each call observes the current store.
pub struct StateDenormalizer<G> {
    get_store: G,
    storage_map: StorageMap,
}

impl<G, S> StateDenormalizer<G>
where
    G: Fn() -> S,
    S: Borrow<Store>,
{
    pub fn new(get_store: G, storage_map: StorageMap) -> Self {
        Self {
            get_store,
            storage_map,
        }
    }

    pub fn storage_map(&self) -> &StorageMap {
        &self.storage_map
    }

    pub fn denormalize_item(
        &self,
        id: &str,
        resource_type: &str,
    ) -> Result<DenormalizedItem, SchemaMapError> {
        let store = (self.get_store)();
        let schemas = create_schemas_map(<S as Borrow<Store>>::borrow(&store), &self.storage_map)?;
        Ok(denormalize_item(id, resource_type, &schemas))
    }

    pub fn denormalize_collection(
        &self,
        ids: &IdCollection,
        resource_type: &str,
    ) -> Result<DenormalizedCollection, SchemaMapError> {
        let store = (self.get_store)();
        let schemas = create_schemas_map(<S as Borrow<Store>>::borrow(&store), &self.storage_map)?;
        Ok(denormalize_collection(ids, resource_type, &schemas))
    }
}
