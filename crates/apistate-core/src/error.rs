//! Error types for normalization, schema-map resolution and configuration.

/// Errors raised while normalizing raw items.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// Raw items must be JSON objects.
    #[error("item is not an object")]
    NotAnObject,

    /// `id` or `type` is missing or not a string.
    #[error("item is missing string `{field}`")]
    MissingIdentity { field: &'static str },

    /// A nested relationship record has no usable `id`/`type`.
    #[error("relationship `{property}` references a record without string `{field}`")]
    MissingRelationshipIdentity {
        property: String,
        field: &'static str,
    },

    /// Failure inside `normalize_collection`.
    #[error("item {index}: {source}")]
    AtIndex {
        index: usize,
        #[source]
        source: Box<NormalizeError>,
    },
}

/// Errors raised while parsing a textual storage path.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoragePathError {
    #[error("storage path is empty")]
    Empty,

    #[error("empty segment at offset {offset} in `{path}`")]
    EmptySegment { path: String, offset: usize },

    #[error("unterminated bracket segment at offset {offset} in `{path}`")]
    Unterminated { path: String, offset: usize },

    #[error("unexpected `{found}` at offset {offset} in `{path}`")]
    Unexpected {
        path: String,
        offset: usize,
        found: char,
    },
}

/// Configuration errors raised by `create_schemas_map`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaMapError {
    #[error("storage path for `{resource_type}` does not resolve: `{path}` has no `{missing}`")]
    Unresolved {
        resource_type: String,
        path: String,
        missing: String,
    },

    #[error("storage path for `{resource_type}` does not end at a collection: `{path}`")]
    NotACollection { resource_type: String, path: String },

    #[error("storage path for `{resource_type}` passes through a collection: `{path}`")]
    ThroughCollection { resource_type: String, path: String },
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("storage path for `{resource_type}`: {source}")]
    StoragePath {
        resource_type: String,
        #[source]
        source: StoragePathError,
    },
}

/// Errors raised while rendering a denormalized graph as JSON.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RenderError {
    /// Two of the flattened fields of a node share a name.
    #[error("field `{field}` of `{resource_type}:{id}` is defined twice")]
    FieldClash {
        resource_type: String,
        id: String,
        field: String,
    },

    #[error("rendering exceeds the budget of {limit} objects")]
    BudgetExceeded { limit: usize },
}
