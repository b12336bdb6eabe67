//! Storage paths and per-session schema maps.
//!
//! A [`StorageMap`] says where each type's collection lives in the root store.
//! [`create_schemas_map`] resolves it once per denormalization session into a
//! [`SchemaMap`] of direct collection references, so a misconfigured path
//! fails before any recursive work starts.

use crate::error::{SchemaMapError, StoragePathError};
use crate::resource::StoredItem;
use crate::store::{Collection, Store};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

/// Location of a collection in the store, as a list of keys.
///
/// Text form uses dotted identifiers and bracket-quoted keys:
/// `storage.type1`, `storage["type2.test"]`, `storage['a.b'].items`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoragePath {
    segments: Vec<String>,
}

impl StoragePath {
    /// Build a path from raw keys. Keys are taken verbatim, dots included.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl FromStr for StoragePath {
    type Err = StoragePathError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        if path.is_empty() {
            return Err(StoragePathError::Empty);
        }

        let mut segments = Vec::new();
        let mut chars = path.char_indices().peekable();
        // At the start and after a '.', a segment must follow.
        let mut expect_segment = true;

        while let Some((offset, ch)) = chars.next() {
            match ch {
                '[' => {
                    segments.push(bracket_segment(path, offset, &mut chars)?);
                    expect_segment = false;
                }
                '.' if expect_segment => {
                    return Err(StoragePathError::EmptySegment {
                        path: path.to_string(),
                        offset,
                    });
                }
                '.' => expect_segment = true,
                _ if !expect_segment => {
                    return Err(StoragePathError::Unexpected {
                        path: path.to_string(),
                        offset,
                        found: ch,
                    });
                }
                _ => {
                    let mut segment = String::from(ch);
                    while let Some(&(_, next)) = chars.peek() {
                        if next == '.' || next == '[' {
                            break;
                        }
                        segment.push(next);
                        chars.next();
                    }
                    segments.push(segment);
                    expect_segment = false;
                }
            }
        }

        if expect_segment {
            return Err(StoragePathError::EmptySegment {
                path: path.to_string(),
                offset: path.len(),
            });
        }
        Ok(Self { segments })
    }
}

/// Read a `[...]` segment; the opening bracket at `open` is already consumed.
fn bracket_segment(
    path: &str,
    open: usize,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<String, StoragePathError> {
    let unterminated = || StoragePathError::Unterminated {
        path: path.to_string(),
        offset: open,
    };

    let quote = match chars.peek() {
        Some(&(_, quote @ ('"' | '\''))) => {
            chars.next();
            Some(quote)
        }
        _ => None,
    };

    let mut segment = String::new();
    loop {
        let (_, ch) = chars.next().ok_or_else(unterminated)?;
        match quote {
            Some(quote) if ch == quote => {
                match chars.next() {
                    Some((_, ']')) => break,
                    Some((offset, found)) => {
                        return Err(StoragePathError::Unexpected {
                            path: path.to_string(),
                            offset,
                            found,
                        });
                    }
                    None => return Err(unterminated()),
                }
            }
            Some(_) if ch == '\\' => {
                let (_, escaped) = chars.next().ok_or_else(unterminated)?;
                segment.push(escaped);
            }
            None if ch == ']' => break,
            _ => segment.push(ch),
        }
    }

    if segment.is_empty() {
        return Err(StoragePathError::EmptySegment {
            path: path.to_string(),
            offset: open,
        });
    }
    Ok(segment)
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '$' | '-'))
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if is_plain_segment(segment) {
                if index > 0 {
                    f.write_str(".")?;
                }
                f.write_str(segment)?;
            } else {
                let escaped = segment.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "[\"{escaped}\"]")?;
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for StoragePath {
    type Error = StoragePathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StoragePath> for String {
    fn from(path: StoragePath) -> Self {
        path.to_string()
    }
}

/// Type name → storage path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageMap {
    paths: BTreeMap<String, StoragePath>,
}

impl StorageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`StorageMap::insert`].
    pub fn with(mut self, resource_type: impl Into<String>, path: StoragePath) -> Self {
        self.insert(resource_type, path);
        self
    }

    pub fn insert(&mut self, resource_type: impl Into<String>, path: StoragePath) -> Option<StoragePath> {
        self.paths.insert(resource_type.into(), path)
    }

    pub fn path(&self, resource_type: &str) -> Option<&StoragePath> {
        self.paths.get(resource_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoragePath)> {
        self.paths.iter().map(|(ty, path)| (ty.as_str(), path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FromIterator<(String, StoragePath)> for StorageMap {
    fn from_iter<I: IntoIterator<Item = (String, StoragePath)>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

/// Type name → that type's collection, borrowed from one store snapshot.
#[derive(Debug, Clone, Default)]
pub struct SchemaMap<'s> {
    collections: BTreeMap<String, &'s Collection>,
}

impl<'s> SchemaMap<'s> {
    pub fn collection(&self, resource_type: &str) -> Option<&'s Collection> {
        self.collections.get(resource_type).copied()
    }

    pub fn item(&self, resource_type: &str, id: &str) -> Option<&'s StoredItem> {
        self.collection(resource_type)?.get(id)
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

/// Resolve every entry of `storage_map` against `store`.
pub fn create_schemas_map<'s>(
    store: &'s Store,
    storage_map: &StorageMap,
) -> Result<SchemaMap<'s>, SchemaMapError> {
    let mut collections = BTreeMap::new();
    for (resource_type, path) in storage_map.iter() {
        let collection = store.resolve(resource_type, path)?;
        tracing::trace!(resource_type, %path, items = collection.len(), "resolved collection");
        collections.insert(resource_type.to_string(), collection);
    }
    Ok(SchemaMap { collections })
}
