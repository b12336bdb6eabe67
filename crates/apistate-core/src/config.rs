//! TOML configuration: storage map, transformation descriptors, normalizer
//! policy.
//!
//! ```toml
//! [storage]
//! type1 = "storage.type1"
//! "type2.test" = 'storage["type2.test"]'
//!
//! [transformations.type1]
//! relationships = ["type1", "type2.test"]
//!
//! [normalize]
//! unknown_type = "passthrough"
//! ignored = ["links"]
//! ```

use crate::error::ConfigError;
use crate::normalize::{NormalizeOptions, Normalizer, UnknownTypePolicy};
use crate::schema::{StorageMap, StoragePath};
use crate::transformation::Transformations;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "apistate.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    storage: BTreeMap<String, String>,
    #[serde(default)]
    transformations: Transformations,
    #[serde(default)]
    normalize: RawNormalize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNormalize {
    #[serde(default)]
    unknown_type: UnknownTypePolicy,
    #[serde(default)]
    ignored: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub storage: StorageMap,
    pub transformations: Transformations,
    pub normalize: NormalizeOptions,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;

        let storage = raw
            .storage
            .into_iter()
            .map(|(resource_type, path)| match path.parse::<StoragePath>() {
                Ok(path) => Ok((resource_type, path)),
                Err(source) => Err(ConfigError::StoragePath {
                    resource_type,
                    source,
                }),
            })
            .collect::<Result<StorageMap, _>>()?;

        let mut normalize = NormalizeOptions {
            unknown_type: raw.normalize.unknown_type,
            ..NormalizeOptions::default()
        };
        normalize.ignored.extend(raw.normalize.ignored);

        Ok(Self {
            storage,
            transformations: raw.transformations,
            normalize,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Normalizer over this configuration's registry and policy.
    pub fn normalizer(&self) -> Normalizer<'_, Transformations> {
        Normalizer::with_options(&self.transformations, self.normalize.clone())
    }
}
