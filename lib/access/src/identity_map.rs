//! Static mapping from provider usernames to internal user IDs.

use crate::config::UserMapSource;
use crate::error::ConfigError;
use config::{FileFormat, Format};
use googlefed_core::UserId;
use rootcause::Report;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Maps an external username (an email address) to an internal user ID.
///
/// Built once at startup and immutable afterwards, so it can be shared
/// across requests behind an `Arc` without locking. Usernames with no entry
/// map to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    entries: HashMap<String, String>,
}

impl IdentityMap {
    /// Creates a map from explicit entries.
    #[must_use]
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Loads the map from its configured source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UserMapRead` or `ConfigError::UserMapParse` if a
    /// map file is unreadable or malformed.
    pub fn load(source: &UserMapSource) -> Result<Self, Report<ConfigError>> {
        let map = match source {
            UserMapSource::Inline(entries) => Self::new(entries.clone()),
            UserMapSource::Yaml(path) => Self::from_yaml_str(&read(path)?, path)?,
            UserMapSource::Json(path) => Self::from_json_str(&read(path)?, path)?,
        };
        info!(entries = map.len(), "loaded identity map");
        Ok(map)
    }

    /// Parses a YAML mapping. Scalar values are stringified.
    fn from_yaml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let parse_error = |details: String| ConfigError::UserMapParse {
            path: path.to_path_buf(),
            details,
        };

        let table = FileFormat::Yaml
            .parse(None, text)
            .map_err(|e| parse_error(e.to_string()))?;

        let mut entries = HashMap::with_capacity(table.len());
        for (external, value) in table {
            let internal = value
                .into_string()
                .map_err(|e| parse_error(format!("entry '{external}': {e}")))?;
            entries.insert(external, internal);
        }
        Ok(Self { entries })
    }

    /// Parses a JSON object of strings.
    fn from_json_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let entries: HashMap<String, String> =
            serde_json::from_str(text).map_err(|e| ConfigError::UserMapParse {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;
        Ok(Self { entries })
    }

    /// Returns the internal user ID for `external`, or `external` itself
    /// if it has no entry.
    #[must_use]
    pub fn lookup(&self, external: &str) -> UserId {
        match self.entries.get(external) {
            Some(internal) => UserId::new(internal.as_str()),
            None => UserId::new(external),
        }
    }

    /// Returns the number of explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no explicit entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::UserMapRead {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}
