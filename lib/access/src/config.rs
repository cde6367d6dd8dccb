//! Validated googlefed configuration.
//!
//! Raw settings arrive as the deserialized `googlefed` table (via the
//! `config` crate) and are turned into a [`GoogleFedConfig`] exactly once at
//! startup; any invalid combination is a fatal [`ConfigError`].

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Raw, unvalidated `googlefed` settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleFedSettings {
    /// Allowed email domain.
    #[serde(default)]
    pub domain: Option<String>,
    /// Grant every authenticated user the admin marker.
    #[serde(default)]
    pub all_admin: bool,
    /// Path to a `.yaml`/`.yml`/`.json` identity-map file.
    #[serde(default)]
    pub user_map: Option<PathBuf>,
    /// Inline identity-map entries (`googlefed.user.<external> = <internal>`).
    #[serde(default)]
    pub user: BTreeMap<String, String>,
    /// `replace` (default) or `extend`.
    #[serde(default)]
    pub group_principals: Option<String>,
    /// Static group table keyed by internal user ID.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

/// Where the identity map comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserMapSource {
    /// Entries given directly in the settings.
    Inline(BTreeMap<String, String>),
    /// A YAML mapping file.
    Yaml(PathBuf),
    /// A JSON object file.
    Json(PathBuf),
}

impl UserMapSource {
    /// Picks the file format from the path's suffix.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnrecognizedUserMapFormat` for any other suffix.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml(path.to_path_buf())),
            Some("json") => Ok(Self::Json(path.to_path_buf())),
            _ => Err(ConfigError::UnrecognizedUserMapFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// How resolver groups combine with the base principals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupPrincipalMode {
    /// The resolver's groups replace the whole principal list.
    #[default]
    Replace,
    /// The resolver's groups follow `Everyone`, `Authenticated` and the user ID.
    Extend,
}

impl FromStr for GroupPrincipalMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "extend" => Ok(Self::Extend),
            _ => Err(ConfigError::InvalidGroupPrincipalMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Validated googlefed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleFedConfig {
    domain: String,
    all_admin: bool,
    user_map: UserMapSource,
    group_principals: GroupPrincipalMode,
    groups: BTreeMap<String, Vec<String>>,
}

impl GoogleFedConfig {
    /// Validates raw settings.
    ///
    /// # Errors
    ///
    /// - `MissingDomain` if no non-blank domain is set
    /// - `ConflictingUserMapSources` if both a file and inline entries are set
    /// - `UnrecognizedUserMapFormat` if the file suffix is unknown
    /// - `InvalidGroupPrincipalMode` for an unknown mode
    pub fn from_settings(settings: GoogleFedSettings) -> Result<Self, ConfigError> {
        let domain = settings
            .domain
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::MissingDomain)?;

        let user_map = match settings.user_map {
            Some(path) if !settings.user.is_empty() => {
                return Err(ConfigError::ConflictingUserMapSources { path });
            }
            Some(path) => UserMapSource::from_path(&path)?,
            None => UserMapSource::Inline(settings.user),
        };

        let group_principals = settings
            .group_principals
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            domain,
            all_admin: settings.all_admin,
            user_map,
            group_principals,
            groups: settings.groups,
        })
    }

    /// Returns the allowed email domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns true if every authenticated user gets the admin marker.
    #[must_use]
    pub fn all_admin(&self) -> bool {
        self.all_admin
    }

    /// Returns the identity-map source.
    #[must_use]
    pub fn user_map(&self) -> &UserMapSource {
        &self.user_map
    }

    /// Returns how resolver groups combine with base principals.
    #[must_use]
    pub fn group_principals(&self) -> GroupPrincipalMode {
        self.group_principals
    }

    /// Returns the static group table.
    #[must_use]
    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }
}
