//! Configuration-backed group resolver.

use async_trait::async_trait;
use googlefed_core::{GroupResolver, ResolverError, UserId};
use rootcause::Report;
use std::collections::BTreeMap;

/// Resolves groups from a fixed table keyed by internal user ID.
///
/// Users without an entry belong to no groups.
#[derive(Debug, Clone, Default)]
pub struct StaticGroupResolver {
    groups: BTreeMap<String, Vec<String>>,
}

impl StaticGroupResolver {
    /// Creates a resolver over the given table.
    #[must_use]
    pub fn new(groups: BTreeMap<String, Vec<String>>) -> Self {
        Self { groups }
    }
}

#[async_trait]
impl GroupResolver for StaticGroupResolver {
    async fn groups(&self, user_id: &UserId) -> Result<Vec<String>, Report<ResolverError>> {
        Ok(self
            .groups
            .get(user_id.as_str())
            .cloned()
            .unwrap_or_default())
    }
}
