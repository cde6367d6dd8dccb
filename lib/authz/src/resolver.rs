//! Group resolver backed by SpiceDB relationships.

use crate::client::AuthzClient;
use crate::types::{Permission, ResourceType, Subject};
use async_trait::async_trait;
use googlefed_core::{GroupResolver, ResolverError, UserId};
use rootcause::Report;
use tracing::instrument;

/// Resolves a user's groups as every `group` on which they hold `member`.
///
/// SpiceDB object IDs cannot contain `@` or `.`, so users must be mapped to
/// plain internal IDs through the identity map before this resolver can
/// answer for them.
#[derive(Clone)]
pub struct SpicedbGroupResolver {
    client: AuthzClient,
}

impl SpicedbGroupResolver {
    /// Creates a resolver over an existing client.
    #[must_use]
    pub fn new(client: AuthzClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GroupResolver for SpicedbGroupResolver {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn groups(&self, user_id: &UserId) -> Result<Vec<String>, Report<ResolverError>> {
        let groups = self
            .client
            .lookup_resources(
                ResourceType::Group,
                Permission::Member,
                &Subject::user(user_id),
            )
            .await
            .map_err(|report| ResolverError::LookupFailed {
                user_id: user_id.clone(),
                details: report.to_string(),
            })?;

        Ok(normalize_groups(groups))
    }
}

/// Sorts and deduplicates group IDs; SpiceDB streams them unordered.
fn normalize_groups(mut groups: Vec<String>) -> Vec<String> {
    groups.sort();
    groups.dedup();
    groups
}
