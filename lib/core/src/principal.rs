//! Principals: the string tokens that authorization checks match against.
//!
//! A request's effective principals are an ordered sequence. The two
//! system markers (`system.Everyone` and `system.Authenticated`) use the
//! same spelling as the hosting frameworks that consume them, so ACLs
//! written against those names keep working.

use crate::id::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker granted to every request.
pub const EVERYONE: &str = "system.Everyone";

/// Marker granted to every request carrying a session identity.
pub const AUTHENTICATED: &str = "system.Authenticated";

/// Marker granted to all authenticated users in global-admin mode.
pub const ADMIN: &str = "admin";

/// A single principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    /// Every request, authenticated or not.
    Everyone,
    /// Any request with a session identity.
    Authenticated,
    /// The resolved internal user.
    User(UserId),
    /// A group returned by the group resolver.
    Group(String),
    /// The fixed elevated role used in global-admin mode.
    Admin,
}

impl Principal {
    /// Returns the string form used in authorization checks.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Everyone => EVERYONE,
            Self::Authenticated => AUTHENTICATED,
            Self::User(id) => id.as_str(),
            Self::Group(name) => name,
            Self::Admin => ADMIN,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered sequence of principals computed for one request.
///
/// Serializes as a plain list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalSet {
    principals: Vec<Principal>,
}

impl PrincipalSet {
    /// Creates the anonymous set: just [`Principal::Everyone`].
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            principals: vec![Principal::Everyone],
        }
    }

    /// Creates a set of group principals, preserving the resolver's order.
    #[must_use]
    pub fn from_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principals: groups
                .into_iter()
                .map(|g| Principal::Group(g.into()))
                .collect(),
        }
    }

    /// Appends a principal.
    pub fn push(&mut self, principal: Principal) {
        self.principals.push(principal);
    }

    /// Appends every principal from `other`.
    pub fn extend(&mut self, other: PrincipalSet) {
        self.principals.extend(other.principals);
    }

    /// Returns true if the set contains the principal.
    #[must_use]
    pub fn contains(&self, principal: &Principal) -> bool {
        self.principals.contains(principal)
    }

    /// Returns true if any principal renders to `name`.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.principals.iter().any(|p| p.as_str() == name)
    }

    /// Returns the principals as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Principal] {
        &self.principals
    }

    /// Returns the string forms, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.principals.iter().map(Principal::as_str).collect()
    }

    /// Returns the number of principals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.principals.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

impl FromIterator<Principal> for PrincipalSet {
    fn from_iter<T: IntoIterator<Item = Principal>>(iter: T) -> Self {
        Self {
            principals: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PrincipalSet {
    type Item = Principal;
    type IntoIter = std::vec::IntoIter<Principal>;

    fn into_iter(self) -> Self::IntoIter {
        self.principals.into_iter()
    }
}

impl Serialize for PrincipalSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.principals.iter().map(Principal::as_str))
    }
}

impl<'de> Deserialize<'de> for PrincipalSet {
    /// Strings are classified back into principals by their markers; any
    /// other string becomes a [`Principal::Group`] since user IDs and group
    /// names are indistinguishable once rendered.
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        Ok(names
            .into_iter()
            .map(|name| match name.as_str() {
                EVERYONE => Principal::Everyone,
                AUTHENTICATED => Principal::Authenticated,
                ADMIN => Principal::Admin,
                _ => Principal::Group(name),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_set_is_everyone_only() {
        let set = PrincipalSet::anonymous();
        assert_eq!(set.names(), vec![EVERYONE]);
    }

    #[test]
    fn principal_string_forms() {
        assert_eq!(Principal::Everyone.as_str(), "system.Everyone");
        assert_eq!(Principal::Authenticated.as_str(), "system.Authenticated");
        assert_eq!(Principal::Admin.as_str(), "admin");
        assert_eq!(Principal::User(UserId::new("u1")).as_str(), "u1");
        assert_eq!(Principal::Group("eng".to_string()).to_string(), "eng");
    }

    #[test]
    fn from_groups_preserves_order() {
        let set = PrincipalSet::from_groups(["oncall", "eng"]);
        assert_eq!(set.names(), vec!["oncall", "eng"]);
    }

    #[test]
    fn contains_name_matches_rendered_form() {
        let mut set = PrincipalSet::anonymous();
        set.push(Principal::User(UserId::new("u1")));
        assert!(set.contains_name("u1"));
        assert!(set.contains_name(EVERYONE));
        assert!(!set.contains_name(ADMIN));
    }

    #[test]
    fn serializes_as_string_list() {
        let mut set = PrincipalSet::anonymous();
        set.push(Principal::Authenticated);
        set.push(Principal::Admin);
        let json = serde_json::to_string(&set).expect("serialize");
        assert_eq!(
            json,
            r#"["system.Everyone","system.Authenticated","admin"]"#
        );
    }

    #[test]
    fn deserializes_markers() {
        let set: PrincipalSet =
            serde_json::from_str(r#"["system.Everyone","eng"]"#).expect("deserialize");
        assert!(set.contains(&Principal::Everyone));
        assert!(set.contains(&Principal::Group("eng".to_string())));
    }
}
