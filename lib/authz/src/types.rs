//! Authorization types for SpiceDB integration.

use googlefed_core::UserId;
use std::fmt;

/// Resource types in the authorization model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// A group users can belong to.
    Group,
}

impl ResourceType {
    /// Returns the SpiceDB type name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A subject (actor) in the authorization model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Subject type (always "user" for now).
    pub subject_type: String,
    /// Subject ID.
    pub id: String,
}

impl Subject {
    /// Creates a new user subject.
    #[must_use]
    pub fn user(id: &UserId) -> Self {
        Self {
            subject_type: "user".to_string(),
            id: id.to_string(),
        }
    }
}

/// Permission to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Membership of a group.
    Member,
}

impl Permission {
    /// Returns the SpiceDB permission name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
