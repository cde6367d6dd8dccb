//! Permission table for login-related events.
//!
//! Each [`EventKind`] the dispatch layer can route has an [`Acl`]. The
//! dispatch layer asks the table before running a handler, rather than the
//! events carrying access metadata themselves.

use googlefed_core::PrincipalSet;
use googlefed_core::principal::{AUTHENTICATED, EVERYONE};
use std::collections::HashMap;
use std::fmt;

/// Events routed by the login layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The login endpoint was requested.
    LoginRequested,
    /// The provider reported a completed authentication.
    AuthenticationComplete,
    /// The provider reported a denied authentication.
    AuthenticationDenied,
    /// The logout endpoint was requested.
    Logout,
    /// Any resource that requires a session identity.
    ProtectedResource,
}

impl EventKind {
    /// Returns a stable name for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginRequested => "login_requested",
            Self::AuthenticationComplete => "authentication_complete",
            Self::AuthenticationDenied => "authentication_denied",
            Self::Logout => "logout",
            Self::ProtectedResource => "protected_resource",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission requested by the dispatch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Run the event's handler.
    Access,
    /// Every permission.
    All,
}

/// Whether an entry grants or refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Grant the permission.
    Allow,
    /// Refuse the permission.
    Deny,
}

/// One ACL entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    /// Grant or refuse.
    pub action: Action,
    /// Principal the entry applies to, in rendered form.
    pub principal: String,
    /// Permission the entry covers.
    pub permission: Permission,
}

impl AclEntry {
    /// Creates an `Allow` entry.
    #[must_use]
    pub fn allow(principal: impl Into<String>, permission: Permission) -> Self {
        Self {
            action: Action::Allow,
            principal: principal.into(),
            permission,
        }
    }

    /// Creates a `Deny` entry.
    #[must_use]
    pub fn deny(principal: impl Into<String>, permission: Permission) -> Self {
        Self {
            action: Action::Deny,
            principal: principal.into(),
            permission,
        }
    }

    fn covers(&self, permission: Permission) -> bool {
        self.permission == Permission::All || self.permission == permission
    }

    // `system.Everyone` is held by every request, whatever the policy computed.
    fn applies_to(&self, principals: &PrincipalSet) -> bool {
        self.principal == EVERYONE || principals.contains_name(&self.principal)
    }
}

/// Ordered access-control list. The first matching entry decides; no match denies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    entries: Vec<AclEntry>,
}

impl Acl {
    /// Creates an ACL from entries, in evaluation order.
    #[must_use]
    pub fn new(entries: Vec<AclEntry>) -> Self {
        Self { entries }
    }

    /// Returns true if `principals` hold `permission`.
    #[must_use]
    pub fn permits(&self, principals: &PrincipalSet, permission: Permission) -> bool {
        self.entries
            .iter()
            .find(|entry| entry.covers(permission) && entry.applies_to(principals))
            .is_some_and(|entry| entry.action == Action::Allow)
    }

    /// Returns true if every request holds `permission`, whatever its
    /// principals: the first entry covering it allows `system.Everyone`.
    #[must_use]
    pub fn grants_everyone(&self, permission: Permission) -> bool {
        self.entries
            .iter()
            .find(|entry| entry.covers(permission))
            .is_some_and(|entry| entry.principal == EVERYONE && entry.action == Action::Allow)
    }
}

/// Permission table keyed by event kind.
#[derive(Debug, Clone)]
pub struct EventPermissions {
    table: HashMap<EventKind, Acl>,
}

impl EventPermissions {
    /// Creates an empty table, in which every event is denied.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Sets the ACL for `kind`.
    #[must_use]
    pub fn with(mut self, kind: EventKind, acl: Acl) -> Self {
        self.table.insert(kind, acl);
        self
    }

    /// Replaces the protected-resource ACL with one allowing any of
    /// `principals`.
    ///
    /// In replace mode an authenticated user's principals are only their
    /// groups, so deployments using it list the groups that may enter.
    #[must_use]
    pub fn protected_by<I, S>(self, principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = principals
            .into_iter()
            .map(|p| AclEntry::allow(p, Permission::Access))
            .collect();
        self.with(EventKind::ProtectedResource, Acl::new(entries))
    }

    /// Returns the ACL for `kind`, if any.
    #[must_use]
    pub fn acl(&self, kind: EventKind) -> Option<&Acl> {
        self.table.get(&kind)
    }

    /// Returns true if any request may trigger `kind`, so its principals
    /// need not be computed.
    #[must_use]
    pub fn is_open(&self, kind: EventKind) -> bool {
        self.acl(kind)
            .is_some_and(|acl| acl.grants_everyone(Permission::Access))
    }

    /// Returns true if `principals` may trigger `kind`.
    #[must_use]
    pub fn permits(&self, kind: EventKind, principals: &PrincipalSet) -> bool {
        self.acl(kind)
            .is_some_and(|acl| acl.permits(principals, Permission::Access))
    }
}

impl Default for EventPermissions {
    /// Login, provider callbacks and logout are open to everyone; protected
    /// resources need a session identity.
    fn default() -> Self {
        let open = Acl::new(vec![AclEntry::allow(EVERYONE, Permission::All)]);
        Self::empty()
            .with(EventKind::LoginRequested, open.clone())
            .with(EventKind::AuthenticationComplete, open.clone())
            .with(EventKind::AuthenticationDenied, open.clone())
            .with(EventKind::Logout, open)
            .with(
                EventKind::ProtectedResource,
                Acl::new(vec![AclEntry::allow(AUTHENTICATED, Permission::Access)]),
            )
    }
}
