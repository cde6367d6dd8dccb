//! Core types shared by the googlefed crates.
//!
//! This crate provides the identity and principal vocabulary used by the
//! authentication policy, together with the [`GroupResolver`] seam through
//! which group memberships are looked up.

pub mod error;
pub mod group;
pub mod id;
pub mod principal;

pub use error::Result;
pub use group::{GroupResolver, ResolverError};
pub use id::{ParseIdError, SessionId, UserId};
pub use principal::{Principal, PrincipalSet};
