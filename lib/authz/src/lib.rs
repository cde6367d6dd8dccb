//! SpiceDB group resolution for googlefed.
//!
//! Group memberships live in SpiceDB as `group#member@user` relationships;
//! [`SpicedbGroupResolver`] answers the policy's group lookups from them.

mod client;
mod error;
mod resolver;
mod types;

pub use client::AuthzClient;
pub use error::AuthzError;
pub use resolver::SpicedbGroupResolver;
pub use types::{Permission, ResourceType, Subject};
