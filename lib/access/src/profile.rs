//! Claims asserted by the identity provider.

/// Profile produced by a completed provider handshake.
///
/// The email address has already been verified by the provider; this crate
/// treats it as trusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedProfile {
    /// Verified email address.
    pub email: String,
    /// Provider subject identifier, if reported.
    pub subject: Option<String>,
    /// Display name, if reported.
    pub display_name: Option<String>,
}

impl VerifiedProfile {
    /// Creates a profile from a verified email address.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            subject: None,
            display_name: None,
        }
    }

    /// Sets the subject claim.
    #[must_use]
    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name;
        self
    }

    /// Returns the email's domain, or `None` unless the address has exactly
    /// one `@`.
    #[must_use]
    pub fn email_domain(&self) -> Option<&str> {
        split_email(&self.email).map(|(_, domain)| domain)
    }
}

/// Splits an address into local part and domain.
///
/// Returns `None` unless there is exactly one `@`.
#[must_use]
pub fn split_email(address: &str) -> Option<(&str, &str)> {
    let (local, domain) = address.split_once('@')?;
    if domain.contains('@') {
        return None;
    }
    Some((local, domain))
}
