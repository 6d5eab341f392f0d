use std::fmt;

/// Fixed key of the credential slot in every [`CredentialStore`](crate::store::CredentialStore).
pub const CREDENTIAL_KEY: &str = "apiKey";

/// Opaque access token gating session establishment.
///
/// Always non-empty: an empty string is the same as no credential at all,
/// so it never becomes a `Credential`. No format validation is done here,
/// the remote service is the only judge of whether a token works.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Interpret a raw value read from a store.
    pub fn from_stored(value: Option<String>) -> Option<Self> {
        value.and_then(Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

// Never print the token itself.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} chars>)", self.0.chars().count())
    }
}
