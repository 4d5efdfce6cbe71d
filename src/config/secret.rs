//! Backend credentials that never show up in logs.

use std::fmt;

const REDACTED: &str = "<REDACTED>";

/// A backend password. Formats as `<REDACTED>` under both `{}` and `{:?}`,
/// so a [`Config`](super::Config) or
/// [`SimulationProfile`](crate::backends::SimulationProfile) can be traced
/// as a whole.
///
/// ```
/// use stability_harness::config::SecretString;
///
/// let password = SecretString::new("redis-auth-token");
/// assert_eq!(format!("{password:?}"), "<REDACTED>");
/// assert!(password.accepts(Some(&"redis-auth-token".into())));
/// assert!(!password.accepts(None));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a password.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw password, for the handshake only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether a client offering `offered` authenticates against this
    /// required password. A client with no password is always rejected.
    #[must_use]
    pub fn accepts(&self, offered: Option<&Self>) -> bool {
        offered.is_some_and(|offered| offered.0 == self.0)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
