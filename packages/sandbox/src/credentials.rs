// ABOUTME: API key resolution for sandbox provider authentication
// ABOUTME: Prefers a per-request key over the process-wide default from the environment

use serde::{Deserialize, Serialize};

/// Environment variable holding the process-wide default API key
pub const API_KEY_ENV: &str = "RUNBOX_API_KEY";

/// Sandbox provider API key.
///
/// An `ApiKey` is always non-empty; absence of a credential is modeled as
/// `Option<ApiKey>` so callers cannot accidentally pass an empty key to the
/// provider and get an opaque authentication error back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey(String);

impl ApiKey {
    /// Create a key from a raw string, trimming whitespace.
    /// Returns `None` for empty or whitespace-only input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Load the process-wide default key from `RUNBOX_API_KEY`.
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV).ok().and_then(|v| Self::new(&v))
    }

    /// Resolve the key for one request: a non-empty per-request value wins,
    /// otherwise the process-wide default, otherwise no credential.
    pub fn resolve(per_request: Option<&str>, default: Option<&ApiKey>) -> Option<ApiKey> {
        per_request
            .and_then(ApiKey::new)
            .or_else(|| default.cloned())
    }

    /// The key material, for handing to the provider.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_and_whitespace() {
        assert!(ApiKey::new("").is_none());
        assert!(ApiKey::new("   ").is_none());
        assert_eq!(ApiKey::new(" k1 ").unwrap().expose(), "k1");
    }

    #[test]
    fn test_resolve_prefers_per_request() {
        let default = ApiKey::new("default-key");
        let resolved = ApiKey::resolve(Some("request-key"), default.as_ref()).unwrap();
        assert_eq!(resolved.expose(), "request-key");
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let default = ApiKey::new("default-key");
        let resolved = ApiKey::resolve(None, default.as_ref()).unwrap();
        assert_eq!(resolved.expose(), "default-key");

        let resolved = ApiKey::resolve(Some("  "), default.as_ref()).unwrap();
        assert_eq!(resolved.expose(), "default-key");
    }

    #[test]
    fn test_resolve_empty_when_nothing_configured() {
        assert!(ApiKey::resolve(None, None).is_none());
        assert!(ApiKey::resolve(Some(""), None).is_none());
    }
}
