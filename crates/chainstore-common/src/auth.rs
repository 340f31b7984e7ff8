//! Endpoint credentials.
//!
//! A credential is an opaque secret attached to outbound requests through
//! the `Authorization` header. Two shapes are recognised:
//!
//! - **`user:password`**: sent as HTTP Basic, the form pinning services
//!   and hosted RPC providers expect
//! - **anything else**: sent as a Bearer token
//!
//! The secret never appears in `Debug` output or logs.
//!
//! # Example
//!
//! ```
//! use chainstore_common::auth::Credential;
//!
//! let token = Credential::new("abc123");
//! assert_eq!(token.header_value(), "Bearer abc123");
//!
//! let basic = Credential::new("alice:s3cret");
//! assert_eq!(basic.header_value(), "Basic YWxpY2U6czNjcmV0");
//!
//! assert_eq!(format!("{:?}", basic), "Credential(<redacted>)");
//! ```

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Opaque secret for authenticated endpoints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the `Authorization` header value for this credential.
    pub fn header_value(&self) -> String {
        if self.0.contains(':') {
            format!("Basic {}", STANDARD.encode(self.0.as_bytes()))
        } else {
            format!("Bearer {}", self.0)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(Credential::new("tok").header_value(), "Bearer tok");
    }

    #[test]
    fn test_basic_auth() {
        // "project:secret" in base64
        assert_eq!(
            Credential::new("project:secret").header_value(),
            "Basic cHJvamVjdDpzZWNyZXQ="
        );
    }

    #[test]
    fn test_debug_is_redacted() {
        let cred = Credential::new("super-secret");
        assert!(!format!("{:?}", cred).contains("super-secret"));
    }

    #[test]
    fn test_serde_transparent() {
        let cred: Credential = serde_json::from_str(r#""tok""#).unwrap();
        assert_eq!(cred, Credential::new("tok"));
        assert_eq!(serde_json::to_string(&cred).unwrap(), r#""tok""#);
    }

    #[test]
    fn test_empty() {
        assert!(Credential::new("").is_empty());
        assert!(!Credential::new("x").is_empty());
    }
}
