//! Authentication methods for the REST API client

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};

/// Authentication methods supported by the API
#[derive(Debug, Clone, Default)]
pub enum AuthMethod {
    /// JWT bearer token (`Authorization: Bearer <jwt>`)
    Bearer(String),
    /// No authentication
    #[default]
    None,
}

impl AuthMethod {
    /// Apply authentication headers to a request
    pub fn apply_to_headers(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        match self {
            AuthMethod::Bearer(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
                value.set_sensitive(true);
                headers.insert(HeaderName::from_static("authorization"), value);
            }
            AuthMethod::None => {}
        }
        Ok(())
    }

    /// Create bearer token authentication from a JWT string
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }
}

/// Authentication configuration for the client
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub method: AuthMethod,
}

impl AuthConfig {
    /// Create a new auth config with bearer token authentication
    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::bearer(token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self.method, AuthMethod::None)
    }

    /// Get headers for this authentication configuration
    pub fn headers(&self) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        self.method.apply_to_headers(&mut headers)?;
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_auth_headers() {
        let auth = AuthMethod::bearer("jwt-token");
        let mut headers = HeaderMap::new();
        auth.apply_to_headers(&mut headers).unwrap();

        assert_eq!(headers.get("authorization").unwrap(), "Bearer jwt-token");
        assert!(headers.get("authorization").unwrap().is_sensitive());
    }

    #[test]
    fn test_no_auth_adds_nothing() {
        let config = AuthConfig::default();
        assert!(!config.is_authenticated());
        assert!(config.headers().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let config = AuthConfig::with_bearer("bad\ntoken");
        assert!(config.headers().is_err());
    }
}
