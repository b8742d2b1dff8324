//! Authentication module for Ledgerdesk.
//!
//! Resolves a caller identity once per request from JWT bearer tokens,
//! back-office service API keys, or basic-auth operator accounts. The
//! access-control layer trusts the resolved `(caller_id, is_admin)` pair
//! completely and never re-verifies it.

mod middleware;

use std::collections::HashSet;

use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};

pub use middleware::{AuthLayer, AuthMiddleware};

/// Caller identity resolved from a validated request.
///
/// Immutable for the lifetime of one request's access-control service;
/// the service never re-resolves or caches identity across calls.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CallerIdentity {
    /// Caller's user id, if authenticated.
    pub caller_id: Option<String>,
    /// Whether the caller bypasses ownership filtering.
    pub is_admin: bool,
    /// Authentication method used.
    pub method: Option<String>,
}

impl CallerIdentity {
    /// An unauthenticated caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An ordinary authenticated caller.
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            caller_id: Some(id.into()),
            is_admin: false,
            method: None,
        }
    }

    /// An admin caller.
    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            caller_id: Some(id.into()),
            is_admin: true,
            method: None,
        }
    }

    /// Whether a caller id is present.
    pub fn is_authenticated(&self) -> bool {
        self.caller_id.is_some()
    }
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Roles.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Authenticator that validates credentials and resolves identities.
#[derive(Clone)]
pub struct Authenticator {
    config: AuthConfig,
    api_keys: HashSet<String>,
}

impl Authenticator {
    /// Create a new authenticator from config.
    pub fn new(config: AuthConfig) -> Self {
        // Load API keys from config and environment
        let mut api_keys: HashSet<String> = config.api_keys.iter().cloned().collect();

        if let Ok(env_keys) = std::env::var("LEDGERDESK_API_KEYS") {
            for key in env_keys.split(',') {
                let key = key.trim();
                if !key.is_empty() {
                    api_keys.insert(key.to_string());
                }
            }
        }

        Self { config, api_keys }
    }

    /// Check if authentication is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Resolve a caller identity from request credentials.
    ///
    /// Returns an error when credentials are present but invalid; absent
    /// credentials resolve to the anonymous identity so the access layer
    /// can reject per-operation.
    pub fn authenticate(
        &self,
        auth_header: Option<&str>,
        api_key_header: Option<&str>,
    ) -> Result<CallerIdentity> {
        if !self.config.enabled {
            return Ok(CallerIdentity::anonymous());
        }

        // Try X-API-Key header first
        if let Some(key) = api_key_header {
            return self.authenticate_api_key(key);
        }

        if let Some(auth) = auth_header {
            return self.authenticate_authorization_header(auth);
        }

        Ok(CallerIdentity::anonymous())
    }

    /// Authenticate using a back-office service API key.
    ///
    /// Service keys belong to trusted integrations; they resolve to an
    /// admin service identity.
    fn authenticate_api_key(&self, key: &str) -> Result<CallerIdentity> {
        if self.api_keys.contains(key) {
            let mut identity =
                CallerIdentity::admin(format!("api-key:{}", &key[..8.min(key.len())]));
            identity.method = Some("api_key".to_string());
            Ok(identity)
        } else {
            Err(AuthError::InvalidCredentials.into())
        }
    }

    /// Authenticate using the Authorization header.
    fn authenticate_authorization_header(&self, auth: &str) -> Result<CallerIdentity> {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            self.authenticate_jwt(token)
        } else if let Some(encoded) = auth.strip_prefix("Basic ") {
            self.authenticate_basic(encoded)
        } else {
            Err(AuthError::InvalidCredentials.into())
        }
    }

    /// Authenticate using a JWT token. The admin flag comes from the
    /// token's role claim.
    fn authenticate_jwt(&self, token: &str) -> Result<CallerIdentity> {
        let secret = self.get_jwt_secret()?;

        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.jwt.issuer]);
        validation.set_audience(&[&self.config.jwt.audience]);

        if self.config.jwt.expiry_secs == 0 {
            validation.validate_exp = false;
        }

        let token_data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let claims = token_data.claims;
        let is_admin = claims.roles.iter().any(|r| r == "admin");

        Ok(CallerIdentity {
            caller_id: Some(claims.sub),
            is_admin,
            method: Some("jwt".to_string()),
        })
    }

    /// Authenticate a basic-auth operator account.
    fn authenticate_basic(&self, encoded: &str) -> Result<CallerIdentity> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = String::from_utf8(decoded).map_err(|_| AuthError::InvalidCredentials)?;

        let parts: Vec<&str> = credentials.splitn(2, ':').collect();
        if parts.len() != 2 {
            return Err(AuthError::InvalidCredentials.into());
        }

        let username = parts[0];
        let password = parts[1];

        if let Some(stored_hash) = self.config.operators.get(username) {
            if self.verify_password_hash(password, stored_hash) {
                let is_admin = self.config.admin_users.iter().any(|u| u == username);
                return Ok(CallerIdentity {
                    caller_id: Some(username.to_string()),
                    is_admin,
                    method: Some("basic".to_string()),
                });
            }
        }

        Err(AuthError::InvalidCredentials.into())
    }

    /// Get the JWT secret from config or environment.
    fn get_jwt_secret(&self) -> Result<String> {
        if !self.config.jwt.secret.is_empty() {
            return Ok(self.config.jwt.secret.clone());
        }

        std::env::var("LEDGERDESK_JWT_SECRET").map_err(|_| AuthError::MissingSecret.into())
    }

    /// Verify a password against a SHA-256 hex hash.
    fn verify_password_hash(&self, password: &str, hash: &str) -> bool {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        let result = hasher.finalize();
        let hex_hash = hex::encode(result);
        hex_hash == hash
    }

    /// Generate a JWT token for a user. Used by tests and provisioning
    /// tooling; the server itself never issues tokens.
    pub fn generate_jwt(&self, user_id: &str, roles: Vec<String>) -> Result<String> {
        let secret = self.get_jwt_secret()?;
        let now = Utc::now();
        let expiry = if self.config.jwt.expiry_secs > 0 {
            now + Duration::seconds(self.config.jwt.expiry_secs as i64)
        } else {
            now + Duration::days(365)
        };

        let claims = JwtClaims {
            sub: user_id.to_string(),
            iss: self.config.jwt.issuer.clone(),
            aud: self.config.jwt.audience.clone(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
            roles,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGeneration(e.to_string()).into())
    }
}

/// Simple hex encoding (to avoid adding another dependency).
mod hex {
    pub fn encode(data: impl AsRef<[u8]>) -> String {
        data.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;

    fn test_config() -> AuthConfig {
        AuthConfig {
            enabled: true,
            api_keys: vec!["test-api-key-12345".to_string()],
            jwt: JwtConfig {
                secret: "test-secret-key".to_string(),
                issuer: "ledgerdesk".to_string(),
                audience: "ledgerdesk-users".to_string(),
                expiry_secs: 3600,
            },
            operators: std::collections::HashMap::new(),
            admin_users: vec![],
        }
    }

    #[test]
    fn test_api_key_resolves_admin_service_identity() {
        let auth = Authenticator::new(test_config());

        let identity = auth.authenticate(None, Some("test-api-key-12345")).unwrap();
        assert!(identity.is_authenticated());
        assert!(identity.is_admin);
        assert_eq!(identity.method.as_deref(), Some("api_key"));

        let result = auth.authenticate(None, Some("invalid-key"));
        assert!(result.is_err());
    }

    #[test]
    fn test_jwt_roundtrip() {
        let auth = Authenticator::new(test_config());

        let token = auth.generate_jwt("user123", vec![]).unwrap();
        let identity = auth
            .authenticate(Some(&format!("Bearer {}", token)), None)
            .unwrap();
        assert_eq!(identity.caller_id.as_deref(), Some("user123"));
        assert!(!identity.is_admin);
    }

    #[test]
    fn test_jwt_admin_role() {
        let auth = Authenticator::new(test_config());

        let token = auth
            .generate_jwt("root", vec!["admin".to_string()])
            .unwrap();
        let identity = auth
            .authenticate(Some(&format!("Bearer {}", token)), None)
            .unwrap();
        assert_eq!(identity.caller_id.as_deref(), Some("root"));
        assert!(identity.is_admin);
    }

    #[test]
    fn test_tampered_jwt_rejected() {
        let auth = Authenticator::new(test_config());

        let token = auth.generate_jwt("user123", vec![]).unwrap();
        let tampered = format!("{}x", token);
        let result = auth.authenticate(Some(&format!("Bearer {}", tampered)), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_basic_auth_operator() {
        let mut config = test_config();
        // SHA-256("hunter2")
        config.operators.insert(
            "ops".to_string(),
            "f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7".to_string(),
        );
        config.admin_users.push("ops".to_string());
        let auth = Authenticator::new(config);

        let encoded = base64::engine::general_purpose::STANDARD.encode("ops:hunter2");
        let identity = auth
            .authenticate(Some(&format!("Basic {}", encoded)), None)
            .unwrap();
        assert_eq!(identity.caller_id.as_deref(), Some("ops"));
        assert!(identity.is_admin);

        let encoded = base64::engine::general_purpose::STANDARD.encode("ops:wrong");
        assert!(auth
            .authenticate(Some(&format!("Basic {}", encoded)), None)
            .is_err());
    }

    #[test]
    fn test_no_credentials_resolve_anonymous() {
        let auth = Authenticator::new(test_config());

        let identity = auth.authenticate(None, None).unwrap();
        assert!(!identity.is_authenticated());
        assert!(!identity.is_admin);
    }

    #[test]
    fn test_auth_disabled() {
        let mut config = test_config();
        config.enabled = false;
        let auth = Authenticator::new(config);

        let identity = auth.authenticate(None, Some("whatever")).unwrap();
        assert!(!identity.is_authenticated());
    }

    #[test]
    fn test_identity_constructors() {
        let anon = CallerIdentity::anonymous();
        assert!(!anon.is_authenticated());
        assert!(!anon.is_admin);

        let user = CallerIdentity::user("u1");
        assert!(user.is_authenticated());
        assert!(!user.is_admin);

        let admin = CallerIdentity::admin("root");
        assert!(admin.is_authenticated());
        assert!(admin.is_admin);
    }
}
