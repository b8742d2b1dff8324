//! Configuration settings for the Ledgerdesk server.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            // Current directory
            PathBuf::from("config.toml"),
            PathBuf::from("ledgerdesk.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("ledgerdesk/config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".ledgerdesk/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.server.http_port == 0 {
            return Err(ConfigError::Invalid("server.http_port must be > 0".to_string()).into());
        }

        // Auth needs at least one credential source; the JWT secret may
        // also arrive via LEDGERDESK_JWT_SECRET at runtime.
        if self.auth.enabled
            && self.auth.api_keys.is_empty()
            && self.auth.operators.is_empty()
            && self.auth.jwt.secret.is_empty()
            && std::env::var("LEDGERDESK_JWT_SECRET").is_err()
            && std::env::var("LEDGERDESK_API_KEYS").is_err()
        {
            return Err(ConfigError::MissingField(
                "auth.jwt.secret (or auth.api_keys / auth.operators)".to_string(),
            )
            .into());
        }

        if !self.api.prefix.starts_with('/') {
            return Err(ConfigError::Invalid("api.prefix must start with '/'".to_string()).into());
        }

        Ok(())
    }

    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.http_port)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_addr: String,
    /// HTTP port.
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            http_port: 8080,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether authentication is enforced. With it disabled every request
    /// resolves to the anonymous identity, which cannot pass the access
    /// layer; leave it on outside of tests.
    pub enabled: bool,
    /// Back-office service API keys. Keys resolve to an admin service
    /// identity; merged with LEDGERDESK_API_KEYS.
    pub api_keys: Vec<String>,
    /// JWT validation settings.
    pub jwt: JwtConfig,
    /// Basic-auth operator accounts: username -> SHA-256 password hash.
    pub operators: HashMap<String, String>,
    /// Operator usernames granted the admin bypass.
    pub admin_users: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_keys: Vec::new(),
            jwt: JwtConfig::default(),
            operators: HashMap::new(),
            admin_users: Vec::new(),
        }
    }
}

/// JWT validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Signing secret; falls back to LEDGERDESK_JWT_SECRET when empty.
    pub secret: String,
    /// Expected issuer.
    pub issuer: String,
    /// Expected audience.
    pub audience: String,
    /// Token lifetime in seconds; 0 disables expiry validation.
    pub expiry_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "ledgerdesk".to_string(),
            audience: "ledgerdesk-users".to_string(),
            expiry_secs: 3600,
        }
    }
}

/// REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API prefix (e.g., "/api/v1").
    pub prefix: String,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Allowed origins for CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api/v1".to_string(),
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}
