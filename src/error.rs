//! Error types for the Ledgerdesk server.

use thiserror::Error;

/// Main error type for Ledgerdesk operations.
#[derive(Error, Debug)]
pub enum LedgerdeskError {
    #[error("Access error: {0}")]
    Access(#[from] AccessError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised locally by the access-control service.
///
/// `Denied` covers both "the record does not exist" and "the record exists
/// but is not owned by the caller" for single-record operations. The two
/// cases are collapsed so a rejected caller cannot probe for existence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No caller identity on an operation that requires one.
    #[error("caller is not authenticated")]
    Unauthenticated,

    /// Target record is missing or not owned by the caller.
    #[error("access denied for {kind}")]
    Denied { kind: &'static str },

    /// Admin lookup for a record that does not exist. Only the admin path
    /// distinguishes a miss; admins see the whole table anyway.
    #[error("{kind} not found")]
    NotFound { kind: &'static str },
}

/// Authentication-related errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No credentials provided")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

/// Storage-related errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} not found")]
    NotFound { kind: &'static str },

    #[error("{kind} with id {id} already exists")]
    Conflict { kind: &'static str, id: String },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Result type alias for Ledgerdesk operations.
pub type Result<T> = std::result::Result<T, LedgerdeskError>;
