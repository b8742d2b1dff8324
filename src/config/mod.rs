//! Configuration loading and validation.

mod settings;

pub use settings::{ApiConfig, AuthConfig, Config, JwtConfig, ServerConfig};
