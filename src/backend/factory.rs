//! Backend factory for creating backend instances from configuration.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;

use super::{http::HttpBackend, Backend};
use crate::config::ServerConfig;

/// Create the remote backend described by the server configuration.
///
/// The `Authorization` header value is read from the environment variable named
/// by `auth_header_env`; obtaining that credential is the caller's business.
///
/// # Errors
/// Returns error if:
/// - The credential variable is unset or empty
/// - The HTTP client cannot be built
pub fn create_backend(config: &ServerConfig) -> Result<Arc<dyn Backend>> {
    let auth_header = std::env::var(&config.auth_header_env)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("Missing credential: set {} to the Authorization header value", config.auth_header_env))?;

    create_backend_with_credential(config, auth_header)
}

/// Create the remote backend with an explicit `Authorization` header value.
pub fn create_backend_with_credential(config: &ServerConfig, auth_header: String) -> Result<Arc<dyn Backend>> {
    let backend = HttpBackend::new(&config.base_url, auth_header, Duration::from_secs(config.timeout_secs))
        .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
    Ok(Arc::new(backend))
}
