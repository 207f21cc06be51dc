//! DigitalOcean API token discovery

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::Path;

pub const TOKEN_FILE_ENV: &str = "DIGITALOCEAN_TOKEN_FILE_PATH";
pub const TOKEN_ENV: &str = "DIGITALOCEAN_TOKEN";
pub const DEFAULT_TOKEN_PATH: &str = "/etc/kubernetes/digitalocean.json";

#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(default)]
    token: String,
}

/// Locate the API token
///
/// 1. JSON file named by `DIGITALOCEAN_TOKEN_FILE_PATH`
/// 2. `DIGITALOCEAN_TOKEN`
/// 3. `/etc/kubernetes/digitalocean.json`
///
/// Sources holding an empty token are skipped.
pub fn discover_token() -> Result<String> {
    discover_token_with_default(Path::new(DEFAULT_TOKEN_PATH))
}

/// Same as [`discover_token`] with a different last-resort file
pub fn discover_token_with_default(default_path: &Path) -> Result<String> {
    if let Ok(file) = std::env::var(TOKEN_FILE_ENV) {
        if !file.is_empty() {
            match read_token_file(Path::new(&file)) {
                Ok(token) if !token.is_empty() => return Ok(token),
                Ok(_) => tracing::info!("Token file {} holds an empty token", file),
                Err(e) => tracing::info!("Could not read a valid token file at {}: {}", file, e),
            }
        }
    }

    if let Ok(token) = std::env::var(TOKEN_ENV) {
        let token = token.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
        tracing::info!("Environment variable {} holds an empty token", TOKEN_ENV);
    }

    match read_token_file(default_path) {
        Ok(token) if !token.is_empty() => Ok(token),
        Ok(_) => {
            tracing::info!("Token file {} holds an empty token", default_path.display());
            Err(ConfigError::TokenNotFound)
        }
        Err(e) => {
            tracing::info!(
                "Could not read a valid token file at {}: {}",
                default_path.display(),
                e
            );
            Err(ConfigError::TokenNotFound)
        }
    }
}

/// Read `{"token": "..."}` from a file, trimming the token
pub fn read_token_file(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    let file: TokenFile = serde_json::from_str(&content)?;
    Ok(file.token.trim().to_string())
}
