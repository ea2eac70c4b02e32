//! Credential loading.
//!
//! Credentials come from `REASK_USERNAME` / `REASK_PASSWORD` when both are
//! set, otherwise from an INI-style `~/.reask` file:
//!
//! ```text
//! [default]
//! username = <USERNAME_OR_EMAIL>
//! password = <PASSWORD>
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ClientError;

/// Username and password for the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Resolve credentials from the environment, then from `~/.reask`.
    pub fn load(section: &str) -> Result<Self, ClientError> {
        if let Some(credentials) = Self::from_env() {
            debug!("Using credentials from environment");
            return Ok(credentials);
        }

        let path = default_credentials_path().ok_or_else(|| {
            ClientError::Credentials("HOME is not set and REASK_USERNAME is missing".to_string())
        })?;
        Self::from_file(&path, section)
    }

    /// Credentials from `REASK_USERNAME` and `REASK_PASSWORD`.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("REASK_USERNAME").ok()?;
        let password = std::env::var("REASK_PASSWORD").ok()?;
        Some(Self::new(username, password))
    }

    /// Credentials from one section of an INI-style file.
    pub fn from_file(path: &Path, section: &str) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Credentials(format!("failed to read {}: {}", path.display(), e))
        })?;

        let credentials = parse_section(&content, section).ok_or_else(|| {
            ClientError::Credentials(format!(
                "section [{}] with username and password not found in {}",
                section,
                path.display()
            ))
        })?;

        debug!(path = %path.display(), section = %section, "Loaded credentials file");
        Ok(credentials)
    }
}

fn default_credentials_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".reask"))
}

fn parse_section(content: &str, section: &str) -> Option<Credentials> {
    let mut in_section = false;
    let mut username = None;
    let mut password = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = name.trim() == section;
            continue;
        }

        if !in_section {
            continue;
        }

        if let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) {
            match key.trim() {
                "username" => username = Some(value.trim().to_string()),
                "password" => password = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    Some(Credentials::new(username?, password?))
}
