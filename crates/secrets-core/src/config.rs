//! Runtime configuration
//!
//! Environment:
//! - SECRETS_PATH - directory holding secrets.age and secrets.hosts (required)
//! - SECRETS_IDENTITY - private key path (default ~/.ssh/id_ed25519)
//! - EDITOR - editor for `secrets edit` (default nano)

use crate::paths::SecretsPaths;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SECRETS_PATH_VAR: &str = "SECRETS_PATH";
pub const IDENTITY_VAR: &str = "SECRETS_IDENTITY";
pub const EDITOR_VAR: &str = "EDITOR";

/// Editor used when $EDITOR is unset
pub const DEFAULT_EDITOR: &str = "nano";

/// Setup errors, fatal at startup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SECRETS_PATH environment variable must be set")]
    MissingSecretsPath,

    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Settings for one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    pub paths: SecretsPaths,
    /// Editor command line; the working file is appended as the last argument
    pub editor: String,
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), dirs::home_dir())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F, home: Option<PathBuf>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let dir = var(SECRETS_PATH_VAR).ok_or(ConfigError::MissingSecretsPath)?;

        let identity = match var(IDENTITY_VAR) {
            Some(path) => PathBuf::from(path),
            None => SecretsPaths::default_identity(&home.ok_or(ConfigError::NoHomeDir)?),
        };

        let editor = var(EDITOR_VAR).unwrap_or_else(|| DEFAULT_EDITOR.to_string());

        Ok(Self {
            paths: SecretsPaths::new(Path::new(&dir), &identity),
            editor,
        })
    }
}
