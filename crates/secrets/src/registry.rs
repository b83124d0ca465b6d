//! Authorized host keys (secrets.hosts)
//!
//! One SSH public key per line. Blank lines and `#` comments are ignored.
//! A key listed here is authorized, but it only decrypts the vault after
//! the next re-encryption.

use crate::atomic::write_atomic;
use crate::error::SecretsError;
use anyhow::{bail, Context, Result};
use secrets_core::{Confirm, SecretsPaths};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// What `Registry::add` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The exact key text was already present; nothing written
    AlreadyAuthorized,
    /// The key was appended
    Added,
    /// Older keys carrying the same hostname were replaced
    Replaced { removed: Vec<String> },
}

/// The hosts file
pub struct Registry {
    path: PathBuf,
}

impl Registry {
    pub fn new(paths: &SecretsPaths) -> Self {
        Self {
            path: paths.hosts.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Raw file content, `None` when the file does not exist
    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SecretsError::RegistryUnreadable {
                path: self.path.clone(),
                source,
            }
            .into()),
        }
    }

    /// Whether the exact key text appears anywhere in the file
    pub fn contains(&self, public_key: &str) -> Result<bool> {
        Ok(self
            .load()?
            .is_some_and(|content| contains_key(&content, public_key)))
    }

    /// Authorize `public_key`.
    ///
    /// Existing keys whose last field is the same hostname are replaced, but
    /// only after the operator confirms; declining fails with `Cancelled`
    /// and leaves the file as it was.
    pub fn add(&self, public_key: &str, confirm: &mut dyn Confirm) -> Result<AddOutcome> {
        let public_key = public_key.trim();

        let content = match self.load()? {
            Some(content) => content,
            None => {
                // a key that could never be added must not create the file
                hostname_tag(public_key)?;
                write_atomic(&self.path, b"").with_context(|| {
                    format!("Failed to create hosts file {}", self.path.display())
                })?;
                String::new()
            }
        };

        if contains_key(&content, public_key) {
            return Ok(AddOutcome::AlreadyAuthorized);
        }

        let hostname = hostname_tag(public_key)?;
        let old_keys: Vec<&str> = content
            .lines()
            .filter(|line| is_key_for_host(line, hostname))
            .collect();

        if old_keys.is_empty() {
            let mut updated = content.clone();
            if !updated.is_empty() && !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str(public_key);
            updated.push('\n');

            self.write(&updated)?;
            info!(host = hostname, "authorized host key");
            return Ok(AddOutcome::Added);
        }

        let question = format!(
            "Found existing key(s) for host '{}':\n{}\n\nRemove old key(s) and add new one?",
            hostname,
            old_keys.join("\n")
        );
        if !confirm.confirm(&question)? {
            bail!(SecretsError::Cancelled);
        }

        let mut kept: Vec<&str> = content
            .lines()
            .filter(|line| !line.is_empty() && !is_key_for_host(line, hostname))
            .collect();
        kept.push(public_key);

        let mut updated = kept.join("\n");
        updated.push('\n');

        self.write(&updated)?;
        info!(host = hostname, removed = old_keys.len(), "replaced host key");

        Ok(AddOutcome::Replaced {
            removed: old_keys.into_iter().map(String::from).collect(),
        })
    }

    fn write(&self, content: &str) -> Result<()> {
        write_atomic(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to update hosts file {}", self.path.display()))
    }
}

/// Substring membership on the raw file, not per-line key comparison
pub fn contains_key(content: &str, public_key: &str) -> bool {
    content.contains(public_key.trim())
}

/// Hostname tag of a key line: its third whitespace-separated field
pub fn hostname_tag(public_key: &str) -> Result<&str> {
    match public_key.split_whitespace().nth(2) {
        Some(tag) => Ok(tag),
        None => bail!(SecretsError::MalformedKey(format!(
            "expected '<type> <key> <host>', got '{}'",
            public_key
        ))),
    }
}

/// A non-comment line whose last field is exactly `hostname`
fn is_key_for_host(line: &str, hostname: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with('#') && line.split_whitespace().last() == Some(hostname)
}
