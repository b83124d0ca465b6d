//! Host identity - this machine's SSH key pair
//!
//! The key pair is created once, with the operator's consent, and never
//! overwritten afterwards.

use crate::error::SecretsError;
use anyhow::{bail, Result};
use age::ssh::Identity;
use secrets_core::{Confirm, KeyGenerator, SecretsPaths};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of making sure an identity exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioning {
    /// The key pair was already there
    Existing,
    /// A new key pair was generated; the command should stop here
    Generated,
}

/// Owns the private/public key files of this host
pub struct IdentityStore {
    private_key: PathBuf,
    public_key: PathBuf,
}

impl IdentityStore {
    pub fn new(paths: &SecretsPaths) -> Self {
        Self {
            private_key: paths.identity.clone(),
            public_key: paths.public_key.clone(),
        }
    }

    /// Private key path
    pub fn path(&self) -> &Path {
        &self.private_key
    }

    /// Whether this host already has a public key
    pub fn exists(&self) -> bool {
        self.public_key.exists()
    }

    /// Generate the key pair if missing, after asking the operator.
    ///
    /// Declining is fatal (`Aborted`). Generation is terminal: callers stop
    /// after `Provisioning::Generated` and let the operator re-run.
    pub fn ensure(
        &self,
        confirm: &mut dyn Confirm,
        keygen: &dyn KeyGenerator,
    ) -> Result<Provisioning> {
        if self.exists() {
            return Ok(Provisioning::Existing);
        }

        let question = format!("OK to generate a {} key?", self.private_key.display());
        if !confirm.confirm(&question)? {
            bail!(SecretsError::Aborted);
        }

        keygen.generate(&self.private_key)?;
        info!(path = %self.private_key.display(), "generated host identity");

        Ok(Provisioning::Generated)
    }

    /// Load the private key as an age identity
    pub fn load_identity(&self) -> Result<Identity> {
        let bytes = fs::read(&self.private_key).map_err(|source| {
            SecretsError::IdentityUnreadable {
                path: self.private_key.clone(),
                source,
            }
        })?;

        let identity = Identity::from_buffer(&bytes[..], Some(self.private_key.display().to_string()))
            .map_err(|e| self.unparsable(e.to_string()))?;

        match identity {
            Identity::Unencrypted(_) => Ok(identity),
            Identity::Encrypted(_) => {
                bail!(self.unparsable("passphrase-protected keys are not supported".to_string()))
            }
            Identity::Unsupported(key) => bail!(self.unparsable(format!("{:?}", key))),
        }
    }

    /// The public key line, trimmed
    pub fn load_public_key_text(&self) -> Result<String> {
        let text = fs::read_to_string(&self.public_key).map_err(|source| {
            SecretsError::IdentityUnreadable {
                path: self.public_key.clone(),
                source,
            }
        })?;

        let text = text.trim();
        if text.is_empty() {
            bail!(SecretsError::MalformedKey(format!(
                "{} is empty",
                self.public_key.display()
            )));
        }

        Ok(text.to_string())
    }

    fn unparsable(&self, reason: String) -> SecretsError {
        SecretsError::IdentityUnparsable {
            path: self.private_key.clone(),
            reason,
        }
    }
}
