//! Vault - the components of one secrets directory, seen from this host
//!
//! Ties the identity, the hosts file and the encrypted vault together and
//! exposes the guarded read and write paths the commands use.

use crate::access::{AccessEvaluator, Verdict};
use crate::codec::VaultCodec;
use crate::error::SecretsError;
use crate::identity::IdentityStore;
use crate::registry::{AddOutcome, Registry};
use anyhow::{bail, Result};
use secrets_core::{Confirm, SecretsPaths};
use tracing::warn;

/// The secrets vault
pub struct Vault {
    identity: IdentityStore,
    registry: Registry,
    codec: VaultCodec,
}

impl Vault {
    pub fn new(paths: &SecretsPaths) -> Self {
        Self {
            identity: IdentityStore::new(paths),
            registry: Registry::new(paths),
            codec: VaultCodec::new(paths),
        }
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn codec(&self) -> &VaultCodec {
        &self.codec
    }

    pub fn access(&self) -> AccessEvaluator<'_> {
        AccessEvaluator::new(&self.identity, &self.registry, &self.codec)
    }

    /// Current verdict for this host
    pub fn evaluate(&self) -> Result<Verdict> {
        self.access().evaluate()
    }

    /// Fail with `AccessDenied` unless an existing vault is readable here,
    /// or `VaultMissing` when this host is listed but nothing is encrypted yet
    pub fn require_readable(&self) -> Result<()> {
        let verdict = self.evaluate()?;
        if verdict != Verdict::Ok {
            bail!(SecretsError::AccessDenied(verdict));
        }
        if !self.codec.exists() {
            bail!(SecretsError::VaultMissing);
        }
        Ok(())
    }

    /// Decrypt the vault. On failure, a non-Ok verdict takes precedence over
    /// the raw age error.
    pub fn decrypt(&self) -> Result<Vec<u8>> {
        let identity = self.identity.load_identity()?;

        match self.codec.decrypt(&identity) {
            Ok(plaintext) => Ok(plaintext),
            Err(err) => {
                warn!(error = %err, "decryption failed, re-checking access");
                let verdict = self.evaluate()?;
                if verdict != Verdict::Ok {
                    bail!(SecretsError::AccessDenied(verdict));
                }
                Err(err)
            }
        }
    }

    /// Access-checked read of the whole payload
    pub fn read_secrets(&self) -> Result<Vec<u8>> {
        self.require_readable()?;
        self.decrypt()
    }

    /// Re-encrypt `plaintext` for the current hosts file plus this host
    pub fn commit(&self, plaintext: &[u8]) -> Result<()> {
        let hosts = self.registry.load()?.unwrap_or_default();
        let own_key = self.identity.load_public_key_text()?;
        // the identity must still be usable, or this host could lock itself out
        self.identity.load_identity()?;

        self.codec.encrypt(plaintext, &hosts, &own_key)
    }

    /// Add this host's public key to the hosts file
    pub fn add_this_host(&self, confirm: &mut dyn Confirm) -> Result<AddOutcome> {
        let public_key = self.identity.load_public_key_text()?;
        self.registry.add(&public_key, confirm)
    }
}
