//! Host access evaluation
//!
//! Computes, from what is on disk right now, whether this host can read the
//! vault. Nothing is cached and nothing is written: provisioning a missing
//! identity is the caller's job.

use crate::codec::VaultCodec;
use crate::identity::IdentityStore;
use crate::registry::Registry;
use anyhow::Result;
use serde::Serialize;
use tracing::debug;

/// Access verdict, ordered by exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Vault readable with this host's identity
    Ok,
    /// Neither vault nor hosts file exists yet
    NoVault,
    /// This host's key is not in the hosts file
    Unauthorized,
    /// Key is listed but the vault was not re-encrypted for it yet
    Stale,
}

impl Verdict {
    /// Process exit code for `check-host-access`
    pub fn code(&self) -> u8 {
        match self {
            Verdict::Ok => 0,
            Verdict::NoVault => 1,
            Verdict::Unauthorized => 2,
            Verdict::Stale => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ok => "ok",
            Verdict::NoVault => "no_vault",
            Verdict::Unauthorized => "unauthorized",
            Verdict::Stale => "stale",
        }
    }

    /// One-line description, used as the error message
    pub fn summary(&self) -> &'static str {
        match self {
            Verdict::Ok => "This host can access secrets.",
            Verdict::NoVault => "No secrets file exists yet.",
            Verdict::Unauthorized => "This host is not authorized to access secrets.",
            Verdict::Stale => "This host's key is in the hosts file but cannot decrypt.",
        }
    }

    /// What the operator should run next
    pub fn remediation(&self) -> &'static str {
        match self {
            Verdict::Ok => "",
            Verdict::NoVault => {
                "No secrets file exists yet. To get started:\n\
                 1. Run 'secrets add-this-host' on this machine to create your first key\n\
                 2. Run 'secrets edit' to create and encrypt your first secrets"
            }
            Verdict::Unauthorized => {
                "This host is not authorized to access secrets.\n\
                 \n\
                 To authorize this host:\n\
                 1. Run 'secrets add-this-host' to add this host's key\n\
                 2. Run 'secrets revalidate' on a machine that can already decrypt"
            }
            Verdict::Stale => {
                "This host's key is in the hosts file but cannot decrypt.\n\
                 \n\
                 To fix this, either:\n\
                 1. Run 'secrets revalidate' on a machine that can decrypt to authorize this key\n\
                 2. Run 'secrets edit' on a machine that can decrypt, then try again\n\
                 \n\
                 If you don't have access to a machine that can decrypt:\n\
                 Ask someone with access to run 'secrets revalidate' to authorize your key"
            }
        }
    }
}

/// Combines identity, hosts file and vault into a verdict
pub struct AccessEvaluator<'a> {
    identity: &'a IdentityStore,
    registry: &'a Registry,
    codec: &'a VaultCodec,
}

impl<'a> AccessEvaluator<'a> {
    pub fn new(identity: &'a IdentityStore, registry: &'a Registry, codec: &'a VaultCodec) -> Self {
        Self {
            identity,
            registry,
            codec,
        }
    }

    /// Evaluate access for this host.
    ///
    /// Errors are reserved for an unreadable identity or hosts file; every
    /// authorization state is a `Verdict`.
    pub fn evaluate(&self) -> Result<Verdict> {
        let verdict = self.compute()?;
        debug!(verdict = verdict.as_str(), "evaluated host access");
        Ok(verdict)
    }

    fn compute(&self) -> Result<Verdict> {
        if !self.codec.exists() && !self.registry.exists() {
            return Ok(Verdict::NoVault);
        }

        let public_key = self.identity.load_public_key_text()?;
        if !self.registry.contains(&public_key)? {
            return Ok(Verdict::Unauthorized);
        }

        if self.codec.exists() {
            let identity = self.identity.load_identity()?;
            if let Err(e) = self.codec.decrypt(&identity) {
                debug!(error = %e, "listed key cannot decrypt the vault");
                return Ok(Verdict::Stale);
            }
        }

        Ok(Verdict::Ok)
    }
}
