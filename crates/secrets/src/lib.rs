//! secrets - Multi-host secrets vault
//!
//! "One file, every host, no server."
//!
//! All secrets live in a single age-encrypted KEY=value file that is safe
//! to commit. Every host whose SSH public key is listed in the hosts file
//! can decrypt it once someone who already can has re-encrypted the vault.
//!
//! Uses age with SSH recipients (ssh-ed25519 and ssh-rsa).

pub mod access;
pub mod codec;
pub mod error;
pub mod identity;
pub mod payload;
pub mod registry;
pub mod session;
pub mod shell;
pub mod vault;

mod atomic;

#[cfg(test)]
mod testing;

pub use access::{AccessEvaluator, Verdict};
pub use codec::{KeyAlgorithm, RecipientKey, VaultCodec};
pub use error::SecretsError;
pub use identity::{IdentityStore, Provisioning};
pub use payload::Entry;
pub use registry::{AddOutcome, Registry};
pub use session::{EditOutcome, EditSession, WorkingCopy};
pub use shell::Shell;
pub use vault::Vault;
