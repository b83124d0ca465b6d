//! Vault-specific errors

use crate::access::Verdict;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretsError {
    #[error("Failed to read SSH key {}: {}", .path.display(), .source)]
    IdentityUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse SSH identity {}: {}", .path.display(), .reason)]
    IdentityUnparsable { path: PathBuf, reason: String },

    #[error("Invalid public key format: {0}")]
    MalformedKey(String),

    #[error("Failed to read hosts file {}: {}", .path.display(), .source)]
    RegistryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("No valid recipients found in hosts file")]
    NoValidRecipients,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Invalid file format. All lines must be KEY=value format. Invalid line: {0}")]
    InvalidLine(String),

    #[error("File must contain at least one KEY=value line")]
    EmptyPayload,

    #[error("Unsupported shell: {0}. Supported shells: fish, bash, zsh, sh")]
    UnsupportedShell(String),

    #[error("Editor exited with error: {0}")]
    EditorFailed(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Aborting")]
    Aborted,

    #[error("{}", .0.summary())]
    AccessDenied(Verdict),

    #[error("No secrets file exists yet. Run 'secrets edit' to create it")]
    VaultMissing,
}
