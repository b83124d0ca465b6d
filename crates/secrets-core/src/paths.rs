//! Standard paths used by the secrets tool

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Encrypted vault file name inside the secrets directory
pub const VAULT_FILE: &str = "secrets.age";

/// Authorized host keys file name inside the secrets directory
pub const HOSTS_FILE: &str = "secrets.hosts";

/// Standard secrets paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretsPaths {
    /// Secrets directory ($SECRETS_PATH)
    pub dir: PathBuf,
    /// Encrypted vault ($SECRETS_PATH/secrets.age)
    pub vault: PathBuf,
    /// Authorized host keys ($SECRETS_PATH/secrets.hosts)
    pub hosts: PathBuf,
    /// Private key of this host (~/.ssh/id_ed25519)
    pub identity: PathBuf,
    /// Public half of the identity (<identity>.pub)
    pub public_key: PathBuf,
}

impl SecretsPaths {
    pub fn new(dir: &Path, identity: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            vault: dir.join(VAULT_FILE),
            hosts: dir.join(HOSTS_FILE),
            identity: identity.to_path_buf(),
            public_key: public_key_path(identity),
        }
    }

    /// Default identity location under a home directory
    pub fn default_identity(home: &Path) -> PathBuf {
        home.join(".ssh").join("id_ed25519")
    }
}

/// `<identity>.pub`, appended to the full file name rather than replacing
/// an extension
fn public_key_path(identity: &Path) -> PathBuf {
    let mut name = OsString::from(identity.as_os_str());
    name.push(".pub");
    PathBuf::from(name)
}
