//! Vault encryption and decryption
//!
//! The vault is one age file encrypted to every usable key in the hosts
//! file plus the encrypting host itself. Registry lines that are not
//! ssh-ed25519 or ssh-rsa keys are skipped, not rejected.

use crate::atomic::write_atomic;
use crate::error::SecretsError;
use age::armor::ArmoredReader;
use age::ssh::Recipient;
use anyhow::{bail, Context, Result};
use secrets_core::SecretsPaths;
use std::collections::HashSet;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// SSH key algorithms age can encrypt to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Rsa,
    Ed25519,
}

/// Canonical identity of a recipient: algorithm plus SSH wire-format key
/// bytes. Two registry lines that differ only in their comment compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecipientKey {
    pub algorithm: KeyAlgorithm,
    pub key_bytes: Vec<u8>,
}

impl RecipientKey {
    pub fn of(recipient: &Recipient) -> Self {
        match recipient {
            Recipient::SshRsa(bytes, _) => Self {
                algorithm: KeyAlgorithm::Rsa,
                key_bytes: bytes.clone(),
            },
            Recipient::SshEd25519(bytes, _) => Self {
                algorithm: KeyAlgorithm::Ed25519,
                key_bytes: bytes.clone(),
            },
        }
    }
}

/// Every usable recipient in a hosts file, in file order, without duplicates
pub fn recipients_from_hosts(content: &str) -> Vec<Recipient> {
    let mut seen = HashSet::new();
    let mut recipients = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.parse::<Recipient>() {
            Ok(recipient) => {
                if seen.insert(RecipientKey::of(&recipient)) {
                    recipients.push(recipient);
                }
            }
            Err(e) => debug!(line = line, error = ?e, "skipping unusable host key"),
        }
    }

    recipients
}

/// Registry recipients plus the encrypting host's own key
pub fn build_recipients(hosts: &str, own_public_key: &str) -> Result<Vec<Recipient>> {
    let mut recipients = recipients_from_hosts(hosts);
    if recipients.is_empty() {
        bail!(SecretsError::NoValidRecipients);
    }

    let own: Recipient = own_public_key.trim().parse().map_err(|e| {
        SecretsError::MalformedKey(format!("cannot encrypt to this host's own key: {:?}", e))
    })?;

    let own_key = RecipientKey::of(&own);
    if !recipients.iter().any(|r| RecipientKey::of(r) == own_key) {
        debug!("adding this host as an extra recipient");
        recipients.push(own);
    }

    Ok(recipients)
}

/// Encrypt `plaintext` to all `recipients` (binary age format)
pub fn encrypt_bytes(plaintext: &[u8], recipients: Vec<Recipient>) -> Result<Vec<u8>> {
    let recipients: Vec<Box<dyn age::Recipient + Send>> = recipients
        .into_iter()
        .map(|r| Box::new(r) as Box<dyn age::Recipient + Send>)
        .collect();

    let encryptor =
        age::Encryptor::with_recipients(recipients).ok_or(SecretsError::NoValidRecipients)?;

    let mut encrypted = vec![];
    let mut writer = encryptor
        .wrap_output(&mut encrypted)
        .map_err(|e| SecretsError::EncryptionFailed(e.to_string()))?;

    writer
        .write_all(plaintext)
        .map_err(|e| SecretsError::EncryptionFailed(e.to_string()))?;

    writer
        .finish()
        .map_err(|e| SecretsError::EncryptionFailed(e.to_string()))?;

    Ok(encrypted)
}

/// Decrypt an age file, binary or ASCII-armored, with one identity
pub fn decrypt_bytes(ciphertext: &[u8], identity: &dyn age::Identity) -> Result<Vec<u8>> {
    let decryptor = match age::Decryptor::new(ArmoredReader::new(ciphertext))
        .map_err(|e| SecretsError::DecryptionFailed(e.to_string()))?
    {
        age::Decryptor::Recipients(d) => d,
        _ => bail!(SecretsError::DecryptionFailed(
            "vault is passphrase-encrypted".to_string()
        )),
    };

    let mut reader = decryptor
        .decrypt(std::iter::once(identity))
        .map_err(|e| SecretsError::DecryptionFailed(e.to_string()))?;

    let mut decrypted = vec![];
    reader
        .read_to_end(&mut decrypted)
        .map_err(|e| SecretsError::DecryptionFailed(e.to_string()))?;

    Ok(decrypted)
}

/// The vault file
pub struct VaultCodec {
    path: PathBuf,
}

impl VaultCodec {
    pub fn new(paths: &SecretsPaths) -> Self {
        Self {
            path: paths.vault.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Decrypt the vault with this host's identity. Wrong key and corrupt
    /// file both surface as `DecryptionFailed`.
    pub fn decrypt(&self, identity: &dyn age::Identity) -> Result<Vec<u8>> {
        let ciphertext = fs::read(&self.path)
            .with_context(|| format!("Failed to open secrets file {}", self.path.display()))?;
        decrypt_bytes(&ciphertext, identity)
    }

    /// Re-encrypt the vault for the hosts file plus this host.
    ///
    /// The ciphertext is built in memory and swapped in with a rename, so a
    /// failure at any point leaves the previous vault intact.
    pub fn encrypt(&self, plaintext: &[u8], hosts: &str, own_public_key: &str) -> Result<()> {
        let recipients = build_recipients(hosts, own_public_key)?;
        let count = recipients.len();

        let encrypted = encrypt_bytes(plaintext, recipients)?;
        write_atomic(&self.path, &encrypted)
            .with_context(|| format!("Failed to write secrets file {}", self.path.display()))?;

        info!(recipients = count, "vault re-encrypted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityStore;
    use crate::testing::{self, KeyPair, ALPHA, BETA, DELTA_PUB, GAMMA};
    use tempfile::tempdir;

    fn identity(root: &Path, name: &str, key: KeyPair) -> age::ssh::Identity {
        IdentityStore::new(&testing::host(root, name, Some(key)))
            .load_identity()
            .unwrap()
    }

    fn hosts(keys: &[&str]) -> String {
        keys.iter().map(|k| k.trim()).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_every_recipient_can_decrypt() -> Result<()> {
        let dir = tempdir()?;
        let codec = VaultCodec::new(&testing::host(dir.path(), "alpha", None));
        let plaintext = b"FOO=bar\nAPI_TOKEN=abc123\n";

        codec.encrypt(plaintext, &hosts(&[ALPHA.public, BETA.public, GAMMA.public]), ALPHA.public)?;

        for (name, key) in [("alpha", ALPHA), ("beta", BETA), ("gamma", GAMMA)] {
            let id = identity(dir.path(), name, key);
            assert_eq!(codec.decrypt(&id)?, plaintext, "{} should decrypt", name);
        }
        Ok(())
    }

    #[test]
    fn test_self_is_always_a_recipient() -> Result<()> {
        let dir = tempdir()?;
        let codec = VaultCodec::new(&testing::host(dir.path(), "alpha", None));

        // alpha encrypts while only beta is listed
        codec.encrypt(b"FOO=bar\n", &hosts(&[BETA.public]), ALPHA.public)?;

        assert_eq!(codec.decrypt(&identity(dir.path(), "alpha", ALPHA))?, b"FOO=bar\n");
        assert_eq!(codec.decrypt(&identity(dir.path(), "beta", BETA))?, b"FOO=bar\n");
        Ok(())
    }

    #[test]
    fn test_unlisted_host_cannot_decrypt() -> Result<()> {
        let dir = tempdir()?;
        let codec = VaultCodec::new(&testing::host(dir.path(), "alpha", None));
        codec.encrypt(b"FOO=bar\n", &hosts(&[ALPHA.public]), ALPHA.public)?;

        let err = codec.decrypt(&identity(dir.path(), "beta", BETA)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SecretsError>(),
            Some(SecretsError::DecryptionFailed(_))
        ));
        Ok(())
    }

    #[test]
    fn test_unusable_lines_are_skipped() {
        let content = format!(
            "# comment\n\n{}\nnot a key at all\n{}\n{}\n",
            ALPHA.public.trim(),
            DELTA_PUB.trim(),
            BETA.public.trim()
        );

        let keys: Vec<RecipientKey> = recipients_from_hosts(&content)
            .iter()
            .map(RecipientKey::of)
            .collect();

        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.algorithm == KeyAlgorithm::Ed25519));
    }

    #[test]
    fn test_duplicates_collapse_by_key_bytes() {
        // same key, different comments
        let relabeled = ALPHA.public.trim().replace("ops@alpha", "renamed");
        let content = hosts(&[ALPHA.public, relabeled.as_str()]);
        assert_eq!(recipients_from_hosts(&content).len(), 1);

        let recipients = build_recipients(&content, ALPHA.public).unwrap();
        assert_eq!(recipients.len(), 1);
    }

    #[test]
    fn test_rsa_key_algorithm() {
        let recipients = recipients_from_hosts(GAMMA.public);
        assert_eq!(recipients.len(), 1);
        assert_eq!(RecipientKey::of(&recipients[0]).algorithm, KeyAlgorithm::Rsa);
    }

    #[test]
    fn test_no_valid_recipients() {
        let dir = tempdir().unwrap();
        let codec = VaultCodec::new(&testing::host(dir.path(), "alpha", None));

        let content = format!("# only junk\n{}\n", DELTA_PUB.trim());
        let err = codec.encrypt(b"FOO=bar\n", &content, ALPHA.public).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SecretsError>(),
            Some(SecretsError::NoValidRecipients)
        ));
        assert!(!codec.exists());
    }

    #[test]
    fn test_failed_encrypt_keeps_previous_vault() -> Result<()> {
        let dir = tempdir()?;
        let codec = VaultCodec::new(&testing::host(dir.path(), "alpha", None));
        codec.encrypt(b"FOO=bar\n", &hosts(&[ALPHA.public]), ALPHA.public)?;
        let before = fs::read(codec.path())?;

        assert!(codec.encrypt(b"FOO=baz\n", "", ALPHA.public).is_err());
        assert!(codec
            .encrypt(b"FOO=baz\n", &hosts(&[ALPHA.public]), "garbage")
            .is_err());

        assert_eq!(fs::read(codec.path())?, before);
        Ok(())
    }

    #[test]
    fn test_reads_armored_vault() -> Result<()> {
        use age::armor::{ArmoredWriter, Format};

        let dir = tempdir()?;
        let recipients = build_recipients(&hosts(&[ALPHA.public]), ALPHA.public)?;
        let binary = encrypt_bytes(b"FOO=bar\n", recipients)?;

        let mut armored = vec![];
        let mut writer = ArmoredWriter::wrap_output(&mut armored, Format::AsciiArmor)?;
        writer.write_all(&binary)?;
        writer.finish()?;
        assert!(armored.starts_with(b"-----BEGIN AGE ENCRYPTED FILE-----"));

        let id = identity(dir.path(), "alpha", ALPHA);
        assert_eq!(decrypt_bytes(&armored, &id)?, b"FOO=bar\n");
        Ok(())
    }

    #[test]
    fn test_corrupt_vault() {
        let dir = tempdir().unwrap();
        let id = identity(dir.path(), "alpha", ALPHA);
        let err = decrypt_bytes(b"definitely not age", &id).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SecretsError>(),
            Some(SecretsError::DecryptionFailed(_))
        ));
    }
}
