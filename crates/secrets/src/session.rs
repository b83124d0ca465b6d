//! Edit sessions and revalidation
//!
//! The decrypted payload is written to a private temporary file, handed to
//! the operator's editor, and re-encrypted only when its content changed
//! and still parses. The temporary file is removed when the session ends,
//! except when the edited content was rejected or could not be encrypted:
//! then it is kept and its path reported so the edit can be recovered.

use crate::access::Verdict;
use crate::error::SecretsError;
use crate::payload;
use crate::vault::Vault;
use anyhow::{bail, Context, Result};
use secrets_core::Editor;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Content of a vault that does not exist yet
pub const PLACEHOLDER: &str = "EXAMPLE_API_KEY=change_me\n";

/// Plaintext copy of the vault, deleted on drop unless kept
pub struct WorkingCopy {
    file: NamedTempFile,
}

impl WorkingCopy {
    /// Create the file (mode 0600) holding `contents`
    pub fn create(contents: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("secrets")
            .suffix(".env")
            .tempfile()
            .context("Failed to create temporary file")?;
        file.write_all(contents)?;
        file.flush()?;

        debug!(path = %file.path().display(), "created working copy");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Current content, read back by path since editors may replace the file
    pub fn read(&self) -> Result<Vec<u8>> {
        fs::read(self.path()).context("Failed to read edited file")
    }

    /// SHA-256 of the current content
    pub fn fingerprint(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(self.read()?);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Leave the file on disk (still 0600) and return its path
    pub fn keep(self) -> Result<PathBuf> {
        let (_, path) = self
            .file
            .keep()
            .map_err(|e| e.error)
            .context("Failed to keep temporary file")?;
        Ok(path)
    }
}

/// How an edit session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Content unchanged; the vault was not touched
    NoChanges,
    /// Vault re-encrypted with the new content
    Updated,
}

/// One `secrets edit`
pub struct EditSession<'a> {
    vault: &'a Vault,
    working: WorkingCopy,
    is_new: bool,
}

impl<'a> EditSession<'a> {
    /// Decrypt the vault into a working copy, or seed one with a placeholder
    /// when no vault exists yet.
    pub fn open(vault: &'a Vault) -> Result<Self> {
        if !vault.codec().exists() {
            let verdict = vault.evaluate()?;
            if !matches!(verdict, Verdict::Ok | Verdict::NoVault) {
                bail!(SecretsError::AccessDenied(verdict));
            }

            info!("no vault yet, starting from placeholder");
            return Ok(Self {
                vault,
                working: WorkingCopy::create(PLACEHOLDER.as_bytes())?,
                is_new: true,
            });
        }

        vault.require_readable()?;
        let plaintext = vault.decrypt()?;

        Ok(Self {
            vault,
            working: WorkingCopy::create(&plaintext)?,
            is_new: false,
        })
    }

    /// Whether this session will create the vault
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn working_copy(&self) -> &WorkingCopy {
        &self.working
    }

    /// Run the editor and commit the result.
    ///
    /// Nothing is written unless the content changed and every line is a
    /// KEY=value pair. When validation or encryption fails the working copy
    /// is kept and the error names its path.
    pub fn edit(self, editor: &dyn Editor) -> Result<EditOutcome> {
        let before = self.working.fingerprint()?;

        editor
            .edit(self.working.path())
            .map_err(|e| SecretsError::EditorFailed(format!("{:#}", e)))?;

        if self.working.fingerprint()? == before {
            info!("content unchanged, vault left as is");
            return Ok(EditOutcome::NoChanges);
        }

        let edited = self.working.read()?;
        match commit_edited(self.vault, &edited) {
            Ok(count) => {
                info!(entries = count, "secrets updated");
                Ok(EditOutcome::Updated)
            }
            Err(err) => match self.working.keep() {
                Ok(kept) => {
                    warn!(path = %kept.display(), "edit not saved, working copy kept");
                    Err(err.context(format!("Your edits were kept in {}", kept.display())))
                }
                Err(keep_err) => {
                    warn!(error = %keep_err, "could not keep working copy");
                    Err(err)
                }
            },
        }
    }
}

/// Validate and encrypt edited content, returning the entry count
fn commit_edited(vault: &Vault, edited: &[u8]) -> Result<usize> {
    let text = std::str::from_utf8(edited).context("Edited file is not valid UTF-8")?;
    let entries = payload::validate(text)?;
    vault.commit(edited)?;
    Ok(entries.len())
}

/// Re-encrypt the vault, unchanged, for every key now in the hosts file
pub fn revalidate(vault: &Vault) -> Result<()> {
    vault.require_readable()?;
    let plaintext = vault.decrypt()?;
    vault.commit(&plaintext)?;

    info!("vault revalidated");
    Ok(())
}
