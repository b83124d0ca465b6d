//! External programs: the operator's editor and ssh-keygen

use crate::config::DEFAULT_EDITOR;
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{0} is not installed")]
    NotInstalled(String),

    #[error("{program} exited with {status}")]
    Failed { program: String, status: String },
}

/// Opens a file for interactive editing
pub trait Editor {
    /// Returns once the editor exits; a non-zero exit is an error
    fn edit(&self, path: &Path) -> Result<()>;
}

/// Creates a new host key pair
pub trait KeyGenerator {
    /// Writes `private_key` and `<private_key>.pub`
    fn generate(&self, private_key: &Path) -> Result<()>;
}

/// Runs the editor command line from $EDITOR on the terminal
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

impl Editor for ExternalEditor {
    fn edit(&self, path: &Path) -> Result<()> {
        // $EDITOR may carry flags, e.g. "code -w"
        let mut words = self.command.split_whitespace();
        let program = words.next().unwrap_or(DEFAULT_EDITOR);

        debug!(editor = program, "launching editor");

        let status = Command::new(program)
            .args(words)
            .arg(path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to launch editor '{}'", program))?;

        if !status.success() {
            bail!(ProcessError::Failed {
                program: program.to_string(),
                status: status.to_string(),
            });
        }

        Ok(())
    }
}

/// Generates an unencrypted ed25519 key with ssh-keygen
pub struct SshKeygen;

impl KeyGenerator for SshKeygen {
    fn generate(&self, private_key: &Path) -> Result<()> {
        let program = which::which("ssh-keygen")
            .map_err(|_| ProcessError::NotInstalled("ssh-keygen".to_string()))?;

        if let Some(parent) = private_key.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        println!("Generating secrets ID...");

        let status = Command::new(&program)
            .args(["-t", "ed25519", "-f"])
            .arg(private_key)
            .args(["-N", ""])
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .context("Failed to generate SSH key")?;

        if !status.success() {
            bail!(ProcessError::Failed {
                program: "ssh-keygen".to_string(),
                status: status.to_string(),
            });
        }

        Ok(())
    }
}
