//! Shell export statements for `secrets activate`
//!
//! Values are emitted as stored; quoting is left to whoever wrote them.

use crate::error::SecretsError;
use crate::payload::Entry;
use std::fmt;
use std::str::FromStr;

/// Shells `activate` can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Fish,
    Bash,
    Zsh,
    Sh,
}

impl Shell {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shell::Fish => "fish",
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Sh => "sh",
        }
    }

    /// One export statement
    pub fn export(&self, entry: &Entry) -> String {
        match self {
            Shell::Fish => format!("set -gx {} {}", entry.key, entry.value),
            Shell::Bash | Shell::Zsh | Shell::Sh => format!("export {}={}", entry.key, entry.value),
        }
    }

    /// All statements, newline terminated
    pub fn render(&self, entries: &[Entry]) -> String {
        entries
            .iter()
            .map(|entry| format!("{}\n", self.export(entry)))
            .collect()
    }
}

impl FromStr for Shell {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fish" => Ok(Shell::Fish),
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "sh" => Ok(Shell::Sh),
            other => Err(SecretsError::UnsupportedShell(other.to_string())),
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
