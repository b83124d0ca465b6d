//! Secrets Core - Shared plumbing for the secrets vault
//!
//! Configuration is read from the environment exactly once, in `main`, and
//! handed to every component from there. Interactive prompts and external
//! programs sit behind small traits so the vault logic can be driven from
//! tests without a terminal.

pub mod config;
pub mod paths;
pub mod process;
pub mod prompt;

pub use config::{ConfigError, Settings};
pub use paths::SecretsPaths;
pub use process::{Editor, ExternalEditor, KeyGenerator, ProcessError, SshKeygen};
pub use prompt::{Confirm, TerminalPrompt};
