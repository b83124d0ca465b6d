//! Interactive yes/no confirmation

use anyhow::Result;
use std::io::{self, Write};

/// Asks the operator a yes/no question
pub trait Confirm {
    /// Returns true only for an explicit "y" or "yes"
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Prompts on stdout and reads the answer from stdin
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        print!("{} [y/N] ", question);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        Ok(is_affirmative(&input))
    }
}

/// Default is no: anything but y/yes (any case) declines
pub fn is_affirmative(input: &str) -> bool {
    let reply = input.trim().to_lowercase();
    reply == "y" || reply == "yes"
}
