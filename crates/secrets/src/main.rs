//! secrets - Multi-host secrets vault
//!
//! One age-encrypted KEY=value file, readable by every host whose SSH key
//! is listed in the hosts file.
//!
//! Commands:
//! - list: Print the decrypted secrets
//! - activate <shell>: Print export statements for fish, bash, zsh or sh
//! - edit: Edit the secrets in $EDITOR and re-encrypt
//! - add-this-host: Authorize this host's SSH key
//! - revalidate: Re-encrypt for every key in the hosts file
//! - check-host-access: Report whether this host can decrypt (exit 0-3)

use anyhow::Result;
use clap::{Parser, Subcommand};
use secrets::{
    payload, session, AddOutcome, EditOutcome, EditSession, Provisioning, SecretsError, Shell,
    Vault,
};
use secrets_core::{ExternalEditor, Settings, SshKeygen, TerminalPrompt};
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "secrets")]
#[command(about = "Multi-host secrets vault - one encrypted file, every authorized SSH host")]
#[command(version)]
#[command(arg_required_else_help = true)]
#[command(after_help = r#"ENVIRONMENT:
    SECRETS_PATH        Directory with secrets.age and secrets.hosts (required)
    SECRETS_IDENTITY    Private key to use (default ~/.ssh/id_ed25519)
    EDITOR              Editor for 'secrets edit' (default nano)
    RUST_LOG            Log filter, e.g. secrets=debug

EXIT CODES (check-host-access):
    0  This host can decrypt
    1  No secrets file exists yet
    2  This host's key is not in the hosts file
    3  Key is listed but the file was not re-encrypted for it

NEW HOST:
    secrets add-this-host                 # on the new host
    secrets revalidate                    # on a host that can already decrypt"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the decrypted secrets
    List,

    /// Print export statements for a shell
    Activate {
        /// Target shell: fish, bash, zsh or sh
        shell: String,
    },

    /// Edit the secrets in $EDITOR, then validate and re-encrypt
    Edit,

    /// Add this host's SSH public key to the hosts file
    AddThisHost,

    /// Re-encrypt the secrets for every key in the hosts file
    Revalidate,

    /// Check whether this host can decrypt the secrets
    CheckHostAccess {
        /// Print the verdict as JSON instead of guidance
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<SecretsError>() {
        Some(SecretsError::AccessDenied(verdict)) => eprintln!("{}", verdict.remediation()),
        _ => eprintln!("Error: {:#}", err),
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::from_env()?;
    let vault = Vault::new(&settings.paths);

    // a freshly generated key cannot be authorized yet, so stop here
    if vault.identity().ensure(&mut TerminalPrompt, &SshKeygen)? == Provisioning::Generated {
        println!("Secrets ID generated");
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        Commands::List => cmd_list(&vault),
        Commands::Activate { shell } => cmd_activate(&vault, &shell),
        Commands::Edit => cmd_edit(&vault, &settings),
        Commands::AddThisHost => cmd_add_this_host(&vault),
        Commands::Revalidate => cmd_revalidate(&vault),
        Commands::CheckHostAccess { json } => cmd_check_host_access(&vault, json),
    }
}

/// Print the decrypted payload as stored
fn cmd_list(vault: &Vault) -> Result<ExitCode> {
    let plaintext = vault.read_secrets()?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&plaintext)?;
    stdout.flush()?;

    Ok(ExitCode::SUCCESS)
}

/// Print shell export statements
fn cmd_activate(vault: &Vault, shell: &str) -> Result<ExitCode> {
    // reject the shell before touching the vault
    let shell: Shell = shell.parse()?;

    let plaintext = vault.read_secrets()?;
    let text = String::from_utf8_lossy(&plaintext);
    print!("{}", shell.render(&payload::entries(&text)));

    Ok(ExitCode::SUCCESS)
}

/// Interactive edit, validate, encrypt
fn cmd_edit(vault: &Vault, settings: &Settings) -> Result<ExitCode> {
    let session = EditSession::open(vault)?;
    if session.is_new() {
        println!("Creating new secrets file...");
    }

    let editor = ExternalEditor::new(&settings.editor);
    match session.edit(&editor)? {
        EditOutcome::NoChanges => println!("No changes made"),
        EditOutcome::Updated => {
            println!("Secrets updated successfully. Run the following to add to your shell:");
            println!();
            println!("  fish:  secrets activate fish | source");
            println!("  bash:  eval \"$(secrets activate bash)\"");
            println!("  zsh:   eval \"$(secrets activate zsh)\"");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Authorize this host's key
fn cmd_add_this_host(vault: &Vault) -> Result<ExitCode> {
    match vault.add_this_host(&mut TerminalPrompt)? {
        AddOutcome::AlreadyAuthorized => println!("This exact key is already authorized"),
        AddOutcome::Added => println!("Host key added successfully"),
        AddOutcome::Replaced { .. } => {
            println!("Old key(s) removed and new key added successfully")
        }
    }

    println!(
        "Note: The key needs to be validated by running 'secrets revalidate' on a machine that can decrypt"
    );

    Ok(ExitCode::SUCCESS)
}

/// Re-encrypt for the current hosts file
fn cmd_revalidate(vault: &Vault) -> Result<ExitCode> {
    session::revalidate(vault)?;

    println!("Revalidation successful!");
    println!("File has been re-encrypted with all current host keys");

    Ok(ExitCode::SUCCESS)
}

/// Exit with the verdict code
fn cmd_check_host_access(vault: &Vault, json: bool) -> Result<ExitCode> {
    let verdict = vault.evaluate()?;

    if json {
        let output = serde_json::json!({
            "verdict": verdict,
            "code": verdict.code(),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else if !verdict.remediation().is_empty() {
        println!("{}", verdict.remediation());
    }

    Ok(ExitCode::from(verdict.code()))
}
