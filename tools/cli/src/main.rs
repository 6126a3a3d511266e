//! Strongbox CLI - command line interface for the credential vault.
//!
//! Unlocks a SQLite-backed vault with the master password and exposes
//! credential CRUD, encrypted export/import, and master-password
//! rotation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use strongbox_common::SensitiveString;
use strongbox_store::SqliteStore;
use strongbox_vault::{looks_like_export_file, BackupOutcome, CredentialDraft, Vault};

#[derive(Parser)]
#[command(name = "strongbox")]
#[command(about = "Strongbox - encrypted credential vault")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Path to the vault database.
    #[arg(short, long, default_value = "passwords.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new credential.
    Add {
        /// Entry title.
        #[arg(short, long)]
        title: String,

        /// Website URL.
        #[arg(short, long, default_value = "")]
        website: String,

        /// Login username.
        #[arg(short, long)]
        username: String,

        /// Category label.
        #[arg(short, long, default_value = "General")]
        category: String,

        /// Free-form notes.
        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// List all credentials (passwords stay hidden).
    List,

    /// Reveal one credential's password.
    Show {
        /// Record id.
        id: i64,
    },

    /// Search credentials by title, website, or username.
    Search {
        /// Substring to search for.
        query: String,
    },

    /// Remove a credential.
    Remove {
        /// Record id.
        id: i64,
    },

    /// Export the vault to an encrypted file.
    Export {
        /// Output file path.
        #[arg(short, long)]
        output: PathBuf,

        /// Device name embedded in the export.
        #[arg(short, long, default_value = "strongbox-cli")]
        device_name: String,
    },

    /// Import records from an encrypted export file.
    Import {
        /// Export file path.
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Change the master password, re-encrypting every record.
    ChangePassword,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Add {
            title,
            website,
            username,
            category,
            notes,
        } => cmd_add(&cli.db, title, website, username, category, notes),
        Commands::List => cmd_list(&cli.db),
        Commands::Show { id } => cmd_show(&cli.db, id),
        Commands::Search { query } => cmd_search(&cli.db, &query),
        Commands::Remove { id } => cmd_remove(&cli.db, id),
        Commands::Export {
            output,
            device_name,
        } => cmd_export(&cli.db, &output, &device_name),
        Commands::Import { input } => cmd_import(&cli.db, &input),
        Commands::ChangePassword => cmd_change_password(&cli.db),
    }
}

/// Prompt for a password without echoing it.
fn prompt_password(prompt: &str) -> Result<SensitiveString> {
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(SensitiveString::new(password))
}

/// Unlock the vault at the given database path.
fn unlock(db: &PathBuf) -> Result<Vault<SqliteStore>> {
    let store = SqliteStore::open(db).context("Failed to open vault database")?;
    let password = prompt_password("Master password: ")?;
    Vault::unlock(store, password.as_str()).context("Failed to unlock vault")
}

fn print_records(records: &[strongbox_store::CredentialRecord]) {
    if records.is_empty() {
        println!("No credentials found.");
        return;
    }
    println!("{:>6}  {:<24} {:<20} {:<28} {}", "ID", "TITLE", "USERNAME", "WEBSITE", "CATEGORY");
    for record in records {
        println!(
            "{:>6}  {:<24} {:<20} {:<28} {}",
            record.id, record.title, record.username, record.website, record.category
        );
    }
}

fn cmd_add(
    db: &PathBuf,
    title: String,
    website: String,
    username: String,
    category: String,
    notes: String,
) -> Result<()> {
    let mut vault = unlock(db)?;

    let password = prompt_password("Password for this entry: ")?;
    let confirm = prompt_password("Confirm: ")?;
    if password.as_str() != confirm.as_str() {
        anyhow::bail!("Passwords do not match");
    }

    let record = vault.add_credential(CredentialDraft {
        title,
        website,
        username,
        password: password.as_str().to_string(),
        category,
        notes,
    })?;

    println!("Added credential #{} ({})", record.id, record.title);
    Ok(())
}

fn cmd_list(db: &PathBuf) -> Result<()> {
    let vault = unlock(db)?;
    print_records(&vault.list()?);
    Ok(())
}

fn cmd_show(db: &PathBuf, id: i64) -> Result<()> {
    let vault = unlock(db)?;
    let record = vault
        .list()?
        .into_iter()
        .find(|r| r.id == id)
        .with_context(|| format!("No credential with id {}", id))?;

    let password = vault
        .reveal_password(&record)
        .context("Could not decrypt this record")?;

    println!("Title:    {}", record.title);
    println!("Website:  {}", record.website);
    println!("Username: {}", record.username);
    println!("Password: {}", password);
    println!("Category: {}", record.category);
    if !record.notes.is_empty() {
        println!("Notes:    {}", record.notes);
    }
    Ok(())
}

fn cmd_search(db: &PathBuf, query: &str) -> Result<()> {
    let vault = unlock(db)?;
    print_records(&vault.search(query)?);
    Ok(())
}

fn cmd_remove(db: &PathBuf, id: i64) -> Result<()> {
    let mut vault = unlock(db)?;
    vault.delete(id)?;
    println!("Removed credential #{}", id);
    Ok(())
}

fn cmd_export(db: &PathBuf, output: &PathBuf, device_name: &str) -> Result<()> {
    let vault = unlock(db)?;
    let data = vault.export(device_name)?;
    std::fs::write(output, &data).context("Failed to write export file")?;
    println!("Exported vault to {} ({} bytes)", output.display(), data.len());
    Ok(())
}

fn cmd_import(db: &PathBuf, input: &PathBuf) -> Result<()> {
    let data = std::fs::read(input).context("Failed to read export file")?;
    if !looks_like_export_file(&data) {
        anyhow::bail!("{} does not look like an export file", input.display());
    }

    let mut vault = unlock(db)?;
    let count = vault.import(&data)?;
    println!("Imported {} credential(s)", count);
    Ok(())
}

fn cmd_change_password(db: &PathBuf) -> Result<()> {
    let store = SqliteStore::open(db).context("Failed to open vault database")?;
    let old = prompt_password("Current master password: ")?;
    let new = prompt_password("New master password: ")?;
    let confirm = prompt_password("Confirm new master password: ")?;
    if new.as_str() != confirm.as_str() {
        anyhow::bail!("Passwords do not match");
    }

    let mut vault = Vault::unlock(store, old.as_str()).context("Failed to unlock vault")?;
    let report = vault.change_master_password(old.as_str(), new.as_str())?;

    match &report.backup {
        BackupOutcome::Created(location) => println!("Backup written to {}", location),
        BackupOutcome::Failed(reason) => println!("Warning: backup failed ({})", reason),
    }
    println!("Re-encrypted {} record(s)", report.reencrypted);
    if !report.skipped.is_empty() {
        println!(
            "Warning: {} record(s) could not be re-encrypted and are now unreadable: {:?}",
            report.skipped.len(),
            report.skipped
        );
        println!("Restore them from the backup above if needed.");
    }
    println!("Master password changed.");
    Ok(())
}
