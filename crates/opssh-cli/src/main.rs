// ABOUTME: Entry point for the opssh importer.
// ABOUTME: Loads settings, applies flag overrides, runs the import and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use opssh_core::ssh_config::user_ssh_config_path;
use opssh_core::{
    default_identity_agent, has_include, include_line, run_import, FieldResolver, ImportReport,
    KeyExporter, LabelsAction, OpCli, Settings, TerminalPrompter, UrlAction, UserAction,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "opssh")]
#[command(about = "Import SSH keys from 1Password, export the public keys and write an SSH config")]
#[command(version)]
struct Cli {
    /// What to do when an item has no user field
    #[arg(long, value_enum, env = "OPSSH_USER_ACTION")]
    user_action: Option<UserAction>,

    /// What to do when an item has no URL field
    #[arg(long, value_enum, env = "OPSSH_URL_ACTION")]
    url_action: Option<UrlAction>,

    /// What to do when an item has no labels field
    #[arg(long, value_enum, env = "OPSSH_LABELS_ACTION")]
    labels_action: Option<LabelsAction>,

    /// Default SSH user (implies --user-action default unless another action is given)
    #[arg(long, env = "OPSSH_USER")]
    user: Option<String>,

    /// Vault to read SSH keys from
    #[arg(long, env = "OPSSH_VAULT")]
    vault: Option<String>,

    /// Comma-separated tags that mark SSH key items
    #[arg(long, env = "OPSSH_TAGS")]
    tags: Option<String>,

    /// Path to the 1Password CLI
    #[arg(long, env = "OPSSH_OP_BINARY")]
    op_binary: Option<String>,

    /// Directory for exported public keys and the generated config (defaults to ~/.ssh/1password)
    #[arg(long, env = "OPSSH_EXPORT_DIR")]
    export_dir: Option<PathBuf>,

    /// IdentityAgent socket to add to every host block
    #[arg(long, env = "OPSSH_IDENTITY_AGENT", conflicts_with = "agent")]
    identity_agent: Option<String>,

    /// Use the platform's default 1Password agent socket as IdentityAgent
    #[arg(long)]
    agent: bool,

    /// Settings file (defaults to ~/.config/opssh/config.toml)
    #[arg(long, env = "OPSSH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.verbose {
        opssh_log::init_with_level(tracing::Level::DEBUG);
    } else {
        opssh_log::init();
    }

    let settings = load_settings(cli.config.as_deref())?;
    let settings = apply_flags(settings, cli);

    // Reject unusable policies before touching the vault
    settings.policy().validate()?;

    let report = run(&settings)?;
    print_summary(&report);
    print_include_hint(&report.config_path);

    Ok(())
}

/// Load the settings file named on the command line, or the default one if it exists.
fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    match explicit {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => match Settings::default_path() {
            Some(path) => Ok(Settings::load_or_default(&path)?),
            None => Ok(Settings::default()),
        },
    }
}

/// Layer command-line flags (and their environment variables) over the settings file.
fn apply_flags(mut settings: Settings, cli: Cli) -> Settings {
    if let Some(user) = cli.user {
        settings.default_user = Some(user);
        if cli.user_action.is_none() {
            settings.user_action = UserAction::Default;
        }
    }
    if let Some(action) = cli.user_action {
        settings.user_action = action;
    }
    if let Some(action) = cli.url_action {
        settings.url_action = action;
    }
    if let Some(action) = cli.labels_action {
        settings.labels_action = action;
    }
    if let Some(vault) = cli.vault {
        settings.vault = vault;
    }
    if let Some(tags) = cli.tags {
        settings.tags = tags;
    }
    if let Some(op_binary) = cli.op_binary {
        settings.op_binary = op_binary;
    }
    if let Some(dir) = cli.export_dir {
        settings.export_dir = dir.display().to_string();
    }
    if cli.agent {
        settings.identity_agent = Some(default_identity_agent().to_string());
    } else if let Some(agent) = cli.identity_agent {
        settings.identity_agent = Some(agent);
    }
    settings
}

fn run(settings: &Settings) -> Result<ImportReport> {
    println!(
        "{} Loading SSH keys from the {} vault (tags: {})",
        "==>".cyan().bold(),
        settings.vault.bold(),
        settings.tags
    );

    let vault = OpCli::new(
        &settings.op_binary,
        &settings.vault,
        &settings.tags,
        settings.fields.clone(),
    );
    let mut resolver =
        FieldResolver::new(settings.policy(), settings.fields.clone(), TerminalPrompter);
    let exporter = KeyExporter::new(settings.export_dir_expanded());

    run_import(
        &vault,
        &mut resolver,
        &exporter,
        settings.identity_agent.as_deref(),
    )
    .context("Import failed")
}

fn print_summary(report: &ImportReport) {
    println!();
    for record in &report.records {
        match &record.export_path {
            Some(path) => println!(
                "  {} {:?} -> {}",
                "exported".green(),
                record.title,
                path.display()
            ),
            None => println!(
                "  {} {:?} (no public key)",
                "loaded".dimmed(),
                record.title
            ),
        }
    }
    for item in &report.skipped {
        println!(
            "  {} {:?}: {}",
            "skipped".yellow(),
            item.title,
            item.reason
        );
    }
    println!();
    println!(
        "Wrote {} host block(s) to {}",
        report.hosts,
        report.config_path.display()
    );
}

/// Tell the user how to pull the generated file into ~/.ssh/config, unless it already is.
fn print_include_hint(config_path: &Path) {
    let Some(user_config) = user_ssh_config_path() else {
        return;
    };
    let existing = std::fs::read_to_string(&user_config).unwrap_or_default();
    if has_include(&existing, config_path, dirs::home_dir().as_deref()) {
        tracing::debug!(path = %user_config.display(), "Include already present");
        return;
    }

    println!();
    println!(
        "{} Add this line at the top of {}:",
        "!".yellow().bold(),
        user_config.display()
    );
    println!("  {}", include_line(config_path).cyan());
}
