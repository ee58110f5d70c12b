// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

// Cloudsync - CLI Client
// Terminal front end for the backups wizard and sync management

mod prompter;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use dialoguer::{Confirm, Input, MultiSelect, Select};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cloudsync_common::{
    ApiErrorCode, ClientConfig, NodeHandle, SandboxAccount, SandboxSdk, SdkCache, SdkResponse,
    SyncController, SyncType,
};
use cloudsync_gui_core::{
    check_folder, check_sync_folder, clean_path, get_client_config_path, load_client_config,
    save_client_config, BackupsWizard, EventQueue, FolderIcon, FolderList, UserAction, WizardEvent, WizardOutcome,
    WizardPage, WizardPrompter, WizardState, WizardViewModel,
};

use prompter::CliPrompter;

#[derive(Parser)]
#[command(name = "cloudsync")]
#[command(about = "Cloudsync desktop client CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the backups setup wizard
    Wizard {
        /// Folder to add to the selection before the wizard starts (repeatable)
        #[arg(short, long = "add", value_name = "PATH")]
        add: Vec<String>,
    },

    /// Back up a single folder
    Backup {
        /// Local folder
        path: String,

        /// Name of the remote backup folder (default: folder name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Check whether a folder can be backed up
    Check {
        /// Local folder
        path: String,
    },

    /// Manage configured syncs
    Syncs {
        #[command(subcommand)]
        action: SyncCommands,
    },

    /// Client configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum SyncCommands {
    /// List syncs and backups
    List {
        /// Output as JSON for scripting
        #[arg(short, long)]
        json: bool,
    },
    /// Add a two-way sync of a local folder
    Add {
        /// Local folder
        path: String,

        /// Name of the remote folder (default: folder name)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Remove a sync or backup
    Remove {
        /// Local folder of the sync
        path: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_client_config()?;
    debug!("Loaded client configuration: {:?}", config);

    match cli.command {
        Commands::Wizard { add } => {
            let paths = add.iter().map(|p| expand_path(p)).collect();
            run_wizard(config, paths).await?;
        }
        Commands::Backup { path, name } => {
            backup_folder(config, expand_path(&path), name).await?;
        }
        Commands::Check { path } => {
            check_path(&config, &expand_path(&path))?;
        }
        Commands::Syncs { action } => match action {
            SyncCommands::List { json } => list_syncs(&config, json)?,
            SyncCommands::Add { path, name } => add_two_way_sync(&config, &expand_path(&path), name)?,
            SyncCommands::Remove { path } => remove_sync(&config, &expand_path(&path))?,
        },
        Commands::Config { action } => match action {
            ConfigCommands::Show => {
                let content = toml::to_string_pretty(&config)
                    .context("Failed to serialize configuration")?;
                println!("{}", content);
            }
            ConfigCommands::Path => {
                println!("{}", get_client_config_path()?.display());
            }
            ConfigCommands::Init => init_config()?,
        },
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "cloudsync=warn",
        1 => "cloudsync=info",
        _ => "cloudsync=debug",
    };

    // Logs go to stderr so they never mix with JSON output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Absolute, symlink-free path of an existing directory
fn resolve_dir(path: &Path) -> Result<PathBuf> {
    let resolved = fs::canonicalize(path)
        .with_context(|| format!("Folder '{}' does not exist", path.display()))?;
    if !resolved.is_dir() {
        anyhow::bail!("'{}' is not a folder", path.display());
    }
    Ok(clean_path(&resolved))
}

fn default_device_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "My computer".to_string())
}

/// Open the sandbox account, replying on `tx`
fn open_sandbox<E: From<SdkResponse>>(
    config: &ClientConfig,
    tx: mpsc::UnboundedSender<E>,
) -> Result<SandboxSdk<E>> {
    let state_path = config.sandbox_state_path()?;
    let mut account = SandboxAccount::load_or_create(&state_path, &default_device_name())?;
    account.quota_bytes = config.sandbox_quota_bytes;
    debug!("Using sandbox account at {}", state_path.display());

    Ok(SandboxSdk::new(account, tx)
        .with_state_path(state_path)
        .with_device_name(config.device_name.clone()))
}

/// Take the reply to a synchronous sandbox request
fn take_reply(rx: &mut mpsc::UnboundedReceiver<SdkResponse>) -> Result<(ApiErrorCode, String)> {
    match rx.try_recv() {
        Ok(SdkResponse::SyncAddStatus { code, message, .. })
        | Ok(SdkResponse::MyBackupsDirStatus { code, message }) => Ok((code, message)),
        Ok(other) => anyhow::bail!("Unexpected SDK reply: {:?}", other),
        Err(_) => anyhow::bail!("The SDK did not reply"),
    }
}

// ----------------------------------------------------------------------
// Wizard
// ----------------------------------------------------------------------

async fn run_wizard(config: ClientConfig, add: Vec<PathBuf>) -> Result<()> {
    let mut queue = EventQueue::new();
    let sdk = open_sandbox::<WizardEvent>(&config, queue.sender())?;
    let prompter = CliPrompter::new(config.backup_center_url.clone());
    let mut wizard = BackupsWizard::new(sdk, prompter, config);

    for path in add {
        queue.post(UserAction::AddFolder(path));
    }

    loop {
        queue.dispatch_pending(&mut wizard);

        if let Some(outcome) = wizard.outcome() {
            match outcome {
                WizardOutcome::Accepted => info!("Backups wizard finished"),
                WizardOutcome::Cancelled => {
                    println!("{}", "Backup setup cancelled".dimmed());
                }
            }
            return Ok(());
        }

        let view = WizardViewModel::from_wizard(&wizard);
        if !matches!(view.state, WizardState::Step1Init | WizardState::Step2Init) {
            anyhow::bail!("Wizard is waiting on the SDK in state {:?}", view.state);
        }

        for action in ask_wizard_action(&view)? {
            queue.post(action);
        }
    }
}

fn print_rows(view: &WizardViewModel) {
    for row in &view.rows {
        let marker = match row.checked {
            Some(true) => "[x]",
            Some(false) => "[ ]",
            None => " • ",
        };
        let line = format!("  {} {}", marker, row.display_name);
        match row.icon {
            FolderIcon::Folder => println!("{}", line),
            FolderIcon::Warning => println!("{} {}", line.yellow(), "⚠️".yellow()),
        }
        for detail in row.tooltip.lines() {
            println!("        {}", detail.dimmed());
        }
    }
}

/// Render the current page and translate the user's choice into actions
fn ask_wizard_action(view: &WizardViewModel) -> Result<Vec<UserAction>> {
    println!();
    match view.page {
        WizardPage::SelectFolders => {
            println!("{}", "Back up your folders".bold().green());
            if !view.device_name.is_empty() {
                println!("Device: {}", view.device_name.cyan());
            }
            println!();

            if view.all_folders_synced {
                println!(
                    "{}",
                    "All your folders are already synced; there is nothing left to back up."
                        .yellow()
                );
                return Ok(vec![UserAction::Cancel]);
            }

            print_rows(view);
            println!();
            println!("{} selected", view.folder_count_text.cyan());

            let mut choices = vec!["Choose folders", "Add another folder"];
            if view.next_enabled {
                choices.push(view.next_label);
            }
            choices.push("Cancel");

            let choice = Select::new()
                .with_prompt("What next?")
                .items(&choices)
                .default(0)
                .interact()?;

            match choices[choice] {
                "Choose folders" => choose_folders(view),
                "Add another folder" => {
                    let path: String = Input::new()
                        .with_prompt("Folder to back up")
                        .interact_text()?;
                    Ok(vec![UserAction::AddFolder(expand_path(path.trim()))])
                }
                "Cancel" => Ok(vec![UserAction::Cancel]),
                _ => Ok(vec![UserAction::Next]),
            }
        }
        WizardPage::Confirm => {
            println!("{}", "Confirm your backup".bold().green());
            println!();
            print_rows(view);
            println!();
            println!("Folders:   {}", view.folder_count_text.cyan());
            match view.backup_to {
                Some(ref destination) => println!("Backup to: {}", destination.cyan()),
                None => println!("Backup to: {}", "looking up...".dimmed()),
            }
            println!();

            let mut choices = Vec::new();
            if view.next_enabled {
                choices.push(view.next_label);
            }
            choices.push("Back");
            choices.push("Cancel");

            let choice = Select::new()
                .with_prompt("Ready?")
                .items(&choices)
                .default(0)
                .interact()?;

            Ok(vec![match choices[choice] {
                "Back" => UserAction::Back,
                "Cancel" => UserAction::Cancel,
                _ => UserAction::Next,
            }])
        }
    }
}

fn choose_folders(view: &WizardViewModel) -> Result<Vec<UserAction>> {
    let items: Vec<String> = view
        .rows
        .iter()
        .map(|row| format!("{}  ({})", row.display_name, row.tooltip.lines().next().unwrap_or("")))
        .collect();
    let defaults: Vec<bool> = view.rows.iter().map(|row| row.checked == Some(true)).collect();

    let selected = MultiSelect::new()
        .with_prompt("Select folders (space to toggle, enter to confirm)")
        .items(&items)
        .defaults(&defaults)
        .interact()?;

    // Unchecks first, so a newly checked folder is not compared against them
    let mut unchecks = Vec::new();
    let mut checks = Vec::new();
    for (position, row) in view.rows.iter().enumerate() {
        let was = row.checked == Some(true);
        let now = selected.contains(&position);
        if was && !now {
            unchecks.push(UserAction::SetChecked {
                index: row.index,
                checked: false,
            });
        } else if !was && now {
            checks.push(UserAction::SetChecked {
                index: row.index,
                checked: true,
            });
        }
    }
    unchecks.extend(checks);
    Ok(unchecks)
}

// ----------------------------------------------------------------------
// Single backup and checks
// ----------------------------------------------------------------------

async fn backup_folder(config: ClientConfig, path: PathBuf, name: Option<String>) -> Result<()> {
    let path = resolve_dir(&path)?;
    let (tx, mut rx) = mpsc::unbounded_channel::<SdkResponse>();
    let mut sdk = open_sandbox(&config, tx)?;

    let account = sdk.account();
    let have_root = account.backups_root.is_valid() && !account.is_in_rubbish(account.backups_root);
    if !have_root || account.syncs.count(SyncType::Backup) == 0 {
        info!("No backups configured yet, starting the wizard");
        drop(sdk);
        return run_wizard(config, vec![path]).await;
    }

    let two_way = sdk.local_folders(SyncType::TwoWay);
    let backups = sdk.local_folders(SyncType::Backup);
    if let Err(rejection) = check_folder(&path, &two_way, &backups, &FolderList::new()) {
        anyhow::bail!("{}", rejection);
    }

    let mut name = name.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    });

    // Backups land in the device folder; ask again while the name is taken
    let mut prompter = CliPrompter::new(config.backup_center_url.clone());
    let device_name = sdk.account().device_name.clone();
    let backups_root = sdk.account().backups_root;
    if let Some(device) = sdk.child_node(backups_root, &device_name) {
        while sdk.child_node(device.handle, &name).is_some() {
            match prompter.ask_new_folder_name(&name) {
                Some(new_name) => name = new_name,
                None => {
                    println!("{}", "Backup cancelled".dimmed());
                    return Ok(());
                }
            }
        }
    }

    sdk.add_sync(&path, NodeHandle::INVALID, &name, SyncType::Backup);
    let (code, message) = take_reply(&mut rx)?;
    if !code.is_ok() {
        anyhow::bail!("Backup of '{}' failed: {}", path.display(), error_text(code, &message));
    }

    println!();
    println!("{}", format!("✓ Backing up '{}'", name).green().bold());
    println!("  Local:  {}", path.display().to_string().dimmed());
    println!(
        "  Remote: {}",
        format!(
            "{}/{}",
            sdk.node_path(backups_root).unwrap_or_default(),
            device_name
        )
        .dimmed()
    );
    println!();
    Ok(())
}

fn error_text(code: ApiErrorCode, message: &str) -> String {
    if message.is_empty() {
        code.message().to_string()
    } else {
        message.to_string()
    }
}

fn check_path(config: &ClientConfig, path: &Path) -> Result<()> {
    let path = resolve_dir(path)?;
    let (tx, _rx) = mpsc::unbounded_channel::<SdkResponse>();
    let sdk = open_sandbox(config, tx)?;

    let two_way = sdk.local_folders(SyncType::TwoWay);
    let backups = sdk.local_folders(SyncType::Backup);

    if sdk.is_remote_root_synced() {
        println!(
            "{}",
            "✗ The whole account is synced; no folder can be backed up".red()
        );
        return Ok(());
    }

    match check_folder(&path, &two_way, &backups, &FolderList::new()) {
        Ok(()) => println!(
            "{}",
            format!("✓ '{}' can be backed up", path.display()).green()
        ),
        Err(rejection) => {
            println!("{}", format!("✗ {}", rejection).red());
            println!(
                "  Conflicts with: {}",
                rejection.root().display().to_string().dimmed()
            );
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Sync management
// ----------------------------------------------------------------------

fn list_syncs(config: &ClientConfig, json: bool) -> Result<()> {
    let (tx, _rx) = mpsc::unbounded_channel::<SdkResponse>();
    let sdk = open_sandbox(config, tx)?;
    let account = sdk.account();

    let mut entries = account.syncs.entries().to_vec();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "No syncs or backups configured.".yellow());
        println!("Set up backups with: {}", "cloudsync wizard".cyan());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").add_attribute(Attribute::Bold).fg(Color::Cyan),
        Cell::new("Type").add_attribute(Attribute::Bold).fg(Color::Cyan),
        Cell::new("Local folder").add_attribute(Attribute::Bold).fg(Color::Cyan),
        Cell::new("Remote folder").add_attribute(Attribute::Bold).fg(Color::Cyan),
        Cell::new("Created").add_attribute(Attribute::Bold).fg(Color::Cyan),
    ]);

    for entry in &entries {
        let remote = account
            .node_path(entry.remote_handle)
            .unwrap_or_else(|| "-".to_string());
        let type_color = match entry.sync_type {
            SyncType::TwoWay => Color::Blue,
            SyncType::Backup => Color::Magenta,
        };

        table.add_row(vec![
            Cell::new(&entry.name).fg(Color::Green),
            Cell::new(entry.sync_type.to_string()).fg(type_color),
            Cell::new(entry.local_path.display()),
            Cell::new(remote),
            Cell::new(entry.created_at.format("%Y-%m-%d %H:%M")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{}", table);
    println!();
    println!(
        "{} sync(s), {} backup(s)",
        account.syncs.count(SyncType::TwoWay).to_string().cyan(),
        account.syncs.count(SyncType::Backup).to_string().cyan()
    );
    println!();
    Ok(())
}

fn add_two_way_sync(config: &ClientConfig, path: &Path, name: Option<String>) -> Result<()> {
    let path = resolve_dir(path)?;
    let (tx, mut rx) = mpsc::unbounded_channel::<SdkResponse>();
    let mut sdk = open_sandbox(config, tx)?;

    let two_way = sdk.local_folders(SyncType::TwoWay);
    let backups = sdk.local_folders(SyncType::Backup);
    if let Err(rejection) = check_sync_folder(&path, &two_way, &backups) {
        anyhow::bail!("{} ('{}')", rejection, rejection.root().display());
    }

    let name = name.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Cloud Drive".to_string())
    });

    sdk.add_sync(&path, NodeHandle::INVALID, &name, SyncType::TwoWay);
    let (code, message) = take_reply(&mut rx)?;
    if !code.is_ok() {
        anyhow::bail!("Sync of '{}' failed: {}", path.display(), error_text(code, &message));
    }

    println!(
        "{}",
        format!("✓ '{}' is now synced as '{}'", path.display(), name).green()
    );
    Ok(())
}

fn remove_sync(config: &ClientConfig, path: &Path) -> Result<()> {
    // The folder may be gone already; fall back to the path as given
    let path = resolve_dir(path).unwrap_or_else(|_| clean_path(path));
    let (tx, _rx) = mpsc::unbounded_channel::<SdkResponse>();
    let mut sdk = open_sandbox(config, tx)?;

    let entry = sdk.account_mut().syncs.remove_by_path(&path)?;
    sdk.persist()?;

    println!(
        "{}",
        format!("{} '{}' removed", capitalize(&entry.sync_type.to_string()), entry.name).green()
    );
    println!("  Remote data is kept in {}", "your account".dimmed());
    Ok(())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn init_config() -> Result<()> {
    let path = get_client_config_path()?;
    if path.exists() {
        let overwrite = Confirm::new()
            .with_prompt(format!(
                "'{}' already exists. Overwrite with defaults?",
                path.display()
            ))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("{}", "Configuration unchanged".dimmed());
            return Ok(());
        }
    }

    let path = save_client_config(&ClientConfig::default())?;
    println!(
        "{}",
        format!("✓ Configuration written to {}", path.display()).green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_wizard_adds() {
        let cli = Cli::try_parse_from(["cloudsync", "wizard", "--add", "/a", "--add", "/b"]).unwrap();
        match cli.command {
            Commands::Wizard { add } => assert_eq!(add, vec!["/a", "/b"]),
            _ => panic!("expected wizard command"),
        }
    }

    #[test]
    fn test_cli_verbosity() {
        let cli = Cli::try_parse_from(["cloudsync", "-vv", "syncs", "list", "--json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Syncs {
                action: SyncCommands::List { json: true }
            }
        ));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("backup"), "Backup");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_error_text_falls_back_to_code() {
        assert_eq!(error_text(ApiErrorCode::OverQuota, ""), "Storage quota exceeded");
        assert_eq!(error_text(ApiErrorCode::Access, "nope"), "nope");
    }

    #[test]
    fn test_expand_path_keeps_absolute() {
        assert_eq!(expand_path("/tmp/x"), PathBuf::from("/tmp/x"));
    }
}
