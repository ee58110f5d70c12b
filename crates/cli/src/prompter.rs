// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

// Cloudsync - CLI Prompter
// Terminal implementation of the wizard's modal dialogs

use colored::Colorize;
use dialoguer::{Confirm, Input};
use tracing::warn;

use cloudsync_common::validate_folder_name;
use cloudsync_gui_core::WizardPrompter;

/// Asks on the terminal with dialoguer. Prompt failures (no TTY, Ctrl-C)
/// count as the user declining.
pub struct CliPrompter {
    backup_center_url: String,
}

impl CliPrompter {
    pub fn new(backup_center_url: String) -> Self {
        Self { backup_center_url }
    }
}

impl WizardPrompter for CliPrompter {
    fn ask_new_folder_name(&mut self, current: &str) -> Option<String> {
        println!(
            "{}",
            format!("A folder named \"{}\" already exists in your backups.", current).yellow()
        );

        let answer = Input::<String>::new()
            .with_prompt("Enter a new name (leave empty to cancel)")
            .allow_empty(true)
            .validate_with(|input: &String| -> Result<(), String> {
                if input.trim().is_empty() {
                    return Ok(());
                }
                validate_folder_name(input).map_err(|e| e.to_string())
            })
            .interact_text();

        match answer {
            Ok(name) if !name.trim().is_empty() => Some(name.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                warn!("Rename prompt failed: {}", e);
                None
            }
        }
    }

    fn confirm_discard_changes(&mut self) -> bool {
        confirm("Are you sure you want to cancel? All changes will be lost.", false)
    }

    fn confirm_recreate_backups_dir(&mut self) -> bool {
        println!(
            "{}",
            "Your backups folder is in the rubbish bin.".yellow()
        );
        confirm("Create a new backups folder?", true)
    }

    fn show_warning(&mut self, message: &str) {
        println!("{}", format!("⚠️  {}", message).yellow());
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("{}", format!("✗ {}", message).red().bold());
    }

    fn show_setup_success(&mut self) -> bool {
        println!();
        println!("{}", "✓ We're backing up your folders".green().bold());
        println!(
            "{}",
            "Your backups are located in the Backups section.".dimmed()
        );

        let open = confirm("Show backups?", false);
        if open {
            println!("  {}", self.backup_center_url.cyan());
        }
        open
    }
}

fn confirm(prompt: &str, default: bool) -> bool {
    match Confirm::new().with_prompt(prompt).default(default).interact() {
        Ok(answer) => answer,
        Err(e) => {
            warn!("Confirmation prompt failed: {}", e);
            false
        }
    }
}
