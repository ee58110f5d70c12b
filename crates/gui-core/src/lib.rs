// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

//! Framework-agnostic core of the Cloudsync backups wizard
//!
//! This crate contains the wizard state machine, the candidate folder model
//! and the view models any front end (terminal or GUI) renders from.

pub mod collision;
pub mod config;
pub mod events;
pub mod folders;
pub mod queue;
pub mod view_models;
pub mod wizard;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use collision::{check_folder, check_sync_folder, clean_path, FolderRejection};
pub use config::{
    get_client_config_path, load_client_config, load_client_config_from, save_client_config,
    save_client_config_to,
};
pub use events::{EventQueue, UserAction, WizardEvent, WizardPrompter};
pub use folders::{BackupCandidate, FolderList};
pub use queue::{BackupQueue, BackupSetupStatus, SetupState};
pub use view_models::{folder_count_text, FolderIcon, FolderRowViewModel, WizardViewModel};
pub use wizard::{BackupsWizard, WizardOutcome, WizardPage, WizardState};

// Re-export types from common crate for convenience
pub use cloudsync_common::{
    ApiErrorCode, ClientConfig, NodeHandle, SdkCache, SdkResponse, SyncController, SyncType,
};
