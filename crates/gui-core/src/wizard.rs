// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

//! Backups wizard state machine
//!
//! Page 1 lists candidate folders, page 2 confirms the selection and the
//! remote destination. Pressing "Setup" makes sure the backups root exists,
//! then creates the backups one after another. All input arrives through
//! [`BackupsWizard::handle`], one event at a time.

use std::fs;
use std::path::{Path, PathBuf};

use cloudsync_common::{
    ApiErrorCode, ClientConfig, NodeHandle, SdkCache, SdkResponse, SyncController, SyncType,
};
use tracing::{debug, info, warn};

use crate::collision::{check_folder, clean_path, FolderRejection};
use crate::events::{UserAction, WizardEvent, WizardPrompter};
use crate::folders::{BackupCandidate, FolderList};
use crate::queue::BackupQueue;

/// Wizard steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Step1Init,
    Step2Init,
    Finalize,
    SetupMyBackupsDir,
    SetupBackups,
    Done,
    Exit,
}

/// Visible wizard page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPage {
    /// Folder selection
    SelectFolders,
    /// Confirmation and setup
    Confirm,
}

/// How the wizard ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardOutcome {
    Accepted,
    Cancelled,
}

pub struct BackupsWizard<S, P> {
    sdk: S,
    prompter: P,
    config: ClientConfig,
    state: WizardState,
    folders: FolderList,
    queue: BackupQueue,
    /// Folders offered when the list is empty
    candidate_locations: Vec<PathBuf>,
    home_dir: Option<PathBuf>,

    device_name: Option<String>,
    backups_root: NodeHandle,
    device_dir: NodeHandle,
    backups_dir_name: String,
    backups_dir_path: Option<String>,
    create_backups_dir: bool,
    have_backups_dir: bool,

    error: bool,
    user_cancelled: bool,
    cancel_enabled: bool,
    all_folders_synced: bool,
    outcome: Option<WizardOutcome>,
}

impl<S, P> BackupsWizard<S, P>
where
    S: SyncController + SdkCache,
    P: WizardPrompter,
{
    /// Create the wizard and enter the first step
    pub fn new(sdk: S, prompter: P, config: ClientConfig) -> Self {
        let candidate_locations = config
            .standard_folders
            .iter()
            .filter_map(|folder| folder.location())
            .collect();
        Self::with_candidate_locations(sdk, prompter, config, candidate_locations)
    }

    /// Like [`BackupsWizard::new`], offering `locations` instead of the
    /// configured standard folders
    pub fn with_candidate_locations(
        sdk: S,
        prompter: P,
        config: ClientConfig,
        locations: Vec<PathBuf>,
    ) -> Self {
        let backups_dir_name = config.backups_dir_name.clone();
        let mut wizard = Self {
            sdk,
            prompter,
            config,
            state: WizardState::Step1Init,
            folders: FolderList::new(),
            queue: BackupQueue::new(),
            candidate_locations: locations,
            home_dir: dirs::home_dir(),
            device_name: None,
            backups_root: NodeHandle::INVALID,
            device_dir: NodeHandle::INVALID,
            backups_dir_name,
            backups_dir_path: None,
            create_backups_dir: false,
            have_backups_dir: false,
            error: false,
            user_cancelled: false,
            cancel_enabled: true,
            all_folders_synced: false,
            outcome: None,
        };
        wizard.next_step(WizardState::Step1Init);
        wizard
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn page(&self) -> WizardPage {
        match self.state {
            WizardState::Step1Init => WizardPage::SelectFolders,
            _ => WizardPage::Confirm,
        }
    }

    pub fn folders(&self) -> &FolderList {
        &self.folders
    }

    pub fn queue(&self) -> &BackupQueue {
        &self.queue
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    pub fn backups_dir_name(&self) -> &str {
        &self.backups_dir_name
    }

    pub fn outcome(&self) -> Option<WizardOutcome> {
        self.outcome
    }

    pub fn all_folders_synced(&self) -> bool {
        self.all_folders_synced
    }

    pub fn cancel_enabled(&self) -> bool {
        self.cancel_enabled && self.state != WizardState::Exit
    }

    pub fn back_visible(&self) -> bool {
        self.state == WizardState::Step2Init
    }

    pub fn next_enabled(&self) -> bool {
        match self.state {
            WizardState::Step1Init => {
                !self.all_folders_synced
                    && self.folders.is_something_checked()
                    && self.device_name.as_deref().is_some_and(|n| !n.is_empty())
            }
            WizardState::Step2Init => self.have_backups_dir,
            _ => false,
        }
    }

    /// Remote destination shown on the confirmation page:
    /// `<root name><backups dir path>/<device name>`
    pub fn backup_to(&self) -> Option<String> {
        let path = self.backups_dir_path.as_ref()?;
        let root = self.sdk.root_node()?;
        Some(format!(
            "{}{}/{}",
            root.name,
            path,
            self.device_name.as_deref().unwrap_or_default()
        ))
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    pub fn sdk_mut(&mut self) -> &mut S {
        &mut self.sdk
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn prompter_mut(&mut self) -> &mut P {
        &mut self.prompter
    }

    /// Feed one event to the state machine
    pub fn handle(&mut self, event: WizardEvent) {
        if self.state == WizardState::Exit {
            debug!("Backups Wizard: ignoring {:?} after exit", event);
            return;
        }

        match event {
            WizardEvent::User(action) => self.on_user_action(action),
            WizardEvent::Sdk(response) => self.on_sdk_response(response),
        }
    }

    // ------------------------------------------------------------------
    // State machine orchestrator
    // ------------------------------------------------------------------

    fn next_step(&mut self, step: WizardState) {
        debug!("Backups Wizard: {:?} -> {:?}", self.state, step);
        self.state = step;

        match step {
            WizardState::Step1Init => self.setup_step1(),
            WizardState::Step2Init => self.setup_step2(),
            WizardState::Finalize => self.setup_finalize(),
            WizardState::SetupMyBackupsDir => self.setup_my_backups_dir(false),
            WizardState::SetupBackups => self.setup_backups(),
            WizardState::Done => self.setup_complete(),
            WizardState::Exit => {
                let outcome = if self.user_cancelled {
                    WizardOutcome::Cancelled
                } else {
                    WizardOutcome::Accepted
                };
                info!("Backups Wizard: exit ({:?})", outcome);
                self.outcome = Some(outcome);
            }
        }
    }

    fn setup_step1(&mut self) {
        info!("Backups Wizard: step 1");
        self.folders.set_show_only_checked(false);
        self.cancel_enabled = true;

        self.sdk.get_device_name();
        self.sdk.get_backups_root_dir_handle();

        self.all_folders_synced = self.sdk.is_remote_root_synced();
        if self.all_folders_synced {
            info!("Backups Wizard: remote root is synced, no folder can be backed up");
        } else if self.folders.is_empty() {
            self.populate_standard_folders();
        }
    }

    fn populate_standard_folders(&mut self) {
        for location in self.candidate_locations.clone() {
            let Ok(path) = fs::canonicalize(&location) else {
                continue;
            };
            if !path.is_dir() || self.home_dir.as_deref() == Some(path.as_path()) {
                continue;
            }
            if self.check_path(&path).is_err() {
                debug!(
                    "Backups Wizard: skipping standard folder {} (already synced)",
                    path.display()
                );
                continue;
            }
            debug!("Backups Wizard: offering {}", path.display());
            self.folders.push(BackupCandidate::new(path));
        }
    }

    fn setup_step2(&mut self) {
        info!(
            "Backups Wizard: step 2 ({} folder(s))",
            self.folders.checked_count()
        );
        self.folders.set_show_only_checked(true);
        self.cancel_enabled = true;

        self.have_backups_dir = false;
        self.sdk.get_backups_root_dir_handle();
    }

    fn setup_finalize(&mut self) {
        info!("Backups Wizard: finalize");
        self.cancel_enabled = false;
        self.error = false;

        self.next_step(WizardState::SetupMyBackupsDir);
    }

    fn setup_my_backups_dir(&mut self, name_collision: bool) {
        debug!("Backups Wizard: setup backups root");

        // Only empty after the user cancelled a rename
        if self.backups_dir_name.is_empty() {
            self.user_cancelled = true;
            self.next_step(WizardState::Exit);
        } else if self.create_backups_dir || name_collision {
            info!(
                "Backups Wizard: creating backups root \"{}\"",
                self.backups_dir_name
            );
            let name = self.backups_dir_name.clone();
            self.sdk.create_my_backups_dir(&name);
        } else {
            self.next_step(WizardState::SetupBackups);
        }
    }

    fn setup_backups(&mut self) {
        self.queue.clear();
        for candidate in self.folders.checked() {
            self.queue
                .enqueue(candidate.display_name.clone(), candidate.local_path.clone());
        }

        if self.queue.is_empty() {
            warn!("Backups Wizard: nothing to back up");
            self.next_step(WizardState::Done);
            return;
        }
        self.process_next_backup_setup();
    }

    fn process_next_backup_setup(&mut self) {
        let Some((name, path)) = self.queue.next_to_submit() else {
            return;
        };

        info!(
            "Backups Wizard: setup backup \"{}\" to \"{}/{}/{}\"",
            name,
            self.backups_dir_name,
            self.device_name.as_deref().unwrap_or_default(),
            path.display()
        );
        self.sdk
            .add_sync(&path, NodeHandle::INVALID, &name, SyncType::Backup);
    }

    fn setup_complete(&mut self) {
        if self.error {
            info!("Backups Wizard: setup completed with errors, back to step 1");
            self.next_step(WizardState::Step1Init);
            return;
        }

        info!("Backups Wizard: setup completed successfully");
        if self.prompter.show_setup_success() {
            info!(
                "Backups Wizard: show backup center ({})",
                self.config.backup_center_url
            );
        }
        self.next_step(WizardState::Exit);
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    fn on_user_action(&mut self, action: UserAction) {
        match action {
            UserAction::Next => self.on_next(),
            UserAction::Back => self.on_back(),
            UserAction::Cancel => self.on_cancel(),
            UserAction::AddFolder(path) => self.on_add_folder(&path),
            UserAction::SetChecked { index, checked } => self.on_set_checked(index, checked),
        }
    }

    fn on_next(&mut self) {
        if !self.next_enabled() {
            warn!("Backups Wizard: next ignored in {:?}", self.state);
            return;
        }

        match self.page() {
            WizardPage::SelectFolders => self.next_step(WizardState::Step2Init),
            WizardPage::Confirm => self.next_step(WizardState::Finalize),
        }
    }

    fn on_back(&mut self) {
        if !self.back_visible() {
            warn!("Backups Wizard: back ignored in {:?}", self.state);
            return;
        }
        info!("Backups Wizard: back");
        self.next_step(WizardState::Step1Init);
    }

    fn on_cancel(&mut self) {
        if !self.cancel_enabled() {
            warn!("Backups Wizard: cancel ignored in {:?}", self.state);
            return;
        }

        if self.folders.is_something_checked() && !self.prompter.confirm_discard_changes() {
            return;
        }

        info!("Backups Wizard: user cancel");
        self.user_cancelled = true;
        self.next_step(WizardState::Exit);
    }

    fn on_add_folder(&mut self, path: &Path) {
        if self.state != WizardState::Step1Init || self.all_folders_synced {
            warn!("Backups Wizard: cannot add folders in {:?}", self.state);
            return;
        }

        let path = match fs::canonicalize(path) {
            Ok(path) if path.is_dir() => clean_path(&path),
            _ => {
                self.prompter.show_warning(&format!(
                    "The folder \"{}\" does not exist",
                    path.display()
                ));
                return;
            }
        };

        if let Err(rejection) = self.check_path(&path) {
            warn!(
                "Backups Wizard: {} rejected: {} ({})",
                path.display(),
                rejection,
                rejection.root().display()
            );
            self.prompter.show_warning(&rejection.to_string());
            return;
        }

        // Same path picked again: reuse the row and its name
        let index = match self.folders.position_by_path(&path) {
            Some(index) => index,
            None => self
                .folders
                .insert_front(BackupCandidate::new(path.clone())),
        };
        info!("Backups Wizard: add folder \"{}\"", path.display());
        self.on_set_checked(index, true);
    }

    fn on_set_checked(&mut self, index: usize, checked: bool) {
        if self.state != WizardState::Step1Init {
            warn!("Backups Wizard: selection is read-only in {:?}", self.state);
            return;
        }

        let Some(candidate) = self.folders.get(index) else {
            warn!("Backups Wizard: no folder at row {}", index);
            return;
        };
        if candidate.checked == checked {
            return;
        }
        let path = candidate.local_path.clone();
        let name = candidate.display_name.clone();

        if !checked {
            if let Some(candidate) = self.folders.get_mut(index) {
                candidate.checked = false;
            }
            return;
        }

        if let Err(rejection) = self.check_path(&path) {
            self.prompter.show_warning(&rejection.to_string());
            return;
        }

        match self.ensure_unique_remote_name(index, name) {
            Some(name) => {
                if let Some(candidate) = self.folders.get_mut(index) {
                    candidate.display_name = name;
                    candidate.checked = true;
                }
            }
            None => debug!("Backups Wizard: rename cancelled, row {} left unchecked", index),
        }
    }

    /// Ask for another name while `name` is taken on the remote device
    /// folder or by another checked row. `None` if the user cancels.
    fn ensure_unique_remote_name(&mut self, index: usize, mut name: String) -> Option<String> {
        while self.is_name_taken(index, &name) {
            let new_name = self.prompter.ask_new_folder_name(&name)?;
            let new_name = new_name.trim().to_string();
            if new_name.is_empty() {
                return None;
            }
            name = new_name;
        }
        Some(name)
    }

    fn is_name_taken(&self, index: usize, name: &str) -> bool {
        let remote = self.device_dir.is_valid()
            && self.sdk.node_by_handle(self.device_dir).is_some()
            && self.sdk.child_node(self.device_dir, name).is_some();

        let local = self
            .folders
            .items()
            .iter()
            .enumerate()
            .any(|(i, c)| i != index && c.checked && c.display_name == name);

        remote || local
    }

    fn check_path(&self, path: &Path) -> Result<(), FolderRejection> {
        let two_way = self.sdk.local_folders(SyncType::TwoWay);
        let backups = self.sdk.local_folders(SyncType::Backup);
        check_folder(path, &two_way, &backups, &self.folders)
    }

    // ------------------------------------------------------------------
    // SDK replies
    // ------------------------------------------------------------------

    fn on_sdk_response(&mut self, response: SdkResponse) {
        match response {
            SdkResponse::DeviceName(name) => self.on_device_name_set(name),
            SdkResponse::BackupsRootDirHandle(handle) => self.on_backups_dir_set(handle),
            SdkResponse::MyBackupsDirStatus { code, message } => {
                self.on_set_my_backups_dir_status(code, &message)
            }
            SdkResponse::SyncAddStatus {
                code,
                message,
                name,
            } => self.on_sync_add_status(code, message, &name),
        }
    }

    fn on_device_name_set(&mut self, name: String) {
        debug!("Backups Wizard: device name \"{}\"", name);
        self.device_name = Some(name);
        self.resolve_device_dir();
    }

    fn resolve_device_dir(&mut self) {
        self.device_dir = match self.device_name.as_deref() {
            Some(name) if self.backups_root.is_valid() => self
                .sdk
                .child_node(self.backups_root, name)
                .map(|node| node.handle)
                .unwrap_or(NodeHandle::INVALID),
            _ => NodeHandle::INVALID,
        };
    }

    fn on_backups_dir_set(&mut self, handle: NodeHandle) {
        if self.state == WizardState::Step1Init {
            // Early lookup for the remote name check; step 2 asks again
            self.backups_root = if handle.is_valid() && !self.sdk.is_in_rubbish(handle) {
                handle
            } else {
                NodeHandle::INVALID
            };
            self.resolve_device_dir();
            return;
        }
        if self.state != WizardState::Step2Init {
            debug!("Backups Wizard: stale backups root reply in {:?}", self.state);
        }

        self.have_backups_dir = true;
        let mut existing_path = None;

        if handle.is_valid() {
            if let Some(node) = self.sdk.node_by_handle(handle) {
                if let Some(path) = self.sdk.node_path(handle).filter(|p| !p.is_empty()) {
                    self.backups_dir_name = node.name.clone();
                    self.create_backups_dir = false;
                    existing_path = Some(path);
                }

                if self.sdk.is_in_rubbish(handle) {
                    info!("Backups Wizard: backups root in rubbish bin");
                    if self.prompter.confirm_recreate_backups_dir() {
                        existing_path = None;
                    } else {
                        self.have_backups_dir = false;
                        self.create_backups_dir = false;
                        self.user_cancelled = true;
                        self.next_step(WizardState::Exit);
                        return;
                    }
                }
            }
        }

        match existing_path {
            Some(path) => {
                self.backups_root = handle;
                self.backups_dir_path = Some(path);
            }
            None => {
                // Missing remote folder: program its creation under the default name
                self.backups_root = NodeHandle::INVALID;
                self.backups_dir_name = self.config.backups_dir_name.clone();
                self.backups_dir_path = Some(format!("/{}", self.backups_dir_name));
                self.create_backups_dir = true;
            }
        }
        debug!(
            "Backups Wizard: backups root \"{}\"",
            self.backups_dir_path.as_deref().unwrap_or_default()
        );
        self.resolve_device_dir();
    }

    fn on_set_my_backups_dir_status(&mut self, code: ApiErrorCode, message: &str) {
        if self.state != WizardState::SetupMyBackupsDir {
            warn!(
                "Backups Wizard: unexpected backups root status in {:?}",
                self.state
            );
            return;
        }

        match code {
            ApiErrorCode::Ok => {
                self.create_backups_dir = false;
                self.have_backups_dir = true;
                self.backups_dir_path = Some(format!("/{}", self.backups_dir_name));
                self.setup_my_backups_dir(false);
            }
            ApiErrorCode::Exists => {
                info!(
                    "Backups Wizard: \"{}\" already exists, asking for another name",
                    self.backups_dir_name
                );
                self.have_backups_dir = false;
                self.backups_dir_name = self
                    .prompter
                    .ask_new_folder_name(&self.backups_dir_name)
                    .map(|name| name.trim().to_string())
                    .unwrap_or_default();
                self.setup_my_backups_dir(true);
            }
            _ => {
                warn!("Backups Wizard: backups root setup failed: {}", message);
                self.prompter.show_error(&format!(
                    "Creating or setting folder \"{}\" as backups root failed.\nReason: {}",
                    self.backups_dir_name, message
                ));
                self.next_step(WizardState::Step2Init);
            }
        }
    }

    fn on_sync_add_status(&mut self, code: ApiErrorCode, message: String, name: &str) {
        if self.state != WizardState::SetupBackups {
            warn!("Backups Wizard: unexpected backup status in {:?}", self.state);
            return;
        }

        let result = if code.is_ok() {
            Ok(())
        } else if message.is_empty() {
            Err(code.message().to_string())
        } else {
            Err(message)
        };

        if !self.queue.complete(name, result.clone()) {
            warn!("Backups Wizard: status for \"{}\" was not expected", name);
            return;
        }

        // Rows are matched by path; an unchecked row may share the name
        let index = self
            .queue
            .get(name)
            .and_then(|status| self.folders.position_by_path(&status.folder_path));
        if let Some(index) = index {
            if let Some(candidate) = self.folders.get_mut(index) {
                match result {
                    Ok(()) => {
                        info!("Backups Wizard: backup \"{}\" created", name);
                        candidate.checked = false;
                        candidate.last_error = None;
                    }
                    Err(error) => {
                        warn!("Backups Wizard: backup \"{}\" failed: {}", name, error);
                        self.error = true;
                        candidate.last_error = Some(error);
                    }
                }
            }
        }

        if !self.queue.is_finished() {
            self.process_next_backup_setup();
            return;
        }

        if self.queue.has_errors() {
            self.error = true;
            self.prompter.show_error(&self.queue.aggregated_error());
        }
        self.next_step(WizardState::Done);
    }
}
