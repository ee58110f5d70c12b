// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

//! Event handling traits and types

use std::path::PathBuf;

use cloudsync_common::{SdkCache, SdkResponse, SyncController};
use tokio::sync::mpsc;
use tracing::debug;

use crate::wizard::{BackupsWizard, WizardOutcome};

/// Something the user did in the wizard window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// "Next" on the first page, "Setup" on the second
    Next,
    Back,
    Cancel,
    /// Pick an extra folder to back up
    AddFolder(PathBuf),
    /// Toggle the checkbox of a row (index into the full list)
    SetChecked { index: usize, checked: bool },
}

/// Input of the wizard state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    User(UserAction),
    Sdk(SdkResponse),
}

impl From<SdkResponse> for WizardEvent {
    fn from(response: SdkResponse) -> Self {
        WizardEvent::Sdk(response)
    }
}

impl From<UserAction> for WizardEvent {
    fn from(action: UserAction) -> Self {
        WizardEvent::User(action)
    }
}

/// Modal interactions the wizard needs from the front end
///
/// GUI implementations show dialogs; the CLI asks on the terminal. Every
/// method blocks until the user answers.
pub trait WizardPrompter {
    /// A remote folder named `current` already exists. Returns the new name,
    /// or `None` if the user gave up.
    fn ask_new_folder_name(&mut self, current: &str) -> Option<String>;

    /// The user asked to cancel with a selection made. Returns `true` to discard.
    fn confirm_discard_changes(&mut self) -> bool;

    /// The backups root is in the rubbish bin. Returns `true` to create a new one.
    fn confirm_recreate_backups_dir(&mut self) -> bool;

    fn show_warning(&mut self, message: &str);

    fn show_error(&mut self, message: &str);

    /// All backups were created. Returns `true` if the user wants to see them.
    fn show_setup_success(&mut self) -> bool;
}

/// Single-consumer queue feeding one wizard on one thread
pub struct EventQueue {
    tx: mpsc::UnboundedSender<WizardEvent>,
    rx: mpsc::UnboundedReceiver<WizardEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Sender handed to the SDK and the front end
    pub fn sender(&self) -> mpsc::UnboundedSender<WizardEvent> {
        self.tx.clone()
    }

    pub fn post(&self, event: impl Into<WizardEvent>) {
        // The queue owns a receiver, so sending cannot fail
        let _ = self.tx.send(event.into());
    }

    /// Dispatch everything queued, including events posted while
    /// dispatching. Returns the number of events handled.
    pub fn dispatch_pending<S, P>(&mut self, wizard: &mut BackupsWizard<S, P>) -> usize
    where
        S: SyncController + SdkCache,
        P: WizardPrompter,
    {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            wizard.handle(event);
            handled += 1;
        }
        if handled > 0 {
            debug!("Dispatched {} wizard event(s)", handled);
        }
        handled
    }

    /// Run the wizard until it exits
    pub async fn run<S, P>(&mut self, wizard: &mut BackupsWizard<S, P>) -> WizardOutcome
    where
        S: SyncController + SdkCache,
        P: WizardPrompter,
    {
        loop {
            if let Some(outcome) = wizard.outcome() {
                return outcome;
            }
            match self.rx.recv().await {
                Some(event) => wizard.handle(event),
                None => return WizardOutcome::Cancelled,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePrompter;
    use crate::wizard::WizardState;
    use cloudsync_common::{ClientConfig, SandboxAccount, SandboxSdk, SyncType};
    use std::fs;
    use tempfile::TempDir;

    type Wizard = BackupsWizard<SandboxSdk<WizardEvent>, FakePrompter>;

    fn sandbox_wizard(queue: &EventQueue, root: &std::path::Path, quota: u64) -> Wizard {
        let mut account = SandboxAccount::new("laptop");
        account.quota_bytes = quota;
        let sdk = SandboxSdk::new(account, queue.sender());
        BackupsWizard::with_candidate_locations(
            sdk,
            FakePrompter::default(),
            ClientConfig::default(),
            vec![root.join("Documents"), root.join("Pictures")],
        )
    }

    fn fixture() -> (TempDir, std::path::PathBuf) {
        let home = TempDir::new().unwrap();
        let root = fs::canonicalize(home.path()).unwrap();
        fs::create_dir(root.join("Documents")).unwrap();
        fs::create_dir(root.join("Pictures")).unwrap();
        fs::write(root.join("Documents").join("a.txt"), vec![0u8; 10]).unwrap();
        fs::write(root.join("Pictures").join("b.jpg"), vec![0u8; 100]).unwrap();
        (home, root)
    }

    #[test]
    fn test_full_setup_against_sandbox() {
        let (_home, root) = fixture();
        let mut queue = EventQueue::new();
        let mut wizard = sandbox_wizard(&queue, &root, 0);

        assert_eq!(queue.dispatch_pending(&mut wizard), 2);
        assert_eq!(wizard.device_name(), Some("laptop"));

        queue.post(UserAction::SetChecked { index: 0, checked: true });
        queue.post(UserAction::SetChecked { index: 1, checked: true });
        queue.post(UserAction::Next);
        queue.dispatch_pending(&mut wizard);
        assert_eq!(wizard.state(), WizardState::Step2Init);
        assert_eq!(
            wizard.backup_to().as_deref(),
            Some("Cloud Drive/My Backups/laptop")
        );

        queue.post(UserAction::Next);
        queue.dispatch_pending(&mut wizard);

        assert_eq!(wizard.outcome(), Some(WizardOutcome::Accepted));
        let account = wizard.sdk().account();
        assert_eq!(account.syncs.count(SyncType::Backup), 2);
        let device = account.child(account.backups_root, "laptop").unwrap();
        assert!(account.child(device.handle, "Documents").is_some());
        assert!(account.child(device.handle, "Pictures").is_some());
    }

    #[test]
    fn test_quota_failure_against_sandbox() {
        let (_home, root) = fixture();
        let mut queue = EventQueue::new();
        // Room for Documents only
        let mut wizard = sandbox_wizard(&queue, &root, 50);

        queue.post(UserAction::SetChecked { index: 0, checked: true });
        queue.post(UserAction::SetChecked { index: 1, checked: true });
        queue.post(UserAction::Next);
        queue.dispatch_pending(&mut wizard);
        queue.post(UserAction::Next);
        queue.dispatch_pending(&mut wizard);

        assert_eq!(wizard.state(), WizardState::Step1Init);
        assert_eq!(wizard.prompter().errors, vec!["Pictures-".to_string()]);

        let pictures = &wizard.folders().items()[1];
        assert!(pictures.checked);
        assert_eq!(pictures.last_error.as_deref(), Some("Storage quota exceeded"));
        assert!(!wizard.folders().items()[0].checked);
    }

    #[tokio::test]
    async fn test_run_until_cancelled() {
        let (_home, root) = fixture();
        let mut queue = EventQueue::new();
        let mut wizard = sandbox_wizard(&queue, &root, 0);

        queue.post(UserAction::Cancel);
        assert_eq!(queue.run(&mut wizard).await, WizardOutcome::Cancelled);
    }
}
