// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

//! View models - Data structures prepared for UI display

use cloudsync_common::{SdkCache, SyncController};

use crate::events::WizardPrompter;
use crate::folders::BackupCandidate;
use crate::wizard::{BackupsWizard, WizardPage, WizardState};

/// Icon shown in front of a folder row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderIcon {
    Folder,
    Warning, // Last setup attempt failed
}

/// One row of the folder list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRowViewModel {
    /// Index in the full list, used for `UserAction::SetChecked`
    pub index: usize,
    pub display_name: String,
    pub tooltip: String,
    /// Checkbox state; `None` on the confirmation page, which has no checkboxes
    pub checked: Option<bool>,
    pub icon: FolderIcon,
}

impl FolderRowViewModel {
    pub fn from_candidate(index: usize, candidate: &BackupCandidate, with_checkbox: bool) -> Self {
        let mut tooltip = candidate.local_path.display().to_string();
        let icon = match candidate.last_error {
            Some(ref error) => {
                tooltip.push_str("\nError: ");
                tooltip.push_str(error);
                FolderIcon::Warning
            }
            None => FolderIcon::Folder,
        };

        Self {
            index,
            display_name: candidate.display_name.clone(),
            tooltip,
            checked: with_checkbox.then_some(candidate.checked),
            icon,
        }
    }
}

/// Everything a front end needs to draw the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardViewModel {
    pub page: WizardPage,
    pub state: WizardState,
    pub device_name: String,
    pub next_label: &'static str,
    pub next_enabled: bool,
    pub back_visible: bool,
    pub cancel_enabled: bool,
    pub all_folders_synced: bool,
    /// "1 folder", "3 folders"
    pub folder_count_text: String,
    /// Remote destination, known once the backups root reply arrived
    pub backup_to: Option<String>,
    pub rows: Vec<FolderRowViewModel>,
}

impl WizardViewModel {
    pub fn from_wizard<S, P>(wizard: &BackupsWizard<S, P>) -> Self
    where
        S: SyncController + SdkCache,
        P: WizardPrompter,
    {
        let page = wizard.page();
        let with_checkbox = page == WizardPage::SelectFolders;
        let folders = wizard.folders();

        let rows = folders
            .visible()
            .map(|(index, candidate)| {
                FolderRowViewModel::from_candidate(index, candidate, with_checkbox)
            })
            .collect();

        Self {
            page,
            state: wizard.state(),
            device_name: wizard.device_name().unwrap_or_default().to_string(),
            next_label: match page {
                WizardPage::SelectFolders => "Next",
                WizardPage::Confirm => "Setup",
            },
            next_enabled: wizard.next_enabled(),
            back_visible: wizard.back_visible(),
            cancel_enabled: wizard.cancel_enabled(),
            all_folders_synced: wizard.all_folders_synced(),
            folder_count_text: folder_count_text(folders.checked_count()),
            backup_to: wizard.backup_to(),
            rows,
        }
    }
}

pub fn folder_count_text(count: usize) -> String {
    if count == 1 {
        "1 folder".to_string()
    } else {
        format!("{} folders", count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{UserAction, WizardEvent};
    use crate::testing::{FakePrompter, FakeSdk};
    use cloudsync_common::{ClientConfig, SdkResponse};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_folder_count_text() {
        assert_eq!(folder_count_text(0), "0 folders");
        assert_eq!(folder_count_text(1), "1 folder");
        assert_eq!(folder_count_text(4), "4 folders");
    }

    #[test]
    fn test_row_with_error() {
        let mut candidate = BackupCandidate::new(PathBuf::from("/home/u/Pictures"));
        candidate.checked = true;
        candidate.last_error = Some("quota exceeded".to_string());

        let row = FolderRowViewModel::from_candidate(2, &candidate, true);
        assert_eq!(row.icon, FolderIcon::Warning);
        assert_eq!(row.tooltip, "/home/u/Pictures\nError: quota exceeded");
        assert_eq!(row.checked, Some(true));

        let row = FolderRowViewModel::from_candidate(2, &candidate, false);
        assert_eq!(row.checked, None);
    }

    #[test]
    fn test_pages() {
        let home = TempDir::new().unwrap();
        let root = fs::canonicalize(home.path()).unwrap();
        for name in ["Documents", "Pictures"] {
            fs::create_dir(root.join(name)).unwrap();
        }
        let mut wizard = BackupsWizard::with_candidate_locations(
            FakeSdk::new(),
            FakePrompter::default(),
            ClientConfig::default(),
            vec![root.join("Documents"), root.join("Pictures")],
        );
        wizard.handle(WizardEvent::Sdk(SdkResponse::DeviceName("laptop".to_string())));
        wizard.handle(WizardEvent::User(UserAction::SetChecked {
            index: 1,
            checked: true,
        }));

        let view = WizardViewModel::from_wizard(&wizard);
        assert_eq!(view.page, WizardPage::SelectFolders);
        assert_eq!(view.next_label, "Next");
        assert!(view.next_enabled);
        assert!(!view.back_visible);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.folder_count_text, "1 folder");
        assert_eq!(view.device_name, "laptop");

        wizard.handle(WizardEvent::User(UserAction::Next));
        let backups = wizard.sdk().backups_root;
        wizard.handle(WizardEvent::Sdk(SdkResponse::BackupsRootDirHandle(backups)));

        let view = WizardViewModel::from_wizard(&wizard);
        assert_eq!(view.page, WizardPage::Confirm);
        assert_eq!(view.next_label, "Setup");
        assert!(view.back_visible);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].index, 1);
        assert_eq!(view.rows[0].display_name, "Pictures");
        assert_eq!(view.rows[0].checked, None);
        assert_eq!(view.backup_to.as_deref(), Some("Cloud Drive/My Backups/laptop"));
    }
}
