// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

//! Backup candidate list
//!
//! An ordered list of folder records with a checkbox each. The confirmation
//! step shows a filtered view that only contains checked rows.

use std::path::{Path, PathBuf};

/// A local folder the user may back up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupCandidate {
    pub local_path: PathBuf,
    /// Name of the remote folder the backup will get
    pub display_name: String,
    pub checked: bool,
    /// Error from the last setup attempt
    pub last_error: Option<String>,
}

impl BackupCandidate {
    /// Unchecked candidate named after the last path component
    pub fn new(local_path: PathBuf) -> Self {
        let display_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| local_path.display().to_string());

        Self {
            local_path,
            display_name,
            checked: false,
            last_error: None,
        }
    }
}

/// Ordered candidate list with a derived "checked only" view
#[derive(Debug, Clone, Default)]
pub struct FolderList {
    items: Vec<BackupCandidate>,
    show_only_checked: bool,
}

impl FolderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[BackupCandidate] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&BackupCandidate> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut BackupCandidate> {
        self.items.get_mut(index)
    }

    /// Append a candidate, returning its index
    pub fn push(&mut self, candidate: BackupCandidate) -> usize {
        self.items.push(candidate);
        self.items.len() - 1
    }

    /// Insert a candidate at the top of the list (index 0)
    pub fn insert_front(&mut self, candidate: BackupCandidate) -> usize {
        self.items.insert(0, candidate);
        0
    }

    pub fn position_by_path(&self, path: &Path) -> Option<usize> {
        self.items.iter().position(|c| c.local_path == path)
    }

    pub fn position_by_name(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|c| c.display_name == name)
    }

    pub fn is_something_checked(&self) -> bool {
        self.items.iter().any(|c| c.checked)
    }

    pub fn checked(&self) -> impl Iterator<Item = &BackupCandidate> {
        self.items.iter().filter(|c| c.checked)
    }

    pub fn checked_count(&self) -> usize {
        self.checked().count()
    }

    pub fn show_only_checked(&self) -> bool {
        self.show_only_checked
    }

    pub fn set_show_only_checked(&mut self, value: bool) {
        self.show_only_checked = value;
    }

    /// Rows currently visible, with their index in the full list
    pub fn visible(&self) -> impl Iterator<Item = (usize, &BackupCandidate)> {
        let only_checked = self.show_only_checked;
        self.items
            .iter()
            .enumerate()
            .filter(move |(_, c)| !only_checked || c.checked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> FolderList {
        let mut list = FolderList::new();
        list.push(BackupCandidate::new(PathBuf::from("/home/u/Documents")));
        list.push(BackupCandidate::new(PathBuf::from("/home/u/Pictures")));
        list.push(BackupCandidate::new(PathBuf::from("/home/u/Videos")));
        list
    }

    #[test]
    fn test_display_name_from_path() {
        let candidate = BackupCandidate::new(PathBuf::from("/home/u/Documents"));
        assert_eq!(candidate.display_name, "Documents");
        assert!(!candidate.checked);

        let root = BackupCandidate::new(PathBuf::from("/"));
        assert_eq!(root.display_name, "/");
    }

    #[test]
    fn test_filtered_view() {
        let mut list = list();
        list.get_mut(1).unwrap().checked = true;

        assert_eq!(list.visible().count(), 3);

        list.set_show_only_checked(true);
        let visible: Vec<_> = list.visible().map(|(i, c)| (i, c.display_name.as_str())).collect();
        assert_eq!(visible, vec![(1, "Pictures")]);
        assert_eq!(list.checked_count(), 1);
    }

    #[test]
    fn test_insert_front_and_lookup() {
        let mut list = list();
        assert!(!list.is_something_checked());

        let index = list.insert_front(BackupCandidate::new(PathBuf::from("/data/Music")));
        assert_eq!(index, 0);
        assert_eq!(list.position_by_path(Path::new("/data/Music")), Some(0));
        assert_eq!(list.position_by_name("Videos"), Some(3));
        assert_eq!(list.position_by_name("Nope"), None);
    }
}
