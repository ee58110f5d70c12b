// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

//! Scripted SDK and prompter for wizard tests
//!
//! `FakeSdk` only records requests; tests reply by handing `SdkResponse`s to
//! the wizard themselves, which keeps ordering under test control.

use std::path::{Path, PathBuf};

use cloudsync_common::{NodeHandle, RemoteNode, SdkCache, SyncController, SyncType};

use crate::events::WizardPrompter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    DeviceName,
    BackupsRootDirHandle,
    CreateMyBackupsDir(String),
    AddSync {
        path: PathBuf,
        parent: NodeHandle,
        name: String,
        sync_type: SyncType,
    },
}

pub struct FakeSdk {
    pub requests: Vec<Request>,
    pub nodes: Vec<RemoteNode>,
    pub rubbish: Vec<NodeHandle>,
    pub two_way: Vec<PathBuf>,
    pub backups: Vec<PathBuf>,
    pub remote_root_synced: bool,
    /// Existing "/My Backups" folder
    pub backups_root: NodeHandle,
    next_handle: u64,
}

impl FakeSdk {
    pub fn new() -> Self {
        let mut sdk = Self {
            requests: Vec::new(),
            nodes: vec![RemoteNode {
                handle: NodeHandle(1),
                name: "Cloud Drive".to_string(),
                parent: NodeHandle::INVALID,
                is_folder: true,
                size: 0,
            }],
            rubbish: Vec::new(),
            two_way: Vec::new(),
            backups: Vec::new(),
            remote_root_synced: false,
            backups_root: NodeHandle::INVALID,
            next_handle: 2,
        };
        sdk.backups_root = sdk.add_node(NodeHandle(1), "My Backups");
        sdk
    }

    pub fn add_node(&mut self, parent: NodeHandle, name: &str) -> NodeHandle {
        let handle = NodeHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes.push(RemoteNode {
            handle,
            name: name.to_string(),
            parent,
            is_folder: true,
            size: 0,
        });
        handle
    }

    /// Names of the backups requested so far, in request order
    pub fn add_sync_names(&self) -> Vec<&str> {
        self.requests
            .iter()
            .filter_map(|request| match request {
                Request::AddSync { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl SyncController for FakeSdk {
    fn get_device_name(&mut self) {
        self.requests.push(Request::DeviceName);
    }

    fn get_backups_root_dir_handle(&mut self) {
        self.requests.push(Request::BackupsRootDirHandle);
    }

    fn create_my_backups_dir(&mut self, name: &str) {
        self.requests
            .push(Request::CreateMyBackupsDir(name.to_string()));
    }

    fn add_sync(&mut self, local_path: &Path, parent: NodeHandle, name: &str, sync_type: SyncType) {
        self.requests.push(Request::AddSync {
            path: local_path.to_path_buf(),
            parent,
            name: name.to_string(),
            sync_type,
        });
    }
}

impl SdkCache for FakeSdk {
    fn root_node(&self) -> Option<RemoteNode> {
        self.nodes.first().cloned()
    }

    fn node_by_handle(&self, handle: NodeHandle) -> Option<RemoteNode> {
        self.nodes.iter().find(|n| n.handle == handle).cloned()
    }

    fn child_node(&self, parent: NodeHandle, name: &str) -> Option<RemoteNode> {
        self.nodes
            .iter()
            .find(|n| n.parent == parent && n.name == name)
            .cloned()
    }

    fn is_in_rubbish(&self, handle: NodeHandle) -> bool {
        self.rubbish.contains(&handle)
    }

    fn node_path(&self, handle: NodeHandle) -> Option<String> {
        let mut parts = Vec::new();
        let mut node = self.node_by_handle(handle)?;
        while node.parent.is_valid() {
            parts.push(node.name.clone());
            node = self.node_by_handle(node.parent)?;
        }
        parts.reverse();
        Some(format!("/{}", parts.join("/")))
    }

    fn local_folders(&self, sync_type: SyncType) -> Vec<PathBuf> {
        match sync_type {
            SyncType::TwoWay => self.two_way.clone(),
            SyncType::Backup => self.backups.clone(),
        }
    }

    fn is_remote_root_synced(&self) -> bool {
        self.remote_root_synced
    }
}

/// Answers queued in advance; records what was asked
#[derive(Debug, Default)]
pub struct FakePrompter {
    /// Answers to rename prompts, consumed front to back. Empty means cancel.
    pub new_names: Vec<Option<String>>,
    pub rename_requests: Vec<String>,
    pub discard: bool,
    pub discard_requests: usize,
    pub recreate_backups_dir: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub successes: usize,
}

impl WizardPrompter for FakePrompter {
    fn ask_new_folder_name(&mut self, current: &str) -> Option<String> {
        self.rename_requests.push(current.to_string());
        if self.new_names.is_empty() {
            None
        } else {
            self.new_names.remove(0)
        }
    }

    fn confirm_discard_changes(&mut self) -> bool {
        self.discard_requests += 1;
        self.discard
    }

    fn confirm_recreate_backups_dir(&mut self) -> bool {
        self.recreate_backups_dir
    }

    fn show_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn show_setup_success(&mut self) -> bool {
        self.successes += 1;
        true
    }
}
