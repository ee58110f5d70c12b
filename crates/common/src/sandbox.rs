// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

//! Sandbox account
//!
//! A local, TOML-persisted stand-in for the storage SDK. It keeps a small
//! remote tree, the backups-root attribute, the device name and the list of
//! configured syncs, and answers [`SyncController`] requests by posting
//! [`SdkResponse`]s to an unbounded channel, the same way SDK callbacks are
//! queued back to the client thread.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::validate_folder_name;
use crate::sdk::{SdkCache, SyncController};
use crate::sync_registry::SyncRegistry;
use crate::types::{ApiErrorCode, NodeHandle, RemoteNode, SdkResponse, SyncEntry, SyncType};

const ROOT_NAME: &str = "Cloud Drive";
const RUBBISH_NAME: &str = "Rubbish Bin";

/// Persisted state of a simulated account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SandboxAccount {
    pub device_name: String,
    #[serde(default)]
    pub backups_root: NodeHandle,
    /// Storage limit in bytes, 0 = unlimited
    #[serde(default)]
    pub quota_bytes: u64,
    root: NodeHandle,
    rubbish: NodeHandle,
    next_handle: u64,
    #[serde(default)]
    nodes: Vec<RemoteNode>,
    #[serde(default)]
    pub syncs: SyncRegistry,
}

impl SandboxAccount {
    /// Create an empty account with a root and a rubbish bin
    pub fn new(device_name: impl Into<String>) -> Self {
        let root = NodeHandle(1);
        let rubbish = NodeHandle(2);
        Self {
            device_name: device_name.into(),
            backups_root: NodeHandle::INVALID,
            quota_bytes: 0,
            root,
            rubbish,
            next_handle: 3,
            nodes: vec![
                RemoteNode {
                    handle: root,
                    name: ROOT_NAME.to_string(),
                    parent: NodeHandle::INVALID,
                    is_folder: true,
                    size: 0,
                },
                RemoteNode {
                    handle: rubbish,
                    name: RUBBISH_NAME.to_string(),
                    parent: NodeHandle::INVALID,
                    is_folder: true,
                    size: 0,
                },
            ],
            syncs: SyncRegistry::new(),
        }
    }

    /// Load account state from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        let account: Self =
            toml::from_str(&contents).context(format!("Failed to parse {}", path.display()))?;
        Ok(account)
    }

    /// Load account state, creating a fresh account if the file is missing
    pub fn load_or_create(path: &Path, device_name: &str) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("Sandbox state {} not found, starting fresh", path.display());
            Ok(Self::new(device_name))
        }
    }

    /// Save account state to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create sandbox state directory")?;
        }

        let toml_content =
            toml::to_string_pretty(self).context("Failed to serialize sandbox state")?;
        fs::write(path, toml_content)
            .context(format!("Failed to write sandbox state to {}", path.display()))?;

        debug!("Saved sandbox state to {}", path.display());
        Ok(())
    }

    pub fn root(&self) -> NodeHandle {
        self.root
    }

    pub fn rubbish(&self) -> NodeHandle {
        self.rubbish
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&RemoteNode> {
        self.nodes.iter().find(|n| n.handle == handle)
    }

    pub fn children(&self, parent: NodeHandle) -> impl Iterator<Item = &RemoteNode> {
        self.nodes.iter().filter(move |n| n.parent == parent)
    }

    pub fn child(&self, parent: NodeHandle, name: &str) -> Option<&RemoteNode> {
        self.children(parent).find(|n| n.name == name)
    }

    /// Create a folder under `parent`; fails if a sibling has the same name
    pub fn create_folder(&mut self, parent: NodeHandle, name: &str) -> Result<NodeHandle> {
        if self.node(parent).is_none() {
            anyhow::bail!("Parent node {} does not exist", parent);
        }
        if self.child(parent, name).is_some() {
            anyhow::bail!("A folder named '{}' already exists", name);
        }

        let handle = NodeHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes.push(RemoteNode {
            handle,
            name: name.to_string(),
            parent,
            is_folder: true,
            size: 0,
        });
        Ok(handle)
    }

    /// Move a node into the rubbish bin
    pub fn move_to_rubbish(&mut self, handle: NodeHandle) -> Result<()> {
        if handle == self.root || handle == self.rubbish {
            anyhow::bail!("Cannot move a root node to the rubbish bin");
        }
        let rubbish = self.rubbish;
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.handle == handle)
            .ok_or_else(|| anyhow::anyhow!("Node {} does not exist", handle))?;
        node.parent = rubbish;
        Ok(())
    }

    /// Top-most ancestor of a node (root, rubbish or an orphan)
    fn top_ancestor(&self, handle: NodeHandle) -> Option<NodeHandle> {
        let mut current = self.node(handle)?;
        while current.parent.is_valid() {
            current = self.node(current.parent)?;
        }
        Some(current.handle)
    }

    pub fn is_in_rubbish(&self, handle: NodeHandle) -> bool {
        handle != self.rubbish && self.top_ancestor(handle) == Some(self.rubbish)
    }

    /// Absolute path of a node: `/a/b` under the root, `//bin/a/b` in the rubbish bin
    pub fn node_path(&self, handle: NodeHandle) -> Option<String> {
        let mut names = Vec::new();
        let mut current = self.node(handle)?;
        while current.parent.is_valid() {
            names.push(current.name.clone());
            current = self.node(current.parent)?;
        }
        names.reverse();

        let prefix = if current.handle == self.root {
            "/"
        } else if current.handle == self.rubbish {
            "//bin/"
        } else {
            return None;
        };
        Some(format!("{}{}", prefix, names.join("/")))
    }

    /// Total stored bytes
    pub fn used_bytes(&self) -> u64 {
        self.nodes.iter().map(|n| n.size).sum()
    }

    fn set_size(&mut self, handle: NodeHandle, size: u64) {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.handle == handle) {
            node.size = size;
        }
    }

    /// Create the backups root under the account root
    fn create_backups_root(&mut self, name: &str) -> (ApiErrorCode, String) {
        if let Err(e) = validate_folder_name(name) {
            return (ApiErrorCode::Args, e.to_string());
        }
        if self.child(self.root, name).is_some() {
            return (
                ApiErrorCode::Exists,
                format!("A folder named \"{}\" already exists", name),
            );
        }
        match self.create_folder(self.root, name) {
            Ok(handle) => {
                self.backups_root = handle;
                info!("Sandbox: backups root \"{}\" created ({})", name, handle);
                (ApiErrorCode::Ok, String::new())
            }
            Err(e) => (ApiErrorCode::Internal, e.to_string()),
        }
    }

    /// Register a sync, creating the remote folder it maps to
    fn add_sync(
        &mut self,
        local_path: &Path,
        parent: NodeHandle,
        name: &str,
        sync_type: SyncType,
    ) -> (ApiErrorCode, String) {
        if !local_path.is_dir() {
            return (
                ApiErrorCode::NotFound,
                format!("Local folder \"{}\" does not exist", local_path.display()),
            );
        }
        if self.syncs.find_by_path(local_path).is_some() {
            return (
                ApiErrorCode::Exists,
                "The local folder is already synced".to_string(),
            );
        }

        let parent = match sync_type {
            SyncType::Backup => match self.device_folder() {
                Ok(handle) => handle,
                Err(code) => return (code, "The backups root folder is not set".to_string()),
            },
            SyncType::TwoWay if parent.is_valid() => parent,
            SyncType::TwoWay => self.root,
        };

        if self.child(parent, name).is_some() {
            return (
                ApiErrorCode::Exists,
                format!("A folder named \"{}\" already exists", name),
            );
        }

        let size = dir_size(local_path);
        if self.quota_bytes > 0 && self.used_bytes().saturating_add(size) > self.quota_bytes {
            return (ApiErrorCode::OverQuota, ApiErrorCode::OverQuota.message().to_string());
        }

        let handle = match self.create_folder(parent, name) {
            Ok(handle) => handle,
            Err(e) => return (ApiErrorCode::Internal, e.to_string()),
        };
        self.set_size(handle, size);

        let entry = SyncEntry::new(name.to_string(), local_path.to_path_buf(), sync_type, handle);
        if let Err(e) = self.syncs.add(entry) {
            return (ApiErrorCode::Internal, e.to_string());
        }

        info!(
            "Sandbox: {} sync \"{}\" -> {}",
            sync_type,
            local_path.display(),
            self.node_path(handle).unwrap_or_default()
        );
        (ApiErrorCode::Ok, String::new())
    }

    /// Per-device folder under the backups root, created on first use
    fn device_folder(&mut self) -> std::result::Result<NodeHandle, ApiErrorCode> {
        if !self.backups_root.is_valid()
            || self.node(self.backups_root).is_none()
            || self.is_in_rubbish(self.backups_root)
        {
            return Err(ApiErrorCode::NotFound);
        }

        let device_name = self.device_name.clone();
        if let Some(node) = self.child(self.backups_root, &device_name) {
            return Ok(node.handle);
        }
        self.create_folder(self.backups_root, &device_name)
            .map_err(|_| ApiErrorCode::Internal)
    }
}

/// Recursive size of a local directory; unreadable entries count as empty
fn dir_size(path: &Path) -> u64 {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| match entry.metadata() {
            Ok(meta) if meta.is_dir() => dir_size(&entry.path()),
            Ok(meta) => meta.len(),
            Err(_) => 0,
        })
        .sum()
}

/// SDK implementation backed by a [`SandboxAccount`]
///
/// Replies are sent as `E` so they can be posted straight onto a client event
/// queue whose event type wraps [`SdkResponse`].
pub struct SandboxSdk<E> {
    account: SandboxAccount,
    responder: mpsc::UnboundedSender<E>,
    state_path: Option<PathBuf>,
    device_name_override: Option<String>,
}

impl<E: From<SdkResponse>> SandboxSdk<E> {
    pub fn new(account: SandboxAccount, responder: mpsc::UnboundedSender<E>) -> Self {
        Self {
            account,
            responder,
            state_path: None,
            device_name_override: None,
        }
    }

    /// Persist the account to `path` after every change
    pub fn with_state_path(mut self, path: PathBuf) -> Self {
        self.state_path = Some(path);
        self
    }

    /// Report this name instead of the account's device name
    pub fn with_device_name(mut self, name: Option<String>) -> Self {
        if let Some(ref name) = name {
            self.account.device_name = name.clone();
        }
        self.device_name_override = name;
        self
    }

    pub fn account(&self) -> &SandboxAccount {
        &self.account
    }

    pub fn account_mut(&mut self) -> &mut SandboxAccount {
        &mut self.account
    }

    /// Write the account to its state file, if one is configured
    pub fn persist(&self) -> Result<()> {
        match self.state_path {
            Some(ref path) => self.account.save(path),
            None => Ok(()),
        }
    }

    fn respond(&self, response: SdkResponse) {
        debug!("Sandbox reply: {:?}", response);
        if self.responder.send(E::from(response)).is_err() {
            warn!("Sandbox reply dropped: event queue closed");
        }
    }

    /// Persist after a successful change; a failed write becomes the reply
    fn persist_outcome(&self, outcome: (ApiErrorCode, String)) -> (ApiErrorCode, String) {
        if !outcome.0.is_ok() {
            return outcome;
        }
        match self.persist() {
            Ok(()) => outcome,
            Err(e) => (ApiErrorCode::Internal, format!("{:#}", e)),
        }
    }
}

impl<E: From<SdkResponse>> SyncController for SandboxSdk<E> {
    fn get_device_name(&mut self) {
        let name = self
            .device_name_override
            .clone()
            .unwrap_or_else(|| self.account.device_name.clone());
        self.respond(SdkResponse::DeviceName(name));
    }

    fn get_backups_root_dir_handle(&mut self) {
        self.respond(SdkResponse::BackupsRootDirHandle(self.account.backups_root));
    }

    fn create_my_backups_dir(&mut self, name: &str) {
        let outcome = self.account.create_backups_root(name);
        let (code, message) = self.persist_outcome(outcome);
        self.respond(SdkResponse::MyBackupsDirStatus { code, message });
    }

    fn add_sync(&mut self, local_path: &Path, parent: NodeHandle, name: &str, sync_type: SyncType) {
        let outcome = self.account.add_sync(local_path, parent, name, sync_type);
        let (code, message) = self.persist_outcome(outcome);
        self.respond(SdkResponse::SyncAddStatus {
            code,
            message,
            name: name.to_string(),
        });
    }
}

impl<E> SdkCache for SandboxSdk<E> {
    fn root_node(&self) -> Option<RemoteNode> {
        self.account.node(self.account.root).cloned()
    }

    fn node_by_handle(&self, handle: NodeHandle) -> Option<RemoteNode> {
        self.account.node(handle).cloned()
    }

    fn child_node(&self, parent: NodeHandle, name: &str) -> Option<RemoteNode> {
        self.account.child(parent, name).cloned()
    }

    fn is_in_rubbish(&self, handle: NodeHandle) -> bool {
        self.account.is_in_rubbish(handle)
    }

    fn node_path(&self, handle: NodeHandle) -> Option<String> {
        self.account.node_path(handle)
    }

    fn local_folders(&self, sync_type: SyncType) -> Vec<PathBuf> {
        self.account.syncs.local_folders(sync_type)
    }

    fn is_remote_root_synced(&self) -> bool {
        self.account.syncs.is_remote_root_synced(self.account.root)
    }
}
