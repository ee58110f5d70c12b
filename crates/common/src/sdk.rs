// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

//! Seam between the client and the storage SDK
//!
//! Requests are fire-and-forget: every [`SyncController`] call is answered
//! later by exactly one [`SdkResponse`](crate::SdkResponse) delivered on the
//! caller's event queue. [`SdkCache`] queries are synchronous and read the
//! SDK's locally cached account state.

use std::path::{Path, PathBuf};

use crate::types::{NodeHandle, RemoteNode, SyncType};

/// Asynchronous requests against the SDK
pub trait SyncController {
    /// Reply: `SdkResponse::DeviceName`
    fn get_device_name(&mut self);

    /// Reply: `SdkResponse::BackupsRootDirHandle`
    fn get_backups_root_dir_handle(&mut self);

    /// Create the backups root folder and register it as such.
    ///
    /// Reply: `SdkResponse::MyBackupsDirStatus`
    fn create_my_backups_dir(&mut self, name: &str);

    /// Reply: `SdkResponse::SyncAddStatus` carrying `name`
    fn add_sync(&mut self, local_path: &Path, parent: NodeHandle, name: &str, sync_type: SyncType);
}

/// Synchronous queries against cached SDK state
pub trait SdkCache {
    fn root_node(&self) -> Option<RemoteNode>;

    fn node_by_handle(&self, handle: NodeHandle) -> Option<RemoteNode>;

    fn child_node(&self, parent: NodeHandle, name: &str) -> Option<RemoteNode>;

    fn is_in_rubbish(&self, handle: NodeHandle) -> bool;

    /// Absolute remote path of a node, e.g. `/My Backups`
    fn node_path(&self, handle: NodeHandle) -> Option<String>;

    /// Local roots of configured syncs of the given type
    fn local_folders(&self, sync_type: SyncType) -> Vec<PathBuf>;

    fn is_remote_root_synced(&self) -> bool;
}
