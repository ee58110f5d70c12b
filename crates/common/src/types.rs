// Common types for the cloudsync desktop client

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a remote node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(pub u64);

impl NodeHandle {
    /// Handle value meaning "no node"
    pub const INVALID: NodeHandle = NodeHandle(0);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl Default for NodeHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{:012x}", self.0)
        } else {
            f.write_str("<invalid>")
        }
    }
}

/// Kind of folder synchronization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    /// Bidirectional synchronization
    TwoWay,
    /// One-directional upload of a local folder
    Backup,
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncType::TwoWay => f.write_str("two-way"),
            SyncType::Backup => f.write_str("backup"),
        }
    }
}

/// Result code reported by the storage SDK
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    Ok,
    /// Target already exists
    Exists,
    /// Resource not found
    NotFound,
    /// Access denied
    Access,
    /// Storage quota exceeded
    OverQuota,
    /// Bad arguments
    Args,
    Internal,
}

impl ApiErrorCode {
    pub fn is_ok(&self) -> bool {
        matches!(self, ApiErrorCode::Ok)
    }

    /// Default human-readable text for the code
    pub fn message(&self) -> &'static str {
        match self {
            ApiErrorCode::Ok => "No error",
            ApiErrorCode::Exists => "Already exists",
            ApiErrorCode::NotFound => "Not found",
            ApiErrorCode::Access => "Access denied",
            ApiErrorCode::OverQuota => "Storage quota exceeded",
            ApiErrorCode::Args => "Invalid argument",
            ApiErrorCode::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A remote node as seen in the SDK cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteNode {
    pub handle: NodeHandle,
    pub name: String,
    #[serde(default)]
    pub parent: NodeHandle,
    #[serde(default = "default_is_folder")]
    pub is_folder: bool,
    /// Bytes stored under this node
    #[serde(default)]
    pub size: u64,
}

fn default_is_folder() -> bool {
    true
}

/// A configured sync or backup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncEntry {
    pub id: Uuid,
    pub name: String,
    pub local_path: PathBuf,
    pub sync_type: SyncType,
    #[serde(default)]
    pub remote_handle: NodeHandle,
    pub created_at: DateTime<Utc>,
}

impl SyncEntry {
    pub fn new(
        name: String,
        local_path: PathBuf,
        sync_type: SyncType,
        remote_handle: NodeHandle,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            local_path,
            sync_type,
            remote_handle,
            created_at: Utc::now(),
        }
    }
}

/// Asynchronous reply from the SDK to a request issued through
/// [`crate::sdk::SyncController`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkResponse {
    /// Reply to `get_device_name`
    DeviceName(String),
    /// Reply to `get_backups_root_dir_handle`; INVALID when not set
    BackupsRootDirHandle(NodeHandle),
    /// Reply to `create_my_backups_dir`
    MyBackupsDirStatus { code: ApiErrorCode, message: String },
    /// Reply to `add_sync`
    SyncAddStatus {
        code: ApiErrorCode,
        message: String,
        name: String,
    },
}
