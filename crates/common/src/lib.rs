// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

// Cloudsync - Common Library
// Shared types, configuration structures and the storage SDK seam

pub mod config;
pub mod error;
pub mod sandbox;
pub mod sdk;
pub mod sync_registry;
pub mod types;

pub use config::{
    app_config_dir, validate_folder_name, ClientConfig, StandardFolder, APP_DIR_NAME,
    DEFAULT_BACKUPS_DIR_NAME,
};
pub use error::{Error, Result};
pub use sandbox::{SandboxAccount, SandboxSdk};
pub use sdk::{SdkCache, SyncController};
pub use sync_registry::SyncRegistry;
pub use types::{ApiErrorCode, NodeHandle, RemoteNode, SdkResponse, SyncEntry, SyncType};

// Re-export commonly used external types
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;
