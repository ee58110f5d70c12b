// Configuration structures for the cloudsync desktop client

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Directory name used under the platform config directory
pub const APP_DIR_NAME: &str = "cloudsync";

/// Default name of the remote folder holding per-device backups
pub const DEFAULT_BACKUPS_DIR_NAME: &str = "My Backups";

/// Well-known user folders offered as backup candidates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StandardFolder {
    Documents,
    Music,
    Videos,
    Pictures,
    Downloads,
    Desktop,
}

impl StandardFolder {
    /// Resolve the folder location on this platform
    pub fn location(&self) -> Option<PathBuf> {
        match self {
            StandardFolder::Documents => dirs::document_dir(),
            StandardFolder::Music => dirs::audio_dir(),
            StandardFolder::Videos => dirs::video_dir(),
            StandardFolder::Pictures => dirs::picture_dir(),
            StandardFolder::Downloads => dirs::download_dir(),
            StandardFolder::Desktop => dirs::desktop_dir(),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Device name override; the SDK-reported name is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,

    /// Name given to the backups root when it has to be created
    #[serde(default = "default_backups_dir_name")]
    pub backups_dir_name: String,

    /// Folders pre-listed in the first wizard step
    #[serde(default = "default_standard_folders")]
    pub standard_folders: Vec<StandardFolder>,

    /// Page opened when the user asks to see their backups
    #[serde(default = "default_backup_center_url")]
    pub backup_center_url: String,

    /// Location of the sandbox account state file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox_state_path: Option<PathBuf>,

    /// Simulated account storage (bytes, 0 = unlimited)
    #[serde(default = "default_sandbox_quota")]
    pub sandbox_quota_bytes: u64,
}

fn default_backups_dir_name() -> String {
    DEFAULT_BACKUPS_DIR_NAME.to_string()
}

fn default_standard_folders() -> Vec<StandardFolder> {
    vec![
        StandardFolder::Documents,
        StandardFolder::Videos,
        StandardFolder::Pictures,
    ]
}

fn default_backup_center_url() -> String {
    "cloudsync://backups".to_string()
}

fn default_sandbox_quota() -> u64 {
    20 * 1024 * 1024 * 1024 // 20 GiB
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            backups_dir_name: default_backups_dir_name(),
            standard_folders: default_standard_folders(),
            backup_center_url: default_backup_center_url(),
            sandbox_state_path: None,
            sandbox_quota_bytes: default_sandbox_quota(),
        }
    }
}

impl ClientConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_folder_name(&self.backups_dir_name)?;

        if let Some(ref name) = self.device_name {
            validate_folder_name(name)?;
        }

        if self.backup_center_url.trim().is_empty() {
            return Err(Error::Config("Backup center URL cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Resolve the sandbox state file location
    pub fn sandbox_state_path(&self) -> Result<PathBuf> {
        match self.sandbox_state_path {
            Some(ref path) => Ok(path.clone()),
            None => Ok(app_config_dir()?.join("sandbox.toml")),
        }
    }
}

/// Check that a remote folder name is usable
pub fn validate_folder_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Config("Folder name cannot be empty".to_string()));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(Error::Config(format!(
            "Folder name '{}' cannot contain path separators",
            name
        )));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(Error::Config(format!("'{}' is not a valid folder name", name)));
    }
    Ok(())
}

/// Get the application config directory
pub fn app_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
    Ok(config_dir.join(APP_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.backups_dir_name, "My Backups");
        assert_eq!(
            config.standard_folders,
            vec![
                StandardFolder::Documents,
                StandardFolder::Videos,
                StandardFolder::Pictures
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str("device_name = \"laptop\"").unwrap();
        assert_eq!(config.device_name.as_deref(), Some("laptop"));
        assert_eq!(config.backups_dir_name, DEFAULT_BACKUPS_DIR_NAME);
        assert_eq!(config.standard_folders.len(), 3);
    }

    #[test]
    fn test_invalid_backups_dir_name() {
        let mut config = ClientConfig::default();
        config.backups_dir_name = "  ".to_string();
        assert!(config.validate().is_err());

        config.backups_dir_name = "a/b".to_string();
        assert!(config.validate().is_err());

        config.backups_dir_name = "..".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_sandbox_path() {
        let mut config = ClientConfig::default();
        config.sandbox_state_path = Some(PathBuf::from("/tmp/state.toml"));
        assert_eq!(
            config.sandbox_state_path().unwrap(),
            PathBuf::from("/tmp/state.toml")
        );
    }
}
