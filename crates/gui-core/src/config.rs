// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

//! Client configuration file helpers

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cloudsync_common::{app_config_dir, ClientConfig};

/// Get client config file path
pub fn get_client_config_path() -> Result<PathBuf> {
    Ok(app_config_dir()?.join("client.toml"))
}

/// Load the client configuration, falling back to defaults when no file exists
pub fn load_client_config() -> Result<ClientConfig> {
    load_client_config_from(&get_client_config_path()?)
}

pub fn load_client_config_from(path: &Path) -> Result<ClientConfig> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: ClientConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    config.validate()?;
    Ok(config)
}

/// Save the client configuration to its default location
pub fn save_client_config(config: &ClientConfig) -> Result<PathBuf> {
    let path = get_client_config_path()?;
    save_client_config_to(config, &path)?;
    Ok(path)
}

pub fn save_client_config_to(config: &ClientConfig, path: &Path) -> Result<()> {
    config.validate()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let toml_content =
        toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    fs::write(path, toml_content).context("Failed to write configuration file")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, permissions)
            .context("Failed to set config file permissions")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_client_config_from(&dir.path().join("client.toml")).unwrap();
        assert_eq!(config.backups_dir_name, "My Backups");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("client.toml");

        let mut config = ClientConfig::default();
        config.device_name = Some("workstation".to_string());
        config.backups_dir_name = "Device Backups".to_string();
        save_client_config_to(&config, &path).unwrap();

        let loaded = load_client_config_from(&path).unwrap();
        assert_eq!(loaded.device_name.as_deref(), Some("workstation"));
        assert_eq!(loaded.backups_dir_name, "Device Backups");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.toml");

        fs::write(&path, "backups_dir_name = \"a/b\"\n").unwrap();
        assert!(load_client_config_from(&path).is_err());

        fs::write(&path, "not toml [").unwrap();
        assert!(load_client_config_from(&path).is_err());
    }
}
