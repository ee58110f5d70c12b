// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

//! Sequential backup creation queue
//!
//! Backups are created one at a time. The queue hands out the first queued
//! entry only when nothing is in flight, and accepts a completion only for
//! the entry that was handed out.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Lifecycle of one backup during batch creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupState {
    Queued,
    Ok,
    /// Failed, with the SDK error message
    Err(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSetupStatus {
    pub folder_path: PathBuf,
    pub state: SetupState,
}

/// Display name -> setup status, ordered by name
#[derive(Debug, Clone, Default)]
pub struct BackupQueue {
    entries: BTreeMap<String, BackupSetupStatus>,
    in_flight: Option<String>,
}

impl BackupQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.in_flight = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn enqueue(&mut self, name: String, folder_path: PathBuf) {
        self.entries.insert(
            name,
            BackupSetupStatus {
                folder_path,
                state: SetupState::Queued,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&BackupSetupStatus> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BackupSetupStatus)> {
        self.entries.iter()
    }

    /// Name of the entry whose request is outstanding
    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    /// Take the first queued entry for submission. Returns `None` while a
    /// request is outstanding or when nothing is queued.
    pub fn next_to_submit(&mut self) -> Option<(String, PathBuf)> {
        if self.in_flight.is_some() {
            return None;
        }

        let (name, status) = self
            .entries
            .iter()
            .find(|(_, status)| status.state == SetupState::Queued)?;
        let next = (name.clone(), status.folder_path.clone());
        self.in_flight = Some(next.0.clone());
        Some(next)
    }

    /// Record the result of the outstanding request. Returns `false` (and
    /// changes nothing) if `name` is not the entry in flight.
    pub fn complete(&mut self, name: &str, result: Result<(), String>) -> bool {
        if self.in_flight.as_deref() != Some(name) {
            return false;
        }

        let Some(status) = self.entries.get_mut(name) else {
            return false;
        };
        status.state = match result {
            Ok(()) => SetupState::Ok,
            Err(message) => SetupState::Err(message),
        };
        self.in_flight = None;
        true
    }

    /// Nothing queued and nothing in flight
    pub fn is_finished(&self) -> bool {
        self.in_flight.is_none()
            && !self
                .entries
                .values()
                .any(|status| status.state == SetupState::Queued)
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .values()
            .any(|status| matches!(status.state, SetupState::Err(_)))
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, status)| matches!(status.state, SetupState::Err(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Failed names, each followed by `-`
    pub fn aggregated_error(&self) -> String {
        self.failed_names()
            .iter()
            .map(|name| format!("{}-", name))
            .collect()
    }
}
