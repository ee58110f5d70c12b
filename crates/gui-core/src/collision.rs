// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Cloudsync Desktop Contributors

//! Folder collision checks
//!
//! A folder can be offered for backup only if it does not overlap an existing
//! sync, an existing backup or another checked candidate. Comparison is
//! case-sensitive and works on whole path components, so `/a/Docs2` is not
//! inside `/a/Docs`.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::folders::FolderList;

/// Reason a folder cannot be added as a backup candidate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FolderRejection {
    /// Equal to or inside a two-way sync root
    #[error("The selected local folder is already synced")]
    AlreadySynced { root: PathBuf },

    /// Ancestor of a two-way sync root
    #[error("A synced folder cannot be inside a backup folder")]
    ContainsSync { root: PathBuf },

    /// Strictly inside a backup root or a checked candidate
    #[error("The selected local folder is already backed up")]
    AlreadyBackedUp { root: PathBuf },

    /// Ancestor of a backup root or a checked candidate
    #[error("A backed up folder cannot be inside a backup folder")]
    ContainsBackup { root: PathBuf },
}

impl FolderRejection {
    /// The existing root the candidate collided with
    pub fn root(&self) -> &Path {
        match self {
            FolderRejection::AlreadySynced { root }
            | FolderRejection::ContainsSync { root }
            | FolderRejection::AlreadyBackedUp { root }
            | FolderRejection::ContainsBackup { root } => root,
        }
    }
}

/// Lexically normalize a path: drop `.` components, resolve `..` and
/// trailing separators. Symlinks are not resolved.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    cleaned.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                );
                if at_root {
                    if !cleaned.has_root() {
                        cleaned.push("..");
                    }
                } else if cleaned.ends_with("..") {
                    cleaned.push("..");
                } else {
                    cleaned.pop();
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }

    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

/// Relation of a candidate path to an existing root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlap {
    Same,
    Inside,
    Contains,
}

fn overlap(candidate: &Path, root: &Path) -> Option<Overlap> {
    if candidate == root {
        Some(Overlap::Same)
    } else if candidate.starts_with(root) {
        Some(Overlap::Inside)
    } else if root.starts_with(candidate) {
        Some(Overlap::Contains)
    } else {
        None
    }
}

/// Check a folder against configured syncs and the current candidate list.
///
/// Existing two-way syncs reject the same path, descendants and ancestors.
/// Backup roots and checked candidates reject descendants and ancestors but
/// let the exact same path through, so an already backed up folder can be
/// picked again. Unchecked candidates are ignored.
pub fn check_folder(
    path: &Path,
    two_way_roots: &[PathBuf],
    backup_roots: &[PathBuf],
    candidates: &FolderList,
) -> Result<(), FolderRejection> {
    let path = clean_path(path);

    for root in two_way_roots {
        let root = clean_path(root);
        match overlap(&path, &root) {
            Some(Overlap::Same) | Some(Overlap::Inside) => {
                return Err(FolderRejection::AlreadySynced { root })
            }
            Some(Overlap::Contains) => return Err(FolderRejection::ContainsSync { root }),
            None => {}
        }
    }

    let checked = candidates.checked().map(|c| &c.local_path);
    for root in backup_roots.iter().chain(checked) {
        let root = clean_path(root);
        match overlap(&path, &root) {
            Some(Overlap::Inside) => return Err(FolderRejection::AlreadyBackedUp { root }),
            Some(Overlap::Contains) => return Err(FolderRejection::ContainsBackup { root }),
            Some(Overlap::Same) | None => {}
        }
    }

    Ok(())
}

/// Check a folder proposed as a new two-way sync root. Any overlap with an
/// existing sync or backup root is rejected, including the same path.
pub fn check_sync_folder(
    path: &Path,
    two_way_roots: &[PathBuf],
    backup_roots: &[PathBuf],
) -> Result<(), FolderRejection> {
    let path = clean_path(path);

    for root in two_way_roots {
        let root = clean_path(root);
        match overlap(&path, &root) {
            Some(Overlap::Same) | Some(Overlap::Inside) => {
                return Err(FolderRejection::AlreadySynced { root })
            }
            Some(Overlap::Contains) => return Err(FolderRejection::ContainsSync { root }),
            None => {}
        }
    }

    for root in backup_roots {
        let root = clean_path(root);
        match overlap(&path, &root) {
            Some(Overlap::Same) | Some(Overlap::Inside) => {
                return Err(FolderRejection::AlreadyBackedUp { root })
            }
            Some(Overlap::Contains) => return Err(FolderRejection::ContainsBackup { root }),
            None => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folders::BackupCandidate;

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/a/./b/")), PathBuf::from("/a/b"));
        assert_eq!(clean_path(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(clean_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(clean_path(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(clean_path(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_two_way_root_rejects_itself_and_descendants() {
        let two_way = paths(&["/home/u/Work"]);
        let list = FolderList::new();

        for candidate in ["/home/u/Work", "/home/u/Work/", "/home/u/Work/src", "/home/u/Work/a/b"] {
            let result = check_folder(Path::new(candidate), &two_way, &[], &list);
            assert_eq!(
                result,
                Err(FolderRejection::AlreadySynced {
                    root: PathBuf::from("/home/u/Work")
                }),
                "{}",
                candidate
            );
        }
    }

    #[test]
    fn test_two_way_root_rejects_ancestors() {
        let two_way = paths(&["/home/u/Work"]);
        let result = check_folder(Path::new("/home/u"), &two_way, &[], &FolderList::new());
        assert!(matches!(result, Err(FolderRejection::ContainsSync { .. })));

        let result = check_folder(Path::new("/"), &two_way, &[], &FolderList::new());
        assert!(matches!(result, Err(FolderRejection::ContainsSync { .. })));
    }

    #[test]
    fn test_backup_root_exact_path_allowed() {
        let backups = paths(&["/home/u/Photos"]);
        let list = FolderList::new();

        assert!(check_folder(Path::new("/home/u/Photos"), &[], &backups, &list).is_ok());
        assert!(matches!(
            check_folder(Path::new("/home/u"), &[], &backups, &list),
            Err(FolderRejection::ContainsBackup { .. })
        ));
        assert!(matches!(
            check_folder(Path::new("/home/u/Photos/2024"), &[], &backups, &list),
            Err(FolderRejection::AlreadyBackedUp { .. })
        ));
    }

    #[test]
    fn test_sibling_with_common_prefix_is_not_nested() {
        let two_way = paths(&["/home/u/Docs"]);
        let backups = paths(&["/home/u/Pics"]);
        let list = FolderList::new();

        assert!(check_folder(Path::new("/home/u/Docs2"), &two_way, &backups, &list).is_ok());
        assert!(check_folder(Path::new("/home/u/Pics-old"), &two_way, &backups, &list).is_ok());
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        let two_way = paths(&["/home/u/Docs"]);
        let result = check_folder(Path::new("/home/u/docs/x"), &two_way, &[], &FolderList::new());
        assert!(result.is_ok());
    }

    #[test]
    fn test_only_checked_candidates_count() {
        let mut list = FolderList::new();
        let index = list.push(BackupCandidate::new(PathBuf::from("/home/u/Music")));

        // Unchecked: no collision
        assert!(check_folder(Path::new("/home/u/Music/Live"), &[], &[], &list).is_ok());

        list.get_mut(index).unwrap().checked = true;
        assert_eq!(
            check_folder(Path::new("/home/u/Music/Live"), &[], &[], &list),
            Err(FolderRejection::AlreadyBackedUp {
                root: PathBuf::from("/home/u/Music")
            })
        );
        assert!(matches!(
            check_folder(Path::new("/home/u"), &[], &[], &list),
            Err(FolderRejection::ContainsBackup { .. })
        ));
        // Same path is handled by reusing the row
        assert!(check_folder(Path::new("/home/u/Music"), &[], &[], &list).is_ok());
    }

    #[test]
    fn test_rejection_messages() {
        let root = PathBuf::from("/x");
        assert_eq!(
            FolderRejection::AlreadySynced { root: root.clone() }.to_string(),
            "The selected local folder is already synced"
        );
        assert_eq!(
            FolderRejection::ContainsBackup { root: root.clone() }.to_string(),
            "A backed up folder cannot be inside a backup folder"
        );
        assert_eq!(FolderRejection::ContainsSync { root: root.clone() }.root(), root.as_path());
    }

    #[test]
    fn test_new_sync_rejects_any_overlap() {
        let two_way = paths(&["/home/u/Work"]);
        let backups = paths(&["/home/u/Photos"]);

        assert!(matches!(
            check_sync_folder(Path::new("/home/u/Work/src"), &two_way, &backups),
            Err(FolderRejection::AlreadySynced { .. })
        ));
        assert!(matches!(
            check_sync_folder(Path::new("/home/u"), &two_way, &[]),
            Err(FolderRejection::ContainsSync { .. })
        ));
        assert!(matches!(
            check_sync_folder(Path::new("/home/u/Photos"), &[], &backups),
            Err(FolderRejection::AlreadyBackedUp { .. })
        ));
        assert!(matches!(
            check_sync_folder(Path::new("/home/u"), &[], &backups),
            Err(FolderRejection::ContainsBackup { .. })
        ));
        assert!(check_sync_folder(Path::new("/home/u/Music"), &two_way, &backups).is_ok());
    }
}
