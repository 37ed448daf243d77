//! Writing a planned project to disk
//!
//! ## Process
//!
//! 1.  **Stage**: Every file of the set is written into a temporary directory
//!     created next to the target, so both live on the same filesystem.
//!     Parent directories are created as needed and permissions (including
//!     the executable bit) are applied.
//!
//! 2.  **Move into place**: If the target does not exist yet, the staging
//!     directory is renamed to it in one step. Otherwise every destination is
//!     checked first (no directory where a file goes, no file where a parent
//!     directory is needed), then each staged file is renamed over its
//!     destination. A replaced file is first moved into a backup directory;
//!     if any rename fails, the moved files are taken out again, the backups
//!     are restored and the directories created for the pass are removed.
//!
//! A failure at any step leaves the target as it was; the staging and backup
//! directories are removed when they go out of scope.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::filesystem::FileSet;

/// Prefix of the staging directory created beside the target
pub const STAGING_PREFIX: &str = ".zero-staging-";

/// Prefix of the directory holding files replaced in an existing target
pub const BACKUP_PREFIX: &str = ".zero-backup-";

/// Write `files` under `target_dir`, all or nothing.
pub fn execute(files: &FileSet, target_dir: &Path) -> Result<()> {
    let parent = staging_parent(target_dir);
    fs::create_dir_all(&parent).map_err(|e| Error::Filesystem {
        message: format!("Failed to create directory '{}': {}", parent.display(), e),
    })?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(&parent)
        .map_err(|e| Error::Filesystem {
            message: format!(
                "Failed to create staging directory in '{}': {}",
                parent.display(),
                e
            ),
        })?;

    stage(files, staging.path())?;
    debug!(
        "Staged {} files in {}",
        files.len(),
        staging.path().display()
    );

    if target_dir.exists() {
        check_destinations(files, target_dir)?;
        let backup = tempfile::Builder::new()
            .prefix(BACKUP_PREFIX)
            .tempdir_in(&parent)
            .map_err(|e| Error::Filesystem {
                message: format!(
                    "Failed to create backup directory in '{}': {}",
                    parent.display(),
                    e
                ),
            })?;
        let mut moves = Moves::default();
        let result = move_files(files, staging.path(), target_dir, backup.path(), &mut moves);
        if result.is_err() {
            moves.roll_back();
        }
        result
    } else {
        fs::rename(staging.path(), target_dir).map_err(|e| Error::Filesystem {
            message: format!(
                "Failed to move project into '{}': {}",
                target_dir.display(),
                e
            ),
        })?;
        // Temporary directories are created owner-only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(target_dir, fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }
}

fn staging_parent(target_dir: &Path) -> PathBuf {
    match target_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn stage(files: &FileSet, root: &Path) -> Result<()> {
    for (relative_path, file) in files.files() {
        let full_path = root.join(relative_path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
                message: format!("Failed to create directory '{}': {}", parent.display(), e),
            })?;
        }

        fs::write(&full_path, &file.content).map_err(|e| Error::Filesystem {
            message: format!("Failed to write file '{}': {}", full_path.display(), e),
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(file.permissions);
            fs::set_permissions(&full_path, perms).map_err(|e| Error::Filesystem {
                message: format!(
                    "Failed to set permissions on '{}': {}",
                    full_path.display(),
                    e
                ),
            })?;
        }
    }
    Ok(())
}

/// Fail before anything moves if a destination cannot take its file
fn check_destinations(files: &FileSet, target_dir: &Path) -> Result<()> {
    for relative_path in files.list_files() {
        let to = target_dir.join(&relative_path);
        if to.is_dir() {
            return Err(Error::Filesystem {
                message: format!("'{}' is a directory, cannot write a file there", to.display()),
            });
        }
        let mut dir = to.parent();
        while let Some(current) = dir {
            if current == target_dir {
                break;
            }
            if current.exists() && !current.is_dir() {
                return Err(Error::Filesystem {
                    message: format!(
                        "'{}' is a file, cannot create directory there",
                        current.display()
                    ),
                });
            }
            dir = current.parent();
        }
    }
    Ok(())
}

/// What a move pass changed in an existing target, newest last
#[derive(Debug, Default)]
struct Moves {
    created_dirs: Vec<PathBuf>,
    /// Destination and, when it replaced a file, where that file was put
    placed: Vec<(PathBuf, Option<PathBuf>)>,
}

impl Moves {
    fn roll_back(self) {
        for (destination, backup) in self.placed.into_iter().rev() {
            if let Err(e) = fs::remove_file(&destination) {
                warn!("Failed to remove '{}' during rollback: {}", destination.display(), e);
            }
            if let Some(backup) = backup {
                if let Err(e) = fs::rename(&backup, &destination) {
                    warn!("Failed to restore '{}': {}", destination.display(), e);
                }
            }
        }
        for dir in self.created_dirs.into_iter().rev() {
            // Only empty directories are removed
            let _ = fs::remove_dir(&dir);
        }
    }
}

fn move_files(
    files: &FileSet,
    staging: &Path,
    target_dir: &Path,
    backup_dir: &Path,
    moves: &mut Moves,
) -> Result<()> {
    for (index, relative_path) in files.list_files().into_iter().enumerate() {
        let from = staging.join(&relative_path);
        let to = target_dir.join(&relative_path);

        if let Some(parent) = to.parent() {
            create_dirs(parent, moves)?;
        }

        let backup = if to.exists() {
            let backup = backup_dir.join(index.to_string());
            fs::rename(&to, &backup).map_err(|e| Error::Filesystem {
                message: format!("Failed to back up '{}': {}", to.display(), e),
            })?;
            Some(backup)
        } else {
            None
        };

        match fs::rename(&from, &to) {
            Ok(()) => moves.placed.push((to, backup)),
            Err(e) => {
                if let Some(backup) = backup {
                    let _ = fs::rename(&backup, &to);
                }
                return Err(Error::Filesystem {
                    message: format!("Failed to move '{}' into place: {}", to.display(), e),
                });
            }
        }
    }
    Ok(())
}

/// `create_dir_all` that records each directory it creates
fn create_dirs(dir: &Path, moves: &mut Moves) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    if let Some(parent) = dir.parent() {
        create_dirs(parent, moves)?;
    }
    fs::create_dir(dir).map_err(|e| Error::Filesystem {
        message: format!("Failed to create directory '{}': {}", dir.display(), e),
    })?;
    moves.created_dirs.push(dir.to_path_buf());
    Ok(())
}
