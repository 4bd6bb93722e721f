//! Working-copy sessions and snapshot bookkeeping.
//!
//! Every mutating pass works copy-before-mutate: the source file is never
//! touched until a pass has fully succeeded on a hidden working copy. The
//! session owns both the working copy and its backup and removes them when
//! it goes out of scope, on success or failure alike.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default backup path for a file: `{path}.backup` alongside it.
pub fn default_backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

/// An editing session on one file: a hidden working copy plus a backup
/// snapshot, both removed on drop.
#[derive(Debug)]
pub struct WorkSession {
    source: PathBuf,
    working_copy: PathBuf,
    backup: PathBuf,
}

impl WorkSession {
    /// Copy `source` to a hidden `.{name}.wip` sibling and snapshot a
    /// backup of it.
    pub fn open(source: &Path) -> Result<WorkSession> {
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Format(format!("invalid path: {}", source.display())))?;
        let dir = source.parent().unwrap_or_else(|| Path::new("."));
        let working_copy = dir.join(format!(".{file_name}.wip"));
        fs::copy(source, &working_copy)?;
        let backup = default_backup_path(&working_copy);
        fs::copy(&working_copy, &backup)?;
        Ok(WorkSession {
            source: source.to_path_buf(),
            working_copy,
            backup,
        })
    }

    pub fn working_copy(&self) -> &Path {
        &self.working_copy
    }

    /// Restore the working copy from the session backup.
    pub fn revert(&self) -> Result<()> {
        if !self.backup.exists() {
            return Err(Error::BackupMissing(self.backup.clone()));
        }
        fs::copy(&self.backup, &self.working_copy)?;
        Ok(())
    }

    /// Copy the working copy back over the source. Only called once a pass
    /// has fully succeeded, so a failed pass never corrupts the source.
    pub fn commit(&self) -> Result<()> {
        fs::copy(&self.working_copy, &self.source)?;
        Ok(())
    }

    /// End the session, removing the working copy and backup.
    pub fn close(self) {}
}

impl Drop for WorkSession {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.working_copy);
        let _ = fs::remove_file(&self.backup);
    }
}

// ============================================================================
// Standalone snapshots
// ============================================================================

/// Snapshot `path` to `to` (default `{path}.backup`); returns the backup
/// path.
pub fn save_backup(path: &Path, to: Option<&Path>) -> Result<PathBuf> {
    let backup = to
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_backup_path(path));
    if let Some(parent) = backup.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::copy(path, &backup)?;
    Ok(backup)
}

/// Restore `path` from `from` (default `{path}.backup`); returns the backup
/// path used.
pub fn revert(path: &Path, from: Option<&Path>) -> Result<PathBuf> {
    let backup = from
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_backup_path(path));
    if !backup.exists() {
        return Err(Error::BackupMissing(backup));
    }
    fs::copy(&backup, path)?;
    Ok(backup)
}

/// Copy the current state of `path` out to `to`; refuses to overwrite.
pub fn export(path: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        return Err(Error::TargetExists(to.to_path_buf()));
    }
    fs::copy(path, to)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_edits_do_not_touch_source_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("mix.scn");
        fs::write(&source, "original").unwrap();

        let session = WorkSession::open(&source).unwrap();
        fs::write(session.working_copy(), "edited").unwrap();
        assert_eq!(fs::read_to_string(&source).unwrap(), "original");

        session.commit().unwrap();
        assert_eq!(fs::read_to_string(&source).unwrap(), "edited");
    }

    #[test]
    fn session_revert_restores_working_copy() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("mix.scn");
        fs::write(&source, "original").unwrap();

        let session = WorkSession::open(&source).unwrap();
        fs::write(session.working_copy(), "broken").unwrap();
        session.revert().unwrap();
        assert_eq!(
            fs::read_to_string(session.working_copy()).unwrap(),
            "original"
        );
    }

    #[test]
    fn session_files_are_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("mix.scn");
        fs::write(&source, "original").unwrap();

        let working_copy;
        {
            let session = WorkSession::open(&source).unwrap();
            working_copy = session.working_copy().to_path_buf();
            assert!(working_copy.exists());
        }
        assert!(!working_copy.exists());
        assert!(!default_backup_path(&working_copy).exists());
        assert!(source.exists());
    }

    #[test]
    fn revert_without_backup_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mix.scn");
        fs::write(&file, "data").unwrap();
        assert!(matches!(
            revert(&file, None),
            Err(Error::BackupMissing(_))
        ));
    }

    #[test]
    fn backup_then_revert_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mix.scn");
        fs::write(&file, "v1").unwrap();

        let backup = save_backup(&file, None).unwrap();
        fs::write(&file, "v2").unwrap();
        let used = revert(&file, None).unwrap();

        assert_eq!(used, backup);
        assert_eq!(fs::read_to_string(&file).unwrap(), "v1");
    }

    #[test]
    fn export_refuses_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mix.scn");
        let out = dir.path().join("out.scn");
        fs::write(&file, "data").unwrap();
        fs::write(&out, "already here").unwrap();
        assert!(matches!(export(&file, &out), Err(Error::TargetExists(_))));
    }
}
