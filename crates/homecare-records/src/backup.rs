//! On-demand copies of the store file.

use std::path::{Path, PathBuf};

use rusqlite::params;
use tracing::{info, instrument};

use crate::error::{RecordError, Result};
use crate::store::RecordStore;

const BACKUP_PREFIX: &str = "homecare-backup-";

impl RecordStore {
    /// Write a consistent copy of the whole store to a new timestamped file
    /// under `dir` and return its path.
    ///
    /// Uses `VACUUM INTO`, holding the store lock for the whole copy so no
    /// write commits halfway through.
    #[instrument(skip(self, dir), fields(dir = %dir.as_ref().display()))]
    pub fn backup_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let target = dir.join(format!("{BACKUP_PREFIX}{stamp}.db"));
        if target.exists() {
            return Err(RecordError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("backup target already exists: {}", target.display()),
            )));
        }
        let target_str = target.to_str().ok_or_else(|| {
            RecordError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "backup path is not valid UTF-8",
            ))
        })?;

        let conn = self.lock()?;
        conn.execute("VACUUM INTO ?1", params![target_str])?;
        drop(conn);

        let bytes = std::fs::metadata(&target).map(|m| m.len()).unwrap_or(0);
        info!(path = %target.display(), bytes, "backup written");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StaffDetails, StaffRole};

    #[test]
    fn backup_is_an_openable_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open_in_memory().unwrap();
        store
            .create_staff(StaffDetails::new("N. Ali", StaffRole::Nurse), "admin")
            .unwrap();

        let path = store.backup_to(dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(BACKUP_PREFIX));
        assert!(name.ends_with("Z.db"));

        let copy = RecordStore::open(&path).unwrap();
        let staff = copy.list_staff(&Default::default()).unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].details.name, "N. Ali");
        assert_eq!(copy.high_water(homecare_core::EntityKind::Staff).unwrap(), 1);
    }
}
