//! Ownership and permission fixing for snapshot artifacts.
//!
//! Backups are often written by a server process running as a different user.
//! This walks every snapshot (retained or not) and applies the configured
//! owner, group and mode. Failures are recorded per entry and never abort.

use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::retention::Snapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnershipSpec {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub mode: Option<u32>,
}

impl OwnershipSpec {
    pub fn is_empty(&self) -> bool {
        self.uid.is_none() && self.gid.is_none() && self.mode.is_none()
    }
}

#[derive(Debug, Default)]
pub struct PermsResult {
    pub changed: usize,
    pub errors: Vec<String>,
}

/// Parses an octal mode such as `644`, `0644` or `0o644`.
pub fn parse_mode(text: &str) -> Result<u32> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);

    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| Error::Config(format!("mode '{text}' is not an octal number")))?;

    if mode > 0o7777 {
        return Err(Error::Config(format!("mode '{text}' is out of range")));
    }

    Ok(mode)
}

// directories need the execute bit wherever the read bit is set,
// otherwise a file mode like 0644 locks everyone out of the tree
fn dir_mode(mode: u32) -> u32 {
    mode | ((mode & 0o444) >> 2)
}

pub fn apply(snapshots: &[Snapshot], ownership: &OwnershipSpec) -> PermsResult {
    let mut result = PermsResult::default();

    if ownership.is_empty() {
        return result;
    }

    for snapshot in snapshots {
        for entry in WalkDir::new(&snapshot.location).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let msg = format!("failed to walk {}: {e}", snapshot.location.display());
                    log::warn!("{msg}");
                    result.errors.push(msg);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                continue;
            }

            match apply_one(entry.path(), file_type.is_dir(), ownership) {
                Ok(()) => {
                    log::debug!("updated ownership of {}", entry.path().display());
                    result.changed += 1;
                }
                Err(e) => {
                    let msg = format!("failed to update {}: {e}", entry.path().display());
                    log::warn!("{msg}");
                    result.errors.push(msg);
                }
            }
        }
    }

    result
}

#[cfg(unix)]
fn apply_one(path: &Path, is_dir: bool, ownership: &OwnershipSpec) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if ownership.uid.is_some() || ownership.gid.is_some() {
        std::os::unix::fs::chown(path, ownership.uid, ownership.gid)?;
    }

    if let Some(mode) = ownership.mode {
        let mode = if is_dir { dir_mode(mode) } else { mode };
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    }

    Ok(())
}

#[cfg(not(unix))]
fn apply_one(_path: &Path, _is_dir: bool, _ownership: &OwnershipSpec) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "ownership changes are only supported on unix",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_octal_modes() {
        assert_eq!(parse_mode("644").unwrap(), 0o644);
        assert_eq!(parse_mode("0755").unwrap(), 0o755);
        assert_eq!(parse_mode("0o600").unwrap(), 0o600);
        assert_eq!(parse_mode(" 2775 ").unwrap(), 0o2775);
    }

    #[test]
    fn rejects_bad_modes() {
        assert!(matches!(parse_mode("rw-r--r--"), Err(Error::Config(_))));
        assert!(matches!(parse_mode("0899"), Err(Error::Config(_))));
        assert!(matches!(parse_mode("17777"), Err(Error::Config(_))));
        assert!(matches!(parse_mode(""), Err(Error::Config(_))));
    }

    #[test]
    fn directories_gain_execute_with_read() {
        assert_eq!(dir_mode(0o644), 0o755);
        assert_eq!(dir_mode(0o600), 0o700);
        assert_eq!(dir_mode(0o640), 0o750);
        assert_eq!(dir_mode(0o755), 0o755);
    }

    #[test]
    fn empty_ownership_does_nothing() {
        let result = apply(&[], &OwnershipSpec::default());
        assert_eq!(result.changed, 0);
        assert!(result.errors.is_empty());
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use chrono::NaiveDate;
        use std::fs;
        use std::os::unix::fs::{MetadataExt, PermissionsExt};
        use std::path::PathBuf;
        use tempfile::TempDir;

        fn snapshot(location: PathBuf) -> Snapshot {
            Snapshot {
                owner: "Overworld".to_string(),
                modified_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                    .and_then(|d| d.and_hms_opt(3, 0, 0))
                    .unwrap()
                    .and_utc()
                    .fixed_offset(),
                location,
                size_bytes: 0,
            }
        }

        #[test]
        fn applies_mode_recursively() {
            let tmp = TempDir::new().unwrap();
            let world = tmp.path().join("Overworld_2024-06-01_03-00-00");
            fs::create_dir_all(world.join("region")).unwrap();
            fs::write(world.join("level.dat"), b"x").unwrap();
            fs::write(world.join("region/r.0.0.mca"), b"y").unwrap();

            let ownership = OwnershipSpec { mode: Some(0o640), ..Default::default() };
            let result = apply(&[snapshot(world.clone())], &ownership);

            assert!(result.errors.is_empty(), "{:?}", result.errors);
            assert_eq!(result.changed, 4);

            let file_mode = fs::metadata(world.join("region/r.0.0.mca")).unwrap().permissions().mode();
            assert_eq!(file_mode & 0o7777, 0o640);

            let region_mode = fs::metadata(world.join("region")).unwrap().permissions().mode();
            assert_eq!(region_mode & 0o7777, 0o750);
        }

        #[test]
        fn chown_to_current_owner_succeeds() {
            let tmp = TempDir::new().unwrap();
            let archive = tmp.path().join("Nether_2024-06-01_03-00-00.zip");
            fs::write(&archive, b"x").unwrap();

            let meta = fs::metadata(&archive).unwrap();
            let ownership = OwnershipSpec {
                uid: Some(meta.uid()),
                gid: Some(meta.gid()),
                mode: None,
            };

            let result = apply(&[snapshot(archive)], &ownership);
            assert!(result.errors.is_empty(), "{:?}", result.errors);
            assert_eq!(result.changed, 1);
        }

        #[test]
        fn missing_snapshot_is_recorded_not_fatal() {
            let tmp = TempDir::new().unwrap();
            let present = tmp.path().join("Nether_2024-06-01_03-00-00.zip");
            fs::write(&present, b"x").unwrap();

            let ownership = OwnershipSpec { mode: Some(0o600), ..Default::default() };
            let result = apply(
                &[snapshot(tmp.path().join("gone.zip")), snapshot(present)],
                &ownership,
            );

            assert_eq!(result.errors.len(), 1);
            assert_eq!(result.changed, 1);
        }
    }
}
