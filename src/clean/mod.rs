//! Cleanup engine.
//!
//! Removes the snapshots a retention pass marked as trim:
//! - Dry run mode: logs what would be deleted, never touches disk
//! - Execute mode: performs actual deletion with logging
//!
//! A failed deletion is recorded and the remaining snapshots are still processed.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::retention::{Classified, Decision, OwnerPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanMode {
    DryRun,
    Execute,
}

#[derive(Debug, Default, Serialize)]
pub struct CleanResult {
    pub deleted: Vec<String>,
    pub errors: Vec<String>,
    pub bytes_freed: u64,
}

pub fn run(plans: &[OwnerPlan], mode: CleanMode) -> CleanResult {
    let trimmed = plans.iter().flat_map(|plan| plan.trimmed());
    remove(trimmed, mode)
}

/// Deletes every entry marked trim. Retained entries are passed over.
pub fn remove<'a>(entries: impl IntoIterator<Item = &'a Classified>, mode: CleanMode) -> CleanResult {
    let mut clean_result = CleanResult::default();

    let entries = entries
        .into_iter()
        .filter(|entry| entry.decision == Decision::Trim);

    match mode {
        CleanMode::DryRun => {
            for entry in entries {
                let path = entry.snapshot.location.display();
                log::info!("[dry-run] would delete {path}");
                clean_result.deleted.push(format!("[dry-run] would delete: {path}"));
                clean_result.bytes_freed = clean_result
                    .bytes_freed
                    .saturating_add(entry.snapshot.size_bytes);
            }
        }
        CleanMode::Execute => {
            for entry in entries {
                match delete_path(&entry.snapshot.location) {
                    Ok(msg) => {
                        log::info!("{msg}");
                        clean_result.deleted.push(msg);
                        clean_result.bytes_freed = clean_result
                            .bytes_freed
                            .saturating_add(entry.snapshot.size_bytes);
                    }
                    Err(e) => {
                        log::warn!("{e}");
                        clean_result.errors.push(e);
                    }
                }
            }
        }
    }

    clean_result
}

fn delete_path(path: &Path) -> Result<String, String> {
    // symlink_metadata so a link to a directory is unlinked, not followed
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Ok(format!("deleted: {}", path.display())),
        Err(e) => Err(format!("failed to delete {}: {}", path.display(), e)),
    }
}
