//! Finds world backup snapshots in a backup folder.
//!
//! A snapshot is a top-level entry named `<world>_<YYYY-MM-DD>_<HH-MM-SS>`,
//! either a directory or an archive with one of the known extensions.
//! The world name may contain underscores itself. Everything else in the
//! folder is ignored.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::retention::Snapshot;

const ARCHIVE_EXTENSIONS: &[&str] = &[".tar.gz", ".tar.zst", ".tgz", ".tar", ".zip"];

const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
// "_" + "YYYY-MM-DD_HH-MM-SS"
const STAMP_SUFFIX_LEN: usize = 20;

/// Lists every snapshot directly inside `folder`.
///
/// Fails only when the folder itself cannot be read. Entries that do not look
/// like snapshots, or whose metadata is unreadable, are skipped.
pub fn discover(folder: &Path) -> Result<Vec<Snapshot>> {
    let mut snapshots = Vec::new();

    let walker = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // the folder itself is unreadable
            Err(e) if e.depth() == 0 => {
                return Err(Error::Discovery {
                    path: folder.to_path_buf(),
                    source: e.into(),
                });
            }
            Err(e) => {
                log::debug!("skipping unreadable entry in {}: {e}", folder.display());
                continue;
            }
        };

        let path = entry.path();
        let Some(file_name) = entry.file_name().to_str() else {
            log::debug!("skipping {}: name is not valid utf-8", path.display());
            continue;
        };

        if file_name.starts_with('.') {
            continue;
        }

        // links are not followed, so a link is neither a file nor a dir here
        let file_type = entry.file_type();
        let is_dir = file_type.is_dir();
        if !is_dir && !file_type.is_file() {
            continue;
        }

        let Some(owner) = parse_artifact_name(file_name, is_dir) else {
            log::debug!("skipping {}: not a world snapshot", path.display());
            continue;
        };

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                log::debug!("skipping {}: {e}", path.display());
                continue;
            }
        };

        let modified_at = match metadata.modified() {
            Ok(time) => DateTime::<Local>::from(time).fixed_offset(),
            Err(e) => {
                log::debug!("skipping {}: no modification time ({e})", path.display());
                continue;
            }
        };

        let size_bytes = if is_dir { dir_size(path) } else { metadata.len() };

        snapshots.push(Snapshot {
            owner,
            modified_at,
            location: path.to_path_buf(),
            size_bytes,
        });
    }

    log::debug!("found {} snapshot(s) in {}", snapshots.len(), folder.display());
    Ok(snapshots)
}

/// Returns the world name when `file_name` follows the snapshot naming scheme.
pub fn parse_artifact_name(file_name: &str, is_dir: bool) -> Option<String> {
    let stem = if is_dir {
        file_name
    } else {
        ARCHIVE_EXTENSIONS
            .iter()
            .find_map(|ext| file_name.strip_suffix(ext))?
    };

    let split = stem.len().checked_sub(STAMP_SUFFIX_LEN)?;
    let (world, suffix) = (stem.get(..split)?, stem.get(split..)?);
    let stamp = suffix.strip_prefix('_')?;

    if world.is_empty() {
        return None;
    }

    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
    Some(world.to_string())
}

/// Sums regular file sizes below `path`. Unreadable entries count as zero.
fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .fold(0u64, |total, m| total.saturating_add(m.len()))
}

/// Artifact file name for `world` stamped at `at`, as the backup job writes it.
pub fn artifact_name(world: &str, at: NaiveDateTime, extension: Option<&str>) -> PathBuf {
    let mut name = format!("{world}_{}", at.format(STAMP_FORMAT));
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(ext.trim_start_matches('.'));
    }
    PathBuf::from(name)
}
