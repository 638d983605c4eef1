use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use tempfile::TempDir;

use worldtrim::clean::{self, CleanMode};
use worldtrim::discover::{self, artifact_name};
use worldtrim::retention::{self, Decision, NullReporter, RetentionPolicy};

const HOUR: u64 = 3_600;
const DAY: u64 = 24 * HOUR;

/// Writes a snapshot archive whose mtime lies `age` in the past.
fn backup(folder: &Path, world: &str, age: Duration) -> PathBuf {
    let mtime = SystemTime::now() - age;
    let stamped = DateTime::<Local>::from(mtime).naive_local();
    let path = folder.join(artifact_name(world, stamped, Some("zip")));

    fs::write(&path, b"world data").unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
    path
}

fn today() -> chrono::NaiveDate {
    Local::now().date_naive()
}

#[test]
fn prune_keeps_recent_and_rescues_lonely_world() {
    let tmp = TempDir::new().unwrap();
    let folder = tmp.path();

    let fresh = backup(folder, "Overworld", Duration::from_secs(60));
    let stale = backup(folder, "Overworld", Duration::from_secs(40 * DAY));
    let lonely = backup(folder, "Nether", Duration::from_secs(40 * DAY));
    fs::write(folder.join("server.properties"), b"not a backup").unwrap();

    let snapshots = discover::discover(folder).unwrap();
    assert_eq!(snapshots.len(), 3);

    let plans = retention::plan(snapshots, &RetentionPolicy::default(), today(), &mut NullReporter);
    let result = clean::run(&plans, CleanMode::Execute);

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.deleted.len(), 1);
    assert!(fresh.exists());
    assert!(!stale.exists());
    assert!(lonely.exists());
    assert!(folder.join("server.properties").exists());
}

#[test]
fn dry_run_leaves_folder_untouched() {
    let tmp = TempDir::new().unwrap();
    let folder = tmp.path();

    let paths: Vec<_> = (0..5)
        .map(|i| backup(folder, "Overworld", Duration::from_secs((30 + i) * DAY)))
        .collect();

    let snapshots = discover::discover(folder).unwrap();
    let plans = retention::plan(snapshots, &RetentionPolicy::default(), today(), &mut NullReporter);
    let result = clean::run(&plans, CleanMode::DryRun);

    assert_eq!(result.deleted.len(), 4);
    assert!(paths.iter().all(|p| p.exists()));
}

#[test]
fn second_pass_finds_nothing_left_to_trim() {
    let tmp = TempDir::new().unwrap();
    let folder = tmp.path();

    for i in 0..48 {
        backup(folder, "Overworld", Duration::from_secs(i * 6 * HOUR + 60));
    }
    backup(folder, "End", Duration::from_secs(20 * DAY));

    let policy = RetentionPolicy {
        trim_days: 2,
        keep_days: 7,
        min_keep: 1,
    };

    let first = retention::plan(discover::discover(folder).unwrap(), &policy, today(), &mut NullReporter);
    let removed = clean::run(&first, CleanMode::Execute);
    assert!(removed.errors.is_empty(), "{:?}", removed.errors);
    assert!(!removed.deleted.is_empty());

    let second = retention::plan(discover::discover(folder).unwrap(), &policy, today(), &mut NullReporter);
    for plan in &second {
        assert!(
            plan.snapshots.iter().all(|c| c.decision == Decision::Retain),
            "{} still has trims",
            plan.owner
        );
    }

    let end = second.iter().find(|p| p.owner == "End").unwrap();
    assert_eq!(end.snapshots.len(), 1);
}

#[test]
fn unreadable_folder_aborts_the_pass() {
    let tmp = TempDir::new().unwrap();
    let result = discover::discover(&tmp.path().join("missing"));
    assert!(matches!(result, Err(worldtrim::Error::Discovery { .. })));
}
