//! Retention decisions for world backup snapshots.
//!
//! A pass runs independently for every world:
//! - snapshots inside the recent window are always retained
//! - snapshots between the recent window and the horizon keep one survivor per calendar day
//! - snapshots beyond the horizon are trimmed
//! - finally the newest trimmed snapshots are promoted back until `min_keep` are retained
//!
//! Nothing here touches the filesystem. Callers act on the returned decisions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::Serialize;

/// One backup artifact on disk, belonging to one world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub owner: String,
    /// Modification instant with the local offset in effect at that moment.
    /// Ordering uses the instant, day buckets use the local calendar date.
    pub modified_at: DateTime<FixedOffset>,
    pub location: PathBuf,
    /// Informational only, never consulted when deciding.
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    #[default]
    Retain,
    Trim,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Retain => "retain",
            Decision::Trim => "trim",
        }
    }
}

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    Recent,
    DailySurvivor,
    SameDayDuplicate,
    BeyondHorizon,
    MinimumKeep,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Recent => "recent",
            Reason::DailySurvivor => "daily survivor",
            Reason::SameDayDuplicate => "same-day duplicate",
            Reason::BeyondHorizon => "beyond horizon",
            Reason::MinimumKeep => "minimum keep",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classified {
    pub snapshot: Snapshot,
    pub decision: Decision,
    pub reason: Reason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("trim_days must be at least 1")]
    ZeroTrimDays,
    #[error("keep_days must be at least 1")]
    ZeroKeepDays,
    #[error("min_keep must be at least 1")]
    ZeroMinKeep,
    #[error("keep_days ({keep_days}) must not be smaller than trim_days ({trim_days})")]
    KeepBeforeTrim { trim_days: u32, keep_days: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Days (including today) in which every snapshot is kept.
    pub trim_days: u32,
    /// Days (including today) after which snapshots are trimmed unconditionally.
    pub keep_days: u32,
    /// Snapshots that must stay retained per world, whatever their age.
    pub min_keep: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        RetentionPolicy {
            trim_days: 3,
            keep_days: 14,
            min_keep: 1,
        }
    }
}

/// Calendar cutoffs for one pass. A snapshot is "older" than a threshold
/// when its day falls strictly before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub trim: NaiveDate,
    pub keep: NaiveDate,
}

impl RetentionPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.trim_days == 0 {
            return Err(PolicyError::ZeroTrimDays);
        }
        if self.keep_days == 0 {
            return Err(PolicyError::ZeroKeepDays);
        }
        if self.min_keep == 0 {
            return Err(PolicyError::ZeroMinKeep);
        }
        if self.keep_days < self.trim_days {
            return Err(PolicyError::KeepBeforeTrim {
                trim_days: self.trim_days,
                keep_days: self.keep_days,
            });
        }
        Ok(())
    }

    pub fn thresholds(&self, today: NaiveDate) -> Thresholds {
        Thresholds {
            trim: days_before(today, self.trim_days),
            keep: days_before(today, self.keep_days),
        }
    }
}

// a window of n days includes today, so the cutoff sits n - 1 days back
fn days_before(today: NaiveDate, window: u32) -> NaiveDate {
    let back = u64::from(window.saturating_sub(1));
    today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN)
}

/// Receives progress events from a retention pass.
///
/// All methods default to doing nothing so implementors only pick what they need.
pub trait PassReporter {
    fn bucket(&mut self, _owner: &str, _day: NaiveDate, _members: usize) {}
    fn override_applied(&mut self, _owner: &str, _promoted: usize) {}
    fn decided(&mut self, _owner: &str, _entry: &Classified) {}
}

pub struct NullReporter;

impl PassReporter for NullReporter {}

/// Forwards pass events to the `log` facade.
pub struct LogReporter;

impl PassReporter for LogReporter {
    fn bucket(&mut self, owner: &str, day: NaiveDate, members: usize) {
        log::debug!("{owner}: day bucket {day} holds {members} snapshot(s)");
    }

    fn override_applied(&mut self, owner: &str, promoted: usize) {
        log::debug!("{owner}: promoted {promoted} snapshot(s) to satisfy minimum keep");
    }

    fn decided(&mut self, owner: &str, entry: &Classified) {
        log::trace!(
            "{owner}: {} -> {} ({})",
            entry.snapshot.location.display(),
            entry.decision.as_str(),
            entry.reason.as_str()
        );
    }
}

/// Splits a flat discovery result into per-world collections.
///
/// Performs no deduplication, two artifacts of the same world always stay separate.
pub fn group_by_owner(snapshots: Vec<Snapshot>) -> BTreeMap<String, Vec<Snapshot>> {
    let mut groups: BTreeMap<String, Vec<Snapshot>> = BTreeMap::new();
    for snapshot in snapshots {
        groups.entry(snapshot.owner.clone()).or_default().push(snapshot);
    }
    groups
}

/// Keeps the `keep_last` most recently modified members of a bucket.
///
/// `stamps` is in arrival order and the returned decisions line up with it.
/// Among equal timestamps the earlier arrival wins.
pub fn dedupe(stamps: &[DateTime<FixedOffset>], keep_last: usize) -> Vec<Decision> {
    let mut order: Vec<usize> = (0..stamps.len()).collect();
    // stable, so ties keep arrival order
    order.sort_by(|&a, &b| stamps[b].cmp(&stamps[a]));

    let mut decisions = vec![Decision::Retain; stamps.len()];
    for &idx in order.iter().skip(keep_last) {
        decisions[idx] = Decision::Trim;
    }
    decisions
}

/// Runs the tiered policy over one world's snapshots.
///
/// The result is sorted newest first. Every input snapshot appears exactly once.
pub fn classify(
    mut snapshots: Vec<Snapshot>,
    policy: &RetentionPolicy,
    today: NaiveDate,
    reporter: &mut dyn PassReporter,
) -> Vec<Classified> {
    let thresholds = policy.thresholds(today);
    let owner = snapshots
        .first()
        .map(|s| s.owner.clone())
        .unwrap_or_default();

    // newest first, both the threshold pass and the override rely on this order
    snapshots.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));

    let mut outcome = vec![(Decision::Retain, Reason::Recent); snapshots.len()];
    let mut buckets: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();

    for (idx, snapshot) in snapshots.iter().enumerate() {
        let day = snapshot.modified_at.date_naive();
        if day < thresholds.keep {
            outcome[idx] = (Decision::Trim, Reason::BeyondHorizon);
        } else if day < thresholds.trim {
            buckets.entry(day).or_default().push(idx);
        }
    }

    for (day, members) in &buckets {
        reporter.bucket(&owner, *day, members.len());

        let stamps: Vec<DateTime<FixedOffset>> = members
            .iter()
            .map(|&idx| snapshots[idx].modified_at)
            .collect();

        for (&idx, verdict) in members.iter().zip(dedupe(&stamps, 1)) {
            outcome[idx] = match verdict {
                Decision::Retain => (Decision::Retain, Reason::DailySurvivor),
                Decision::Trim => (Decision::Trim, Reason::SameDayDuplicate),
            };
        }
    }

    let retained = outcome
        .iter()
        .filter(|(decision, _)| *decision == Decision::Retain)
        .count();

    if retained < policy.min_keep {
        let mut missing = policy.min_keep - retained;
        let mut promoted = 0;

        for entry in outcome.iter_mut() {
            if missing == 0 {
                break;
            }
            if entry.0 == Decision::Trim {
                *entry = (Decision::Retain, Reason::MinimumKeep);
                missing -= 1;
                promoted += 1;
            }
        }

        if promoted > 0 {
            reporter.override_applied(&owner, promoted);
        }
    }

    snapshots
        .into_iter()
        .zip(outcome)
        .map(|(snapshot, (decision, reason))| {
            let entry = Classified { snapshot, decision, reason };
            reporter.decided(&owner, &entry);
            entry
        })
        .collect()
}

/// The classified snapshots of a single world.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerPlan {
    pub owner: String,
    pub snapshots: Vec<Classified>,
}

impl OwnerPlan {
    pub fn retained(&self) -> impl Iterator<Item = &Classified> {
        self.snapshots.iter().filter(|c| c.decision == Decision::Retain)
    }

    pub fn trimmed(&self) -> impl Iterator<Item = &Classified> {
        self.snapshots.iter().filter(|c| c.decision == Decision::Trim)
    }

    pub fn bytes_to_free(&self) -> u64 {
        self.trimmed()
            .fold(0u64, |total, c| total.saturating_add(c.snapshot.size_bytes))
    }
}

/// Groups discovered snapshots by world and classifies every group.
pub fn plan(
    snapshots: Vec<Snapshot>,
    policy: &RetentionPolicy,
    today: NaiveDate,
    reporter: &mut dyn PassReporter,
) -> Vec<OwnerPlan> {
    group_by_owner(snapshots)
        .into_iter()
        .map(|(owner, group)| OwnerPlan {
            snapshots: classify(group, policy, today, reporter),
            owner,
        })
        .collect()
}
