//! JSON output for retention plans.
//!
//! Serializes plans for scripting and piping.

use serde::Serialize;

use crate::clean::CleanResult;
use crate::retention::OwnerPlan;

#[derive(Serialize)]
struct WorldSummary<'a> {
    world: &'a str,
    snapshots: usize,
    retained: usize,
    trimmed: usize,
    bytes_to_free: u64,
}

#[derive(Serialize)]
struct PruneOutput<'a> {
    dry_run: bool,
    worlds: &'a [OwnerPlan],
    clean: &'a CleanResult,
}

pub fn render_prune(plans: &[OwnerPlan], result: &CleanResult, dry_run: bool) -> String {
    let output = PruneOutput {
        dry_run,
        worlds: plans,
        clean: result,
    };

    serde_json::to_string_pretty(&output).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

pub fn render_listing(plans: &[OwnerPlan]) -> String {
    let summaries: Vec<WorldSummary> = plans
        .iter()
        .map(|plan| WorldSummary {
            world: &plan.owner,
            snapshots: plan.snapshots.len(),
            retained: plan.retained().count(),
            trimmed: plan.trimmed().count(),
            bytes_to_free: plan.bytes_to_free(),
        })
        .collect();

    serde_json::to_string_pretty(&summaries).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}
