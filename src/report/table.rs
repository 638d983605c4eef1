//! Terminal table rendering for retention plans.
//!
//! One section per world, newest snapshot first, with per-world and
//! grand totals of the space a prune would free.

use chrono::{DateTime, FixedOffset};

use crate::retention::{Decision, OwnerPlan};
use crate::util::{format_age, format_bytes};

const STAMP: &str = "%Y-%m-%d %H:%M";

pub fn render_plan(plans: &[OwnerPlan], now: DateTime<FixedOffset>) -> String {
    if plans.is_empty() {
        return String::from("No snapshots found.\n");
    }

    let mut output = String::new();
    let mut grand_total: u64 = 0;

    for plan in plans {
        let to_free = plan.bytes_to_free();
        grand_total = grand_total.saturating_add(to_free);

        output.push_str(&format!("\n{}\n", plan.owner));
        output.push_str(&"-".repeat(72));
        output.push('\n');

        for entry in &plan.snapshots {
            let marker = match entry.decision {
                Decision::Retain => "keep",
                Decision::Trim => "TRIM",
            };
            output.push_str(&format!(
                "  {:<4} {:<16} {:>16} {:>10}  {}\n",
                marker,
                entry.snapshot.modified_at.format(STAMP),
                format_age(now, entry.snapshot.modified_at),
                format_bytes(entry.snapshot.size_bytes),
                entry.reason.as_str()
            ));
        }

        output.push_str(&format!(
            "  {} kept, {} trimmed, {} to free\n",
            plan.retained().count(),
            plan.trimmed().count(),
            format_bytes(to_free)
        ));
    }

    output.push_str(&format!(
        "\n{:>72}\n",
        format!("TOTAL TO FREE: {}", format_bytes(grand_total))
    ));

    output
}

pub fn render_listing(plans: &[OwnerPlan]) -> String {
    if plans.is_empty() {
        return String::from("No snapshots found.\n");
    }

    let mut output = format!(
        "{:<24} {:>6} {:<16} {:<16} {:>10}\n",
        "World", "Count", "Newest", "Oldest", "Size"
    );
    output.push_str(&"-".repeat(76));
    output.push('\n');

    for plan in plans {
        let total: u64 = plan
            .snapshots
            .iter()
            .fold(0u64, |sum, c| sum.saturating_add(c.snapshot.size_bytes));
        let newest = plan.snapshots.first().map(|c| stamp(c.snapshot.modified_at));
        let oldest = plan.snapshots.last().map(|c| stamp(c.snapshot.modified_at));

        output.push_str(&format!(
            "{:<24} {:>6} {:<16} {:<16} {:>10}\n",
            truncate(&plan.owner, 24),
            plan.snapshots.len(),
            newest.unwrap_or_default(),
            oldest.unwrap_or_default(),
            format_bytes(total)
        ));
    }

    output
}

fn stamp(at: DateTime<FixedOffset>) -> String {
    at.format(STAMP).to_string()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
