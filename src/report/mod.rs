pub mod table;
pub mod json;

use chrono::{DateTime, FixedOffset};

use crate::clean::CleanResult;
use crate::config::Config;
use crate::retention::OwnerPlan;
use crate::util::format_bytes;

/// Prints a finished prune: the plan followed by what cleanup did.
pub fn print_prune(plans: &[OwnerPlan], result: &CleanResult, config: &Config, now: DateTime<FixedOffset>) {
    if config.json_output {
        println!("{}", json::render_prune(plans, result, config.dry_run));
    } else {
        print!("{}", table::render_plan(plans, now));
        print_clean(result, config.dry_run);
    }
}

pub fn print_listing(plans: &[OwnerPlan], config: &Config) {
    if config.json_output {
        println!("{}", json::render_listing(plans));
    } else {
        print!("{}", table::render_listing(plans));
    }
}

fn print_clean(result: &CleanResult, dry_run: bool) {
    if !result.errors.is_empty() {
        eprintln!("\nerrors encountered:");
        for error in &result.errors {
            eprintln!("  {error}");
        }
    }

    if dry_run {
        println!("\nwould free: {}", format_bytes(result.bytes_freed));
    } else {
        println!(
            "\ndeleted {} snapshot(s), freed: {}",
            result.deleted.len(),
            format_bytes(result.bytes_freed)
        );
    }
}
