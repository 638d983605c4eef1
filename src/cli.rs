use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "worldtrim")]
#[command(about = "Prunes world backup snapshots with a tiered retention policy")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logging
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decide which snapshots to keep and delete the rest
    Prune(PruneArgs),

    /// Show discovered worlds and their snapshots
    List(ListArgs),

    /// Apply owner, group and mode to every snapshot
    FixPerms(FixPermsArgs),
}

#[derive(Parser)]
pub struct PruneArgs {
    /// Backup folder to prune
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Days (including today) in which every snapshot is kept
    #[arg(long)]
    pub trim_days: Option<u32>,

    /// Days (including today) after which snapshots are deleted
    #[arg(long)]
    pub keep_days: Option<u32>,

    /// Snapshots to keep per world regardless of age
    #[arg(long)]
    pub min_keep: Option<usize>,

    /// Only report what would be deleted
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Output the plan as JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Backup folder to inspect
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct FixPermsArgs {
    /// Backup folder whose snapshots are updated
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Numeric owner id
    #[arg(long)]
    pub uid: Option<u32>,

    /// Numeric group id
    #[arg(long)]
    pub gid: Option<u32>,

    /// Octal permission bits, e.g. 0644
    #[arg(long)]
    pub mode: Option<String>,
}
