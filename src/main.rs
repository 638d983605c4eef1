use chrono::Local;
use clap::Parser;
use env_logger::{Builder, Env};
use log::{error, info};
use worldtrim::cli::{Cli, Command};
use worldtrim::clean::{self, CleanMode};
use worldtrim::config::{Config, FileConfig};
use worldtrim::discover;
use worldtrim::perms;
use worldtrim::report;
use worldtrim::retention::{self, LogReporter, NullReporter};
use worldtrim::Result;

fn init_logger(verbose: bool) {
    // RUST_LOG still wins, e.g. RUST_LOG=trace shows every decision
    let level = if verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    message
}

fn run(cli: Cli) -> Result<()> {
    let file = FileConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Prune(args) => {
            let config = Config::from_prune_args(&args, &file)?;
            let snapshots = discover::discover(&config.folder)?;

            let now = Local::now().fixed_offset();
            let plans = retention::plan(snapshots, &config.policy, now.date_naive(), &mut LogReporter);

            let mode = if config.dry_run {
                CleanMode::DryRun
            } else {
                CleanMode::Execute
            };
            let result = clean::run(&plans, mode);

            report::print_prune(&plans, &result, &config, now);
        }
        Command::List(args) => {
            let config = Config::from_list_args(&args, &file)?;
            let snapshots = discover::discover(&config.folder)?;
            let today = Local::now().date_naive();
            let plans = retention::plan(snapshots, &config.policy, today, &mut NullReporter);

            report::print_listing(&plans, &config);
        }
        Command::FixPerms(args) => {
            let config = Config::from_perms_args(&args, &file)?;
            let snapshots = discover::discover(&config.folder)?;
            let result = perms::apply(&snapshots, &config.ownership);

            info!(
                "updated {} path(s) across {} snapshot(s), {} error(s)",
                result.changed,
                snapshots.len(),
                result.errors.len()
            );
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = run(cli) {
        error!("{}", error_chain(&e));
        std::process::exit(1);
    }
}
