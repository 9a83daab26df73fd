//! StoreSweep CLI - Bulk Compare and ACL Repair
//!
//! Walks paginated storage listings and applies compare or set-ACL actions
//! under bounded concurrency, one job at a time.

use anyhow::Context;
use clap::Parser;
use std::time::Duration;
use storesweep::config::{resolve_bindings, CliArgs, Commands, EnvConfig, ExclusionRules};
use storesweep::engine::{plan_jobs, run_jobs, JobOperation, PairingRule, RunOptions};
use storesweep::storage::AclSpec;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let mut configs = Vec::new();
    for path in &args.configs {
        let config = EnvConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?;
        configs.push(config);
    }

    match args.command.clone() {
        Commands::Compare {
            storage,
            dir,
            recursive,
            mode,
            concurrency,
            page_size,
            report_interval,
        } => {
            let bindings = resolve_bindings(&configs, &storage).await?;
            let rules = ExclusionRules::from_configs(&configs)?;

            let jobs = plan_jobs(
                &bindings,
                PairingRule::EveryOrderedPair,
                JobOperation::Compare(mode),
                &dir,
                recursive,
                |src, dst| rules.is_excluded(src, dst),
            );
            if jobs.is_empty() {
                anyhow::bail!("no comparison jobs detected, see --help");
            }

            execute(jobs, concurrency, page_size, report_interval, args.quiet).await
        }
        Commands::Acl {
            dir,
            storage,
            acl,
            recursive,
            concurrency,
            page_size,
            report_interval,
        } => {
            let bindings = resolve_bindings(&configs, &storage).await?;

            let jobs = plan_jobs(
                &bindings,
                PairingRule::EachSingle,
                JobOperation::SetAcl(AclSpec::new(acl)),
                &dir,
                recursive,
                |_, _| false,
            );
            if jobs.is_empty() {
                anyhow::bail!("no ACL jobs detected, see --help");
            }

            execute(jobs, concurrency, page_size, report_interval, args.quiet).await
        }
    }
}

async fn execute(
    jobs: Vec<storesweep::Job>,
    concurrency: usize,
    page_size: usize,
    report_interval: u64,
    quiet: bool,
) -> anyhow::Result<()> {
    let options = RunOptions {
        concurrency_limit: concurrency,
        page_size_limit: page_size,
        report_interval: Duration::from_secs(report_interval.max(1)),
    };

    let report = run_jobs(jobs, options).await;
    if !quiet || !report.is_success() {
        report.print_summary();
    }

    match report.error {
        None => Ok(()),
        Some(e) => Err(e.into()),
    }
}
