use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;
mod gates;
mod human;
mod ledger;
mod lm;
mod prompts;
mod report;
mod templates;
mod util;
mod workflow;

use cli::{Command, InitArgs, RootArgs, RunArgs};
use human::Console;
use lm::{GenerationClient, RateLimiter};
use workflow::Workflow;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    let verbose = matches!(&args.command, Command::Run(run) if run.verbose);
    init_tracing(verbose);

    match args.command {
        Command::Init(args) => run_init(args),
        Command::Run(args) => run_run(args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_init(args: InitArgs) -> Result<()> {
    let path = match args.config {
        Some(path) => path,
        None => config::default_config_path()
            .ok_or_else(|| anyhow!("no config directory on this platform; pass --config"))?,
    };
    if path.exists() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    config::write_config(&path, &config::default_config())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn run_run(args: RunArgs) -> Result<()> {
    let (mut config, source) = config::resolve_config(args.config.as_deref())?;
    config::apply_lm_override(&mut config, args.lm.as_deref());
    config::validate_config(&config)?;
    match &source {
        Some(path) => tracing::info!(config = %path.display(), "loaded config"),
        None => tracing::info!("using built-in config defaults"),
    }

    // One limiter for every call this process makes.
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit.calls,
        Duration::from_secs(config.rate_limit.window_secs),
    ));
    let client = GenerationClient::from_config(&config, limiter)?;
    let mut human = Console::stdio();

    let report = Workflow::new(&config, &client, &mut human)
        .run()
        .context("run refinement workflow")?;

    if let Some(out) = &args.out {
        util::write_json(out, &report)?;
    }
    if args.json {
        let text = serde_json::to_string_pretty(&report).context("serialize run report")?;
        println!("{text}");
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}
