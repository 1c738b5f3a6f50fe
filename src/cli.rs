//! CLI argument parsing for the refinement workflow.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "draftloop",
    version,
    about = "Iterative draft refinement with automated reviewers and a human sign-off",
    after_help = "Commands:\n  init [--config <path>]                Write the default config\n  run [--config <path>] [--lm <cmd>]   Refine one draft interactively\n\nExamples:\n  draftloop init\n  draftloop run --lm \"ollama run llama3\"\n  draftloop run --json --out /tmp/run.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Run(RunArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Write the default workflow config")]
pub struct InitArgs {
    /// Config path (defaults to <config dir>/draftloop/config.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Refine one draft interactively (prompts on stderr, report on stdout)")]
pub struct RunArgs {
    /// Config path; built-in defaults apply when omitted and none is installed
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Generation command (prompt on stdin, reply on stdout); overrides the config backend
    #[arg(long, value_name = "CMD")]
    pub lm: Option<String>,

    /// Emit the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON report to this path
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG wins when set)
    #[arg(long)]
    pub verbose: bool,
}
