use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod live_cmd;
mod path_guard;
mod stack_cmd;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Validate(args) => stack_cmd::run_validate(args),
        Command::Vars(args) => stack_cmd::run_vars(args),
        Command::SetVar(args) => stack_cmd::run_set_var(args),
        Command::Render(args) => stack_cmd::run_render(args),
        Command::ParentDg(args) => live_cmd::run_parent_dg(args),
        Command::StacksForTemplate(args) => live_cmd::run_stacks_for_template(args),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
