use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "panorama-config")]
#[command(about = "Inspect and edit Panorama template stacks and device groups")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Check a template-stack JSON document for structural and variable problems.
    Validate(ValidateArgs),
    /// List variable definitions and per-device assignments of a stack.
    Vars(VarsArgs),
    /// Assign a variable value to one device in a stack document.
    SetVar(SetVarArgs),
    /// Print a stack document as a Panorama XML entry.
    Render(RenderArgs),
    /// Look up the parent of a device group on a live Panorama.
    ParentDg(ParentDgArgs),
    /// List template stacks on a live Panorama that include a template.
    StacksForTemplate(StacksForTemplateArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Template-stack JSON document.
    pub file: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Treat warnings as failures.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Debug)]
pub struct VarsArgs {
    pub file: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct SetVarArgs {
    pub file: PathBuf,
    /// Device serial number.
    #[arg(long)]
    pub device: String,
    /// Variable name, e.g. `$mgmt_ip`.
    #[arg(long)]
    pub name: String,
    /// Value to assign. For pre-shared keys this is the cleartext value.
    #[arg(long)]
    pub value: String,
    /// Fail instead of adding the device when it is not in the stack.
    #[arg(long)]
    pub no_create_device: bool,
    /// Write the updated document here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    pub file: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ParentDgArgs {
    /// Connection profile (TOML).
    #[arg(long)]
    pub config: PathBuf,
    pub device_group: String,
}

#[derive(Parser, Debug)]
pub struct StacksForTemplateArgs {
    /// Connection profile (TOML).
    #[arg(long)]
    pub config: PathBuf,
    pub template: String,
}
