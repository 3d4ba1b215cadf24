use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gauntlet",
    version,
    about = "Evaluation harness for tool-using LLM agents: suites, prompt variants, tool mocking, and composable judges"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run an eval suite and save scored results
    Run(RunArgs),
    /// Compare two run result files
    Diff(DiffArgs),
    /// Interactively grade flagged cases from a run
    Review(ReviewArgs),
    /// List available prompts or suites
    List(ListArgs),
    /// Validate config, suite, and prompt files
    Validate(ValidateArgs),
    /// Scaffold a new eval project
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the eval suite YAML file
    #[arg(short, long)]
    pub suite: PathBuf,

    /// Override the prompt variant named by the suite
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Directory holding prompt variant files
    #[arg(long, default_value = "prompts")]
    pub prompts_dir: PathBuf,

    /// Provider to run against (a key in the config's providers map, or "fake")
    #[arg(long, default_value = "anthropic")]
    pub provider: String,

    /// Override the provider's configured model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to the config file
    #[arg(short, long, default_value = "gauntlet.yaml")]
    pub config: PathBuf,

    /// Max concurrent cases (0 = config default)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub concurrency: usize,

    /// Only run cases carrying one of these tags (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Composite pass threshold (0 = default 0.5)
    #[arg(long, default_value_t = 0.0)]
    pub threshold: f64,

    /// Output file path (default: <output_dir>/<timestamp>-<suite>.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print per-case details after the summary table
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable ANSI colors
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Baseline run result JSON
    pub run_a: PathBuf,
    /// Candidate run result JSON
    pub run_b: PathBuf,

    /// Minimum absolute score delta to count as a change
    #[arg(long, default_value_t = 0.0)]
    pub threshold: f64,

    /// Output format: table or json
    #[arg(long, default_value = "table")]
    pub format: String,

    /// Only show these categories (comma separated:
    /// improved,regressed,unchanged,new,removed)
    #[arg(long, value_delimiter = ',')]
    pub filter: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Run result JSON to review; grades are written back to this file
    pub run: PathBuf,

    /// Which cases to surface: review, fail, or all
    #[arg(long, default_value = "review")]
    pub filter: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(subcommand)]
    pub cmd: ListSub,
}

#[derive(Subcommand, Debug)]
pub enum ListSub {
    /// List prompt variants
    Prompts(ListDirArgs),
    /// List eval suites
    Suites(ListDirArgs),
}

#[derive(Args, Debug)]
pub struct ListDirArgs {
    /// Base directory to search
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Suite file to validate
    #[arg(short, long)]
    pub suite: Option<PathBuf>,

    /// Config file to validate
    #[arg(short, long, default_value = "gauntlet.yaml")]
    pub config: PathBuf,

    /// Directory holding prompt variant files; referenced prompts are
    /// checked when a suite is given
    #[arg(long, default_value = "prompts")]
    pub prompts_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to scaffold into
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}
