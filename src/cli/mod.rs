use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "review-coach",
    about = "Simulated AI code-review walkthrough over demo pull-request scenarios"
)]
pub struct Cli {
    /// Scenario to open (defaults to the first in the catalog). Shorthand
    /// for `review --scenario <ID>`.
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// Start in generic review mode (project memory disabled).
    #[arg(long)]
    pub generic: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive walkthrough TUI (default).
    Review(ReviewArgs),
    /// List the available pull-request scenarios.
    List,
    /// Print PR metadata and the CI log for a scenario.
    Status(StatusArgs),
    /// Run the review pipeline headlessly, printing each step.
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Scenario to open.
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// Start in generic review mode (project memory disabled).
    #[arg(long)]
    pub generic: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Scenario to show (defaults to the first in the catalog).
    #[arg(short, long)]
    pub scenario: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario to run (defaults to the first in the catalog).
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// Run the generic pipeline (project memory disabled).
    #[arg(long)]
    pub generic: bool,
}

/// Parse CLI arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}
