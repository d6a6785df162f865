use anyhow::{Context, Result, bail};
use std::time::{Duration, Instant};

use review_coach::cli::{self, Commands};
use review_coach::pipeline::{STEP_COUNT, StepId};
use review_coach::scenario::Catalog;
use review_coach::session::ReviewSession;
use review_coach::tui::{App, run_tui};
use review_coach::{CiStatus, StepStatus};

fn main() -> Result<()> {
    let args = cli::parse_args();

    match args.command {
        None => handle_review(args.scenario.as_deref(), args.generic),
        Some(Commands::Review(review_args)) => {
            handle_review(review_args.scenario.as_deref(), review_args.generic)
        }
        Some(Commands::List) => handle_list(),
        Some(Commands::Status(status_args)) => handle_status(status_args.scenario.as_deref()),
        Some(Commands::Run(run_args)) => {
            handle_run(run_args.scenario.as_deref(), run_args.generic)
        }
    }
}

/// Build a session positioned on the requested scenario. Unlike the
/// in-session operations, an unknown id given on the command line is a
/// hard error.
fn new_session(scenario: Option<&str>, generic: bool) -> Result<ReviewSession> {
    let catalog = Catalog::builtin().context("Failed to load the scenario catalog")?;
    if let Some(id) = scenario
        && catalog.get(id).is_none()
    {
        bail!("Unknown scenario '{id}'. Run `review-coach list` to see what is available");
    }

    let mut session = ReviewSession::new(catalog);
    if let Some(id) = scenario {
        session.select_scenario(id);
    }
    if generic {
        session.toggle_memory();
    }
    Ok(session)
}

/// Launch the interactive TUI.
fn handle_review(scenario: Option<&str>, generic: bool) -> Result<()> {
    let session = new_session(scenario, generic)?;
    run_tui(App::new(session))
}

/// Print the scenario catalog.
fn handle_list() -> Result<()> {
    let catalog = Catalog::builtin().context("Failed to load the scenario catalog")?;

    println!("Available scenarios");
    println!("───────────────────────────────────────");
    for scenario in catalog.scenarios() {
        let ci = match scenario.ci.status {
            CiStatus::Passing => "passing",
            CiStatus::Failing => "failing",
        };
        println!(
            "  {:<4} {} • PR #{} • CI {} • {} files +{}/-{}",
            scenario.id,
            scenario.repo,
            scenario.pr_number,
            ci,
            scenario.changed_files,
            scenario.additions,
            scenario.deletions
        );
        println!("       {}", scenario.name);
    }
    Ok(())
}

/// Print PR metadata and the CI log for one scenario.
fn handle_status(scenario: Option<&str>) -> Result<()> {
    let session = new_session(scenario, false)?;
    let scenario = session.scenario();

    println!("{} • PR #{}", scenario.repo, scenario.pr_number);
    println!(
        "{} • {} • by {}",
        scenario.branch,
        scenario.languages.join(", "),
        scenario.author
    );
    println!(
        "{} files changed, +{} / -{}",
        scenario.changed_files, scenario.additions, scenario.deletions
    );
    println!("───────────────────────────────────────");
    let ci = match scenario.ci.status {
        CiStatus::Passing => "✓ CI passing",
        CiStatus::Failing => "✗ CI failing",
    };
    println!("{ci} - {}", scenario.ci.summary);
    for line in &scenario.ci.logs {
        println!("  {line}");
    }
    Ok(())
}

/// Drive the simulated pipeline to completion without the TUI, printing
/// each step as it finishes.
fn handle_run(scenario: Option<&str>, generic: bool) -> Result<()> {
    let mut session = new_session(scenario, generic)?;
    {
        let scenario = session.scenario();
        let mode = if session.memory_enabled() {
            "with project memory"
        } else {
            "generic"
        };
        println!(
            "Reviewing {} PR #{} ({})",
            scenario.repo, scenario.pr_number, mode
        );
    }

    session.start_run(Instant::now());

    let mut printed = [false; STEP_COUNT];
    while session.is_running() {
        std::thread::sleep(Duration::from_millis(25));
        session.tick(Instant::now());

        for step in StepId::ALL {
            if session.step_status(step) == StepStatus::Done && !printed[step.index()] {
                printed[step.index()] = true;
                println!("  ✓ {:<28} {}", step.label(), step.description());
            }
        }
    }

    println!("───────────────────────────────────────");
    println!("{}", session.check_state().label());
    Ok(())
}
