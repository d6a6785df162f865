use assert_cmd::Command;
use predicates::prelude::*;

fn review_coach() -> Command {
    Command::cargo_bin("review-coach").unwrap()
}

#[test]
fn list_shows_both_scenarios() {
    review_coach()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("acme/payments-api"))
        .stdout(predicate::str::contains("acme/search-api"))
        .stdout(predicate::str::contains("PR #184"));
}

#[test]
fn status_defaults_to_the_first_scenario() {
    review_coach()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("acme/payments-api • PR #184"))
        .stdout(predicate::str::contains("CI failing"))
        .stdout(predicate::str::contains("FAIL  tests/refunds.spec.ts"));
}

#[test]
fn status_accepts_a_scenario_id() {
    review_coach()
        .args(["status", "--scenario", "s2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme/search-api • PR #207"))
        .stdout(predicate::str::contains("CI passing"));
}

#[test]
fn unknown_scenario_is_a_hard_error_on_the_cli() {
    review_coach()
        .args(["status", "--scenario", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown scenario 'nope'"));
}

#[test]
fn headless_run_prints_every_step_and_the_check_state() {
    review_coach()
        .args(["run", "--scenario", "s2", "--generic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(generic)"))
        .stdout(predicate::str::contains("Ingest PR Event"))
        .stdout(predicate::str::contains("Index Repo Context"))
        .stdout(predicate::str::contains("Retrieve Project Memory"))
        .stdout(predicate::str::contains("Run Analyzers"))
        .stdout(predicate::str::contains("Generate Review + Patches"))
        .stdout(predicate::str::contains("Post Back to PR"))
        .stdout(predicate::str::contains("Checks Passed"));
}

#[test]
fn headless_run_reports_failing_checks_for_s1() {
    review_coach()
        .args(["run", "--scenario", "s1", "--generic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checks Failed"));
}
