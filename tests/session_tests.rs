use std::time::{Duration, Instant};

use review_coach::pipeline::StepId;
use review_coach::scenario::Catalog;
use review_coach::session::ReviewSession;
use review_coach::{CheckState, StepStatus};

fn session() -> ReviewSession {
    ReviewSession::new(Catalog::builtin().unwrap())
}

/// Total simulated run duration for the given memory mode.
fn run_duration(memory: bool) -> Duration {
    StepId::ALL
        .iter()
        .map(|step| step.latency(memory))
        .sum::<Duration>()
}

#[test]
fn filtered_comments_only_target_the_selected_file() {
    let mut s = session();
    let scenario_ids: Vec<String> = s
        .catalog()
        .scenarios()
        .iter()
        .map(|sc| sc.id.clone())
        .collect();

    for id in scenario_ids {
        s.select_scenario(&id);
        for memory in [true, false] {
            if s.memory_enabled() != memory {
                s.toggle_memory();
            }
            let paths: Vec<String> = s.scenario().diff.iter().map(|f| f.path.clone()).collect();
            for path in paths {
                s.select_file(&path);
                for comment in s.comments_for_selected_file() {
                    assert_eq!(comment.file_path, path);
                }
            }
        }
    }
}

#[test]
fn filtered_comments_are_ordered_by_descending_risk() {
    let mut s = session();
    let scenario_ids: Vec<String> = s
        .catalog()
        .scenarios()
        .iter()
        .map(|sc| sc.id.clone())
        .collect();

    for id in scenario_ids {
        s.select_scenario(&id);
        for memory in [true, false] {
            if s.memory_enabled() != memory {
                s.toggle_memory();
            }
            let paths: Vec<String> = s.scenario().diff.iter().map(|f| f.path.clone()).collect();
            for path in paths {
                s.select_file(&path);
                let ordered = s.comments_for_selected_file();
                for pair in ordered.windows(2) {
                    assert!(pair[0].risk_score >= pair[1].risk_score);
                }
            }
        }
    }
}

#[test]
fn equal_risk_comments_keep_fixture_order() {
    let mut s = session();
    s.select_scenario("s2");
    s.toggle_memory(); // generic bundle has the tied pair
    s.select_file("internal/cache/ttl.go");

    let ids: Vec<&str> = s
        .comments_for_selected_file()
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    // g2 and g3 both score 30; the sort must keep their authored order.
    assert_eq!(ids, vec!["g1", "g2", "g3"]);
}

#[test]
fn apply_patch_twice_is_the_same_as_once() {
    let mut s = session();
    let t0 = Instant::now();
    s.apply_patch("p1m", t0);
    let commit_after_first = s.bot_commit().map(str::to_string);
    s.apply_patch("p1m", t0 + Duration::from_millis(100));

    assert_eq!(s.applied_count(), 1);
    assert!(s.is_applied("p1m"));
    assert_eq!(s.bot_commit().map(str::to_string), commit_after_first);
    assert_eq!(s.check_state(), CheckState::Pending);

    // The first apply's timer still completes on schedule.
    s.tick(t0 + Duration::from_millis(900));
    assert_eq!(s.check_state(), CheckState::Passed);
}

#[test]
fn highest_risk_comment_is_auto_selected_after_file_switch() {
    let mut s = session();
    s.select_file("tests/refunds.spec.ts");
    s.select_file("src/refunds/refund.service.ts");

    let expected: Vec<&str> = s
        .comments_for_selected_file()
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(expected, vec!["c1m", "c3m"]);
    assert_eq!(s.effective_selected_comment().unwrap().id, "c1m");
}

#[test]
fn second_run_invalidates_the_first() {
    let mut s = session();
    let t0 = Instant::now();
    s.start_run(t0);

    // Partway through the first run.
    s.tick(t0 + Duration::from_millis(500));
    assert_eq!(s.step_status(StepId::Ingest), StepStatus::Done);
    assert_eq!(s.step_status(StepId::Index), StepStatus::Running);

    // Restart: only the second run's transitions may be visible.
    let t1 = t0 + Duration::from_millis(600);
    s.start_run(t1);
    assert_eq!(s.step_status(StepId::Ingest), StepStatus::Running);
    for step in &StepId::ALL[1..] {
        assert_eq!(s.step_status(*step), StepStatus::Idle);
    }

    s.tick(t1 + run_duration(true));
    assert!(!s.is_running());
    for step in StepId::ALL {
        assert_eq!(s.step_status(step), StepStatus::Done);
    }
}

#[test]
fn s1_with_memory_has_three_hits_and_risk_ordering() {
    let s = session();
    assert_eq!(s.scenario().id, "s1");
    assert!(s.memory_enabled());
    assert_eq!(s.active_memory_hits().len(), 3);

    let ids: Vec<&str> = s
        .comments_for_selected_file()
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    // c1m (risk 90) must come before c3m (risk 22).
    assert_eq!(ids, vec!["c1m", "c3m"]);
}

#[test]
fn applying_p1_on_failed_checks_goes_pending_then_passed() {
    let mut s = session();
    s.toggle_memory(); // p1 lives in the generic bundle
    assert_eq!(s.check_state(), CheckState::Failed);

    let t0 = Instant::now();
    s.apply_patch("p1", t0);
    assert_eq!(s.check_state(), CheckState::Pending);

    s.tick(t0 + Duration::from_millis(899));
    assert_eq!(s.check_state(), CheckState::Pending);

    s.tick(t0 + Duration::from_millis(900));
    assert_eq!(s.check_state(), CheckState::Passed);
}

#[test]
fn applying_a_patch_on_passing_checks_changes_nothing() {
    let mut s = session();
    s.select_scenario("s2");
    assert_eq!(s.check_state(), CheckState::Passed);

    let t0 = Instant::now();
    s.apply_patch("q1m", t0);
    assert_eq!(s.check_state(), CheckState::Passed);
    assert!(s.is_applied("q1m"));

    s.tick(t0 + Duration::from_secs(5));
    assert_eq!(s.check_state(), CheckState::Passed);
}

#[test]
fn unknown_scenario_leaves_state_unchanged() {
    let mut s = session();
    s.select_file("tests/refunds.spec.ts");
    s.select_comment("c2m");
    s.apply_patch("p1m", Instant::now());
    let generation = s.generation();

    s.select_scenario("does-not-exist");

    assert_eq!(s.scenario().id, "s1");
    assert_eq!(s.selected_file(), "tests/refunds.spec.ts");
    assert_eq!(s.selected_comment_id(), Some("c2m"));
    assert!(s.is_applied("p1m"));
    assert_eq!(s.generation(), generation);
}

#[test]
fn scenario_switch_cancels_an_inflight_run() {
    let mut s = session();
    let t0 = Instant::now();
    s.start_run(t0);
    s.tick(t0 + Duration::from_millis(500));

    s.select_scenario("s2");
    assert!(!s.is_running());

    // The abandoned run's deadlines must not fire on the new scenario.
    s.tick(t0 + Duration::from_secs(30));
    for step in StepId::ALL {
        assert_eq!(s.step_status(step), StepStatus::Idle);
    }
}

#[test]
fn scenario_switch_resets_runtime_state() {
    let mut s = session();
    s.select_comment("c3m");
    s.apply_patch("p1m", Instant::now());

    s.select_scenario("s2");
    assert_eq!(s.selected_file(), "internal/cache/ttl.go");
    assert_eq!(s.selected_comment_id(), None);
    assert_eq!(s.applied_count(), 0);
    assert_eq!(s.bot_commit(), None);
    assert_eq!(s.check_state(), CheckState::Passed);
}

#[test]
fn stale_comment_selection_falls_back_after_bundle_toggle() {
    let mut s = session();
    s.select_comment("c1m");
    s.toggle_memory(); // generic bundle has no c1m
    assert_eq!(s.effective_selected_comment().unwrap().id, "c1");
}

#[test]
fn memory_run_takes_longer_than_generic() {
    let with_memory = run_duration(true);
    let generic = run_duration(false);
    assert!(with_memory > generic);

    let mut s = session();
    let t0 = Instant::now();
    s.start_run(t0);
    s.tick(t0 + with_memory - Duration::from_millis(1));
    assert!(s.is_running());
    s.tick(t0 + with_memory);
    assert!(!s.is_running());
}
