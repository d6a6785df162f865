use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::pipeline::{STEP_COUNT, StepId};
use crate::scenario::{Catalog, MemoryHit, Patch, ReviewBundle, ReviewComment, Scenario};
use crate::{CheckState, StepStatus};

/// Delay before a simulated check run flips from pending to passed.
const CHECK_PASS_DELAY: Duration = Duration::from_millis(900);

/// An in-flight simulated pipeline run.
///
/// `token` is the generation the run was started under; a transition is
/// only committed while it still matches the session's current
/// generation. `memory` is the memory flag captured at start so that
/// toggling mid-run does not change step latencies.
#[derive(Debug, Clone)]
struct PipelineRun {
    token: u64,
    step: usize,
    deadline: Instant,
    memory: bool,
}

/// A scheduled `Pending -> Passed` check transition, bound to the
/// generation it was scheduled under.
#[derive(Debug, Clone)]
struct PendingCheck {
    token: u64,
    due: Instant,
}

/// Owns all mutable walkthrough state and the pure derivations over the
/// immutable scenario catalog.
///
/// Time never advances on its own: callers pass `Instant`s into the
/// operations and pump `tick` from their event loop. Every deferred
/// transition re-checks its generation token before committing, so a
/// restart, reset, or scenario switch cancels stale timers by simply
/// bumping the generation.
pub struct ReviewSession {
    catalog: Catalog,
    scenario_idx: usize,
    memory_enabled: bool,
    step_status: [StepStatus; STEP_COUNT],
    selected_file: String,
    selected_comment: Option<String>,
    applied_patches: BTreeSet<String>,
    check_state: CheckState,
    bot_commit: Option<String>,
    generation: u64,
    run: Option<PipelineRun>,
    pending_check: Option<PendingCheck>,
}

impl ReviewSession {
    /// Start a session on the catalog's first scenario with project
    /// memory enabled.
    pub fn new(catalog: Catalog) -> Self {
        let first = catalog.first();
        let selected_file = first.first_file().to_string();
        let check_state = CheckState::from_ci(first.ci.status);
        Self {
            catalog,
            scenario_idx: 0,
            memory_enabled: true,
            step_status: [StepStatus::Idle; STEP_COUNT],
            selected_file,
            selected_comment: None,
            applied_patches: BTreeSet::new(),
            check_state,
            bot_commit: None,
            generation: 0,
            run: None,
            pending_check: None,
        }
    }

    // ── Operations ──

    /// Switch scenarios, discarding all runtime state. Unknown ids and
    /// re-selecting the current scenario are no-ops.
    pub fn select_scenario(&mut self, id: &str) {
        let Some(idx) = self.catalog.position(id) else {
            return;
        };
        if idx == self.scenario_idx {
            return;
        }
        self.scenario_idx = idx;

        let scenario = &self.catalog.scenarios()[self.scenario_idx];
        let first_file = scenario.first_file().to_string();
        let check_state = CheckState::from_ci(scenario.ci.status);

        self.generation += 1;
        self.run = None;
        self.pending_check = None;
        self.step_status = [StepStatus::Idle; STEP_COUNT];
        self.selected_file = first_file;
        self.selected_comment = None;
        self.applied_patches.clear();
        self.bot_commit = None;
        self.check_state = check_state;
    }

    /// Flip between the memory-augmented and generic review bundles.
    /// Selection state is kept; the effective-comment derivation falls
    /// back if the selected id does not exist in the other bundle.
    pub fn toggle_memory(&mut self) {
        self.memory_enabled = !self.memory_enabled;
    }

    /// Start (or restart) the simulated pipeline. A run already in
    /// flight is invalidated; only the new run's transitions will
    /// survive token checks.
    pub fn start_run(&mut self, now: Instant) {
        self.generation += 1;
        self.step_status = [StepStatus::Idle; STEP_COUNT];

        let first = StepId::ALL[0];
        self.step_status[0] = StepStatus::Running;
        self.run = Some(PipelineRun {
            token: self.generation,
            step: 0,
            deadline: now + first.latency(self.memory_enabled),
            memory: self.memory_enabled,
        });
    }

    /// Abandon the current run and return every step to idle.
    pub fn reset_run(&mut self) {
        self.generation += 1;
        self.run = None;
        self.step_status = [StepStatus::Idle; STEP_COUNT];
    }

    /// Select a file; comment selection is cleared so the
    /// highest-risk comment of the new file is auto-selected on the
    /// next read.
    pub fn select_file(&mut self, path: &str) {
        self.selected_file = path.to_string();
        self.selected_comment = None;
    }

    /// Select a comment by id. Not validated here; a stale id is
    /// tolerated by the effective-comment fallback.
    pub fn select_comment(&mut self, id: &str) {
        self.selected_comment = Some(id.to_string());
    }

    /// Apply a suggested patch from the active bundle. Unknown ids are
    /// ignored; re-applying is a no-op beyond refreshing the bot-commit
    /// marker. Applying while checks are failed moves them to pending,
    /// with the passed transition scheduled after a fixed delay.
    pub fn apply_patch(&mut self, patch_id: &str, now: Instant) {
        let Some(patch) = self.patch(patch_id) else {
            return;
        };
        let marker = format!(
            "review-coach-bot: apply \"{}\" ({})",
            patch.title,
            short_commit_id(&patch.unified_diff)
        );

        self.applied_patches.insert(patch_id.to_string());
        self.bot_commit = Some(marker);

        if self.check_state == CheckState::Failed {
            self.check_state = CheckState::Pending;
            self.pending_check = Some(PendingCheck {
                token: self.generation,
                due: now + CHECK_PASS_DELAY,
            });
        }
    }

    /// Commit every elapsed, generation-valid deferred transition.
    /// Stale timers (token mismatch) are dropped without effect.
    pub fn tick(&mut self, now: Instant) {
        self.advance_run(now);
        self.advance_check(now);
    }

    fn advance_run(&mut self, now: Instant) {
        loop {
            let Some(run) = &self.run else {
                return;
            };
            if run.token != self.generation {
                self.run = None;
                return;
            }
            if now < run.deadline {
                return;
            }

            let (step, deadline, memory) = (run.step, run.deadline, run.memory);
            self.step_status[step] = StepStatus::Done;

            if step + 1 < STEP_COUNT {
                // Chain the next deadline off the previous one so poll
                // granularity does not stretch the schedule.
                let next = StepId::ALL[step + 1];
                self.step_status[step + 1] = StepStatus::Running;
                self.run = Some(PipelineRun {
                    token: self.generation,
                    step: step + 1,
                    deadline: deadline + next.latency(memory),
                    memory,
                });
            } else {
                // Run complete: checks reflect the scenario's static CI
                // result until a patch is applied.
                self.run = None;
                let ci = self.catalog.scenarios()[self.scenario_idx].ci.status;
                self.check_state = CheckState::from_ci(ci);
            }
        }
    }

    fn advance_check(&mut self, now: Instant) {
        let Some(check) = &self.pending_check else {
            return;
        };
        if check.token != self.generation {
            self.pending_check = None;
            return;
        }
        if now < check.due {
            return;
        }
        self.pending_check = None;
        self.check_state = CheckState::Passed;
    }

    // ── Derivations ──

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn scenario(&self) -> &Scenario {
        &self.catalog.scenarios()[self.scenario_idx]
    }

    pub fn memory_enabled(&self) -> bool {
        self.memory_enabled
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn step_status(&self, step: StepId) -> StepStatus {
        self.step_status[step.index()]
    }

    pub fn check_state(&self) -> CheckState {
        self.check_state
    }

    pub fn bot_commit(&self) -> Option<&str> {
        self.bot_commit.as_deref()
    }

    pub fn selected_file(&self) -> &str {
        &self.selected_file
    }

    pub fn selected_comment_id(&self) -> Option<&str> {
        self.selected_comment.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn active_bundle(&self) -> &ReviewBundle {
        let scenario = self.scenario();
        if self.memory_enabled {
            &scenario.with_memory
        } else {
            &scenario.generic
        }
    }

    pub fn active_comments(&self) -> &[ReviewComment] {
        &self.active_bundle().comments
    }

    pub fn active_patches(&self) -> &[Patch] {
        &self.active_bundle().patches
    }

    /// Memory hits of the active bundle; always empty in generic mode
    /// because the generic bundle carries none (catalog invariant).
    pub fn active_memory_hits(&self) -> &[MemoryHit] {
        &self.active_bundle().memory_hits
    }

    /// Comments on the selected file, highest risk first. The sort is
    /// stable: equal scores keep their fixture order.
    pub fn comments_for_selected_file(&self) -> Vec<&ReviewComment> {
        let mut comments: Vec<&ReviewComment> = self
            .active_comments()
            .iter()
            .filter(|c| c.file_path == self.selected_file)
            .collect();
        comments.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
        comments
    }

    /// The selected comment if it is still in the filtered list, else
    /// the list's first (highest-risk) comment, else none. Recomputed
    /// on every read, so file switches and bundle toggles self-correct.
    pub fn effective_selected_comment(&self) -> Option<&ReviewComment> {
        let in_file = self.comments_for_selected_file();
        let explicit = self
            .selected_comment
            .as_deref()
            .and_then(|id| in_file.iter().find(|c| c.id == id).copied());
        explicit.or_else(|| in_file.first().copied())
    }

    /// Look up a patch in the active bundle.
    pub fn patch(&self, id: &str) -> Option<&Patch> {
        self.active_patches().iter().find(|p| p.id == id)
    }

    pub fn is_applied(&self, patch_id: &str) -> bool {
        self.applied_patches.contains(patch_id)
    }

    pub fn applied_count(&self) -> usize {
        self.applied_patches.len()
    }

    /// Comments in the active bundle targeting the given file.
    pub fn comment_count_for(&self, path: &str) -> usize {
        self.active_comments()
            .iter()
            .filter(|c| c.file_path == path)
            .count()
    }
}

/// Git-style short id derived from the patch content, used for the
/// synthetic bot-commit marker.
fn short_commit_id(diff: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(diff.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..7].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ReviewSession {
        ReviewSession::new(Catalog::builtin().unwrap())
    }

    /// Advance far enough past every deadline that the whole run
    /// completes in one tick.
    fn finish_run(session: &mut ReviewSession, start: Instant) {
        session.tick(start + Duration::from_secs(10));
    }

    #[test]
    fn new_session_defaults() {
        let s = session();
        assert_eq!(s.scenario().id, "s1");
        assert!(s.memory_enabled());
        assert_eq!(s.selected_file(), "src/refunds/refund.service.ts");
        assert_eq!(s.check_state(), CheckState::Failed);
        assert!(!s.is_running());
        assert_eq!(s.applied_count(), 0);
        for step in StepId::ALL {
            assert_eq!(s.step_status(step), StepStatus::Idle);
        }
    }

    #[test]
    fn toggle_memory_switches_bundles_but_keeps_selection() {
        let mut s = session();
        s.select_file("tests/refunds.spec.ts");
        s.toggle_memory();
        assert!(!s.memory_enabled());
        assert_eq!(s.selected_file(), "tests/refunds.spec.ts");
        assert!(s.active_memory_hits().is_empty());
        assert!(s.active_comments().iter().any(|c| c.id == "c1"));
    }

    #[test]
    fn run_advances_step_by_step() {
        let mut s = session();
        let t0 = Instant::now();
        s.start_run(t0);
        assert!(s.is_running());
        assert_eq!(s.step_status(StepId::Ingest), StepStatus::Running);

        // Just before the ingest deadline nothing moves.
        s.tick(t0 + Duration::from_millis(449));
        assert_eq!(s.step_status(StepId::Ingest), StepStatus::Running);

        s.tick(t0 + Duration::from_millis(450));
        assert_eq!(s.step_status(StepId::Ingest), StepStatus::Done);
        assert_eq!(s.step_status(StepId::Index), StepStatus::Running);

        finish_run(&mut s, t0);
        assert!(!s.is_running());
        for step in StepId::ALL {
            assert_eq!(s.step_status(step), StepStatus::Done);
        }
        // s1's CI is failing, so a completed run reports failed checks.
        assert_eq!(s.check_state(), CheckState::Failed);
    }

    #[test]
    fn one_late_tick_catches_up_the_whole_run() {
        let mut s = session();
        let t0 = Instant::now();
        s.start_run(t0);
        s.tick(t0 + Duration::from_secs(60));
        assert!(!s.is_running());
        assert_eq!(s.step_status(StepId::Post), StepStatus::Done);
    }

    #[test]
    fn reset_run_returns_steps_to_idle() {
        let mut s = session();
        let t0 = Instant::now();
        s.start_run(t0);
        s.tick(t0 + Duration::from_millis(500));
        s.reset_run();
        assert!(!s.is_running());
        for step in StepId::ALL {
            assert_eq!(s.step_status(step), StepStatus::Idle);
        }
    }

    #[test]
    fn select_file_clears_comment_selection() {
        let mut s = session();
        s.select_comment("c3m");
        s.select_file("tests/refunds.spec.ts");
        assert_eq!(s.selected_comment_id(), None);
        // Fallback picks the only comment on that file.
        assert_eq!(s.effective_selected_comment().unwrap().id, "c2m");
    }

    #[test]
    fn unknown_patch_is_ignored() {
        let mut s = session();
        s.apply_patch("does-not-exist", Instant::now());
        assert_eq!(s.applied_count(), 0);
        assert_eq!(s.bot_commit(), None);
        assert_eq!(s.check_state(), CheckState::Failed);
    }

    #[test]
    fn apply_patch_records_bot_commit_with_short_hash() {
        let mut s = session();
        s.apply_patch("p1m", Instant::now());
        let marker = s.bot_commit().unwrap();
        assert!(marker.starts_with("review-coach-bot: apply "));
        // 7-char hex short id in parentheses at the end.
        let id = marker.rsplit('(').next().unwrap().trim_end_matches(')');
        assert_eq!(id.len(), 7);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn stale_check_transition_is_discarded_after_scenario_switch() {
        let mut s = session();
        let t0 = Instant::now();
        s.apply_patch("p1m", t0);
        assert_eq!(s.check_state(), CheckState::Pending);

        s.select_scenario("s2");
        // The delayed passed-transition must not land on the new
        // scenario.
        s.tick(t0 + Duration::from_secs(5));
        assert_eq!(s.check_state(), CheckState::Passed); // s2's own CI is passing
        assert_eq!(s.scenario().id, "s2");

        s.select_scenario("s1");
        s.tick(t0 + Duration::from_secs(10));
        assert_eq!(s.check_state(), CheckState::Failed);
    }

    #[test]
    fn restart_discards_pending_check() {
        let mut s = session();
        let t0 = Instant::now();
        s.apply_patch("p1m", t0);
        assert_eq!(s.check_state(), CheckState::Pending);

        s.start_run(t0 + Duration::from_millis(100));
        finish_run(&mut s, t0 + Duration::from_millis(100));
        // The run's completion re-derives from CI; the stale pending
        // timer must not flip it to passed afterwards.
        s.tick(t0 + Duration::from_secs(30));
        assert_eq!(s.check_state(), CheckState::Failed);
    }

    #[test]
    fn memory_flag_is_captured_at_run_start() {
        let mut s = session();
        let t0 = Instant::now();
        s.start_run(t0); // memory enabled: retrieve takes 600ms
        s.toggle_memory();

        // ingest 450 + index 650 = 1100; retrieve deadline at 1700.
        s.tick(t0 + Duration::from_millis(1699));
        assert_eq!(s.step_status(StepId::Retrieve), StepStatus::Running);
        s.tick(t0 + Duration::from_millis(1700));
        assert_eq!(s.step_status(StepId::Retrieve), StepStatus::Done);
    }

    #[test]
    fn short_commit_id_is_stable_hex() {
        let a = short_commit_id("diff --git a/x b/x");
        let b = short_commit_id("diff --git a/x b/x");
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
    }
}
