pub mod cli;
pub mod highlight;
pub mod pipeline;
pub mod scenario;
pub mod session;
pub mod tui;

/// Severity of a review comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// CI result recorded in a scenario fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiStatus {
    Passing,
    Failing,
}

/// Simulated check-run state shown on the PR header.
///
/// Starts out mirroring the scenario's CI status and moves
/// `Failed -> Pending -> Passed` when a suggested patch is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Failed,
    Pending,
    Passed,
}

impl CheckState {
    /// The check state a freshly loaded scenario starts in.
    pub fn from_ci(status: CiStatus) -> Self {
        match status {
            CiStatus::Passing => CheckState::Passed,
            CiStatus::Failing => CheckState::Failed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckState::Failed => "Checks Failed",
            CheckState::Pending => "Checks Pending",
            CheckState::Passed => "Checks Passed",
        }
    }
}

/// Status of a single pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Idle,
    Running,
    Done,
    Error,
}
