use std::time::Duration;

/// One stage of the simulated review pipeline.
///
/// The set is fixed and ordered; `ALL` is the canonical execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    Ingest = 0,
    Index = 1,
    Retrieve = 2,
    Analyze = 3,
    Generate = 4,
    Post = 5,
}

/// Number of pipeline steps.
pub const STEP_COUNT: usize = StepId::ALL.len();

impl StepId {
    pub const ALL: [StepId; 6] = [
        StepId::Ingest,
        StepId::Index,
        StepId::Retrieve,
        StepId::Analyze,
        StepId::Generate,
        StepId::Post,
    ];

    /// Position of this step in `ALL`.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepId::Ingest => "Ingest PR Event",
            StepId::Index => "Index Repo Context",
            StepId::Retrieve => "Retrieve Project Memory",
            StepId::Analyze => "Run Analyzers",
            StepId::Generate => "Generate Review + Patches",
            StepId::Post => "Post Back to PR",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StepId::Ingest => "Simulated GitHub webhook: PR metadata captured",
            StepId::Index => "Collect changed files, key docs, module boundaries",
            StepId::Retrieve => "Fetch style decisions and prior review patterns (RAG)",
            StepId::Analyze => "Static signals: lint/test/AST heuristics plus diff risk model",
            StepId::Generate => "Comments, patch-ready unified diffs, risk scores",
            StepId::Post => "Simulated check run, review comments, optional bot commit",
        }
    }

    /// Simulated latency of this step. Retrieval takes longer when project
    /// memory is enabled (there is something to retrieve).
    pub fn latency(&self, memory_enabled: bool) -> Duration {
        let ms = match self {
            StepId::Ingest => 450,
            StepId::Index => 650,
            StepId::Retrieve => {
                if memory_enabled {
                    600
                } else {
                    300
                }
            }
            StepId::Analyze => 800,
            StepId::Generate => 900,
            StepId::Post => 550,
        };
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_in_execution_order() {
        for (i, step) in StepId::ALL.iter().enumerate() {
            assert_eq!(step.index(), i);
        }
    }

    #[test]
    fn retrieve_is_slower_with_memory() {
        assert!(StepId::Retrieve.latency(true) > StepId::Retrieve.latency(false));
    }

    #[test]
    fn other_steps_ignore_memory_flag() {
        for step in StepId::ALL {
            if step != StepId::Retrieve {
                assert_eq!(step.latency(true), step.latency(false));
            }
        }
    }
}
