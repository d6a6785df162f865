mod fixtures;

use std::collections::HashSet;
use thiserror::Error;

use crate::{CiStatus, Severity};

/// Errors that can occur while validating a scenario catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog contains no scenarios")]
    Empty,
    #[error("duplicate scenario id: {0}")]
    DuplicateScenario(String),
    #[error("scenario {0} has no diff files")]
    NoDiffFiles(String),
    #[error("scenario {scenario}: duplicate {kind} id {id} in the {bundle} bundle")]
    DuplicateId {
        scenario: String,
        bundle: &'static str,
        kind: &'static str,
        id: String,
    },
    #[error("scenario {scenario}: comment {comment} targets {path}, which is not in the diff")]
    CommentOutsideDiff {
        scenario: String,
        comment: String,
        path: String,
    },
    #[error("scenario {scenario}: comment {comment} suggests unknown patch {patch}")]
    DanglingPatchRef {
        scenario: String,
        comment: String,
        patch: String,
    },
    #[error("scenario {0}: the generic bundle must not carry memory hits")]
    MemoryHitsInGenericBundle(String),
}

/// CI result attached to a scenario: overall status plus the log excerpt
/// shown in the status views.
#[derive(Debug, Clone)]
pub struct CiReport {
    pub status: CiStatus,
    pub summary: String,
    pub logs: Vec<String>,
}

/// Diff of a single file: an ordered list of hunk text blocks in unified
/// diff format (header line plus `+`/`-`/context lines).
#[derive(Debug, Clone)]
pub struct FileDiff {
    pub path: String,
    pub hunks: Vec<String>,
}

/// Where a memory hit was (notionally) retrieved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorySource {
    StyleGuide,
    PastPr,
    ModulePattern,
    IncidentPostmortem,
}

impl MemorySource {
    pub fn label(&self) -> &'static str {
        match self {
            MemorySource::StyleGuide => "Style Guide",
            MemorySource::PastPr => "Past PR",
            MemorySource::ModulePattern => "Module Pattern",
            MemorySource::IncidentPostmortem => "Postmortem",
        }
    }
}

/// A piece of repository-specific context retrieved by the simulated
/// memory layer.
#[derive(Debug, Clone)]
pub struct MemoryHit {
    pub id: String,
    pub source: MemorySource,
    pub title: String,
    pub snippet: String,
}

/// A patch-ready suggestion attached to a review bundle.
#[derive(Debug, Clone)]
pub struct Patch {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub unified_diff: String,
    pub touches_business_logic: bool,
}

/// A single review comment anchored to one file and line.
#[derive(Debug, Clone)]
pub struct ReviewComment {
    pub id: String,
    pub file_path: String,
    pub line: u32,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub rationale: String,
    /// 0-100; clamped during catalog validation.
    pub risk_score: u8,
    pub suggested_patch: Option<String>,
}

/// The output of one review mode: comments, patches, and (for the
/// memory-augmented mode) the memory hits that informed them.
#[derive(Debug, Clone, Default)]
pub struct ReviewBundle {
    pub comments: Vec<ReviewComment>,
    pub patches: Vec<Patch>,
    pub memory_hits: Vec<MemoryHit>,
}

/// One fixed mock pull-request dataset.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub repo: String,
    pub pr_number: u32,
    pub branch: String,
    pub author: String,
    pub languages: Vec<String>,
    pub changed_files: u32,
    pub additions: u32,
    pub deletions: u32,
    pub ci: CiReport,
    pub diff: Vec<FileDiff>,
    pub generic: ReviewBundle,
    pub with_memory: ReviewBundle,
}

impl Scenario {
    /// Path of the first file in the diff (the default selection).
    pub fn first_file(&self) -> &str {
        &self.diff[0].path
    }

    pub fn file(&self, path: &str) -> Option<&FileDiff> {
        self.diff.iter().find(|f| f.path == path)
    }
}

/// Validated, immutable set of scenarios the demo can play back.
#[derive(Debug, Clone)]
pub struct Catalog {
    scenarios: Vec<Scenario>,
}

impl Catalog {
    /// Validate fixture invariants and build a catalog.
    ///
    /// Risk scores above 100 are clamped rather than rejected; everything
    /// else that is inconsistent (dangling patch references, comments on
    /// files absent from the diff, duplicate ids) is an error.
    pub fn new(mut scenarios: Vec<Scenario>) -> Result<Self, CatalogError> {
        if scenarios.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for scenario in &mut scenarios {
            if !seen.insert(scenario.id.clone()) {
                return Err(CatalogError::DuplicateScenario(scenario.id.clone()));
            }
            if scenario.diff.is_empty() {
                return Err(CatalogError::NoDiffFiles(scenario.id.clone()));
            }
            if !scenario.generic.memory_hits.is_empty() {
                return Err(CatalogError::MemoryHitsInGenericBundle(scenario.id.clone()));
            }

            let paths: HashSet<&str> = scenario.diff.iter().map(|f| f.path.as_str()).collect();
            let id = scenario.id.clone();
            validate_bundle(&id, "generic", &mut scenario.generic, &paths)?;
            validate_bundle(&id, "with-memory", &mut scenario.with_memory, &paths)?;
        }

        Ok(Self { scenarios })
    }

    /// The built-in hand-authored catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(fixtures::scenarios())
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Position of a scenario in catalog order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.scenarios.iter().position(|s| s.id == id)
    }

    pub fn first(&self) -> &Scenario {
        &self.scenarios[0]
    }
}

/// Check one review bundle against the scenario's diff, clamping risk
/// scores as a side effect.
fn validate_bundle(
    scenario: &str,
    bundle: &'static str,
    review: &mut ReviewBundle,
    diff_paths: &HashSet<&str>,
) -> Result<(), CatalogError> {
    let mut patch_ids = HashSet::new();
    for patch in &review.patches {
        if !patch_ids.insert(patch.id.as_str()) {
            return Err(CatalogError::DuplicateId {
                scenario: scenario.to_string(),
                bundle,
                kind: "patch",
                id: patch.id.clone(),
            });
        }
    }

    let mut hit_ids = HashSet::new();
    for hit in &review.memory_hits {
        if !hit_ids.insert(hit.id.as_str()) {
            return Err(CatalogError::DuplicateId {
                scenario: scenario.to_string(),
                bundle,
                kind: "memory hit",
                id: hit.id.clone(),
            });
        }
    }

    let mut comment_ids = HashSet::new();
    for comment in &mut review.comments {
        if !comment_ids.insert(comment.id.clone()) {
            return Err(CatalogError::DuplicateId {
                scenario: scenario.to_string(),
                bundle,
                kind: "comment",
                id: comment.id.clone(),
            });
        }
        if !diff_paths.contains(comment.file_path.as_str()) {
            return Err(CatalogError::CommentOutsideDiff {
                scenario: scenario.to_string(),
                comment: comment.id.clone(),
                path: comment.file_path.clone(),
            });
        }
        if let Some(patch) = &comment.suggested_patch
            && !patch_ids.contains(patch.as_str())
        {
            return Err(CatalogError::DanglingPatchRef {
                scenario: scenario.to_string(),
                comment: comment.id.clone(),
                patch: patch.clone(),
            });
        }
        comment.risk_score = comment.risk_score.min(100);
    }

    Ok(())
}
