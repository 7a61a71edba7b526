//! Plan runner: reads a target, runs a [`PatchPlan`] over it, decides what a
//! miss means, and persists the result.
//!
//! The engine never fails on a missing literal. Here the caller's [`Policy`]
//! turns misses into either an aborted run ([`Policy::FailFast`]) or a
//! written-but-incomplete report ([`Policy::BestEffort`]).

use crate::diagnostic::{closest_line, NearMiss};
use crate::engine::{OperationKind, OperationReport, PatchPlan};
use crate::store::{self, Fingerprint, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, info_span, warn};

/// What to do when an operation's literal is not found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Abort before writing anything
    #[default]
    FailFast,
    /// Write whatever applied and report the misses
    BestEffort,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub policy: Policy,
    /// Compute the result but never write it
    pub dry_run: bool,
}

/// An operation whose literal was not found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Miss {
    pub index: usize,
    pub kind: OperationKind,
    pub literal: String,
    pub hint: Option<NearMiss>,
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self
            .literal
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("");
        let more = if self.literal.trim().lines().count() > 1 {
            " ..."
        } else {
            ""
        };
        write!(
            f,
            "operation #{} ({}): literal not found: {first}{more}",
            self.index, self.kind
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    /// New contents were persisted
    Written,
    /// The plan produced the document it was given; nothing to write
    Unchanged,
    /// Dry run or check: the target would have been rewritten
    WouldWrite,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub target: PathBuf,
    pub status: RunStatus,
    pub operations: Vec<OperationReport>,
    pub misses: Vec<Miss>,
    pub before: Fingerprint,
    pub after: Fingerprint,
    #[serde(skip)]
    pub original: String,
    #[serde(skip)]
    pub patched: String,
}

impl RunReport {
    /// True when every operation found its literal.
    pub fn is_complete(&self) -> bool {
        self.misses.is_empty()
    }

    pub fn changed(&self) -> bool {
        self.original != self.patched
    }
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Source(StoreError),

    #[error("{} literal(s) not found in {}; nothing written", .misses.len(), .target.display())]
    MatchNotFound { target: PathBuf, misses: Vec<Miss> },

    /// The patched text is kept so the caller can retry the write.
    #[error("failed to persist {}: {source}", .target.display())]
    Persist {
        target: PathBuf,
        source: StoreError,
        document: String,
    },
}

/// Run `plan` against the file at `target`.
pub fn run_plan(
    target: &Path,
    plan: &PatchPlan,
    options: &RunOptions,
) -> Result<RunReport, RunError> {
    let span = info_span!("run_plan", path = %target.display(), operations = plan.len());
    let _guard = span.enter();

    let mut report = evaluate(target, plan)?;

    if !report.misses.is_empty() {
        for miss in &report.misses {
            warn!(index = miss.index, kind = %miss.kind, "literal not found");
        }
        if options.policy == Policy::FailFast {
            return Err(RunError::MatchNotFound {
                target: report.target,
                misses: report.misses,
            });
        }
    }

    if !report.changed() {
        info!("plan left document unchanged");
        return Ok(report);
    }

    if options.dry_run {
        info!("dry run, not writing");
        return Ok(report);
    }

    if let Err(source) = store::write_document(target, &report.patched, Some(report.before)) {
        return Err(RunError::Persist {
            target: target.to_path_buf(),
            source,
            document: report.patched,
        });
    }

    report.status = RunStatus::Written;
    Ok(report)
}

/// Report what `plan` would do to `target` without writing anything.
///
/// Misses are reported, never turned into errors.
pub fn check_plan(target: &Path, plan: &PatchPlan) -> Result<RunReport, RunError> {
    let span = info_span!("check_plan", path = %target.display(), operations = plan.len());
    let _guard = span.enter();
    evaluate(target, plan)
}

fn evaluate(target: &Path, plan: &PatchPlan) -> Result<RunReport, RunError> {
    let source = store::read_document(target).map_err(RunError::Source)?;
    let output = plan.apply(&source.text);

    // Hints search the document each operation actually saw, which for a
    // later operation includes the earlier operations' edits.
    let mut misses = Vec::new();
    let mut seen = source.text.clone();
    for (op, report) in plan.operations.iter().zip(&output.reports) {
        if report.outcome.is_applied() {
            seen = op.apply(&seen).document;
        } else {
            misses.push(Miss {
                index: report.index,
                kind: report.kind,
                literal: report.literal.clone(),
                hint: closest_line(&seen, &report.literal),
            });
        }
    }

    let after = Fingerprint::of(&output.document);
    let status = if after == source.fingerprint {
        RunStatus::Unchanged
    } else {
        RunStatus::WouldWrite
    };

    Ok(RunReport {
        target: source.path,
        status,
        operations: output.reports,
        misses,
        before: source.fingerprint,
        after,
        original: source.text,
        patched: output.document,
    })
}
