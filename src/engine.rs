//! Patch engine: applies literal replace and insert-before-anchor operations
//! to an in-memory document.
//!
//! Matching is exact and leftmost: the first occurrence of a needle or anchor
//! is the only one touched. A literal that does not occur is not an error
//! here; the operation leaves the document unchanged and reports
//! [`Outcome::NotFound`], and the caller decides whether that is acceptable.
//!
//! A [`PatchPlan`] is a strict left-to-right fold. There is no rollback, so a
//! miss late in the plan leaves earlier steps applied.

use crate::edit::Splice;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Replace the first occurrence of `needle` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceOperation {
    pub needle: String,
    #[serde(default)]
    pub replacement: String,
}

impl ReplaceOperation {
    pub fn new(needle: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            replacement: replacement.into(),
        }
    }
}

/// Insert `insertion` immediately before the first occurrence of `anchor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertBeforeAnchorOperation {
    pub anchor: String,
    pub insertion: String,
}

impl InsertBeforeAnchorOperation {
    pub fn new(anchor: impl Into<String>, insertion: impl Into<String>) -> Self {
        Self {
            anchor: anchor.into(),
            insertion: insertion.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    Replace(ReplaceOperation),
    InsertBefore(InsertBeforeAnchorOperation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Replace,
    InsertBefore,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Replace => write!(f, "replace"),
            OperationKind::InsertBefore => write!(f, "insert-before"),
        }
    }
}

/// What happened to a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    /// The literal was found; `offset` is where its first occurrence starts
    /// in the document the operation received.
    Applied { offset: usize },
    /// The literal does not occur; the document was passed through unchanged.
    NotFound,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }
}

/// Output of one operation: the next document state and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Step {
    pub document: String,
    pub outcome: Outcome,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Replace(_) => OperationKind::Replace,
            Operation::InsertBefore(_) => OperationKind::InsertBefore,
        }
    }

    /// The literal this operation searches for (needle or anchor).
    pub fn literal(&self) -> &str {
        match self {
            Operation::Replace(op) => &op.needle,
            Operation::InsertBefore(op) => &op.anchor,
        }
    }

    /// Compute the splice this operation would make, without applying it.
    ///
    /// Empty literals never match.
    pub fn locate(&self, document: &str) -> Option<Splice> {
        match self {
            Operation::Replace(op) => locate_replace(document, op),
            Operation::InsertBefore(op) => locate_insert(document, op),
        }
    }

    pub fn apply(&self, document: &str) -> Step {
        splice_step(document, self.kind(), self.locate(document))
    }
}

fn find_literal(document: &str, literal: &str) -> Option<usize> {
    if literal.is_empty() {
        return None;
    }
    document.find(literal)
}

fn locate_replace(document: &str, op: &ReplaceOperation) -> Option<Splice> {
    let start = find_literal(document, &op.needle)?;
    Some(Splice::replace(
        start..start + op.needle.len(),
        op.replacement.as_str(),
    ))
}

fn locate_insert(document: &str, op: &InsertBeforeAnchorOperation) -> Option<Splice> {
    let start = find_literal(document, &op.anchor)?;
    Some(Splice::insert(start, op.insertion.as_str()))
}

fn splice_step(document: &str, kind: OperationKind, located: Option<Splice>) -> Step {
    // A located splice always fits: it came from `find` on this document.
    let applied = located.and_then(|splice| {
        let patched = splice.apply(document)?;
        Some((splice.byte_start, splice.delta(), patched))
    });

    match applied {
        Some((offset, delta, patched)) => {
            debug!(%kind, offset, delta, "literal matched");
            Step {
                document: patched,
                outcome: Outcome::Applied { offset },
            }
        }
        None => {
            debug!(%kind, "literal not found, passing document through");
            Step {
                document: document.to_string(),
                outcome: Outcome::NotFound,
            }
        }
    }
}

impl From<ReplaceOperation> for Operation {
    fn from(op: ReplaceOperation) -> Self {
        Operation::Replace(op)
    }
}

impl From<InsertBeforeAnchorOperation> for Operation {
    fn from(op: InsertBeforeAnchorOperation) -> Self {
        Operation::InsertBefore(op)
    }
}

/// Replace the first occurrence of `op.needle` in `document`.
pub fn apply_replace(document: &str, op: &ReplaceOperation) -> Step {
    splice_step(document, OperationKind::Replace, locate_replace(document, op))
}

/// Insert `op.insertion` before the first occurrence of `op.anchor`.
pub fn apply_insert_before_anchor(document: &str, op: &InsertBeforeAnchorOperation) -> Step {
    splice_step(
        document,
        OperationKind::InsertBefore,
        locate_insert(document, op),
    )
}

/// An ordered list of operations, applied strictly in sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchPlan {
    pub operations: Vec<Operation>,
}

impl PatchPlan {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    /// Append an operation to the end of the plan.
    pub fn then(mut self, op: impl Into<Operation>) -> Self {
        self.operations.push(op.into());
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn apply(&self, document: &str) -> PlanOutput {
        let mut current = document.to_string();
        let mut reports = Vec::with_capacity(self.operations.len());

        for (index, op) in self.operations.iter().enumerate() {
            let step = op.apply(&current);
            reports.push(OperationReport {
                index,
                kind: op.kind(),
                literal: op.literal().to_string(),
                outcome: step.outcome,
            });
            current = step.document;
        }

        PlanOutput {
            document: current,
            reports,
        }
    }
}

/// Apply every operation of `plan` to `document`, in order.
pub fn apply_plan(document: &str, plan: &PatchPlan) -> PlanOutput {
    plan.apply(document)
}

/// Per-operation record of a plan run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    /// Zero-based position in the plan
    pub index: usize,
    pub kind: OperationKind,
    /// The needle or anchor that was searched for
    pub literal: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutput {
    pub document: String,
    pub reports: Vec<OperationReport>,
}

impl PlanOutput {
    /// True when every operation found its literal.
    pub fn is_complete(&self) -> bool {
        self.reports.iter().all(|r| r.outcome.is_applied())
    }

    pub fn misses(&self) -> impl Iterator<Item = &OperationReport> {
        self.reports.iter().filter(|r| !r.outcome.is_applied())
    }

    pub fn applied_count(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_applied()).count()
    }
}
