//! Anchor Patcher: exact-match literal text patching
//!
//! Rewrites a source file by replacing a literal block with another and by
//! inserting a literal block immediately before a literal anchor. Nothing is
//! parsed; all matching is exact, leftmost, and single-shot.
//!
//! # Architecture
//!
//! Both operations compile down to a single primitive, [`Splice`], a byte
//! span replacement on an in-memory document. The [`engine`] locates spans
//! and folds a [`PatchPlan`] left to right. The [`runner`] wraps the engine
//! with file I/O from [`store`] and a [`Policy`] for missing literals.
//!
//! # Safety
//!
//! - A missing needle or anchor is reported per operation, never silently
//!   swallowed
//! - Atomic file writes (tempfile + fsync + rename)
//! - Writes refuse to clobber a file that changed since it was read
//! - UTF-8 validation on read
//!
//! # Example
//!
//! ```
//! use anchor_patcher::{InsertBeforeAnchorOperation, PatchPlan, ReplaceOperation};
//!
//! let plan = PatchPlan::default()
//!     .then(ReplaceOperation::new("B", "X\nY"))
//!     .then(InsertBeforeAnchorOperation::new("C", "Z\n"));
//!
//! let output = plan.apply("A\nB\nC");
//! assert_eq!(output.document, "A\nX\nY\nZ\nC");
//! assert!(output.is_complete());
//! ```

pub mod config;
pub mod diagnostic;
pub mod edit;
pub mod engine;
pub mod runner;
pub mod store;

// Re-exports
pub use config::{load_from_path, load_from_str, plan_base_dir, ConfigError, PlanConfig};
pub use diagnostic::{closest_line, NearMiss};
pub use edit::Splice;
pub use engine::{
    apply_insert_before_anchor, apply_plan, apply_replace, InsertBeforeAnchorOperation,
    Operation, OperationKind, OperationReport, Outcome, PatchPlan, PlanOutput, ReplaceOperation,
    Step,
};
pub use runner::{check_plan, run_plan, Miss, Policy, RunError, RunOptions, RunReport, RunStatus};
pub use store::{read_document, write_document, Fingerprint, SourceDocument, StoreError};
