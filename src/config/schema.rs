use crate::engine::{Operation, PatchPlan};
use crate::runner::Policy;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlanConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl PlanConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.meta.file.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                operation: None,
                field: "meta.file",
            });
        }

        if self.operations.is_empty() {
            issues.push(ValidationIssue::EmptyOperationList);
        }

        for (idx, op) in self.operations.iter().enumerate() {
            match op {
                Operation::Replace(replace) => {
                    if replace.needle.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            operation: Some(idx),
                            field: "needle",
                        });
                    } else if replace.needle == replace.replacement {
                        issues.push(ValidationIssue::InvalidCombo {
                            operation: Some(idx),
                            message: "replacement is identical to needle".to_string(),
                        });
                    }
                }
                Operation::InsertBefore(insert) => {
                    if insert.anchor.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            operation: Some(idx),
                            field: "anchor",
                        });
                    }
                    if insert.insertion.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            operation: Some(idx),
                            field: "insertion",
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn plan(&self) -> PatchPlan {
        PatchPlan::new(self.operations.clone())
    }

    /// Resolve the target file. Relative paths are taken from `base_dir`,
    /// normally the directory holding the plan file.
    pub fn target_path(&self, base_dir: &Path) -> PathBuf {
        let file = Path::new(self.meta.file.trim());
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            base_dir.join(file)
        }
    }

    /// Display name: `meta.name`, or the target file when unnamed.
    pub fn display_name(&self) -> &str {
        if self.meta.name.trim().is_empty() {
            self.meta.file.trim()
        } else {
            self.meta.name.trim()
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Target file, relative to the plan file unless absolute
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub policy: Option<Policy>,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyOperationList,
    MissingField {
        operation: Option<usize>,
        field: &'static str,
    },
    InvalidCombo {
        operation: Option<usize>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyOperationList => write!(f, "plan contains no operations"),
            ValidationIssue::MissingField { operation, field } => match operation {
                Some(idx) => write!(f, "operation #{idx} missing required field '{field}'"),
                None => write!(f, "plan missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { operation, message } => match operation {
                Some(idx) => write!(f, "operation #{idx} has invalid configuration: {message}"),
                None => write!(f, "invalid plan configuration: {message}"),
            },
        }
    }
}
