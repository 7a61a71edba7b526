pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, plan_base_dir, ConfigError};
pub use schema::{Metadata, PlanConfig, ValidationError, ValidationIssue};
