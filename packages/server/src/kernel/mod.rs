//! Kernel module - job infrastructure and workflow dependencies.

pub mod deps;
pub mod jobs;
pub mod test_dependencies;
pub mod traits;
pub mod workflow_command;

pub use deps::ServerDeps;
pub use test_dependencies::{MockScraperWorkflow, WorkflowCall};
pub use traits::*;
pub use workflow_command::CommandWorkflow;
