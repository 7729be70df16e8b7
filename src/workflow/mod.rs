mod adapter;
pub mod field_workflow;
mod trait_def;

pub use adapter::WorkflowAdapter;
pub use field_workflow::{
    FieldWorkflow, FieldWorkflowProvider, WorkflowDefinition, WorkflowStateDef,
};
pub use trait_def::{Workflow, WorkflowProvider, WorkflowViolation};
