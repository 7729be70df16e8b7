//! Inkwell Content Repository Library
//!
//! Lifecycle operations (add, copy, duplicate, version, delete) on
//! hierarchically organized content nodes, kept consistent with each node's
//! workflow state, edit lock and security policy.

pub mod audit;
pub mod commands;
pub mod config;
pub mod lifecycle;
pub mod repository;
pub mod security;
pub mod sqlite_persistence;
pub mod workflow;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig, SiteSettings};
pub use lifecycle::{ContextData, LockController, PolicyScope, WorkflowContext, WorkflowPolicy};
pub use repository::{
    MemoryNodeStore, Node, NodeId, NodeStore, SqliteNodeStore, Template, TemplateId, VersionRef,
};
pub use security::{AccessResult, AccessRight, Actor, SecurityElevation};
pub use workflow::{
    FieldWorkflowProvider, Workflow, WorkflowDefinition, WorkflowProvider, WorkflowViolation,
};
