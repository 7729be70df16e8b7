//! Workflow capability traits.
//!
//! A workflow is a polymorphic capability bound to a node through its
//! repository's provider. "No workflow bound" is an explicit `None` that
//! callers must branch on; there is no silent no-op substitute.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use crate::repository::{Node, NodeId};
use crate::security::{AccessResult, AccessRight, Actor};

/// The workflow state machine bound to a node.
///
/// The lifecycle core only queries approval, resets state and asks for
/// state-level access decisions; it never drives transitions itself.
pub trait Workflow: Send + Sync {
    fn id(&self) -> &str;

    /// Whether the node's current state permits it to leave the workflow
    /// towards `target_scope` (e.g. a publishing target).
    fn is_approved(&self, node: &Node, target_scope: Option<&str>) -> Result<bool>;

    /// Reset the node's version to the workflow's initial state.
    fn start(&self, node: &Node) -> Result<()>;

    /// State-level access decision for the given actor and right.
    fn get_access(&self, node: &Node, actor: &Actor, right: AccessRight) -> Result<AccessResult>;
}

/// Binds workflows to nodes; reachable from a repository.
pub trait WorkflowProvider: Send + Sync {
    /// The workflow the node is currently in, if any. Must be pure and safe
    /// to call repeatedly.
    fn workflow_for(&self, node: &Node) -> Result<Option<Arc<dyn Workflow>>>;
}

/// A structural mutation was rejected by a workflow precondition.
///
/// When `node` is set, that node was created before the rejection and must
/// be compensated away by the caller.
#[derive(Debug, Clone, Error)]
#[error("workflow rejected {action}: {reason}")]
pub struct WorkflowViolation {
    pub node: Option<NodeId>,
    pub action: String,
    pub reason: String,
}

impl WorkflowViolation {
    pub fn new(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            node: None,
            action: action.into(),
            reason: reason.into(),
        }
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }
}
