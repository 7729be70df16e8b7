//! Access evaluation against workflow-state security.

use anyhow::Result;

use super::elevation::SecurityElevation;
use super::rights::{AccessResult, AccessRight};
use super::Actor;
use crate::repository::Node;
use crate::workflow::WorkflowAdapter;

const NON_GATED_EXPLANATION: &str =
    "Only write, delete and remove-version access rights consult workflow state security. \
     All other rights are evaluated against the node's own security settings.";

/// Decides whether an actor may perform a right on a node.
///
/// Workflow state is consulted only for the three workflow-gated rights;
/// everything else is allowed here and left to the plain security layer.
#[derive(Clone)]
pub struct AccessEvaluator {
    adapter: WorkflowAdapter,
}

impl AccessEvaluator {
    pub fn new(adapter: WorkflowAdapter) -> Self {
        Self { adapter }
    }

    /// `None` means "no workflow-imposed decision": the node has no bound
    /// workflow and the caller must fall back to plain security evaluation.
    pub fn get_access(
        &self,
        node: &Node,
        actor: &Actor,
        right: AccessRight,
    ) -> Result<Option<AccessResult>> {
        if SecurityElevation::is_active() {
            return Ok(Some(AccessResult::allow(
                "security checks are suspended by an elevation scope",
            )));
        }
        if !right.is_workflow_gated() {
            return Ok(Some(AccessResult::allow(NON_GATED_EXPLANATION)));
        }
        match self.adapter.get_workflow(node)? {
            Some(workflow) => workflow.get_access(node, actor, right).map(Some),
            None => Ok(None),
        }
    }
}
