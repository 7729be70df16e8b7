//! Policy-gated workflow lookup and delegation.

use std::sync::Arc;

use anyhow::Result;

use super::trait_def::Workflow;
use crate::config::SiteSettings;
use crate::lifecycle::WorkflowPolicy;
use crate::repository::{Node, NodeStore};

/// Resolves the workflow bound to a node through its repository's provider,
/// respecting the scoped enforcement policy, and delegates approval queries
/// and state resets to it.
#[derive(Clone)]
pub struct WorkflowAdapter {
    store: Arc<dyn NodeStore>,
    site: Option<SiteSettings>,
}

impl WorkflowAdapter {
    pub fn new(store: Arc<dyn NodeStore>, site: Option<SiteSettings>) -> Self {
        Self { store, site }
    }

    /// Whether workflow enforcement is currently active for this call chain.
    pub fn enforcement_enabled(&self) -> bool {
        WorkflowPolicy::resolve(self.site.as_ref())
    }

    /// The workflow bound to the node, or `None` when enforcement is off,
    /// the repository has no provider, or the provider binds nothing.
    /// Pure; safe to call repeatedly.
    pub fn get_workflow(&self, node: &Node) -> Result<Option<Arc<dyn Workflow>>> {
        if !self.enforcement_enabled() {
            return Ok(None);
        }
        match self.store.workflow_provider() {
            Some(provider) => provider.workflow_for(node),
            None => Ok(None),
        }
    }

    /// No bound workflow means the node is approved by definition.
    pub fn is_approved(&self, node: &Node, target_scope: Option<&str>) -> Result<bool> {
        match self.get_workflow(node)? {
            Some(workflow) => workflow.is_approved(node, target_scope),
            None => Ok(true),
        }
    }

    /// Reset the node's version to the bound workflow's initial state; no-op
    /// when nothing is bound.
    pub fn start(&self, node: &Node) -> Result<()> {
        if let Some(workflow) = self.get_workflow(node)? {
            workflow.start(node)?;
        }
        Ok(())
    }
}
