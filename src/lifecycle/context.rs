//! Lifecycle orchestration of workflow-governed content nodes.
//!
//! `WorkflowContext` is the single place where structural mutation, workflow
//! state, edit locking and access evaluation have to agree: every add, copy,
//! duplicate and version operation funnels through it so the post-processing
//! protocol runs exactly once per successful mutation.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use thiserror::Error;
use tracing::error;

use super::lock::LockController;
use super::policy::WorkflowPolicy;
use crate::config::SiteSettings;
use crate::repository::{fields, naming, Node, NodeId, NodeStore, TemplateId};
use crate::security::{AccessEvaluator, AccessResult, AccessRight, Actor, SecurityElevation};
use crate::workflow::{WorkflowAdapter, WorkflowViolation};

/// A required argument was null-ish. Raised before any mutation.
#[derive(Debug, Error)]
#[error("argument '{0}' must not be empty")]
pub struct EmptyArgument(pub &'static str);

fn require_name(value: &str, name: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EmptyArgument(name).into());
    }
    Ok(())
}

/// Ambient data of the calling context.
#[derive(Debug, Clone)]
pub struct ContextData {
    pub user: Actor,
    pub site: Option<SiteSettings>,
    /// Context-level administrator override, distinct from the actor's own
    /// administrator flag.
    pub is_administrator: bool,
}

impl ContextData {
    pub fn new(user: Actor) -> Self {
        Self {
            user,
            site: None,
            is_administrator: false,
        }
    }

    pub fn with_site(mut self, site: SiteSettings) -> Self {
        self.site = Some(site);
        self
    }

    pub fn with_administrator(mut self, is_administrator: bool) -> Self {
        self.is_administrator = is_administrator;
        self
    }
}

pub struct WorkflowContext {
    context: ContextData,
    store: Arc<dyn NodeStore>,
    adapter: WorkflowAdapter,
    evaluator: AccessEvaluator,
    locks: LockController,
}

impl WorkflowContext {
    pub fn new(context: ContextData, store: Arc<dyn NodeStore>) -> Self {
        let adapter = WorkflowAdapter::new(Arc::clone(&store), context.site.clone());
        let evaluator = AccessEvaluator::new(adapter.clone());
        let locks = LockController::new(Arc::clone(&store));
        Self {
            context,
            store,
            adapter,
            evaluator,
            locks,
        }
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    pub fn context(&self) -> &ContextData {
        &self.context
    }

    /// Whether workflow enforcement is active for this call chain, resolving
    /// the scoped policy override against the ambient site.
    pub fn enabled(&self) -> bool {
        WorkflowPolicy::resolve(self.context.site.as_ref())
    }

    // =========================================================================
    // Structural operations
    // =========================================================================

    /// Create a node and run it through the edit-entry gate. When the store
    /// rejects the mutation with a workflow violation after partially
    /// creating the node, the partial node is deleted before the failure is
    /// re-raised unchanged.
    pub fn add_item(&self, name: &str, template: &TemplateId, parent: &NodeId) -> Result<Node> {
        require_name(name, "name")?;
        match self.add_item_inner(name, template, parent) {
            Ok(node) => Ok(node),
            Err(error) => {
                self.compensate_workflow_violation(&error);
                Err(error)
            }
        }
    }

    fn add_item_inner(&self, name: &str, template: &TemplateId, parent: &NodeId) -> Result<Node> {
        let node = self.store.add_node(name, template, parent)?;
        self.process_added(&node)?;
        Ok(node)
    }

    /// Delete the partial node a workflow violation left behind, under an
    /// elevation scope so the compensation cannot itself be refused.
    /// Compensation failures are logged and swallowed; the original error is
    /// what the caller sees.
    fn compensate_workflow_violation(&self, error: &anyhow::Error) {
        let Some(violation) = error.downcast_ref::<WorkflowViolation>() else {
            return;
        };
        let Some(node_id) = violation.node else {
            return;
        };
        let _elevation = SecurityElevation::enter();
        if let Err(cleanup_error) = self.store.delete_node(&node_id) {
            error!(
                "failed to remove partially created node {} after workflow rejection: {:#}",
                node_id, cleanup_error
            );
        }
    }

    /// Create a new version of the node and run it through the edit-entry
    /// gate.
    pub fn add_version(&self, node: &Node) -> Result<Node> {
        let version = self.store.add_version(node)?;
        self.process_added(&version)?;
        Ok(version)
    }

    /// Deep copy with a fresh copy id.
    pub fn copy_item(&self, node: &Node, destination: &NodeId, copy_name: &str) -> Result<Node> {
        self.copy_item_with(node, destination, copy_name, NodeId::new(), true)
    }

    pub fn copy_item_with(
        &self,
        node: &Node,
        destination: &NodeId,
        copy_name: &str,
        copy_id: NodeId,
        deep: bool,
    ) -> Result<Node> {
        require_name(copy_name, "copy_name")?;
        let copied = self
            .store
            .copy_node(node, destination, copy_name, copy_id, deep)?;
        self.process_copied(&copied)?;
        Ok(copied)
    }

    /// Duplicate next to the original under a "copy of" name uniquified
    /// against the parent.
    pub fn duplicate_item(&self, node: &Node) -> Result<Node> {
        let parent = node
            .parent
            .with_context(|| format!("cannot duplicate root node {}", node.id))?;
        let copy_name = naming::copy_of_name(self.store.as_ref(), &parent, &node.name)?;
        self.duplicate_item_as(node, &copy_name)
    }

    pub fn duplicate_item_as(&self, node: &Node, copy_name: &str) -> Result<Node> {
        require_name(copy_name, "copy_name")?;
        let duplicated = self.store.duplicate_node(node, copy_name)?;
        self.process_copied(&duplicated)?;
        Ok(duplicated)
    }

    /// A deleted node has no further state to normalize; no post-processing.
    pub fn delete_item(&self, node: &Node) -> Result<()> {
        self.store.delete_node(&node.id)
    }

    // =========================================================================
    // Workflow state
    // =========================================================================

    /// Reset the version addressed by the handle to its workflow's initial
    /// state; no-op for unbound nodes.
    pub fn reset_workflow_state(&self, node: &Node) -> Result<()> {
        self.adapter.start(node)
    }

    /// Reset every version of the node, then every version of every
    /// descendant, exactly once each. `_all_versions` is accepted for
    /// call-site compatibility but the traversal always covers the full
    /// version set.
    pub fn reset_workflow_state_recursive(&self, node: &Node, _all_versions: bool) -> Result<()> {
        for version in self.store.get_versions(&node.id)? {
            self.reset_workflow_state(&version)?;
        }
        let mut pending = self.store.children(&node.id)?;
        while let Some(child) = pending.pop() {
            for version in self.store.get_versions(&child.id)? {
                self.reset_workflow_state(&version)?;
            }
            pending.extend(self.store.children(&child.id)?);
        }
        Ok(())
    }

    /// The workflow bound to the node, respecting the scoped enforcement
    /// policy. `None` is "no workflow" and callers must branch on it.
    pub fn get_workflow(&self, node: &Node) -> Result<Option<Arc<dyn crate::workflow::Workflow>>> {
        self.adapter.get_workflow(node)
    }

    pub fn has_workflow(&self, node: &Node) -> Result<bool> {
        Ok(self.get_workflow(node)?.is_some())
    }

    /// True only when enforcement is on and the inherited default-workflow
    /// field carries a value.
    pub fn has_default_workflow(&self, node: &Node) -> Result<bool> {
        if !self.enabled() {
            return Ok(false);
        }
        Ok(self
            .store
            .inherited_field_value(node, fields::DEFAULT_WORKFLOW)?
            .is_some_and(|value| !value.is_empty()))
    }

    pub fn is_approved(&self, node: &Node, target_scope: Option<&str>) -> Result<bool> {
        self.adapter.is_approved(node, target_scope)
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// `None` means the node has no bound workflow and the caller must fall
    /// back to plain security evaluation.
    pub fn get_access(
        &self,
        node: &Node,
        right: AccessRight,
        actor: &Actor,
    ) -> Result<Option<AccessResult>> {
        self.evaluator.get_access(node, actor, right)
    }

    /// Whether the current actor gets the right; an absent workflow decision
    /// imposes no restriction.
    pub fn is_allowed(&self, right: AccessRight, node: &Node) -> Result<bool> {
        Ok(self
            .get_access(node, right, &self.context.user)?
            .map(|result| result.is_allowed())
            .unwrap_or(true))
    }

    // =========================================================================
    // Edit entry
    // =========================================================================

    /// The edit-entry gate. Returns the node (or fresh version) that should
    /// be presented as editable, or `None` when the lock could not be
    /// obtained — "not editable now", never an error.
    pub fn start_editing(&self, node: &Node) -> Result<Option<Node>> {
        if self.context.user.is_administrator {
            return Ok(Some(node.clone()));
        }
        let owner = self.context.user.name.clone();
        if self.context.is_administrator {
            return self.locks.lock(node, &owner);
        }
        if self.store.is_standard_values_holder(node)? {
            return self.locks.lock(node, &owner);
        }
        if !self.has_workflow(node)? && !self.has_default_workflow(node)? {
            return self.locks.lock(node, &owner);
        }
        if !self.is_approved(node, None)? {
            // unapproved: editing continues on the existing version
            return self.locks.lock(node, &owner);
        }
        let version = self.store.add_version(node)?;
        self.locks.lock(&version, &owner)
    }

    // =========================================================================
    // Post-processing
    // =========================================================================

    fn process_added(&self, node: &Node) -> Result<()> {
        self.start_editing(node)?;
        Ok(())
    }

    fn process_copied(&self, node: &Node) -> Result<()> {
        self.reset_workflow_state_recursive(node, true)?;
        self.locks.unlock(node)?;
        if !self.store.get_versions(&node.id)?.is_empty() {
            self.start_editing(node)?;
        }
        Ok(())
    }
}
