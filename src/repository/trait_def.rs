//! NodeStore trait definition.
//!
//! This trait abstracts the content repository so the lifecycle core can run
//! against either the in-memory `MemoryNodeStore` or the persistent
//! `SqliteNodeStore` transparently.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::models::{Node, NodeId, Template, TemplateId, VersionRef};
use crate::workflow::WorkflowProvider;

/// Trait for node storage backends.
///
/// Structural mutations may fail with a
/// [`WorkflowViolation`](crate::workflow::WorkflowViolation) carried in the
/// error chain; when the violation names a node, that node was created
/// before the mutation was rejected and it is the caller's job to
/// compensate.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait NodeStore: Send + Sync {
    // =========================================================================
    // Retrieval
    // =========================================================================

    /// Get a handle to a node at its default version.
    fn get_node(&self, id: &NodeId) -> Result<Option<Node>>;

    /// Get a handle to a node at a specific version.
    ///
    /// Returns `None` when the node does not exist; the version does not
    /// have to be materialized for the handle to be returned.
    fn get_version(&self, id: &NodeId, version: &VersionRef) -> Result<Option<Node>>;

    /// All materialized versions of a node, across languages.
    fn get_versions(&self, id: &NodeId) -> Result<Vec<Node>>;

    /// Direct children, in insertion order.
    fn children(&self, id: &NodeId) -> Result<Vec<Node>>;

    fn has_children(&self, id: &NodeId) -> Result<bool>;

    fn child_by_name(&self, parent: &NodeId, name: &str) -> Result<Option<Node>>;

    /// Slash-separated path from the root, e.g. `/content/home`.
    fn node_path(&self, id: &NodeId) -> Result<Option<String>>;

    /// Top-level nodes.
    fn roots(&self) -> Result<Vec<Node>>;

    /// When the node row was created.
    fn created_at(&self, id: &NodeId) -> Result<Option<DateTime<Utc>>>;

    // =========================================================================
    // Template introspection
    // =========================================================================

    fn get_template(&self, id: &TemplateId) -> Result<Option<Template>>;

    fn template_by_name(&self, name: &str) -> Result<Option<Template>>;

    /// Whether the node's template declares the given field.
    fn template_declares_field(&self, node: &Node, field: &str) -> Result<bool>;

    /// Whether the node is the standard-values holder of its template.
    fn is_standard_values_holder(&self, node: &Node) -> Result<bool>;

    // =========================================================================
    // Fields
    // =========================================================================

    /// The field value carried by the node's own version.
    fn field_value(&self, node: &Node, field: &str) -> Result<Option<String>>;

    /// The field value of the node's own version, falling back to the
    /// template's standard-values holder.
    fn inherited_field_value(&self, node: &Node, field: &str) -> Result<Option<String>>;

    fn set_field_value(&self, node: &Node, field: &str, value: &str) -> Result<()>;

    // =========================================================================
    // Structural mutation
    // =========================================================================

    /// Create a node under `parent` with one initial version.
    fn add_node(&self, name: &str, template: &TemplateId, parent: &NodeId) -> Result<Node>;

    /// Create a top-level node with one initial version.
    fn add_root(&self, name: &str, template: &TemplateId) -> Result<Node>;

    /// Materialize the next version in the handle's language.
    fn add_version(&self, node: &Node) -> Result<Node>;

    /// Copy a node under `destination` as `copy_name` with id `copy_id`;
    /// `deep` copies the whole subtree. Versions, fields and the lock state
    /// are copied verbatim.
    fn copy_node(
        &self,
        node: &Node,
        destination: &NodeId,
        copy_name: &str,
        copy_id: NodeId,
        deep: bool,
    ) -> Result<Node>;

    /// Deep-copy a node next to itself under its own parent.
    fn duplicate_node(&self, node: &Node, copy_name: &str) -> Result<Node>;

    /// Reparent a node (and implicitly its subtree) under `destination`.
    fn move_node(&self, node: &Node, destination: &NodeId) -> Result<()>;

    /// Delete a node and its whole subtree.
    fn delete_node(&self, id: &NodeId) -> Result<()>;

    // =========================================================================
    // Edit locking
    // =========================================================================

    /// Acquire the edit lock for `owner`. Returns `false` when the lock is
    /// held by a different owner; re-acquiring an own lock succeeds.
    fn lock_node(&self, id: &NodeId, owner: &str) -> Result<bool>;

    fn unlock_node(&self, id: &NodeId) -> Result<()>;

    fn is_locked(&self, id: &NodeId) -> Result<bool>;

    fn lock_owner(&self, id: &NodeId) -> Result<Option<String>>;

    // =========================================================================
    // Workflow binding
    // =========================================================================

    /// The workflow provider attached to this repository, if any.
    fn workflow_provider(&self) -> Option<Arc<dyn WorkflowProvider>>;

    fn set_workflow_provider(&self, provider: Arc<dyn WorkflowProvider>);

    // =========================================================================
    // Repository administration
    // =========================================================================

    fn register_template(&self, template: Template) -> Result<()>;
}
