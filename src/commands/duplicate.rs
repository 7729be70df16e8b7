//! Duplicate command.

use anyhow::Result;

use crate::lifecycle::WorkflowContext;
use crate::repository::Node;

/// Surfaces node duplication to command callers. All gating lives in the
/// lifecycle core; this must stay a plain delegation.
pub fn duplicate_item(ctx: &WorkflowContext, node: &Node, name: Option<&str>) -> Result<Node> {
    match name {
        Some(name) => ctx.duplicate_item_as(node, name),
        None => ctx.duplicate_item(node),
    }
}
