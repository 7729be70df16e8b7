//! Pipeline-style copy of one node under a target.

use anyhow::Result;
use tracing::info;

use crate::audit::format_node;
use crate::lifecycle::WorkflowContext;
use crate::repository::{naming, Node};

/// Copy `item_to_copy` under `target` with a name uniquified against the
/// target's existing children, writing an audit record. Returns the created
/// node for the caller's pipeline continuation.
pub fn copy_item_to(ctx: &WorkflowContext, item_to_copy: &Node, target: &Node) -> Result<Node> {
    let store = ctx.store();
    let copy_name = naming::copy_of_name(store.as_ref(), &target.id, &item_to_copy.name)?;
    let copied = ctx.copy_item(item_to_copy, &target.id, &copy_name)?;
    info!(
        target: "audit",
        "Copy item from: {} to {}",
        format_node(store.as_ref(), item_to_copy),
        format_node(store.as_ref(), &copied)
    );
    Ok(copied)
}
