//! Audit record formatting.
//!
//! Audit records go through `tracing` under the `audit` target so operators
//! can route them separately from diagnostic logs. Formatting failures fall
//! back to the bare identity; audit output must never fail an operation.

use crate::repository::{Node, NodeStore};

/// Renders a node for audit records: `name [id] at /path`.
pub fn format_node(store: &dyn NodeStore, node: &Node) -> String {
    match store.node_path(&node.id) {
        Ok(Some(path)) => format!("{} [{}] at {}", node.name, node.id, path),
        _ => format!("{} [{}]", node.name, node.id),
    }
}
