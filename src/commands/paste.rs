//! Clipboard paste command.
//!
//! A "copy" payload goes through the lifecycle core so the pasted subtree is
//! reset, unlocked and gated like any other copy. A "cut" payload is a plain
//! move through the repository: moving is not a workflow-governed structural
//! mutation and bypasses the copy/version logic entirely.

use anyhow::{Context, Result};
use tracing::info;

use crate::audit::format_node;
use crate::lifecycle::WorkflowContext;
use crate::repository::{naming, Node, NodeId, NodeStore};

pub const COPY_PREFIX: &str = "content:copy:";
pub const CUT_PREFIX: &str = "content:cut:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardPayload {
    Copy(NodeId),
    Cut(NodeId),
}

impl ClipboardPayload {
    pub fn parse(data: &str) -> Option<ClipboardPayload> {
        if let Some(id) = data.strip_prefix(COPY_PREFIX) {
            return id.parse().ok().map(ClipboardPayload::Copy);
        }
        if let Some(id) = data.strip_prefix(CUT_PREFIX) {
            return id.parse().ok().map(ClipboardPayload::Cut);
        }
        None
    }

    pub fn serialize(&self) -> String {
        match self {
            ClipboardPayload::Copy(id) => format!("{}{}", COPY_PREFIX, id),
            ClipboardPayload::Cut(id) => format!("{}{}", CUT_PREFIX, id),
        }
    }
}

/// Paste the clipboard payload under `destination`. Returns the pasted node,
/// or `None` when the payload is not recognized or the cut source already
/// sits at the destination.
pub fn paste_from_clipboard(
    ctx: &WorkflowContext,
    data: &str,
    destination: &Node,
) -> Result<Option<Node>> {
    let store = ctx.store();
    let Some(payload) = ClipboardPayload::parse(data) else {
        return Ok(None);
    };
    match payload {
        ClipboardPayload::Copy(source_id) => {
            let source = store
                .get_node(&source_id)?
                .with_context(|| format!("clipboard source {} no longer exists", source_id))?;
            info!(
                target: "audit",
                "Paste from: {} to {}",
                format_node(store.as_ref(), &source),
                format_node(store.as_ref(), destination)
            );
            let copy_name = naming::copy_of_name(store.as_ref(), &destination.id, &source.name)?;
            ctx.copy_item(&source, &destination.id, &copy_name).map(Some)
        }
        ClipboardPayload::Cut(source_id) => {
            if source_id == destination.id {
                return Ok(None);
            }
            let source = store
                .get_node(&source_id)?
                .with_context(|| format!("clipboard source {} no longer exists", source_id))?;
            info!(
                target: "audit",
                "Cut from: {} to {}",
                format_node(store.as_ref(), &source),
                format_node(store.as_ref(), destination)
            );
            store.move_node(&source, &destination.id)?;
            store.get_node(&source_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ContextData;
    use crate::repository::{MemoryNodeStore, NodeStore, Template, TemplateId};
    use crate::security::Actor;
    use std::sync::Arc;

    fn setup() -> (Arc<dyn NodeStore>, WorkflowContext, Node, Node) {
        let store: Arc<dyn NodeStore> = Arc::new(MemoryNodeStore::new());
        let template = Template {
            id: TemplateId::new(),
            name: "folder".into(),
            fields: vec![],
            standard_values: None,
        };
        store.register_template(template.clone()).unwrap();
        let root = store.add_root("content", &template.id).unwrap();
        let source = store.add_node("page", &template.id, &root.id).unwrap();
        let target = store.add_node("archive", &template.id, &root.id).unwrap();
        let ctx = WorkflowContext::new(ContextData::new(Actor::named("alice")), Arc::clone(&store));
        (store, ctx, source, target)
    }

    #[test]
    fn payload_roundtrip() {
        let id = NodeId::new();
        for payload in [ClipboardPayload::Copy(id), ClipboardPayload::Cut(id)] {
            assert_eq!(
                ClipboardPayload::parse(&payload.serialize()),
                Some(payload)
            );
        }
        assert_eq!(ClipboardPayload::parse("something else"), None);
        assert_eq!(ClipboardPayload::parse("content:copy:not-a-uuid"), None);
    }

    #[test]
    fn copy_payload_creates_uniquified_copy() {
        let (store, ctx, source, target) = setup();
        let payload = ClipboardPayload::Copy(source.id).serialize();

        let pasted = paste_from_clipboard(&ctx, &payload, &target)
            .unwrap()
            .unwrap();
        assert_eq!(pasted.name, "copy of page");
        assert_eq!(pasted.parent, Some(target.id));
        // the source is untouched
        assert!(store.get_node(&source.id).unwrap().is_some());
    }

    #[test]
    fn cut_payload_moves_without_copying() {
        let (store, ctx, source, target) = setup();
        let payload = ClipboardPayload::Cut(source.id).serialize();

        let moved = paste_from_clipboard(&ctx, &payload, &target)
            .unwrap()
            .unwrap();
        assert_eq!(moved.id, source.id);
        assert_eq!(moved.parent, Some(target.id));
        assert_eq!(store.children(&target.id).unwrap().len(), 1);
    }

    #[test]
    fn cut_onto_itself_does_nothing() {
        let (_store, ctx, source, _target) = setup();
        let payload = ClipboardPayload::Cut(source.id).serialize();
        let result = paste_from_clipboard(&ctx, &payload, &source).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn unknown_payload_is_ignored() {
        let (_store, ctx, _source, target) = setup();
        let result = paste_from_clipboard(&ctx, "text/plain: hello", &target).unwrap();
        assert!(result.is_none());
    }
}
