//! Conditional edit-lock acquisition.

use std::sync::Arc;

use anyhow::Result;

use crate::repository::{fields, Node, NodeStore};

/// Acquires and releases the editing lock, but only for nodes whose template
/// declares the lock field; everything else passes through untouched.
pub struct LockController {
    store: Arc<dyn NodeStore>,
}

impl LockController {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    /// `None` signals "could not enter edit mode". Nodes without a lock
    /// field always succeed; locking is simply skipped for them.
    pub fn lock(&self, node: &Node, owner: &str) -> Result<Option<Node>> {
        if self.store.template_declares_field(node, fields::LOCK)?
            && !self.store.lock_node(&node.id, owner)?
        {
            return Ok(None);
        }
        Ok(Some(node.clone()))
    }

    /// Idempotent: unlocking an unlocked or non-lockable node is a no-op.
    pub fn unlock(&self, node: &Node) -> Result<Node> {
        if self.store.template_declares_field(node, fields::LOCK)? {
            if !self.store.is_locked(&node.id)? {
                return Ok(node.clone());
            }
            self.store.unlock_node(&node.id)?;
        }
        Ok(node.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryNodeStore, Template, TemplateId};

    fn setup() -> (Arc<dyn NodeStore>, Node, Node) {
        let store: Arc<dyn NodeStore> = Arc::new(MemoryNodeStore::new());
        let lockable = Template {
            id: TemplateId::new(),
            name: "document".into(),
            fields: vec![fields::LOCK.into()],
            standard_values: None,
        };
        let plain = Template {
            id: TemplateId::new(),
            name: "folder".into(),
            fields: vec![],
            standard_values: None,
        };
        store.register_template(lockable.clone()).unwrap();
        store.register_template(plain.clone()).unwrap();
        let root = store.add_root("content", &plain.id).unwrap();
        let lockable_node = store.add_node("page", &lockable.id, &root.id).unwrap();
        (store, root, lockable_node)
    }

    #[test]
    fn nodes_without_lock_field_are_never_refused() {
        let (store, plain_node, _) = setup();
        let locks = LockController::new(Arc::clone(&store));

        let locked = locks.lock(&plain_node, "alice").unwrap();
        assert!(locked.is_some());
        // the store was never touched
        assert!(!store.is_locked(&plain_node.id).unwrap());

        let unlocked = locks.unlock(&plain_node).unwrap();
        assert_eq!(unlocked.id, plain_node.id);
    }

    #[test]
    fn contended_lock_returns_none() {
        let (store, _, node) = setup();
        let locks = LockController::new(Arc::clone(&store));

        assert!(locks.lock(&node, "alice").unwrap().is_some());
        assert!(locks.lock(&node, "bob").unwrap().is_none());
        // re-acquiring an own lock is fine
        assert!(locks.lock(&node, "alice").unwrap().is_some());
    }

    #[test]
    fn unlock_is_idempotent() {
        let (store, _, node) = setup();
        let locks = LockController::new(Arc::clone(&store));

        locks.unlock(&node).unwrap();
        locks.lock(&node, "alice").unwrap();
        locks.unlock(&node).unwrap();
        locks.unlock(&node).unwrap();
        assert!(!store.is_locked(&node.id).unwrap());
    }
}
