//! Field-backed workflow state machine.
//!
//! Stores each version's state in the `__workflow_state` field and binds to
//! nodes through their own (or inherited) `__workflow` field, so workflow
//! membership travels with copies and standard-values inheritance. The
//! transition rules themselves live in [`WorkflowDefinition`]s registered
//! with the provider; the lifecycle core never looks inside them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use anyhow::{bail, Result};
use serde::Deserialize;

use super::trait_def::{Workflow, WorkflowProvider};
use crate::repository::{fields, Node, NodeStore};
use crate::security::{AccessResult, AccessRight, Actor};

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowStateDef {
    pub id: String,
    pub name: String,
    /// Final states approve the version for leaving the workflow.
    #[serde(default)]
    pub is_final: bool,
    /// When set, only these actors get the workflow-gated rights while a
    /// version sits in this state. `None` means no state-level restriction.
    #[serde(default)]
    pub editors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    pub name: String,
    pub initial_state: String,
    pub states: Vec<WorkflowStateDef>,
}

impl WorkflowDefinition {
    pub fn state(&self, id: &str) -> Option<&WorkflowStateDef> {
        self.states.iter().find(|s| s.id == id)
    }
}

/// One workflow bound to one node lookup; cheap to construct per call.
pub struct FieldWorkflow {
    definition: Arc<WorkflowDefinition>,
    store: Weak<dyn NodeStore>,
}

impl FieldWorkflow {
    fn store(&self) -> Result<Arc<dyn NodeStore>> {
        match self.store.upgrade() {
            Some(store) => Ok(store),
            None => bail!("workflow '{}' is detached from its repository", self.definition.id),
        }
    }

    fn current_state(&self, store: &dyn NodeStore, node: &Node) -> Result<String> {
        Ok(store
            .field_value(node, fields::WORKFLOW_STATE)?
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.definition.initial_state.clone()))
    }
}

impl Workflow for FieldWorkflow {
    fn id(&self) -> &str {
        &self.definition.id
    }

    fn is_approved(&self, node: &Node, _target_scope: Option<&str>) -> Result<bool> {
        let store = self.store()?;
        let state_id = self.current_state(store.as_ref(), node)?;
        Ok(self
            .definition
            .state(&state_id)
            .map(|s| s.is_final)
            .unwrap_or(false))
    }

    fn start(&self, node: &Node) -> Result<()> {
        let store = self.store()?;
        store.set_field_value(node, fields::WORKFLOW, &self.definition.id)?;
        store.set_field_value(node, fields::WORKFLOW_STATE, &self.definition.initial_state)
    }

    fn get_access(&self, node: &Node, actor: &Actor, right: AccessRight) -> Result<AccessResult> {
        if actor.is_administrator {
            return Ok(AccessResult::allow(
                "administrators bypass workflow state security",
            ));
        }
        let store = self.store()?;
        let state_id = self.current_state(store.as_ref(), node)?;
        let Some(state) = self.definition.state(&state_id) else {
            return Ok(AccessResult::deny(format!(
                "version sits in unknown workflow state '{}'",
                state_id
            )));
        };
        if let Some(editors) = &state.editors {
            if !editors.iter().any(|e| e == &actor.name) {
                return Ok(AccessResult::deny(format!(
                    "workflow state '{}' limits {} access to its designated editors",
                    state.name,
                    right.as_str()
                )));
            }
        }
        Ok(AccessResult::allow(format!(
            "workflow state '{}' does not restrict {}",
            state.name,
            right.as_str()
        )))
    }
}

/// Binds [`FieldWorkflow`]s to nodes via the `__workflow` field, falling
/// back to the inherited `__default_workflow`.
pub struct FieldWorkflowProvider {
    store: RwLock<Weak<dyn NodeStore>>,
    definitions: RwLock<HashMap<String, Arc<WorkflowDefinition>>>,
}

impl FieldWorkflowProvider {
    pub fn new() -> Self {
        // placeholder that upgrades to nothing until a store is attached
        let detached: Weak<dyn NodeStore> = Weak::<crate::repository::MemoryNodeStore>::new();
        Self {
            store: RwLock::new(detached),
            definitions: RwLock::new(HashMap::new()),
        }
    }

    /// Point the provider at the repository whose fields hold the state.
    /// Held weakly so the store can own the provider without a cycle.
    pub fn attach_store(&self, store: &Arc<dyn NodeStore>) {
        *self.store.write().unwrap() = Arc::downgrade(store);
    }

    pub fn register(&self, definition: WorkflowDefinition) {
        self.definitions
            .write()
            .unwrap()
            .insert(definition.id.clone(), Arc::new(definition));
    }
}

impl Default for FieldWorkflowProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowProvider for FieldWorkflowProvider {
    fn workflow_for(&self, node: &Node) -> Result<Option<Arc<dyn Workflow>>> {
        let store_ref = self.store.read().unwrap().clone();
        let Some(store) = store_ref.upgrade() else {
            return Ok(None);
        };
        let bound = match store.field_value(node, fields::WORKFLOW)? {
            Some(id) if !id.is_empty() => Some(id),
            _ => store
                .inherited_field_value(node, fields::WORKFLOW)?
                .filter(|id| !id.is_empty()),
        };
        let Some(workflow_id) = bound else {
            return Ok(None);
        };
        let definition = self
            .definitions
            .read()
            .unwrap()
            .get(&workflow_id)
            .cloned();
        Ok(definition.map(|definition| {
            Arc::new(FieldWorkflow {
                definition,
                store: store_ref,
            }) as Arc<dyn Workflow>
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryNodeStore, Template, TemplateId};

    fn editorial_definition() -> WorkflowDefinition {
        WorkflowDefinition {
            id: "editorial".into(),
            name: "Editorial".into(),
            initial_state: "draft".into(),
            states: vec![
                WorkflowStateDef {
                    id: "draft".into(),
                    name: "Draft".into(),
                    is_final: false,
                    editors: Some(vec!["alice".into()]),
                },
                WorkflowStateDef {
                    id: "published".into(),
                    name: "Published".into(),
                    is_final: true,
                    editors: None,
                },
            ],
        }
    }

    fn workflow_setup() -> (Arc<dyn NodeStore>, Arc<FieldWorkflowProvider>, Node) {
        let store: Arc<dyn NodeStore> = Arc::new(MemoryNodeStore::new());
        let template = Template {
            id: TemplateId::new(),
            name: "article".into(),
            fields: vec![
                fields::WORKFLOW.into(),
                fields::WORKFLOW_STATE.into(),
            ],
            standard_values: None,
        };
        store.register_template(template.clone()).unwrap();
        let root = store.add_root("content", &template.id).unwrap();

        let provider = Arc::new(FieldWorkflowProvider::new());
        provider.register(editorial_definition());
        provider.attach_store(&store);
        (store, provider, root)
    }

    #[test]
    fn unbound_node_has_no_workflow() {
        let (_store, provider, root) = workflow_setup();
        assert!(provider.workflow_for(&root).unwrap().is_none());
    }

    #[test]
    fn start_binds_and_resets_state() {
        let (store, provider, root) = workflow_setup();
        store
            .set_field_value(&root, fields::WORKFLOW, "editorial")
            .unwrap();
        let workflow = provider.workflow_for(&root).unwrap().unwrap();

        store
            .set_field_value(&root, fields::WORKFLOW_STATE, "published")
            .unwrap();
        assert!(workflow.is_approved(&root, None).unwrap());

        workflow.start(&root).unwrap();
        assert_eq!(
            store
                .field_value(&root, fields::WORKFLOW_STATE)
                .unwrap()
                .as_deref(),
            Some("draft")
        );
        assert!(!workflow.is_approved(&root, None).unwrap());
    }

    #[test]
    fn missing_state_defaults_to_initial() {
        let (store, provider, root) = workflow_setup();
        store
            .set_field_value(&root, fields::WORKFLOW, "editorial")
            .unwrap();
        let workflow = provider.workflow_for(&root).unwrap().unwrap();
        // no __workflow_state written yet: draft, not approved
        assert!(!workflow.is_approved(&root, None).unwrap());
    }

    #[test]
    fn state_editors_gate_access() {
        let (store, provider, root) = workflow_setup();
        store
            .set_field_value(&root, fields::WORKFLOW, "editorial")
            .unwrap();
        let workflow = provider.workflow_for(&root).unwrap().unwrap();

        let alice = Actor::named("alice");
        let bob = Actor::named("bob");
        let admin = Actor::administrator("root");

        assert!(workflow
            .get_access(&root, &alice, AccessRight::Write)
            .unwrap()
            .is_allowed());
        assert!(!workflow
            .get_access(&root, &bob, AccessRight::Write)
            .unwrap()
            .is_allowed());
        assert!(workflow
            .get_access(&root, &admin, AccessRight::Write)
            .unwrap()
            .is_allowed());

        // published places no editor restriction
        store
            .set_field_value(&root, fields::WORKFLOW_STATE, "published")
            .unwrap();
        assert!(workflow
            .get_access(&root, &bob, AccessRight::Delete)
            .unwrap()
            .is_allowed());
    }

    #[test]
    fn unknown_definition_means_unbound() {
        let (store, provider, root) = workflow_setup();
        store
            .set_field_value(&root, fields::WORKFLOW, "no-such-workflow")
            .unwrap();
        assert!(provider.workflow_for(&root).unwrap().is_none());
    }
}
