//! Test fixture creation for the content repository.
//!
//! Builds an on-disk sqlite repository with two content templates:
//! - `document`: lockable, no workflow binding (workflow-exempt),
//! - `article`: lockable and bound to the editorial workflow through its
//!   template's standard-values holder.

use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use inkwell_content_repo::repository::fields;
use inkwell_content_repo::workflow::WorkflowStateDef;
use inkwell_content_repo::{
    FieldWorkflowProvider, Node, NodeStore, SqliteNodeStore, Template, TemplateId,
    WorkflowDefinition,
};

use super::constants::*;

pub struct TestRepo {
    // keeps the database directory alive for the duration of the test
    _dir: TempDir,
    pub store: Arc<dyn NodeStore>,
    pub content_root: Node,
    pub document_template: TemplateId,
    pub article_template: TemplateId,
}

pub fn editorial_workflow() -> WorkflowDefinition {
    WorkflowDefinition {
        id: WORKFLOW_EDITORIAL.into(),
        name: "Editorial".into(),
        initial_state: STATE_DRAFT.into(),
        states: vec![
            WorkflowStateDef {
                id: STATE_DRAFT.into(),
                name: "Draft".into(),
                is_final: false,
                editors: Some(vec![USER_ALICE.into()]),
            },
            WorkflowStateDef {
                id: STATE_PUBLISHED.into(),
                name: "Published".into(),
                is_final: true,
                editors: None,
            },
        ],
    }
}

pub fn create_test_repository() -> Result<TestRepo> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("content.db");
    let store: Arc<dyn NodeStore> = Arc::new(SqliteNodeStore::open(&db_path)?);

    let folder = Template {
        id: TemplateId::new(),
        name: "folder".into(),
        fields: vec![],
        standard_values: None,
    };
    store.register_template(folder.clone())?;

    let document = Template {
        id: TemplateId::new(),
        name: "document".into(),
        fields: vec![
            fields::LOCK.into(),
            fields::WORKFLOW.into(),
            fields::WORKFLOW_STATE.into(),
            "title".into(),
        ],
        standard_values: None,
    };
    store.register_template(document.clone())?;

    let article = Template {
        id: TemplateId::new(),
        name: "article".into(),
        fields: vec![
            fields::LOCK.into(),
            fields::WORKFLOW.into(),
            fields::WORKFLOW_STATE.into(),
            fields::DEFAULT_WORKFLOW.into(),
            "title".into(),
        ],
        standard_values: None,
    };
    store.register_template(article.clone())?;

    let content_root = store.add_root("content", &folder.id)?;
    let templates_root = store.add_root("templates", &folder.id)?;

    // standard-values holder binding articles to the editorial workflow
    let holder = store.add_node("article", &article.id, &templates_root.id)?;
    store.set_field_value(&holder, fields::WORKFLOW, WORKFLOW_EDITORIAL)?;
    store.set_field_value(&holder, fields::DEFAULT_WORKFLOW, WORKFLOW_EDITORIAL)?;
    store.register_template(Template {
        standard_values: Some(holder.id),
        ..article.clone()
    })?;

    let provider = Arc::new(FieldWorkflowProvider::new());
    provider.register(editorial_workflow());
    provider.attach_store(&store);
    store.set_workflow_provider(provider);

    Ok(TestRepo {
        _dir: dir,
        store,
        content_root,
        document_template: document.id,
        article_template: article.id,
    })
}
