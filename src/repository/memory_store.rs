//! In-memory node store.
//!
//! Backs unit tests and dev tooling. Mirrors the behavior of the sqlite
//! store, and additionally exposes [`MemoryNodeStore::inject_add_violation`]
//! so tests can simulate a workflow precondition rejecting an add after the
//! node was already created — the scenario the lifecycle core must
//! compensate for.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use super::models::{Node, NodeId, Template, TemplateId, VersionRef, DEFAULT_LANGUAGE};
use super::naming::validate_node_name;
use super::trait_def::NodeStore;
use crate::workflow::{WorkflowProvider, WorkflowViolation};

struct NodeRecord {
    name: String,
    template: TemplateId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    versions: Vec<VersionRef>,
    fields: HashMap<(VersionRef, String), String>,
    lock: Option<String>,
    created: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    templates: HashMap<TemplateId, Template>,
    nodes: HashMap<NodeId, NodeRecord>,
    roots: Vec<NodeId>,
    pending_add_violation: Option<String>,
}

pub struct MemoryNodeStore {
    inner: Mutex<Inner>,
    provider: RwLock<Option<Arc<dyn WorkflowProvider>>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            provider: RwLock::new(None),
        }
    }

    /// Make the next `add_node` fail with a [`WorkflowViolation`] naming the
    /// node it created before being rejected.
    pub fn inject_add_violation(&self, reason: impl Into<String>) {
        self.inner.lock().unwrap().pending_add_violation = Some(reason.into());
    }

    fn handle(inner: &Inner, id: NodeId) -> Option<Node> {
        let record = inner.nodes.get(&id)?;
        Some(Self::handle_at(record, id, Self::default_version(record)))
    }

    fn handle_at(record: &NodeRecord, id: NodeId, version: VersionRef) -> Node {
        Node {
            id,
            name: record.name.clone(),
            template: record.template,
            parent: record.parent,
            version,
        }
    }

    fn default_version(record: &NodeRecord) -> VersionRef {
        record
            .versions
            .iter()
            .filter(|v| v.language == DEFAULT_LANGUAGE)
            .max_by_key(|v| v.number)
            .or_else(|| record.versions.first())
            .cloned()
            .unwrap_or_else(|| VersionRef::first(DEFAULT_LANGUAGE))
    }

    fn record<'a>(inner: &'a Inner, id: &NodeId) -> Result<&'a NodeRecord> {
        match inner.nodes.get(id) {
            Some(record) => Ok(record),
            None => bail!("node {} not found", id),
        }
    }

    fn record_mut<'a>(inner: &'a mut Inner, id: &NodeId) -> Result<&'a mut NodeRecord> {
        match inner.nodes.get_mut(id) {
            Some(record) => Ok(record),
            None => bail!("node {} not found", id),
        }
    }

    fn ensure_name_free(inner: &Inner, parent: Option<&NodeId>, name: &str) -> Result<()> {
        let siblings = match parent {
            Some(parent) => &Self::record(inner, parent)?.children,
            None => &inner.roots,
        };
        for sibling in siblings {
            if inner.nodes[sibling].name == name {
                bail!("a node named '{}' already exists here", name);
            }
        }
        Ok(())
    }

    fn insert_node(
        inner: &mut Inner,
        name: &str,
        template: &TemplateId,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        validate_node_name(name)?;
        if !inner.templates.contains_key(template) {
            bail!("template {} is not registered", template);
        }
        Self::ensure_name_free(inner, parent.as_ref(), name)?;
        let id = NodeId::new();
        inner.nodes.insert(
            id,
            NodeRecord {
                name: name.to_string(),
                template: *template,
                parent,
                children: Vec::new(),
                versions: vec![VersionRef::first(DEFAULT_LANGUAGE)],
                fields: HashMap::new(),
                lock: None,
                created: Utc::now(),
            },
        );
        match parent {
            Some(parent) => Self::record_mut(inner, &parent)?.children.push(id),
            None => inner.roots.push(id),
        }
        Ok(id)
    }

    fn copy_tree(
        inner: &mut Inner,
        source: &NodeId,
        destination: &NodeId,
        copy_name: &str,
        copy_id: NodeId,
        deep: bool,
    ) -> Result<()> {
        let source_record = Self::record(inner, source)?;
        let record = NodeRecord {
            name: copy_name.to_string(),
            template: source_record.template,
            parent: Some(*destination),
            children: Vec::new(),
            versions: source_record.versions.clone(),
            fields: source_record.fields.clone(),
            lock: source_record.lock.clone(),
            created: Utc::now(),
        };
        let child_ids = source_record.children.clone();
        inner.nodes.insert(copy_id, record);
        Self::record_mut(inner, destination)?.children.push(copy_id);
        if deep {
            for child_id in child_ids {
                let child_name = Self::record(inner, &child_id)?.name.clone();
                Self::copy_tree(inner, &child_id, &copy_id, &child_name, NodeId::new(), true)?;
            }
        }
        Ok(())
    }

    fn delete_tree(inner: &mut Inner, id: &NodeId) {
        if let Some(record) = inner.nodes.remove(id) {
            for child in record.children {
                Self::delete_tree(inner, &child);
            }
        }
    }

    fn is_descendant_of(inner: &Inner, candidate: &NodeId, ancestor: &NodeId) -> bool {
        let mut current = Some(*candidate);
        while let Some(id) = current {
            if id == *ancestor {
                return true;
            }
            current = inner.nodes.get(&id).and_then(|r| r.parent);
        }
        false
    }
}

impl Default for MemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore for MemoryNodeStore {
    fn get_node(&self, id: &NodeId) -> Result<Option<Node>> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::handle(&inner, *id))
    }

    fn get_version(&self, id: &NodeId, version: &VersionRef) -> Result<Option<Node>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .nodes
            .get(id)
            .map(|record| Self::handle_at(record, *id, version.clone())))
    }

    fn get_versions(&self, id: &NodeId) -> Result<Vec<Node>> {
        let inner = self.inner.lock().unwrap();
        let record = Self::record(&inner, id)?;
        let mut versions = record.versions.clone();
        versions.sort_by(|a, b| a.language.cmp(&b.language).then(a.number.cmp(&b.number)));
        Ok(versions
            .into_iter()
            .map(|version| Self::handle_at(record, *id, version))
            .collect())
    }

    fn children(&self, id: &NodeId) -> Result<Vec<Node>> {
        let inner = self.inner.lock().unwrap();
        let record = Self::record(&inner, id)?;
        Ok(record
            .children
            .iter()
            .filter_map(|child| Self::handle(&inner, *child))
            .collect())
    }

    fn has_children(&self, id: &NodeId) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(!Self::record(&inner, id)?.children.is_empty())
    }

    fn child_by_name(&self, parent: &NodeId, name: &str) -> Result<Option<Node>> {
        let inner = self.inner.lock().unwrap();
        let record = Self::record(&inner, parent)?;
        for child in &record.children {
            if inner.nodes[child].name == name {
                return Ok(Self::handle(&inner, *child));
            }
        }
        Ok(None)
    }

    fn node_path(&self, id: &NodeId) -> Result<Option<String>> {
        let inner = self.inner.lock().unwrap();
        if !inner.nodes.contains_key(id) {
            return Ok(None);
        }
        let mut segments = Vec::new();
        let mut current = Some(*id);
        while let Some(node_id) = current {
            let record = Self::record(&inner, &node_id)?;
            segments.push(record.name.clone());
            current = record.parent;
        }
        segments.reverse();
        Ok(Some(format!("/{}", segments.join("/"))))
    }

    fn roots(&self) -> Result<Vec<Node>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .roots
            .iter()
            .filter_map(|id| Self::handle(&inner, *id))
            .collect())
    }

    fn created_at(&self, id: &NodeId) -> Result<Option<DateTime<Utc>>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.nodes.get(id).map(|record| record.created))
    }

    fn get_template(&self, id: &TemplateId) -> Result<Option<Template>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.templates.get(id).cloned())
    }

    fn template_by_name(&self, name: &str) -> Result<Option<Template>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.templates.values().find(|t| t.name == name).cloned())
    }

    fn template_declares_field(&self, node: &Node, field: &str) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        match inner.templates.get(&node.template) {
            Some(template) => Ok(template.declares_field(field)),
            None => bail!("template {} is not registered", node.template),
        }
    }

    fn is_standard_values_holder(&self, node: &Node) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .templates
            .values()
            .any(|t| t.standard_values == Some(node.id)))
    }

    fn field_value(&self, node: &Node, field: &str) -> Result<Option<String>> {
        let inner = self.inner.lock().unwrap();
        let record = Self::record(&inner, &node.id)?;
        Ok(record
            .fields
            .get(&(node.version.clone(), field.to_string()))
            .cloned())
    }

    fn inherited_field_value(&self, node: &Node, field: &str) -> Result<Option<String>> {
        let inner = self.inner.lock().unwrap();
        let record = Self::record(&inner, &node.id)?;
        if let Some(value) = record.fields.get(&(node.version.clone(), field.to_string())) {
            return Ok(Some(value.clone()));
        }
        let standard_values = inner
            .templates
            .get(&record.template)
            .and_then(|t| t.standard_values);
        if let Some(holder_id) = standard_values {
            if holder_id != node.id {
                if let Some(holder) = inner.nodes.get(&holder_id) {
                    let version = Self::default_version(holder);
                    return Ok(holder.fields.get(&(version, field.to_string())).cloned());
                }
            }
        }
        Ok(None)
    }

    fn set_field_value(&self, node: &Node, field: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = Self::record_mut(&mut inner, &node.id)?;
        if !record.versions.contains(&node.version) {
            bail!("version {} of node {} does not exist", node.version, node.id);
        }
        record
            .fields
            .insert((node.version.clone(), field.to_string()), value.to_string());
        Ok(())
    }

    fn add_node(&self, name: &str, template: &TemplateId, parent: &NodeId) -> Result<Node> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.nodes.contains_key(parent) {
            bail!("parent node {} not found", parent);
        }
        let id = Self::insert_node(&mut inner, name, template, Some(*parent))?;
        if let Some(reason) = inner.pending_add_violation.take() {
            return Err(WorkflowViolation::new(format!("add of '{}'", name), reason)
                .with_node(id)
                .into());
        }
        Ok(Self::handle(&inner, id).expect("node was just inserted"))
    }

    fn add_root(&self, name: &str, template: &TemplateId) -> Result<Node> {
        let mut inner = self.inner.lock().unwrap();
        let id = Self::insert_node(&mut inner, name, template, None)?;
        Ok(Self::handle(&inner, id).expect("node was just inserted"))
    }

    fn add_version(&self, node: &Node) -> Result<Node> {
        let mut inner = self.inner.lock().unwrap();
        let record = Self::record_mut(&mut inner, &node.id)?;
        let next = record
            .versions
            .iter()
            .filter(|v| v.language == node.version.language)
            .map(|v| v.number)
            .max()
            .map_or(1, |n| n + 1);
        let version = VersionRef::new(node.version.language.clone(), next);
        record.versions.push(version.clone());
        Ok(Self::handle_at(record, node.id, version))
    }

    fn copy_node(
        &self,
        node: &Node,
        destination: &NodeId,
        copy_name: &str,
        copy_id: NodeId,
        deep: bool,
    ) -> Result<Node> {
        validate_node_name(copy_name)?;
        let mut inner = self.inner.lock().unwrap();
        if !inner.nodes.contains_key(&node.id) {
            bail!("node {} not found", node.id);
        }
        if !inner.nodes.contains_key(destination) {
            bail!("destination node {} not found", destination);
        }
        Self::ensure_name_free(&inner, Some(destination), copy_name)?;
        Self::copy_tree(&mut inner, &node.id, destination, copy_name, copy_id, deep)?;
        Ok(Self::handle(&inner, copy_id).expect("copy was just inserted"))
    }

    fn duplicate_node(&self, node: &Node, copy_name: &str) -> Result<Node> {
        let parent = match node.parent {
            Some(parent) => parent,
            None => bail!("cannot duplicate root node {}", node.id),
        };
        self.copy_node(node, &parent, copy_name, NodeId::new(), true)
    }

    fn move_node(&self, node: &Node, destination: &NodeId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.nodes.contains_key(destination) {
            bail!("destination node {} not found", destination);
        }
        if Self::is_descendant_of(&inner, destination, &node.id) {
            bail!("cannot move {} under its own subtree", node.id);
        }
        let old_parent = Self::record(&inner, &node.id)?.parent;
        match old_parent {
            Some(parent) => {
                let siblings = &mut Self::record_mut(&mut inner, &parent)?.children;
                siblings.retain(|c| c != &node.id);
            }
            None => inner.roots.retain(|c| c != &node.id),
        }
        Self::record_mut(&mut inner, destination)?.children.push(node.id);
        Self::record_mut(&mut inner, &node.id)?.parent = Some(*destination);
        Ok(())
    }

    fn delete_node(&self, id: &NodeId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let parent = Self::record(&inner, id)?.parent;
        match parent {
            Some(parent) => {
                if let Some(record) = inner.nodes.get_mut(&parent) {
                    record.children.retain(|c| c != id);
                }
            }
            None => inner.roots.retain(|c| c != id),
        }
        Self::delete_tree(&mut inner, id);
        Ok(())
    }

    fn lock_node(&self, id: &NodeId, owner: &str) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let record = Self::record_mut(&mut inner, id)?;
        match &record.lock {
            None => {
                record.lock = Some(owner.to_string());
                Ok(true)
            }
            Some(current) => Ok(current == owner),
        }
    }

    fn unlock_node(&self, id: &NodeId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::record_mut(&mut inner, id)?.lock = None;
        Ok(())
    }

    fn is_locked(&self, id: &NodeId) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::record(&inner, id)?.lock.is_some())
    }

    fn lock_owner(&self, id: &NodeId) -> Result<Option<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::record(&inner, id)?.lock.clone())
    }

    fn workflow_provider(&self) -> Option<Arc<dyn WorkflowProvider>> {
        self.provider.read().unwrap().clone()
    }

    fn set_workflow_provider(&self, provider: Arc<dyn WorkflowProvider>) {
        *self.provider.write().unwrap() = Some(provider);
    }

    fn register_template(&self, template: Template) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.templates.insert(template.id, template);
        Ok(())
    }
}
