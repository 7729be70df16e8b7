//! SQLite-backed node store implementation.
//!
//! Subtree ownership is encoded in `ON DELETE CASCADE` foreign keys: deleting
//! a node row removes its versions, fields, lock and, recursively, its
//! children.

use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::info;

use super::models::{Node, NodeId, Template, TemplateId, VersionRef, DEFAULT_LANGUAGE};
use super::naming::validate_node_name;
use super::trait_def::NodeStore;
use crate::sqlite_column;
use crate::sqlite_persistence::{Column, ForeignKey, Schema, SqlType, Table, DEFAULT_TIMESTAMP};
use crate::workflow::WorkflowProvider;

const NODES_FK: ForeignKey = ForeignKey {
    foreign_table: "nodes",
    foreign_column: "id",
};

const TEMPLATES_FK: ForeignKey = ForeignKey {
    foreign_table: "templates",
    foreign_column: "id",
};

const TEMPLATES_TABLE: Table = Table {
    name: "templates",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
        sqlite_column!("standard_values_id", SqlType::Text),
    ],
    indices: &[("idx_templates_name", "name")],
    unique_constraints: &[],
};

const TEMPLATE_FIELDS_TABLE: Table = Table {
    name: "template_fields",
    columns: &[
        sqlite_column!(
            "template_id",
            SqlType::Text,
            non_null = true,
            foreign_key = Some(&TEMPLATES_FK)
        ),
        sqlite_column!("field", SqlType::Text, non_null = true),
    ],
    indices: &[("idx_template_fields_template", "template_id")],
    unique_constraints: &[&["template_id", "field"]],
};

const NODES_TABLE: Table = Table {
    name: "nodes",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
        sqlite_column!("template_id", SqlType::Text, non_null = true),
        sqlite_column!("parent_id", SqlType::Text, foreign_key = Some(&NODES_FK)),
        sqlite_column!(
            "created",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_nodes_parent", "parent_id")],
    unique_constraints: &[],
};

const VERSIONS_TABLE: Table = Table {
    name: "versions",
    columns: &[
        sqlite_column!(
            "node_id",
            SqlType::Text,
            non_null = true,
            foreign_key = Some(&NODES_FK)
        ),
        sqlite_column!("language", SqlType::Text, non_null = true),
        sqlite_column!("number", SqlType::Integer, non_null = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_versions_node", "node_id")],
    unique_constraints: &[&["node_id", "language", "number"]],
};

const FIELDS_TABLE: Table = Table {
    name: "fields",
    columns: &[
        sqlite_column!(
            "node_id",
            SqlType::Text,
            non_null = true,
            foreign_key = Some(&NODES_FK)
        ),
        sqlite_column!("language", SqlType::Text, non_null = true),
        sqlite_column!("number", SqlType::Integer, non_null = true),
        sqlite_column!("field", SqlType::Text, non_null = true),
        sqlite_column!("value", SqlType::Text, non_null = true),
    ],
    indices: &[("idx_fields_node", "node_id")],
    unique_constraints: &[&["node_id", "language", "number", "field"]],
};

const LOCKS_TABLE: Table = Table {
    name: "locks",
    columns: &[
        sqlite_column!(
            "node_id",
            SqlType::Text,
            is_primary_key = true,
            foreign_key = Some(&NODES_FK)
        ),
        sqlite_column!("owner", SqlType::Text, non_null = true),
        sqlite_column!(
            "locked_at",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const NODE_SCHEMA: Schema = Schema {
    tables: &[
        TEMPLATES_TABLE,
        TEMPLATE_FIELDS_TABLE,
        NODES_TABLE,
        VERSIONS_TABLE,
        FIELDS_TABLE,
        LOCKS_TABLE,
    ],
};

pub struct SqliteNodeStore {
    conn: Arc<Mutex<Connection>>,
    provider: RwLock<Option<Arc<dyn WorkflowProvider>>>,
}

impl SqliteNodeStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open content database at {:?}", path))?;
        Self::prepare(conn, || format!("{:?}", path))
    }

    /// In-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::prepare(conn, || ":memory:".to_string())
    }

    fn prepare(conn: Connection, describe: impl Fn() -> String) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        if Schema::is_empty_database(&conn)? {
            info!("Creating content db schema at {}", describe());
            NODE_SCHEMA.create(&conn)?;
        } else {
            NODE_SCHEMA
                .validate(&conn)
                .with_context(|| format!("content database {} failed validation", describe()))?;
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            provider: RwLock::new(None),
        })
    }

    fn node_row(conn: &Connection, id: &NodeId) -> Result<Option<(String, TemplateId, Option<NodeId>)>> {
        let row = conn
            .query_row(
                "SELECT name, template_id, parent_id FROM nodes WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;
        match row {
            None => Ok(None),
            Some((name, template, parent)) => Ok(Some((
                name,
                template.parse()?,
                parent.as_deref().map(str::parse).transpose()?,
            ))),
        }
    }

    fn default_version(conn: &Connection, id: &NodeId) -> Result<VersionRef> {
        let preferred = conn
            .query_row(
                "SELECT MAX(number) FROM versions WHERE node_id = ?1 AND language = ?2",
                params![id.to_string(), DEFAULT_LANGUAGE],
                |row| row.get::<_, Option<u32>>(0),
            )
            .optional()?
            .flatten();
        if let Some(number) = preferred {
            return Ok(VersionRef::new(DEFAULT_LANGUAGE, number));
        }
        let first = conn
            .query_row(
                "SELECT language, number FROM versions WHERE node_id = ?1 \
                 ORDER BY language, number LIMIT 1",
                params![id.to_string()],
                |row| Ok(VersionRef::new(row.get::<_, String>(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(first.unwrap_or_else(|| VersionRef::first(DEFAULT_LANGUAGE)))
    }

    fn handle(conn: &Connection, id: &NodeId) -> Result<Option<Node>> {
        let Some((name, template, parent)) = Self::node_row(conn, id)? else {
            return Ok(None);
        };
        Ok(Some(Node {
            id: *id,
            name,
            template,
            parent,
            version: Self::default_version(conn, id)?,
        }))
    }

    fn require_node(conn: &Connection, id: &NodeId) -> Result<()> {
        if Self::node_row(conn, id)?.is_none() {
            bail!("node {} not found", id);
        }
        Ok(())
    }

    fn ensure_name_free(conn: &Connection, parent: Option<&NodeId>, name: &str) -> Result<()> {
        let taken: Option<i64> = match parent {
            Some(parent) => conn
                .query_row(
                    "SELECT 1 FROM nodes WHERE parent_id = ?1 AND name = ?2",
                    params![parent.to_string(), name],
                    |row| row.get(0),
                )
                .optional()?,
            None => conn
                .query_row(
                    "SELECT 1 FROM nodes WHERE parent_id IS NULL AND name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?,
        };
        if taken.is_some() {
            bail!("a node named '{}' already exists here", name);
        }
        Ok(())
    }

    fn insert_node(
        conn: &Connection,
        name: &str,
        template: &TemplateId,
        parent: Option<&NodeId>,
    ) -> Result<NodeId> {
        validate_node_name(name)?;
        let template_known: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM templates WHERE id = ?1",
                params![template.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if template_known.is_none() {
            bail!("template {} is not registered", template);
        }
        Self::ensure_name_free(conn, parent, name)?;
        let id = NodeId::new();
        conn.execute(
            "INSERT INTO nodes (id, name, template_id, parent_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                name,
                template.to_string(),
                parent.map(|p| p.to_string())
            ],
        )?;
        conn.execute(
            "INSERT INTO versions (node_id, language, number) VALUES (?1, ?2, 1)",
            params![id.to_string(), DEFAULT_LANGUAGE],
        )?;
        Ok(id)
    }

    fn copy_tree(
        tx: &Transaction,
        source: &NodeId,
        destination: &NodeId,
        copy_name: &str,
        copy_id: NodeId,
        deep: bool,
    ) -> Result<()> {
        tx.execute(
            "INSERT INTO nodes (id, name, template_id, parent_id) \
             SELECT ?1, ?2, template_id, ?3 FROM nodes WHERE id = ?4",
            params![
                copy_id.to_string(),
                copy_name,
                destination.to_string(),
                source.to_string()
            ],
        )?;
        tx.execute(
            "INSERT INTO versions (node_id, language, number) \
             SELECT ?1, language, number FROM versions WHERE node_id = ?2",
            params![copy_id.to_string(), source.to_string()],
        )?;
        tx.execute(
            "INSERT INTO fields (node_id, language, number, field, value) \
             SELECT ?1, language, number, field, value FROM fields WHERE node_id = ?2",
            params![copy_id.to_string(), source.to_string()],
        )?;
        tx.execute(
            "INSERT INTO locks (node_id, owner) \
             SELECT ?1, owner FROM locks WHERE node_id = ?2",
            params![copy_id.to_string(), source.to_string()],
        )?;
        if deep {
            let children: Vec<(NodeId, String)> = {
                let mut stmt = tx.prepare(
                    "SELECT id, name FROM nodes WHERE parent_id = ?1 ORDER BY rowid",
                )?;
                let rows = stmt.query_map(params![source.to_string()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?;
                let mut children = Vec::new();
                for row in rows {
                    let (id, name) = row?;
                    children.push((id.parse()?, name));
                }
                children
            };
            for (child_id, child_name) in children {
                Self::copy_tree(tx, &child_id, &copy_id, &child_name, NodeId::new(), true)?;
            }
        }
        Ok(())
    }

    fn is_descendant_of(conn: &Connection, candidate: &NodeId, ancestor: &NodeId) -> Result<bool> {
        let mut current = Some(*candidate);
        while let Some(id) = current {
            if id == *ancestor {
                return Ok(true);
            }
            current = match Self::node_row(conn, &id)? {
                Some((_, _, parent)) => parent,
                None => None,
            };
        }
        Ok(false)
    }
}

impl NodeStore for SqliteNodeStore {
    fn get_node(&self, id: &NodeId) -> Result<Option<Node>> {
        let conn = self.conn.lock().unwrap();
        Self::handle(&conn, id)
    }

    fn get_version(&self, id: &NodeId, version: &VersionRef) -> Result<Option<Node>> {
        let conn = self.conn.lock().unwrap();
        let Some((name, template, parent)) = Self::node_row(&conn, id)? else {
            return Ok(None);
        };
        Ok(Some(Node {
            id: *id,
            name,
            template,
            parent,
            version: version.clone(),
        }))
    }

    fn get_versions(&self, id: &NodeId) -> Result<Vec<Node>> {
        let conn = self.conn.lock().unwrap();
        let Some((name, template, parent)) = Self::node_row(&conn, id)? else {
            bail!("node {} not found", id);
        };
        let mut stmt = conn.prepare(
            "SELECT language, number FROM versions WHERE node_id = ?1 ORDER BY language, number",
        )?;
        let versions = stmt
            .query_map(params![id.to_string()], |row| {
                Ok(VersionRef::new(row.get::<_, String>(0)?, row.get(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(versions
            .into_iter()
            .map(|version| Node {
                id: *id,
                name: name.clone(),
                template,
                parent,
                version,
            })
            .collect())
    }

    fn children(&self, id: &NodeId) -> Result<Vec<Node>> {
        let conn = self.conn.lock().unwrap();
        Self::require_node(&conn, id)?;
        let child_ids: Vec<NodeId> = {
            let mut stmt =
                conn.prepare("SELECT id FROM nodes WHERE parent_id = ?1 ORDER BY rowid")?;
            let rows = stmt.query_map(params![id.to_string()], |row| row.get::<_, String>(0))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?.parse()?);
            }
            ids
        };
        let mut children = Vec::with_capacity(child_ids.len());
        for child_id in child_ids {
            if let Some(node) = Self::handle(&conn, &child_id)? {
                children.push(node);
            }
        }
        Ok(children)
    }

    fn has_children(&self, id: &NodeId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        Self::require_node(&conn, id)?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM nodes WHERE parent_id = ?1 LIMIT 1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn child_by_name(&self, parent: &NodeId, name: &str) -> Result<Option<Node>> {
        let conn = self.conn.lock().unwrap();
        Self::require_node(&conn, parent)?;
        let child: Option<String> = conn
            .query_row(
                "SELECT id FROM nodes WHERE parent_id = ?1 AND name = ?2",
                params![parent.to_string(), name],
                |row| row.get(0),
            )
            .optional()?;
        match child {
            Some(id) => Self::handle(&conn, &id.parse()?),
            None => Ok(None),
        }
    }

    fn node_path(&self, id: &NodeId) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        if Self::node_row(&conn, id)?.is_none() {
            return Ok(None);
        }
        let mut segments = Vec::new();
        let mut current = Some(*id);
        while let Some(node_id) = current {
            let Some((name, _, parent)) = Self::node_row(&conn, &node_id)? else {
                break;
            };
            segments.push(name);
            current = parent;
        }
        segments.reverse();
        Ok(Some(format!("/{}", segments.join("/"))))
    }

    fn roots(&self) -> Result<Vec<Node>> {
        let conn = self.conn.lock().unwrap();
        let root_ids: Vec<NodeId> = {
            let mut stmt =
                conn.prepare("SELECT id FROM nodes WHERE parent_id IS NULL ORDER BY rowid")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?.parse()?);
            }
            ids
        };
        let mut roots = Vec::with_capacity(root_ids.len());
        for root_id in root_ids {
            if let Some(node) = Self::handle(&conn, &root_id)? {
                roots.push(node);
            }
        }
        Ok(roots)
    }

    fn created_at(&self, id: &NodeId) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().unwrap();
        let seconds: Option<i64> = conn
            .query_row(
                "SELECT created FROM nodes WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seconds.and_then(|s| DateTime::from_timestamp(s, 0)))
    }

    fn get_template(&self, id: &TemplateId) -> Result<Option<Template>> {
        let conn = self.conn.lock().unwrap();
        let row: Option<(String, Option<String>)> = conn
            .query_row(
                "SELECT name, standard_values_id FROM templates WHERE id = ?1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((name, standard_values)) = row else {
            return Ok(None);
        };
        let mut stmt =
            conn.prepare("SELECT field FROM template_fields WHERE template_id = ?1")?;
        let fields = stmt
            .query_map(params![id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Some(Template {
            id: *id,
            name,
            fields,
            standard_values: standard_values.as_deref().map(str::parse).transpose()?,
        }))
    }

    fn template_by_name(&self, name: &str) -> Result<Option<Template>> {
        let id: Option<String> = {
            let conn = self.conn.lock().unwrap();
            conn.query_row(
                "SELECT id FROM templates WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?
        };
        match id {
            Some(id) => self.get_template(&id.parse()?),
            None => Ok(None),
        }
    }

    fn template_declares_field(&self, node: &Node, field: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM template_fields WHERE template_id = ?1 AND field = ?2",
                params![node.template.to_string(), field],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn is_standard_values_holder(&self, node: &Node) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM templates WHERE standard_values_id = ?1",
                params![node.id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn field_value(&self, node: &Node, field: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT value FROM fields \
                 WHERE node_id = ?1 AND language = ?2 AND number = ?3 AND field = ?4",
                params![
                    node.id.to_string(),
                    node.version.language,
                    node.version.number,
                    field
                ],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn inherited_field_value(&self, node: &Node, field: &str) -> Result<Option<String>> {
        if let Some(own) = self.field_value(node, field)? {
            return Ok(Some(own));
        }
        let holder: Option<NodeId> = {
            let conn = self.conn.lock().unwrap();
            let value: Option<Option<String>> = conn
                .query_row(
                    "SELECT standard_values_id FROM templates WHERE id = ?1",
                    params![node.template.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            value.flatten().as_deref().map(str::parse).transpose()?
        };
        match holder {
            Some(holder_id) if holder_id != node.id => {
                match self.get_node(&holder_id)? {
                    Some(holder) => self.field_value(&holder, field),
                    None => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn set_field_value(&self, node: &Node, field: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let version_exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM versions WHERE node_id = ?1 AND language = ?2 AND number = ?3",
                params![
                    node.id.to_string(),
                    node.version.language,
                    node.version.number
                ],
                |row| row.get(0),
            )
            .optional()?;
        if version_exists.is_none() {
            bail!("version {} of node {} does not exist", node.version, node.id);
        }
        conn.execute(
            "INSERT OR REPLACE INTO fields (node_id, language, number, field, value) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                node.id.to_string(),
                node.version.language,
                node.version.number,
                field,
                value
            ],
        )?;
        Ok(())
    }

    fn add_node(&self, name: &str, template: &TemplateId, parent: &NodeId) -> Result<Node> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::require_node(&tx, parent)?;
        let id = Self::insert_node(&tx, name, template, Some(parent))?;
        tx.commit()?;
        Ok(Self::handle(&conn, &id)?.expect("node was just inserted"))
    }

    fn add_root(&self, name: &str, template: &TemplateId) -> Result<Node> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let id = Self::insert_node(&tx, name, template, None)?;
        tx.commit()?;
        Ok(Self::handle(&conn, &id)?.expect("node was just inserted"))
    }

    fn add_version(&self, node: &Node) -> Result<Node> {
        let conn = self.conn.lock().unwrap();
        Self::require_node(&conn, &node.id)?;
        let next: u32 = conn
            .query_row(
                "SELECT COALESCE(MAX(number), 0) + 1 FROM versions \
                 WHERE node_id = ?1 AND language = ?2",
                params![node.id.to_string(), node.version.language],
                |row| row.get(0),
            )?;
        conn.execute(
            "INSERT INTO versions (node_id, language, number) VALUES (?1, ?2, ?3)",
            params![node.id.to_string(), node.version.language, next],
        )?;
        Ok(node.at_version(VersionRef::new(node.version.language.clone(), next)))
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
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::require_node(&tx, &node.id)?;
        Self::require_node(&tx, destination)?;
        Self::ensure_name_free(&tx, Some(destination), copy_name)?;
        Self::copy_tree(&tx, &node.id, destination, copy_name, copy_id, deep)?;
        tx.commit()?;
        Ok(Self::handle(&conn, &copy_id)?.expect("copy was just inserted"))
    }

    fn duplicate_node(&self, node: &Node, copy_name: &str) -> Result<Node> {
        let parent = match node.parent {
            Some(parent) => parent,
            None => bail!("cannot duplicate root node {}", node.id),
        };
        self.copy_node(node, &parent, copy_name, NodeId::new(), true)
    }

    fn move_node(&self, node: &Node, destination: &NodeId) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        Self::require_node(&conn, &node.id)?;
        Self::require_node(&conn, destination)?;
        if Self::is_descendant_of(&conn, destination, &node.id)? {
            bail!("cannot move {} under its own subtree", node.id);
        }
        conn.execute(
            "UPDATE nodes SET parent_id = ?1 WHERE id = ?2",
            params![destination.to_string(), node.id.to_string()],
        )?;
        Ok(())
    }

    fn delete_node(&self, id: &NodeId) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        Self::require_node(&conn, id)?;
        conn.execute("DELETE FROM nodes WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    fn lock_node(&self, id: &NodeId, owner: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        Self::require_node(&conn, id)?;
        let current: Option<String> = conn
            .query_row(
                "SELECT owner FROM locks WHERE node_id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match current {
            None => {
                conn.execute(
                    "INSERT INTO locks (node_id, owner) VALUES (?1, ?2)",
                    params![id.to_string(), owner],
                )?;
                Ok(true)
            }
            Some(current) => Ok(current == owner),
        }
    }

    fn unlock_node(&self, id: &NodeId) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        Self::require_node(&conn, id)?;
        conn.execute(
            "DELETE FROM locks WHERE node_id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    fn is_locked(&self, id: &NodeId) -> Result<bool> {
        Ok(self.lock_owner(id)?.is_some())
    }

    fn lock_owner(&self, id: &NodeId) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        Self::require_node(&conn, id)?;
        Ok(conn
            .query_row(
                "SELECT owner FROM locks WHERE node_id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn workflow_provider(&self) -> Option<Arc<dyn WorkflowProvider>> {
        self.provider.read().unwrap().clone()
    }

    fn set_workflow_provider(&self, provider: Arc<dyn WorkflowProvider>) {
        *self.provider.write().unwrap() = Some(provider);
    }

    fn register_template(&self, template: Template) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO templates (id, name, standard_values_id) VALUES (?1, ?2, ?3)",
            params![
                template.id.to_string(),
                template.name,
                template.standard_values.map(|id| id.to_string())
            ],
        )?;
        tx.execute(
            "DELETE FROM template_fields WHERE template_id = ?1",
            params![template.id.to_string()],
        )?;
        for field in &template.fields {
            tx.execute(
                "INSERT INTO template_fields (template_id, field) VALUES (?1, ?2)",
                params![template.id.to_string(), field],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
