//! Core data model for the content repository.
//!
//! A `Node` value is a snapshot *handle* to one (node, version) pair, not a
//! live record: two handles with the same id address the same stored node at
//! possibly different versions. All reads and writes go through a
//! [`NodeStore`](super::NodeStore).

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Language used for versions when the caller does not specify one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Well-known field identifiers.
///
/// The mere presence of [`fields::LOCK`] on a node's template (not its
/// value) determines whether edit-locking applies to the node.
pub mod fields {
    /// Id of the workflow a node is currently in.
    pub const WORKFLOW: &str = "__workflow";
    /// Id of the workflow a node enters when versioned for the first time.
    pub const DEFAULT_WORKFLOW: &str = "__default_workflow";
    /// Id of the workflow state the version currently sits in.
    pub const WORKFLOW_STATE: &str = "__workflow_state";
    /// Declares that nodes of this template participate in edit-locking.
    pub const LOCK: &str = "__lock";
}

/// Stable identifier of a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Stable identifier of a node template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateId(Uuid);

impl TemplateId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TemplateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Addresses one language/numbered variant of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRef {
    pub language: String,
    pub number: u32,
}

impl VersionRef {
    pub fn new(language: impl Into<String>, number: u32) -> Self {
        Self {
            language: language.into(),
            number,
        }
    }

    /// The first version in the given language.
    pub fn first(language: impl Into<String>) -> Self {
        Self::new(language, 1)
    }
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.language, self.number)
    }
}

/// Snapshot handle to a node at a specific version.
///
/// The parent reference is navigational only; ownership of the subtree lives
/// in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub template: TemplateId,
    pub parent: Option<NodeId>,
    pub version: VersionRef,
}

impl Node {
    /// The same node addressed at a different version.
    pub fn at_version(&self, version: VersionRef) -> Node {
        Node {
            version,
            ..self.clone()
        }
    }
}

/// Structural definition shared by all nodes of one type.
#[derive(Debug, Clone)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    /// Fields nodes of this template may carry.
    pub fields: Vec<String>,
    /// Node holding the template's inheritable default field values.
    pub standard_values: Option<NodeId>,
}

impl Template {
    pub fn declares_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_roundtrips_through_display() {
        let id = NodeId::new();
        let parsed: NodeId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn node_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<NodeId>().is_err());
    }

    #[test]
    fn version_ref_display() {
        assert_eq!(VersionRef::new("en", 3).to_string(), "en#3");
        assert_eq!(VersionRef::first("da").to_string(), "da#1");
    }

    #[test]
    fn at_version_keeps_identity() {
        let node = Node {
            id: NodeId::new(),
            name: "home".into(),
            template: TemplateId::new(),
            parent: None,
            version: VersionRef::first(DEFAULT_LANGUAGE),
        };
        let other = node.at_version(VersionRef::new(DEFAULT_LANGUAGE, 2));
        assert_eq!(other.id, node.id);
        assert_eq!(other.version.number, 2);
    }

    #[test]
    fn template_field_declaration() {
        let template = Template {
            id: TemplateId::new(),
            name: "document".into(),
            fields: vec![fields::LOCK.into(), "title".into()],
            standard_values: None,
        };
        assert!(template.declares_field(fields::LOCK));
        assert!(!template.declares_field(fields::WORKFLOW));
    }
}
