use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessRight {
    Read,
    Write,
    Rename,
    CreateChildren,
    Delete,
    RemoveVersion,
}

impl AccessRight {
    /// Only these rights consult workflow-state security; every other right
    /// is evaluated against the node's own security settings.
    pub fn is_workflow_gated(self) -> bool {
        matches!(
            self,
            AccessRight::Write | AccessRight::Delete | AccessRight::RemoveVersion
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessRight::Read => "read",
            AccessRight::Write => "write",
            AccessRight::Rename => "rename",
            AccessRight::CreateChildren => "create-children",
            AccessRight::Delete => "delete",
            AccessRight::RemoveVersion => "remove-version",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "read" => Some(AccessRight::Read),
            "write" => Some(AccessRight::Write),
            "rename" => Some(AccessRight::Rename),
            "create-children" => Some(AccessRight::CreateChildren),
            "delete" => Some(AccessRight::Delete),
            "remove-version" => Some(AccessRight::RemoveVersion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPermission {
    Allow,
    Deny,
}

/// Outcome of an access evaluation. Immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessResult {
    pub permission: AccessPermission,
    pub explanation: String,
}

impl AccessResult {
    pub fn allow(explanation: impl Into<String>) -> Self {
        Self {
            permission: AccessPermission::Allow,
            explanation: explanation.into(),
        }
    }

    pub fn deny(explanation: impl Into<String>) -> Self {
        Self {
            permission: AccessPermission::Deny,
            explanation: explanation.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.permission == AccessPermission::Allow
    }
}
