use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::workflow::WorkflowDefinition;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub site_name: Option<String>,
    pub enable_workflow: Option<bool>,

    /// Workflow definitions registered with the repository's provider.
    pub workflows: Vec<WorkflowDefinition>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<FileConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: FileConfig = toml::from_str(
            r#"
            db_path = "/var/lib/inkwell/content.db"
            site_name = "intranet"
            enable_workflow = true

            [[workflows]]
            id = "editorial"
            name = "Editorial"
            initial_state = "draft"

            [[workflows.states]]
            id = "draft"
            name = "Draft"
            editors = ["alice"]

            [[workflows.states]]
            id = "published"
            name = "Published"
            is_final = true
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path.as_deref(), Some("/var/lib/inkwell/content.db"));
        assert_eq!(config.enable_workflow, Some(true));
        assert_eq!(config.workflows.len(), 1);
        let workflow = &config.workflows[0];
        assert_eq!(workflow.initial_state, "draft");
        assert_eq!(workflow.states.len(), 2);
        assert!(workflow.states[1].is_final);
        assert_eq!(
            workflow.states[0].editors.as_deref(),
            Some(&["alice".to_string()][..])
        );
    }

    #[test]
    fn empty_config_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.db_path.is_none());
        assert!(config.enable_workflow.is_none());
        assert!(config.workflows.is_empty());
    }
}
