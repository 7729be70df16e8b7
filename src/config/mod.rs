mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::workflow::WorkflowDefinition;

/// Ambient site settings; the policy's `Default` override defers to
/// `enable_workflow`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub name: String,
    pub enable_workflow: bool,
}

impl SiteSettings {
    pub fn new(name: impl Into<String>, enable_workflow: bool) -> Self {
        Self {
            name: name.into(),
            enable_workflow,
        }
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML
/// config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub site_name: Option<String>,
    pub enable_workflow: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub site: SiteSettings,
    pub workflows: Vec<WorkflowDefinition>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone());
        let Some(db_path) = db_path else {
            bail!("db_path must be specified via --db-path or in the config file");
        };
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                bail!("database directory does not exist: {:?}", parent);
            }
        }

        let site_name = file
            .site_name
            .or_else(|| cli.site_name.clone())
            .unwrap_or_else(|| "default".to_string());
        let enable_workflow = file.enable_workflow.unwrap_or(cli.enable_workflow);

        Ok(AppConfig {
            db_path,
            site: SiteSettings::new(site_name, enable_workflow),
            workflows: file.workflows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_cli() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("cli.db")),
            site_name: Some("cli-site".into()),
            enable_workflow: false,
        };
        let file: FileConfig = toml::from_str(
            r#"
            site_name = "file-site"
            enable_workflow = true
            "#,
        )
        .unwrap();

        let resolved = AppConfig::resolve(&cli, Some(file)).unwrap();
        assert_eq!(resolved.db_path, PathBuf::from("cli.db"));
        assert_eq!(resolved.site.name, "file-site");
        assert!(resolved.site.enable_workflow);
    }

    #[test]
    fn missing_db_path_is_rejected() {
        let error = AppConfig::resolve(&CliConfig::default(), None).unwrap_err();
        assert!(error.to_string().contains("db_path"));
    }

    #[test]
    fn defaults_without_file() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("content.db")),
            ..Default::default()
        };
        let resolved = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(resolved.site.name, "default");
        assert!(!resolved.site.enable_workflow);
        assert!(resolved.workflows.is_empty());
    }
}
