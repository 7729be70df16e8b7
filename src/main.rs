use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use inkwell_content_repo::commands;
use inkwell_content_repo::repository::fields;
use inkwell_content_repo::{
    Actor, AppConfig, CliConfig, ContextData, FieldWorkflowProvider, FileConfig, Node, NodeId,
    NodeStore, SqliteNodeStore, Template, TemplateId, WorkflowContext,
};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite content database file.
    #[clap(long)]
    db_path: Option<PathBuf>,

    /// Path to a TOML config file; file values override CLI values.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Name of the acting user.
    #[clap(long, default_value = "admin")]
    user: String,

    /// Give the acting user global administrator rights.
    #[clap(long)]
    admin: bool,

    /// Site name used for workflow resolution.
    #[clap(long)]
    site: Option<String>,

    /// Enable workflow enforcement for the site.
    #[clap(long)]
    enable_workflow: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema, a starter template set and a root node.
    Init,
    /// Print the content tree.
    Tree {
        /// Emit the tree as JSON instead of indented text.
        #[clap(long)]
        json: bool,
    },
    /// Add a node under a parent.
    Add {
        #[clap(long)]
        parent: NodeId,
        #[clap(long)]
        name: String,
        /// Template name, e.g. "document" or "folder".
        #[clap(long, default_value = "document")]
        template: String,
    },
    /// Deep-copy a node under a destination.
    Copy {
        #[clap(long)]
        source: NodeId,
        #[clap(long)]
        dest: NodeId,
        /// Copy name; derived as "copy of {name}" when omitted.
        #[clap(long)]
        name: Option<String>,
    },
    /// Duplicate a node next to itself.
    Duplicate {
        #[clap(long)]
        source: NodeId,
        #[clap(long)]
        name: Option<String>,
    },
    /// Delete a node and its subtree.
    Delete {
        #[clap(long)]
        id: NodeId,
    },
    /// Reset workflow state across a node's subtree.
    ResetWorkflow {
        #[clap(long)]
        id: NodeId,
        #[clap(long)]
        all_versions: bool,
    },
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        db_path: args.db_path.clone(),
        site_name: args.site.clone(),
        enable_workflow: args.enable_workflow,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening content database at {:?}...", config.db_path);
    let store: Arc<dyn NodeStore> = Arc::new(SqliteNodeStore::open(&config.db_path)?);

    if !config.workflows.is_empty() {
        let provider = Arc::new(FieldWorkflowProvider::new());
        for definition in config.workflows.clone() {
            provider.register(definition);
        }
        provider.attach_store(&store);
        store.set_workflow_provider(provider);
    }

    let user = if args.admin {
        Actor::administrator(&args.user)
    } else {
        Actor::named(&args.user)
    };
    let context = ContextData::new(user).with_site(config.site.clone());
    let ctx = WorkflowContext::new(context, Arc::clone(&store));

    match args.command {
        Command::Init => init(&store),
        Command::Tree { json } => tree(&store, json),
        Command::Add {
            parent,
            name,
            template,
        } => {
            let template = store
                .template_by_name(&template)?
                .with_context(|| format!("template '{}' is not registered", template))?;
            let node = ctx.add_item(&name, &template.id, &parent)?;
            println!("added {} [{}]", node.name, node.id);
            Ok(())
        }
        Command::Copy { source, dest, name } => {
            let source = require_node(&store, &source)?;
            let copied = match name {
                Some(name) => ctx.copy_item(&source, &dest, &name)?,
                None => {
                    let dest = require_node(&store, &dest)?;
                    commands::copy_item_to(&ctx, &source, &dest)?
                }
            };
            println!("copied to {} [{}]", copied.name, copied.id);
            Ok(())
        }
        Command::Duplicate { source, name } => {
            let source = require_node(&store, &source)?;
            let duplicated = commands::duplicate_item(&ctx, &source, name.as_deref())?;
            println!("duplicated as {} [{}]", duplicated.name, duplicated.id);
            Ok(())
        }
        Command::Delete { id } => {
            let node = require_node(&store, &id)?;
            ctx.delete_item(&node)?;
            println!("deleted {} [{}]", node.name, node.id);
            Ok(())
        }
        Command::ResetWorkflow { id, all_versions } => {
            let node = require_node(&store, &id)?;
            ctx.reset_workflow_state_recursive(&node, all_versions)?;
            println!("workflow state reset under {} [{}]", node.name, node.id);
            Ok(())
        }
    }
}

fn require_node(store: &Arc<dyn NodeStore>, id: &NodeId) -> Result<Node> {
    store
        .get_node(id)?
        .with_context(|| format!("node {} not found", id))
}

/// Starter template set: plain folders plus lockable, workflow-aware
/// documents. Safe to run repeatedly.
fn init(store: &Arc<dyn NodeStore>) -> Result<()> {
    if store.template_by_name("folder")?.is_none() {
        let folder = Template {
            id: TemplateId::new(),
            name: "folder".into(),
            fields: vec![],
            standard_values: None,
        };
        store.register_template(folder.clone())?;
        println!("registered template folder [{}]", folder.id);
    }
    if store.template_by_name("document")?.is_none() {
        let document = Template {
            id: TemplateId::new(),
            name: "document".into(),
            fields: vec![
                fields::LOCK.into(),
                fields::WORKFLOW.into(),
                fields::WORKFLOW_STATE.into(),
                fields::DEFAULT_WORKFLOW.into(),
                "title".into(),
            ],
            standard_values: None,
        };
        store.register_template(document.clone())?;
        println!("registered template document [{}]", document.id);
    }
    if store.roots()?.is_empty() {
        let folder = store
            .template_by_name("folder")?
            .expect("folder template was just registered");
        let root = store.add_root("content", &folder.id)?;
        println!("created root {} [{}]", root.name, root.id);
    }
    Ok(())
}

fn tree(store: &Arc<dyn NodeStore>, json: bool) -> Result<()> {
    let roots = store.roots()?;
    if json {
        let rendered = roots
            .iter()
            .map(|root| json_subtree(store, root))
            .collect::<Result<Vec<_>>>()?;
        println!("{}", serde_json::to_string_pretty(&rendered)?);
        return Ok(());
    }
    for root in &roots {
        print_subtree(store, root, 0)?;
    }
    Ok(())
}

fn json_subtree(store: &Arc<dyn NodeStore>, node: &Node) -> Result<serde_json::Value> {
    let children = store
        .children(&node.id)?
        .iter()
        .map(|child| json_subtree(store, child))
        .collect::<Result<Vec<_>>>()?;
    Ok(serde_json::json!({
        "id": node.id.to_string(),
        "name": node.name,
        "template": node.template.to_string(),
        "version": node.version.to_string(),
        "created": store.created_at(&node.id)?.map(|t| t.to_rfc3339()),
        "locked_by": store.lock_owner(&node.id)?,
        "workflow_state": store.field_value(node, fields::WORKFLOW_STATE)?,
        "children": children,
    }))
}

fn print_subtree(store: &Arc<dyn NodeStore>, node: &Node, depth: usize) -> Result<()> {
    let mut annotations = Vec::new();
    if let Some(owner) = store.lock_owner(&node.id)? {
        annotations.push(format!("locked by {}", owner));
    }
    if let Some(state) = store.field_value(node, fields::WORKFLOW_STATE)? {
        annotations.push(format!("state {}", state));
    }
    let suffix = if annotations.is_empty() {
        String::new()
    } else {
        format!(" ({})", annotations.join(", "))
    };
    println!("{}{} [{}]{}", "  ".repeat(depth), node.name, node.id, suffix);
    for child in store.children(&node.id)? {
        print_subtree(store, &child, depth + 1)?;
    }
    Ok(())
}
