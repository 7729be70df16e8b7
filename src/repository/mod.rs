pub mod memory_store;
pub mod models;
pub mod naming;
pub mod sqlite_store;
mod trait_def;

pub use memory_store::MemoryNodeStore;
pub use models::{fields, Node, NodeId, Template, TemplateId, VersionRef, DEFAULT_LANGUAGE};
pub use sqlite_store::SqliteNodeStore;
pub use trait_def::NodeStore;

#[cfg(feature = "mock")]
pub use trait_def::MockNodeStore;
