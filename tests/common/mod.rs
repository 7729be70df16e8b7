//! Common test infrastructure
//!
//! End-to-end tests exercise the lifecycle core against the sqlite store and
//! the field-backed editorial workflow. Tests should only import from this
//! module, not from internal submodules.

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::{create_test_repository, TestRepo};

use inkwell_content_repo::{Actor, ContextData, SiteSettings, WorkflowContext};
use std::sync::Arc;

/// A workflow-enabled context for the given actor against the repo's store.
pub fn context_for(repo: &TestRepo, actor: Actor) -> WorkflowContext {
    let context = ContextData::new(actor).with_site(SiteSettings::new(SITE_NAME, true));
    WorkflowContext::new(context, Arc::clone(&repo.store))
}
