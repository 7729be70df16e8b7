//! Scoped override of workflow enforcement.
//!
//! The override is a thread-local stack, never a process-wide flag: a scope
//! pushed on one call chain is invisible to concurrently running operations,
//! nested scopes shadow outer ones, and the prior value is restored on drop
//! even when the protected code panics.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::config::SiteSettings;

thread_local! {
    static POLICY_STACK: RefCell<Vec<WorkflowPolicy>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowPolicy {
    /// Defer to the ambient site's own workflow-enabled flag.
    #[default]
    Default,
    Enabled,
    Disabled,
}

impl WorkflowPolicy {
    /// The override currently in effect on this thread.
    pub fn current() -> WorkflowPolicy {
        POLICY_STACK.with(|stack| stack.borrow().last().copied().unwrap_or_default())
    }

    /// Resolve the current override against the ambient site context.
    /// No site context means workflow enforcement is off.
    pub fn resolve(site: Option<&SiteSettings>) -> bool {
        match Self::current() {
            WorkflowPolicy::Default => site.map(|s| s.enable_workflow).unwrap_or(false),
            WorkflowPolicy::Disabled => false,
            WorkflowPolicy::Enabled => true,
        }
    }
}

/// RAII guard shadowing the current policy until dropped.
///
/// Deliberately `!Send`: the scope must end on the thread that opened it.
pub struct PolicyScope {
    _not_send: PhantomData<*const ()>,
}

impl PolicyScope {
    pub fn enter(policy: WorkflowPolicy) -> Self {
        POLICY_STACK.with(|stack| stack.borrow_mut().push(policy));
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for PolicyScope {
    fn drop(&mut self) {
        POLICY_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
