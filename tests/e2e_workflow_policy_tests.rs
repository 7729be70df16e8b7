//! End-to-end tests for workflow gating, access decisions and the scoped
//! enforcement policy.

mod common;

use common::{context_for, create_test_repository, STATE_PUBLISHED, USER_ALICE, USER_BOB, USER_ROOT};
use inkwell_content_repo::repository::fields;
use inkwell_content_repo::{
    AccessRight, Actor, ContextData, NodeStore, PolicyScope, SiteSettings, WorkflowContext,
    WorkflowPolicy,
};
use std::sync::Arc;

#[test]
fn unapproved_article_is_locked_but_not_versioned() {
    let repo = create_test_repository().unwrap();
    let ctx = context_for(&repo, Actor::named(USER_ALICE));

    let article = repo
        .store
        .add_node("piece", &repo.article_template, &repo.content_root.id)
        .unwrap();
    assert!(ctx.has_workflow(&article).unwrap());
    assert!(ctx.has_default_workflow(&article).unwrap());
    assert!(!ctx.is_approved(&article, None).unwrap());

    let editable = ctx.start_editing(&article).unwrap().unwrap();
    assert_eq!(editable.version.number, 1);
    assert_eq!(repo.store.get_versions(&article.id).unwrap().len(), 1);
    assert_eq!(
        repo.store.lock_owner(&article.id).unwrap().as_deref(),
        Some(USER_ALICE)
    );
}

#[test]
fn published_article_gets_a_fresh_locked_version() {
    let repo = create_test_repository().unwrap();
    let ctx = context_for(&repo, Actor::named(USER_ALICE));

    let article = repo
        .store
        .add_node("piece", &repo.article_template, &repo.content_root.id)
        .unwrap();
    repo.store
        .set_field_value(&article, fields::WORKFLOW_STATE, STATE_PUBLISHED)
        .unwrap();
    assert!(ctx.is_approved(&article, None).unwrap());

    let editable = ctx.start_editing(&article).unwrap().unwrap();
    assert_eq!(editable.version.number, 2);
    assert_eq!(repo.store.get_versions(&article.id).unwrap().len(), 2);
    assert_eq!(
        repo.store.lock_owner(&article.id).unwrap().as_deref(),
        Some(USER_ALICE)
    );
}

#[test]
fn lock_contention_refuses_editing() {
    let repo = create_test_repository().unwrap();
    let ctx = context_for(&repo, Actor::named(USER_ALICE));

    let page = repo
        .store
        .add_node("page", &repo.document_template, &repo.content_root.id)
        .unwrap();
    repo.store.lock_node(&page.id, USER_BOB).unwrap();

    // not an error, just "not editable now"
    assert!(ctx.start_editing(&page).unwrap().is_none());
}

#[test]
fn administrator_edits_anything_without_workflow_checks() {
    let repo = create_test_repository().unwrap();
    let ctx = context_for(&repo, Actor::administrator(USER_ROOT));

    let article = repo
        .store
        .add_node("piece", &repo.article_template, &repo.content_root.id)
        .unwrap();
    repo.store.lock_node(&article.id, USER_BOB).unwrap();

    let editable = ctx.start_editing(&article).unwrap();
    assert!(editable.is_some());
    assert_eq!(repo.store.get_versions(&article.id).unwrap().len(), 1);
    // bob's lock was left alone
    assert_eq!(
        repo.store.lock_owner(&article.id).unwrap().as_deref(),
        Some(USER_BOB)
    );
}

#[test]
fn workflow_state_editors_gate_write_but_not_read() {
    let repo = create_test_repository().unwrap();
    let alice_ctx = context_for(&repo, Actor::named(USER_ALICE));
    let bob_ctx = context_for(&repo, Actor::named(USER_BOB));

    let article = repo
        .store
        .add_node("piece", &repo.article_template, &repo.content_root.id)
        .unwrap();

    assert!(alice_ctx.is_allowed(AccessRight::Write, &article).unwrap());
    assert!(!bob_ctx.is_allowed(AccessRight::Write, &article).unwrap());
    assert!(!bob_ctx.is_allowed(AccessRight::Delete, &article).unwrap());
    // non-gated rights never consult the workflow
    assert!(bob_ctx.is_allowed(AccessRight::Read, &article).unwrap());
    assert!(bob_ctx.is_allowed(AccessRight::Rename, &article).unwrap());

    let decision = bob_ctx
        .get_access(&article, AccessRight::Write, &Actor::named(USER_BOB))
        .unwrap()
        .unwrap();
    assert!(decision.explanation.contains("designated editors"));
}

#[test]
fn exempt_node_yields_no_workflow_decision() {
    let repo = create_test_repository().unwrap();
    let ctx = context_for(&repo, Actor::named(USER_BOB));

    let page = repo
        .store
        .add_node("page", &repo.document_template, &repo.content_root.id)
        .unwrap();
    let decision = ctx
        .get_access(&page, AccessRight::Write, &Actor::named(USER_BOB))
        .unwrap();
    assert!(decision.is_none());
    assert!(ctx.is_allowed(AccessRight::Write, &page).unwrap());
}

#[test]
fn disabling_the_policy_turns_articles_exempt() {
    let repo = create_test_repository().unwrap();
    let ctx = context_for(&repo, Actor::named(USER_ALICE));

    let article = repo
        .store
        .add_node("piece", &repo.article_template, &repo.content_root.id)
        .unwrap();
    repo.store
        .set_field_value(&article, fields::WORKFLOW_STATE, STATE_PUBLISHED)
        .unwrap();

    {
        let _scope = PolicyScope::enter(WorkflowPolicy::Disabled);
        assert!(!ctx.has_workflow(&article).unwrap());
        // exempt path: locked in place, no new version despite approval
        let editable = ctx.start_editing(&article).unwrap().unwrap();
        assert_eq!(editable.version.number, 1);
        assert_eq!(repo.store.get_versions(&article.id).unwrap().len(), 1);
    }
    assert!(ctx.has_workflow(&article).unwrap());
}

#[test]
fn enabling_the_policy_overrides_a_workflow_free_site() {
    let repo = create_test_repository().unwrap();
    let context = ContextData::new(Actor::named(USER_ALICE))
        .with_site(SiteSettings::new("plain-site", false));
    let ctx = WorkflowContext::new(context, Arc::clone(&repo.store));

    let article = repo
        .store
        .add_node("piece", &repo.article_template, &repo.content_root.id)
        .unwrap();

    assert!(!ctx.has_workflow(&article).unwrap());
    {
        let _scope = PolicyScope::enter(WorkflowPolicy::Enabled);
        assert!(ctx.has_workflow(&article).unwrap());
    }
    assert!(!ctx.has_workflow(&article).unwrap());
}

#[test]
fn policy_scopes_do_not_leak_across_threads() {
    let repo = create_test_repository().unwrap();
    let ctx = context_for(&repo, Actor::named(USER_ALICE));
    let article = repo
        .store
        .add_node("piece", &repo.article_template, &repo.content_root.id)
        .unwrap();

    let _scope = PolicyScope::enter(WorkflowPolicy::Disabled);
    assert!(!ctx.has_workflow(&article).unwrap());

    // an independent call chain on another thread sees enforcement on
    let store = Arc::clone(&repo.store);
    let article_id = article.id;
    let other_chain = std::thread::spawn(move || {
        let context = ContextData::new(Actor::named(USER_BOB))
            .with_site(SiteSettings::new(common::SITE_NAME, true));
        let ctx = WorkflowContext::new(context, store);
        let article = ctx.store().get_node(&article_id).unwrap().unwrap();
        ctx.has_workflow(&article).unwrap()
    })
    .join()
    .unwrap();
    assert!(other_chain);

    // and this chain is still disabled
    assert!(!ctx.has_workflow(&article).unwrap());
}
