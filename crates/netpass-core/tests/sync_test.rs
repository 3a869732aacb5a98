#![allow(clippy::unwrap_used)]
// Principal sync, subscriber mirroring, batch sync and reconciliation.

mod common;

use std::sync::atomic::Ordering;

use chrono::TimeDelta;
use pretty_assertions::assert_eq;

use common::{Fixture, flaky_fixture};
use netpass_core::model::attr;
use netpass_core::{
    AuthMode, CoreError, NewSubscriber, PrincipalKind, RadiusRow, SubscriberCredential,
    SubscriberUpdate, SubscriptionStatus, TenantId,
};

fn new_subscriber(username: &str, subscription: Option<uuid::Uuid>) -> NewSubscriber {
    NewSubscriber {
        username: username.into(),
        password: "s3cret".into(),
        auth_mode: AuthMode::Chap,
        subscription_id: subscription,
        ..NewSubscriber::default()
    }
}

// ── Single-principal sync ───────────────────────────────────────────

#[test]
fn sync_twice_yields_identical_rows() {
    let fx = Fixture::new();
    let subscription = fx.subscription(SubscriptionStatus::Active);
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", Some(subscription.id)))
        .unwrap();

    fx.engine.sync.sync_subscriber(fx.tenant, "alice").unwrap();
    let first = fx.rows("alice");
    fx.engine.sync.sync_subscriber(fx.tenant, "alice").unwrap();
    let second = fx.rows("alice");

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn created_subscriber_is_mirrored() {
    let fx = Fixture::new();
    let subscription = fx.subscription(SubscriptionStatus::Active);
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", Some(subscription.id)))
        .unwrap();

    let values: Vec<_> = fx
        .rows("alice")
        .into_iter()
        .map(|r| (r.attribute, r.value))
        .collect();
    assert_eq!(
        values,
        vec![
            (attr::CLEARTEXT_PASSWORD.to_owned(), "s3cret".to_owned()),
            (attr::MIKROTIK_GROUP.to_owned(), "home-20".to_owned()),
            (attr::MIKROTIK_RATE_LIMIT.to_owned(), "10000k/20000k".to_owned()),
        ]
    );
}

#[test]
fn suspension_removes_every_row_and_resume_restores_them() {
    let fx = Fixture::new();
    let subscription = fx.subscription(SubscriptionStatus::Active);
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", Some(subscription.id)))
        .unwrap();
    let before = fx.rows("alice");

    fx.engine.accounts.suspend(fx.tenant, "alice").unwrap();
    assert!(fx.rows("alice").is_empty());

    fx.engine.accounts.resume(fx.tenant, "alice").unwrap();
    assert_eq!(fx.rows("alice"), before);
}

#[test]
fn subscriber_without_active_billing_has_no_rows() {
    let fx = Fixture::new();
    let suspended = fx.subscription(SubscriptionStatus::Suspended);
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("bob", Some(suspended.id)))
        .unwrap();
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("carol", None))
        .unwrap();

    assert!(fx.rows("bob").is_empty());
    assert!(fx.rows("carol").is_empty());
}

#[test]
fn past_hard_expiry_adds_reject_row() {
    let fx = Fixture::new();
    let subscription = fx.subscription(SubscriptionStatus::Active);
    let mut request = new_subscriber("alice", Some(subscription.id));
    request.expires_at = Some(common::t0() + TimeDelta::hours(1));
    fx.engine.accounts.create(fx.tenant, request).unwrap();
    assert!(fx.rows("alice").iter().all(|r| r.attribute != attr::AUTH_TYPE));

    fx.clock.advance(TimeDelta::hours(2));
    fx.engine.sync.sync_subscriber(fx.tenant, "alice").unwrap();

    let reject: Vec<_> = fx
        .rows("alice")
        .into_iter()
        .filter(|r| r.attribute == attr::AUTH_TYPE)
        .collect();
    assert_eq!(reject.len(), 1);
    assert_eq!(reject[0].value, "Reject");
}

#[test]
fn update_resyncs_static_address() {
    let fx = Fixture::new();
    let subscription = fx.subscription(SubscriptionStatus::Active);
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", Some(subscription.id)))
        .unwrap();

    fx.engine
        .accounts
        .update(
            fx.tenant,
            "alice",
            SubscriberUpdate {
                static_ip: Some(Some("100.64.1.2".parse().unwrap())),
                ..SubscriberUpdate::default()
            },
        )
        .unwrap();

    assert!(
        fx.rows("alice")
            .iter()
            .any(|r| r.attribute == attr::FRAMED_IP_ADDRESS && r.value == "100.64.1.2")
    );
}

#[test]
fn update_from_a_stale_read_keeps_the_suspension() {
    let fx = Fixture::new();
    let subscription = fx.subscription(SubscriptionStatus::Active);
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", Some(subscription.id)))
        .unwrap();
    let stale = fx.engine.accounts.find(fx.tenant, "alice").unwrap();
    assert!(stale.is_active);

    fx.engine.accounts.suspend(fx.tenant, "alice").unwrap();
    // A writer that read the row before the suspension lands afterwards.
    let stored = fx
        .stores
        .subscribers
        .update_credential(SubscriberCredential {
            static_ip: Some("100.64.1.2".parse().unwrap()),
            ..stale
        })
        .unwrap();
    assert!(!stored.is_active);
    assert_eq!(stored.static_ip, Some("100.64.1.2".parse().unwrap()));

    let updated = fx
        .engine
        .accounts
        .update(
            fx.tenant,
            "alice",
            SubscriberUpdate {
                auth_mode: Some(AuthMode::Pap),
                ..SubscriberUpdate::default()
            },
        )
        .unwrap();

    assert!(!updated.is_active);
    assert_eq!(updated.auth_mode, AuthMode::Pap);
    assert!(fx.rows("alice").is_empty());
}

#[test]
fn duplicate_username_is_a_conflict() {
    let fx = Fixture::new();
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", None))
        .unwrap();
    let err = fx
        .engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", None))
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));
}

#[test]
fn foreign_subscription_is_forbidden() {
    let fx = Fixture::new();
    let other = Fixture::new();
    let foreign = other.subscription(SubscriptionStatus::Active);
    fx.store.put_subscription(foreign.clone());

    let err = fx
        .engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", Some(foreign.id)))
        .unwrap_err();
    assert!(matches!(err, CoreError::Forbidden { .. }));
}

#[test]
fn delete_retracts_rows() {
    let fx = Fixture::new();
    let subscription = fx.subscription(SubscriptionStatus::Active);
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", Some(subscription.id)))
        .unwrap();

    fx.engine.accounts.delete(fx.tenant, "alice").unwrap();

    assert!(fx.rows("alice").is_empty());
    let err = fx.engine.sync.sync_subscriber(fx.tenant, "alice").unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

#[test]
fn retract_is_tenant_scoped() {
    let fx = Fixture::new();
    let package = fx.package(1, "hours");
    let code = fx.generate_one(package.id);
    fx.engine.vouchers.activate(fx.tenant, &code, None).unwrap();

    fx.engine.sync.retract(TenantId::random(), &code).unwrap();
    assert!(!fx.rows(&code).is_empty());

    fx.engine.sync.retract(fx.tenant, &code).unwrap();
    assert!(fx.rows(&code).is_empty());
}

#[test]
fn plan_does_not_touch_the_store() {
    let fx = Fixture::new();
    let package = fx.package(1, "hours");
    let code = fx.generate_one(package.id);
    fx.engine.vouchers.activate(fx.tenant, &code, None).unwrap();
    fx.engine.sync.retract(fx.tenant, &code).unwrap();

    let principal = fx.engine.sync.load_voucher(fx.tenant, &code).unwrap();
    let planned = fx.engine.sync.plan(&principal);

    assert_eq!(planned.len(), 3);
    assert!(fx.rows(&code).is_empty());
}

// ── Failure handling ────────────────────────────────────────────────

#[test]
fn failed_sync_rolls_back_and_keeps_previous_rows() {
    let (fx, flaky) = flaky_fixture();
    let subscription = fx.subscription(SubscriptionStatus::Active);
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", Some(subscription.id)))
        .unwrap();
    let before = fx.rows("alice");
    assert!(!before.is_empty());

    flaky.failing.store(true, Ordering::SeqCst);
    let err = fx.engine.sync.sync_subscriber(fx.tenant, "alice").unwrap_err();

    assert!(matches!(err, CoreError::Internal(_)));
    assert_eq!(fx.rows("alice"), before);
}

#[test]
fn mirror_failure_does_not_fail_the_domain_write() {
    let (fx, flaky) = flaky_fixture();
    let subscription = fx.subscription(SubscriptionStatus::Active);
    flaky.failing.store(true, Ordering::SeqCst);

    let created = fx
        .engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", Some(subscription.id)))
        .unwrap();

    assert_eq!(created.username, "alice");
    assert!(fx.engine.accounts.find(fx.tenant, "alice").is_ok());
    assert!(fx.rows("alice").is_empty());

    // The drift is repaired once the store recovers.
    flaky.failing.store(false, Ordering::SeqCst);
    let report = fx.engine.reconciler.reconcile(fx.tenant).unwrap();
    assert_eq!(report.resynced, 1);
    assert_eq!(fx.rows("alice").len(), 3);
}

// ── Batch sync ──────────────────────────────────────────────────────

#[test]
fn sync_all_counts_active_principals() {
    let (fx, flaky) = flaky_fixture();
    let package = fx.package(1, "hours");
    let codes: Vec<_> = (0..3).map(|_| fx.generate_one(package.id)).collect();
    fx.generate_one(package.id);
    for code in &codes {
        fx.engine.vouchers.activate(fx.tenant, code, None).unwrap();
    }

    let report = fx
        .engine
        .sync
        .sync_all(fx.tenant, PrincipalKind::Voucher)
        .unwrap();
    assert_eq!((report.succeeded, report.failed), (3, 0));

    flaky.failing.store(true, Ordering::SeqCst);
    let report = fx
        .engine
        .sync
        .sync_all(fx.tenant, PrincipalKind::Voucher)
        .unwrap();
    assert_eq!((report.succeeded, report.failed), (0, 3));
    for code in &codes {
        assert_eq!(fx.rows(code).len(), 3);
    }
}

// ── Reconciliation ──────────────────────────────────────────────────

#[test]
fn reconcile_repairs_drift_and_removes_orphans() {
    let fx = Fixture::new();
    let subscription = fx.subscription(SubscriptionStatus::Active);
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("alice", Some(subscription.id)))
        .unwrap();
    fx.engine
        .accounts
        .create(fx.tenant, new_subscriber("bob", Some(subscription.id)))
        .unwrap();

    // Tamper: drop alice's rows, plant rows for a deleted user.
    let mut txn = fx.stores.auth.begin().unwrap();
    txn.delete_username(fx.tenant, "alice").unwrap();
    txn.insert(RadiusRow::check(fx.tenant, "ghost", attr::CLEARTEXT_PASSWORD, "x"))
        .unwrap();
    txn.commit().unwrap();

    let report = fx.engine.reconciler.reconcile(fx.tenant).unwrap();
    assert_eq!(report.checked, 2);
    assert_eq!(report.in_sync, 1);
    assert_eq!(report.resynced, 1);
    assert_eq!(report.retracted, 1);
    assert_eq!(report.failed, 0);
    assert!(fx.rows("ghost").is_empty());
    assert_eq!(fx.rows("alice").len(), 3);

    let again = fx.engine.reconciler.reconcile(fx.tenant).unwrap();
    assert!(!again.drifted());
    assert_eq!(again.in_sync, 2);
}
