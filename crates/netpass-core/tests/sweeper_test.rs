#![allow(clippy::unwrap_used)]
// Expiration sweeper: single ticks and the cancellable loop.

mod common;

use std::time::Duration;

use chrono::TimeDelta;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use common::Fixture;
use netpass_core::{NewSubscriber, SubscriptionStatus, VoucherStatus};

#[tokio::test]
async fn sweep_expires_due_vouchers_and_retracts_rows() {
    let fx = Fixture::new();
    let package = fx.package(1, "hours");
    let code = fx.generate_one(package.id);
    fx.engine.vouchers.activate(fx.tenant, &code, None).unwrap();
    assert!(!fx.rows(&code).is_empty());

    fx.clock.advance(TimeDelta::minutes(61));
    let report = fx.engine.sweeper().sweep_once().await;

    assert_eq!(report.vouchers_expired, 1);
    assert_eq!(report.retract_failures, 0);
    assert_eq!(
        fx.engine.vouchers.find(fx.tenant, &code).unwrap().status,
        VoucherStatus::Expired
    );
    assert!(fx.rows(&code).is_empty());
}

#[tokio::test]
async fn sweep_leaves_valid_vouchers_alone() {
    let fx = Fixture::new();
    let package = fx.package(1, "days");
    let code = fx.generate_one(package.id);
    fx.engine.vouchers.activate(fx.tenant, &code, None).unwrap();
    fx.live.add("*1", &code);

    fx.clock.advance(TimeDelta::hours(23));
    let report = fx.engine.sweeper().sweep_once().await;

    assert_eq!(report.sessions_checked, 1);
    assert_eq!(report.disconnected, 0);
    assert_eq!(report.vouchers_expired, 0);
    assert_eq!(
        fx.engine.vouchers.find(fx.tenant, &code).unwrap().status,
        VoucherStatus::Active
    );
}

#[tokio::test]
async fn sweep_disconnects_sessions_of_spent_credentials() {
    let fx = Fixture::new();
    let package = fx.package(1, "hours");
    let expired = fx.generate_one(package.id);
    let valid = fx.generate_one(package.id);
    fx.engine.vouchers.activate(fx.tenant, &expired, None).unwrap();
    fx.clock.advance(TimeDelta::minutes(90));
    fx.engine.vouchers.activate(fx.tenant, &valid, None).unwrap();

    let subscription = fx.subscription(SubscriptionStatus::Active);
    fx.engine
        .accounts
        .create(
            fx.tenant,
            NewSubscriber {
                username: "lapsed".into(),
                password: "pw".into(),
                expires_at: Some(common::t0()),
                subscription_id: Some(subscription.id),
                ..NewSubscriber::default()
            },
        )
        .unwrap();

    fx.live.add("*1", &expired);
    fx.live.add("*2", &valid);
    fx.live.add("*3", "lapsed");
    fx.live.add("*4", "walk-in");

    let report = fx.engine.sweeper().sweep_once().await;

    assert_eq!(report.sessions_checked, 4);
    assert_eq!(report.disconnected, 2);
    assert_eq!(fx.live.disconnected(), vec!["*1".to_owned(), "*3".to_owned()]);
    assert_eq!(report.vouchers_expired, 1);
}

#[tokio::test]
async fn live_channel_failure_does_not_stop_domain_expiry() {
    let fx = Fixture::new();
    let package = fx.package(1, "hours");
    let code = fx.generate_one(package.id);
    fx.engine.vouchers.activate(fx.tenant, &code, None).unwrap();
    *fx.live.fail_listing.lock() = true;

    fx.clock.advance(TimeDelta::hours(2));
    let report = fx.engine.sweeper().sweep_once().await;

    assert_eq!(report.live_failures, 1);
    assert_eq!(report.vouchers_expired, 1);
    assert!(fx.rows(&code).is_empty());
}

#[tokio::test]
async fn one_refused_disconnect_does_not_stop_the_others() {
    let fx = Fixture::new();
    let package = fx.package(1, "hours");
    let first = fx.generate_one(package.id);
    let second = fx.generate_one(package.id);
    fx.engine.vouchers.activate(fx.tenant, &first, None).unwrap();
    fx.engine.vouchers.activate(fx.tenant, &second, None).unwrap();
    fx.live.add("*1", &first);
    fx.live.add("*2", &second);
    fx.live.fail_disconnect.lock().push("*1".into());

    fx.clock.advance(TimeDelta::minutes(90));
    let report = fx.engine.sweeper().sweep_once().await;

    assert_eq!(report.sessions_checked, 2);
    assert_eq!(report.disconnect_failures, 1);
    assert_eq!(report.disconnected, 1);
    assert_eq!(fx.live.disconnected(), vec!["*2".to_owned()]);
    assert_eq!(fx.live.live_ids(), vec!["*1".to_owned()]);
    assert_eq!(report.vouchers_expired, 2);
}

#[tokio::test]
async fn failed_retract_still_expires_every_due_voucher() {
    let (fx, flaky) = common::flaky_fixture();
    let package = fx.package(1, "hours");
    let stuck = fx.generate_one(package.id);
    let clean = fx.generate_one(package.id);
    fx.engine.vouchers.activate(fx.tenant, &stuck, None).unwrap();
    fx.engine.vouchers.activate(fx.tenant, &clean, None).unwrap();
    *flaky.refuse_delete.lock() = Some(stuck.clone());

    fx.clock.advance(TimeDelta::hours(2));
    let report = fx.engine.sweeper().sweep_once().await;

    assert_eq!(report.vouchers_expired, 2);
    assert_eq!(report.retract_failures, 1);
    for code in [&stuck, &clean] {
        assert_eq!(
            fx.engine.vouchers.find(fx.tenant, code).unwrap().status,
            VoucherStatus::Expired
        );
    }
    // Left for the next reconcile.
    assert!(!fx.rows(&stuck).is_empty());
    assert!(fx.rows(&clean).is_empty());
}

#[tokio::test(start_paused = true)]
async fn spawned_sweeper_ticks_until_cancelled() {
    let fx = Fixture::new();
    let package = fx.package(1, "hours");
    let code = fx.generate_one(package.id);
    fx.engine.vouchers.activate(fx.tenant, &code, None).unwrap();
    fx.clock.advance(TimeDelta::hours(2));

    let sweeper = fx.engine.sweeper();
    let mut reports = sweeper.subscribe();
    let cancel = CancellationToken::new();
    let handle = sweeper.spawn(cancel.clone());

    // First tick fires immediately.
    reports.changed().await.unwrap();
    let first = (*reports.borrow_and_update()).unwrap();
    assert_eq!(first.vouchers_expired, 1);

    // Next tick after one interval finds nothing left to expire.
    tokio::time::advance(Duration::from_secs(60)).await;
    reports.changed().await.unwrap();
    let second = (*reports.borrow_and_update()).unwrap();
    assert_eq!(second.vouchers_expired, 0);

    cancel.cancel();
    handle.await.unwrap();
    assert!(fx.rows(&code).is_empty());
}
