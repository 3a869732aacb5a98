// Shared fixtures for netpass-core integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use netpass_core::live::{LiveSession, LiveSessions};
use netpass_core::store::{AuthStore, AuthTxn};
use netpass_core::{
    AccountingRecord, BandwidthPolicy, Clock, CoreError, Engine, EngineConfig, HashCost,
    MacAddress, ManualClock, MemoryStore, Package, RadiusRow, ServicePlan, Stores, Subscription,
    SubscriptionStatus, TenantId,
};

// ── Fake live-session channel ───────────────────────────────────────

#[derive(Default)]
pub struct FakeLive {
    pub sessions: Mutex<Vec<LiveSession>>,
    pub disconnected: Mutex<Vec<String>>,
    pub fail_listing: Mutex<bool>,
    /// Live ids whose disconnect is refused by the NAS.
    pub fail_disconnect: Mutex<Vec<String>>,
}

impl FakeLive {
    pub fn add(&self, id: &str, username: &str) {
        self.add_device(id, username, "10.5.50.10", None);
    }

    pub fn add_device(&self, id: &str, username: &str, address: &str, mac: Option<&str>) {
        self.sessions.lock().push(LiveSession {
            id: id.to_owned(),
            username: username.to_owned(),
            address: Some(address.to_owned()),
            mac: mac.map(|m| MacAddress::parse(m).unwrap()),
            uptime_secs: Some(60),
            bytes_in: Some(1_000),
            bytes_out: Some(2_000),
        });
    }

    pub fn live_ids(&self) -> Vec<String> {
        self.sessions.lock().iter().map(|s| s.id.clone()).collect()
    }

    pub fn disconnected(&self) -> Vec<String> {
        self.disconnected.lock().clone()
    }
}

impl LiveSessions for FakeLive {
    async fn list_active(&self, _tenant: TenantId) -> Result<Vec<LiveSession>, CoreError> {
        if *self.fail_listing.lock() {
            return Err(CoreError::LiveSession {
                message: "NAS unreachable".into(),
                transient: true,
            });
        }
        Ok(self.sessions.lock().clone())
    }

    async fn disconnect(&self, _tenant: TenantId, live_id: &str) -> Result<(), CoreError> {
        if self.fail_disconnect.lock().iter().any(|id| id == live_id) {
            return Err(CoreError::LiveSession {
                message: format!("NAS refused to remove {live_id}"),
                transient: false,
            });
        }
        self.sessions.lock().retain(|s| s.id != live_id);
        self.disconnected.lock().push(live_id.to_owned());
        Ok(())
    }
}

// ── Failing authorization store ─────────────────────────────────────

/// Delegates to a `MemoryStore`. When `failing` is set every transaction
/// fails on its second staged insert; `refuse_delete` fails any delete
/// of that username.
pub struct FlakyAuth {
    pub inner: Arc<MemoryStore>,
    pub failing: AtomicBool,
    pub refuse_delete: Mutex<Option<String>>,
}

struct FlakyTxn<'a> {
    inner: Box<dyn AuthTxn + 'a>,
    fail: bool,
    refuse_delete: Option<String>,
    inserts: usize,
}

impl AuthTxn for FlakyTxn<'_> {
    fn delete_username(&mut self, tenant: TenantId, username: &str) -> Result<(), CoreError> {
        if self.refuse_delete.as_deref() == Some(username) {
            return Err(CoreError::Internal("radcheck delete failed".into()));
        }
        self.inner.delete_username(tenant, username)
    }

    fn insert(&mut self, row: RadiusRow) -> Result<(), CoreError> {
        self.inserts += 1;
        if self.fail && self.inserts == 2 {
            return Err(CoreError::Internal("radreply insert failed".into()));
        }
        self.inner.insert(row)
    }

    fn commit(self: Box<Self>) -> Result<(), CoreError> {
        self.inner.commit()
    }
}

impl AuthStore for FlakyAuth {
    fn begin(&self) -> Result<Box<dyn AuthTxn + '_>, CoreError> {
        Ok(Box::new(FlakyTxn {
            inner: self.inner.begin()?,
            fail: self.failing.load(Ordering::SeqCst),
            refuse_delete: self.refuse_delete.lock().clone(),
            inserts: 0,
        }))
    }

    fn rows_for(&self, tenant: TenantId, username: &str) -> Result<Vec<RadiusRow>, CoreError> {
        self.inner.rows_for(tenant, username)
    }

    fn usernames(&self, tenant: TenantId) -> Result<Vec<String>, CoreError> {
        self.inner.usernames(tenant)
    }
}

pub fn flaky_fixture() -> (Fixture, Arc<FlakyAuth>) {
    let store = Arc::new(MemoryStore::new());
    let flaky = Arc::new(FlakyAuth {
        inner: Arc::clone(&store),
        failing: AtomicBool::new(false),
        refuse_delete: Mutex::new(None),
    });
    let mut stores = Stores::memory(&store);
    let auth: Arc<dyn AuthStore> = flaky.clone();
    stores.auth = auth;
    (Fixture::with_stores(store, stores, test_config()), flaky)
}

// ── Fixture ─────────────────────────────────────────────────────────

pub fn t0() -> DateTime<Utc> {
    "2026-03-01T08:00:00Z".parse().unwrap()
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        hash: HashCost::minimal(),
        ..EngineConfig::default()
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub stores: Stores,
    pub clock: Arc<ManualClock>,
    pub live: Arc<FakeLive>,
    pub engine: Engine<FakeLive>,
    pub tenant: TenantId,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let stores = Stores::memory(&store);
        Self::with_stores(store, stores, config)
    }

    /// Use custom store handles, e.g. a failing authorization store.
    pub fn with_stores(store: Arc<MemoryStore>, stores: Stores, config: EngineConfig) -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let live = Arc::new(FakeLive::default());
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let engine = Engine::new(stores.clone(), Arc::clone(&live), dyn_clock, config).unwrap();
        let tenant = TenantId::random();
        store.add_tenant(tenant);
        Self {
            store,
            stores,
            clock,
            live,
            engine,
            tenant,
        }
    }

    pub fn package(&self, duration: u32, unit: &str) -> Package {
        self.package_for(self.tenant, duration, unit)
    }

    pub fn package_for(&self, tenant: TenantId, duration: u32, unit: &str) -> Package {
        let package = Package {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            name: format!("{duration} {unit}"),
            duration,
            duration_unit: unit.to_owned(),
            bandwidth: BandwidthPolicy::new(10, 5),
            max_devices: 1,
            bind_device: false,
            is_active: true,
        };
        self.store.put_package(package.clone());
        package
    }

    /// An active plan + subscription pair; returns the subscription id.
    pub fn subscription(&self, status: SubscriptionStatus) -> Subscription {
        let plan = ServicePlan {
            id: Uuid::new_v4(),
            tenant_id: self.tenant,
            name: "Home 20".into(),
            profile: Some("home-20".into()),
            bandwidth: BandwidthPolicy::new(20, 10),
        };
        let subscription = Subscription {
            id: Uuid::new_v4(),
            tenant_id: self.tenant,
            customer_id: Uuid::new_v4(),
            plan_id: plan.id,
            status,
        };
        self.store.put_plan(plan);
        self.store.put_subscription(subscription.clone());
        subscription
    }

    pub fn accounting(
        &self,
        session_id: &str,
        username: &str,
        start: DateTime<Utc>,
    ) -> AccountingRecord {
        let record = AccountingRecord {
            session_id: session_id.to_owned(),
            tenant_id: self.tenant,
            username: username.to_owned(),
            nas_ip: None,
            framed_ip: Some("10.5.50.10".parse().unwrap()),
            calling_station_id: Some("AA-BB-CC-DD-EE-FF".into()),
            start_time: start,
            stop_time: None,
            session_time_secs: None,
            input_octets: 1_000,
            output_octets: 5_000,
            input_packets: 10,
            output_packets: 50,
            terminate_cause: None,
        };
        self.store.record_accounting(record.clone());
        record
    }
}

impl Fixture {
    pub fn generate_one(&self, package_id: Uuid) -> String {
        let mut batch = self
            .engine
            .vouchers
            .generate(self.tenant, package_id, 1, None)
            .unwrap();
        batch.remove(0).voucher.code
    }

    pub fn rows(&self, username: &str) -> Vec<netpass_core::RadiusRow> {
        self.stores.auth.rows_for(self.tenant, username).unwrap()
    }

    pub fn store_usernames(&self) -> Vec<String> {
        self.stores.auth.usernames(self.tenant).unwrap()
    }
}
