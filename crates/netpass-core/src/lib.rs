//! Credential lifecycle and authorization-store sync engine.
//!
//! Turns subscriber accounts and prepaid hotspot vouchers into
//! radcheck/radreply rows consumed by a RADIUS server, and keeps those rows
//! honest as accounts are suspended and vouchers run out:
//!
//! - **[`VoucherManager`]** owns the `unused -> active -> expired | used`
//!   state machine. Activation is a compare-and-swap at the store, so a code
//!   can only be activated once.
//!
//! - **[`SyncOrchestrator`]** is the only writer of the authorization store.
//!   [`sync`](SyncOrchestrator::sync) replaces a principal's rows in one
//!   transaction; an ineligible principal ends up with no rows at all.
//!
//! - **[`encoder`]** renders bandwidth policies as NAS rate-limit strings.
//!
//! - **[`Sweeper`]** periodically disconnects stale live sessions and
//!   demotes due vouchers, until its `CancellationToken` fires.
//!
//! - **[`Reconciler`]** diffs domain state against the store and repairs
//!   drift left behind by absorbed mirror failures.
//!
//! - **[`SessionView`]** projects accounting records into active-session
//!   and usage listings.
//!
//! Storage sits behind the traits in [`store`]; [`MemoryStore`] implements
//! all of them.

pub mod accounts;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod live;
pub mod model;
pub mod principal;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod sweeper;
pub mod sync;
pub mod voucher;

// ── Primary re-exports ──────────────────────────────────────────────
pub use accounts::{AccountManager, NewSubscriber, SubscriberUpdate};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, HashCost, VoucherSettings};
pub use credentials::SecretHasher;
pub use engine::Engine;
pub use error::CoreError;
pub use live::{LiveSession, LiveSessions};
pub use principal::{Principal, PrincipalKind, SubscriberPrincipal, VoucherPrincipal};
pub use reconcile::{ReconcileReport, Reconciler};
pub use session::{ActiveSession, SessionView, UsageSummary};
pub use store::{MemoryStore, StoreSnapshot, Stores};
pub use sweeper::{SweepReport, Sweeper};
pub use sync::{BatchReport, SyncOrchestrator, SyncOutcome};
pub use voucher::{GeneratedVoucher, VoucherManager};

pub use model::{
    AccountingRecord, AuthMode, BandwidthPolicy, DurationUnit, MacAddress, Package, RadiusRow,
    RadiusTable, ServicePlan, SubscriberCredential, Subscription, SubscriptionStatus, TenantId,
    Voucher, VoucherStatus,
};
