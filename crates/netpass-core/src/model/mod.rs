// ── Domain model ──

pub mod accounting;
pub mod catalog;
pub mod ids;
pub mod policy;
pub mod radius;
pub mod subscriber;
pub mod voucher;

pub use accounting::AccountingRecord;
pub use catalog::{DurationUnit, Package, ServicePlan, Subscription, SubscriptionStatus};
pub use ids::{MacAddress, TenantId};
pub use policy::BandwidthPolicy;
pub use radius::{RadiusRow, RadiusTable, attr};
pub use subscriber::{AuthMode, SubscriberCredential};
pub use voucher::{Voucher, VoucherStatus};
