// ── Principal capability ──
//
// The orchestrator and planner only ever see principals through this
// trait. Concrete account types are wrapped together with the upstream
// records needed to resolve their policy.

use chrono::{DateTime, Utc};
use std::net::IpAddr;
use strum::{Display, EnumString};

use crate::model::{
    BandwidthPolicy, Package, ServicePlan, SubscriberCredential, Subscription, TenantId, Voucher,
    VoucherStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PrincipalKind {
    #[strum(to_string = "subscriber", serialize = "subscribers")]
    Subscriber,
    #[strum(to_string = "voucher", serialize = "vouchers")]
    Voucher,
}

/// Anything that can authenticate against the access-control layer.
pub trait Principal: Send + Sync {
    fn kind(&self) -> PrincipalKind;

    fn tenant_id(&self) -> TenantId;

    fn username(&self) -> &str;

    /// Whether rows should exist at all. `false` means retract-only.
    fn is_eligible(&self) -> bool;

    /// Value written to the clear-text password check row.
    fn credentialed_password(&self) -> &str;

    fn resolved_policy(&self) -> Option<&BandwidthPolicy>;

    /// Cut-off after which authentication must fail even while eligible.
    fn hard_expiry(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn static_address(&self) -> Option<IpAddr> {
        None
    }

    /// NAS profile/group name. Only emitted alongside a resolved policy.
    fn profile_group(&self) -> Option<&str> {
        None
    }

    /// Maximum concurrent sessions, when limited.
    fn session_limit(&self) -> Option<u32> {
        None
    }
}

// ── Subscriber ──────────────────────────────────────────────────────

/// Subscriber credential joined with its billing relationship.
#[derive(Debug, Clone)]
pub struct SubscriberPrincipal {
    pub credential: SubscriberCredential,
    pub subscription: Option<Subscription>,
    pub plan: Option<ServicePlan>,
}

impl SubscriberPrincipal {
    pub fn has_active_billing(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }
}

impl Principal for SubscriberPrincipal {
    fn kind(&self) -> PrincipalKind {
        PrincipalKind::Subscriber
    }

    fn tenant_id(&self) -> TenantId {
        self.credential.tenant_id
    }

    fn username(&self) -> &str {
        &self.credential.username
    }

    fn is_eligible(&self) -> bool {
        self.credential.is_active && self.has_active_billing()
    }

    fn credentialed_password(&self) -> &str {
        &self.credential.password
    }

    fn resolved_policy(&self) -> Option<&BandwidthPolicy> {
        self.plan.as_ref().map(|plan| &plan.bandwidth)
    }

    fn hard_expiry(&self) -> Option<DateTime<Utc>> {
        self.credential.expires_at
    }

    fn static_address(&self) -> Option<IpAddr> {
        self.credential.static_ip
    }

    fn profile_group(&self) -> Option<&str> {
        self.credential
            .profile
            .as_deref()
            .or_else(|| self.plan.as_ref().and_then(|p| p.profile.as_deref()))
            .or_else(|| self.plan.as_ref().map(|p| p.name.as_str()))
    }
}

// ── Voucher ─────────────────────────────────────────────────────────

/// Voucher joined with the package it was cut from.
#[derive(Debug, Clone)]
pub struct VoucherPrincipal {
    pub voucher: Voucher,
    pub package: Option<Package>,
}

impl Principal for VoucherPrincipal {
    fn kind(&self) -> PrincipalKind {
        PrincipalKind::Voucher
    }

    fn tenant_id(&self) -> TenantId {
        self.voucher.tenant_id
    }

    fn username(&self) -> &str {
        &self.voucher.code
    }

    fn is_eligible(&self) -> bool {
        self.voucher.status == VoucherStatus::Active
    }

    /// Hotspot logins present the code as both username and password;
    /// the generated password is only kept as a hash.
    fn credentialed_password(&self) -> &str {
        &self.voucher.code
    }

    fn resolved_policy(&self) -> Option<&BandwidthPolicy> {
        self.package.as_ref().map(|pkg| &pkg.bandwidth)
    }

    fn hard_expiry(&self) -> Option<DateTime<Utc>> {
        self.voucher.expires_at
    }

    fn session_limit(&self) -> Option<u32> {
        self.package
            .as_ref()
            .map(|pkg| pkg.max_devices)
            .filter(|&n| n > 0)
    }
}
