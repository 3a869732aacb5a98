//! Subscriber account command handlers.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use netpass_core::{AuthMode, NewSubscriber, SubscriberCredential, SubscriberUpdate};

use crate::cli::{GlobalOpts, SubscribersArgs, SubscribersCommand};
use crate::error::CliError;
use crate::output;

use super::Context;
use super::util;

// ── View ────────────────────────────────────────────────────────────

/// Account as shown to operators, without either password form.
#[derive(Serialize)]
struct SubscriberView {
    id: Uuid,
    username: String,
    auth_mode: AuthMode,
    profile: Option<String>,
    static_ip: Option<IpAddr>,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    subscription_id: Option<Uuid>,
}

impl From<SubscriberCredential> for SubscriberView {
    fn from(c: SubscriberCredential) -> Self {
        Self {
            id: c.id,
            username: c.username,
            auth_mode: c.auth_mode,
            profile: c.profile,
            static_ip: c.static_ip,
            is_active: c.is_active,
            expires_at: c.expires_at,
            subscription_id: c.subscription_id,
        }
    }
}

#[derive(Tabled)]
struct SubscriberRow {
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Auth")]
    auth: String,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Static IP")]
    static_ip: String,
    #[tabled(rename = "Expires")]
    expires: String,
}

impl From<&SubscriberView> for SubscriberRow {
    fn from(s: &SubscriberView) -> Self {
        Self {
            username: s.username.clone(),
            active: if s.is_active { "yes" } else { "no" }.into(),
            auth: s.auth_mode.to_string(),
            profile: output::or_dash(s.profile.as_deref()),
            static_ip: output::or_dash(s.static_ip),
            expires: util::fmt_time(s.expires_at),
        }
    }
}

fn detail(s: &SubscriberView) -> String {
    output::detail_lines(&[
        ("Username", s.username.clone()),
        ("ID", s.id.to_string()),
        ("Active", s.is_active.to_string()),
        ("Auth Mode", s.auth_mode.to_string()),
        ("Profile", output::or_dash(s.profile.as_deref())),
        ("Static IP", output::or_dash(s.static_ip)),
        ("Expires", util::fmt_time(s.expires_at)),
        ("Subscription", output::or_dash(s.subscription_id)),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: SubscribersArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let accounts = &ctx.engine.accounts;
    let tenant = ctx.tenant()?;

    match args.command {
        SubscribersCommand::List => {
            let views: Vec<SubscriberView> = accounts
                .list(tenant)?
                .into_iter()
                .map(SubscriberView::from)
                .collect();
            let out = output::render_list(&global.output, &views, |s| SubscriberRow::from(s), |s| {
                s.username.clone()
            })?;
            output::print_output(&out, global.quiet);
        }

        SubscribersCommand::Show { username } => {
            print_one(accounts.find(tenant, &username)?, global)?;
        }

        SubscribersCommand::Create {
            username,
            password,
            subscription,
            auth_mode,
            profile,
            static_ip,
            expires,
        } => {
            let request = NewSubscriber {
                username,
                password,
                auth_mode: parse_auth_mode(&auth_mode)?,
                profile,
                static_ip,
                expires_at: expires
                    .map(|raw| util::parse_instant("expires", &raw))
                    .transpose()?,
                subscription_id: subscription
                    .map(|raw| parse_uuid("subscription", &raw))
                    .transpose()?,
            };
            print_one(accounts.create(tenant, request)?, global)?;
        }

        SubscribersCommand::Update {
            username,
            password,
            auth_mode,
            profile,
            clear_profile,
            static_ip,
            clear_static_ip,
            expires,
            clear_expires,
        } => {
            let expires_at = expires
                .map(|raw| util::parse_instant("expires", &raw))
                .transpose()?;
            let update = SubscriberUpdate {
                password,
                auth_mode: auth_mode.as_deref().map(parse_auth_mode).transpose()?,
                profile: clearable(profile, clear_profile),
                static_ip: clearable(static_ip, clear_static_ip),
                expires_at: clearable(expires_at, clear_expires),
                ..SubscriberUpdate::default()
            };
            print_one(accounts.update(tenant, &username, update)?, global)?;
        }

        SubscribersCommand::Suspend { username } => {
            print_one(accounts.suspend(tenant, &username)?, global)?;
        }

        SubscribersCommand::Resume { username } => {
            print_one(accounts.resume(tenant, &username)?, global)?;
        }

        SubscribersCommand::Delete { username } => {
            if !util::confirm(&format!("Delete subscriber {username}?"), global.yes)? {
                return Ok(());
            }
            let removed = accounts.delete(tenant, &username)?;
            if !global.quiet {
                eprintln!("Deleted subscriber {}", removed.username);
            }
        }
    }
    Ok(())
}

fn print_one(credential: SubscriberCredential, global: &GlobalOpts) -> Result<(), CliError> {
    let view = SubscriberView::from(credential);
    let out = output::render_single(&global.output, &view, detail, |s| s.username.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// `Some(Some(v))` sets, `Some(None)` clears, `None` leaves untouched.
fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear { Some(None) } else { value.map(Some) }
}

fn parse_auth_mode(raw: &str) -> Result<AuthMode, CliError> {
    raw.parse().map_err(|_| {
        CliError::validation(
            "auth-mode",
            format!("'{raw}' (expected pap, chap or mschapv2)"),
        )
    })
}

fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, CliError> {
    Uuid::parse_str(raw).map_err(|e| CliError::validation(field, format!("'{raw}': {e}")))
}
