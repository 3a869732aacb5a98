//! Voucher command handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use netpass_core::{GeneratedVoucher, MacAddress, Voucher, VoucherStatus};

use crate::cli::{GlobalOpts, VouchersArgs, VouchersCommand};
use crate::error::CliError;
use crate::output;

use super::Context;
use super::util;

// ── Views ───────────────────────────────────────────────────────────

/// Voucher as shown to operators; never carries the password hash.
#[derive(Serialize)]
struct VoucherView {
    id: Uuid,
    code: String,
    status: VoucherStatus,
    package_id: Uuid,
    package: Option<String>,
    created_at: DateTime<Utc>,
    activated_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    device_mac: Option<String>,
}

impl VoucherView {
    fn new(voucher: Voucher, ctx: &Context) -> Self {
        let package = ctx
            .engine
            .stores()
            .catalog
            .package(voucher.package_id)
            .ok()
            .flatten()
            .map(|p| p.name);
        Self {
            id: voucher.id,
            code: voucher.code,
            status: voucher.status,
            package_id: voucher.package_id,
            package,
            created_at: voucher.created_at,
            activated_at: voucher.activated_at,
            expires_at: voucher.expires_at,
            device_mac: voucher.device_mac.map(|m| m.to_string()),
        }
    }
}

#[derive(Tabled)]
struct VoucherRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Activated")]
    activated: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Device")]
    device: String,
}

impl From<&VoucherView> for VoucherRow {
    fn from(v: &VoucherView) -> Self {
        Self {
            code: v.code.clone(),
            status: v.status.to_string(),
            package: v.package.clone().unwrap_or_else(|| v.package_id.to_string()),
            activated: util::fmt_time(v.activated_at),
            expires: util::fmt_time(v.expires_at),
            device: output::or_dash(v.device_mac.as_deref()),
        }
    }
}

/// Freshly issued credentials. The password is only ever shown here.
#[derive(Serialize)]
struct IssuedVoucher {
    code: String,
    password: String,
    package_id: Uuid,
}

impl From<GeneratedVoucher> for IssuedVoucher {
    fn from(g: GeneratedVoucher) -> Self {
        Self {
            code: g.voucher.code,
            password: g.password,
            package_id: g.voucher.package_id,
        }
    }
}

#[derive(Tabled)]
struct IssuedRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Password")]
    password: String,
}

fn detail(v: &VoucherView) -> String {
    output::detail_lines(&[
        ("Code", v.code.clone()),
        ("ID", v.id.to_string()),
        ("Status", v.status.to_string()),
        (
            "Package",
            v.package.as_ref().map_or_else(
                || v.package_id.to_string(),
                |name| format!("{name} ({})", v.package_id),
            ),
        ),
        ("Created", util::fmt_time(Some(v.created_at))),
        ("Activated", util::fmt_time(v.activated_at)),
        ("Expires", util::fmt_time(v.expires_at)),
        ("Device", output::or_dash(v.device_mac.as_deref())),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: VouchersArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let vouchers = &ctx.engine.vouchers;
    let tenant = ctx.tenant()?;

    match args.command {
        VouchersCommand::Generate {
            package,
            count,
            prefix,
        } => {
            let package_id = Uuid::parse_str(&package)
                .map_err(|e| CliError::validation("package", format!("'{package}': {e}")))?;
            let issued: Vec<IssuedVoucher> = vouchers
                .generate(tenant, package_id, count, prefix.as_deref())?
                .into_iter()
                .map(IssuedVoucher::from)
                .collect();
            tracing::info!(%tenant, count = issued.len(), "vouchers generated");
            let out = output::render_list(
                &global.output,
                &issued,
                |v| IssuedRow {
                    code: v.code.clone(),
                    password: v.password.clone(),
                },
                |v| format!("{}\t{}", v.code, v.password),
            )?;
            output::print_output(&out, global.quiet);
        }

        VouchersCommand::Activate { code, mac } => {
            let mac = mac.map(MacAddress::parse).transpose()?;
            let voucher = vouchers.activate(tenant, &code, mac)?;
            print_one(&VoucherView::new(voucher, ctx), global)?;
        }

        VouchersCommand::List { status } => {
            let status = status
                .map(|s| {
                    s.parse::<VoucherStatus>().map_err(|_| {
                        CliError::validation("status", format!("unknown status '{s}'"))
                    })
                })
                .transpose()?;
            let views: Vec<VoucherView> = vouchers
                .list(tenant, status)?
                .into_iter()
                .map(|v| VoucherView::new(v, ctx))
                .collect();
            let out = output::render_list(&global.output, &views, |v| VoucherRow::from(v), |v| {
                v.code.clone()
            })?;
            output::print_output(&out, global.quiet);
        }

        VouchersCommand::Show { code } => {
            print_one(&VoucherView::new(vouchers.find(tenant, &code)?, ctx), global)?;
        }

        VouchersCommand::Expire { code } => {
            print_one(&VoucherView::new(vouchers.mark_expired(tenant, &code)?, ctx), global)?;
        }

        VouchersCommand::Consume { code } => {
            print_one(&VoucherView::new(vouchers.mark_used(tenant, &code)?, ctx), global)?;
        }

        VouchersCommand::Delete { code } => {
            if !util::confirm(&format!("Delete voucher {code}?"), global.yes)? {
                return Ok(());
            }
            let voucher = vouchers.delete(tenant, &code)?;
            if !global.quiet {
                eprintln!("Deleted voucher {}", voucher.code);
            }
        }
    }
    Ok(())
}

fn print_one(view: &VoucherView, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, view, detail, |v| v.code.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
