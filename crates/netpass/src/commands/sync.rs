//! Sync command handlers: explicit resyncs, retraction, reconciliation.

use netpass_core::{BatchReport, PrincipalKind, ReconcileReport, SyncOutcome};

use crate::cli::{GlobalOpts, PrincipalKindArg, SyncArgs, SyncCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, rows};

impl From<PrincipalKindArg> for PrincipalKind {
    fn from(kind: PrincipalKindArg) -> Self {
        match kind {
            PrincipalKindArg::Vouchers => Self::Voucher,
            PrincipalKindArg::Subscribers => Self::Subscriber,
        }
    }
}

fn outcome_detail(o: &SyncOutcome) -> String {
    format!("Synced {} ({} rows)", o.username, o.rows_written)
}

fn batch_detail(r: &BatchReport) -> String {
    output::detail_lines(&[
        ("Succeeded", r.succeeded.to_string()),
        ("Failed", r.failed.to_string()),
    ])
}

fn reconcile_detail(r: &ReconcileReport) -> String {
    output::detail_lines(&[
        ("Checked", r.checked.to_string()),
        ("In sync", r.in_sync.to_string()),
        ("Resynced", r.resynced.to_string()),
        ("Retracted", r.retracted.to_string()),
        ("Failed", r.failed.to_string()),
    ])
}

pub fn handle(args: SyncArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let sync = &ctx.engine.sync;
    let tenant = ctx.tenant()?;

    let out = match args.command {
        SyncCommand::Voucher { code } => {
            let outcome = sync.sync_voucher(tenant, &code)?;
            output::render_single(&global.output, &outcome, outcome_detail, |o| o.username.clone())?
        }

        SyncCommand::Subscriber { username } => {
            let outcome = sync.sync_subscriber(tenant, &username)?;
            output::render_single(&global.output, &outcome, outcome_detail, |o| o.username.clone())?
        }

        SyncCommand::All { kind } => {
            let report = sync.sync_all(tenant, kind.into())?;
            output::render_single(&global.output, &report, batch_detail, |r| {
                format!("{} {}", r.succeeded, r.failed)
            })?
        }

        SyncCommand::Retract { username } => {
            sync.retract(tenant, &username)?;
            if !global.quiet {
                eprintln!("Retracted all rows for {username}");
            }
            return Ok(());
        }

        SyncCommand::Reconcile => {
            let report = ctx.engine.reconciler.reconcile(tenant)?;
            if report.drifted() {
                tracing::info!(
                    %tenant,
                    resynced = report.resynced,
                    retracted = report.retracted,
                    "reconcile repaired drift"
                );
            }
            output::render_single(&global.output, &report, reconcile_detail, |r| {
                format!("{} {} {}", r.resynced, r.retracted, r.failed)
            })?
        }

        SyncCommand::Plan { kind, name } => {
            let planned = match PrincipalKind::from(kind) {
                PrincipalKind::Voucher => sync.plan(&sync.load_voucher(tenant, &name)?),
                PrincipalKind::Subscriber => sync.plan(&sync.load_subscriber(tenant, &name)?),
            };
            return rows::render(&planned, global);
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}
