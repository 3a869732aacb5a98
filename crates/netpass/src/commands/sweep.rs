//! `sweep`: one expiration tick, or the sweeper loop until Ctrl-C.

use netpass_core::SweepReport;
use tokio_util::sync::CancellationToken;

use crate::cli::{GlobalOpts, SweepArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

fn detail(r: &SweepReport) -> String {
    output::detail_lines(&[
        ("Sessions checked", r.sessions_checked.to_string()),
        ("Disconnected", r.disconnected.to_string()),
        ("Disconnect failures", r.disconnect_failures.to_string()),
        ("Live listing failures", r.live_failures.to_string()),
        ("Vouchers expired", r.vouchers_expired.to_string()),
        ("Retract failures", r.retract_failures.to_string()),
    ])
}

fn print_report(report: &SweepReport, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, report, detail, |r| {
        format!("{} {}", r.disconnected, r.vouchers_expired)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(args: &SweepArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let sweeper = ctx.engine.sweeper();

    if !args.watch {
        let report = sweeper.sweep_once().await;
        return print_report(&report, global);
    }

    let mut reports = sweeper.subscribe();
    let cancel = CancellationToken::new();
    let handle = sweeper.spawn(cancel.clone());
    tracing::info!(
        interval_secs = ctx.engine.config().sweep_interval.as_secs(),
        "sweeper running, Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = reports.changed() => {
                if changed.is_err() {
                    break;
                }
                let report = *reports.borrow_and_update();
                if let Some(report) = report {
                    // Persist per tick so a kill between ticks loses nothing.
                    ctx.save()?;
                    print_report(&report, global)?;
                }
            }
        }
    }

    cancel.cancel();
    handle
        .await
        .map_err(|e| CliError::Internal(format!("sweeper task failed: {e}")))?;
    Ok(())
}
