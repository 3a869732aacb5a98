//! Session and usage command handlers.

use tabled::Tabled;

use netpass_core::{ActiveSession, UsageSummary};

use crate::cli::{GlobalOpts, SessionsArgs, SessionsCommand};
use crate::error::CliError;
use crate::output;

use super::Context;
use super::util;

#[derive(Tabled)]
struct ActiveRow {
    #[tabled(rename = "Session")]
    session_id: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Elapsed")]
    elapsed: String,
    #[tabled(rename = "In/Out")]
    octets: String,
    #[tabled(rename = "Policy")]
    policy: String,
}

impl From<&ActiveSession> for ActiveRow {
    fn from(s: &ActiveSession) -> Self {
        Self {
            session_id: s.session_id.clone(),
            username: s.username.clone(),
            ip: output::or_dash(s.framed_ip.as_deref()),
            mac: output::or_dash(s.calling_station_id.as_deref()),
            started: util::fmt_time(Some(s.start_time)),
            elapsed: util::fmt_secs(s.elapsed_secs),
            octets: format!("{}/{}", s.input_octets, s.output_octets),
            policy: match (&s.policy_name, &s.rate_limit) {
                (Some(name), Some(rate)) => format!("{name} ({rate})"),
                (Some(name), None) => name.clone(),
                (None, Some(rate)) => rate.clone(),
                (None, None) => "-".into(),
            },
        }
    }
}

#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Sessions")]
    sessions: usize,
    #[tabled(rename = "In Octets")]
    input_octets: u64,
    #[tabled(rename = "Out Octets")]
    output_octets: u64,
    #[tabled(rename = "Packets In/Out")]
    packets: String,
    #[tabled(rename = "Time")]
    time: String,
}

impl From<&UsageSummary> for UsageRow {
    fn from(u: &UsageSummary) -> Self {
        Self {
            owner: u.owner.clone(),
            sessions: u.sessions,
            input_octets: u.input_octets,
            output_octets: u.output_octets,
            packets: format!("{}/{}", u.input_packets, u.output_packets),
            time: util::fmt_secs(u.session_secs),
        }
    }
}

pub async fn handle(
    args: SessionsArgs,
    ctx: &Context,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let view = &ctx.engine.sessions;
    let tenant = ctx.tenant()?;

    match args.command {
        SessionsCommand::Active => {
            let sessions = view.active_sessions(tenant)?;
            let out = output::render_list(&global.output, &sessions, |s| ActiveRow::from(s), |s| {
                s.session_id.clone()
            })?;
            output::print_output(&out, global.quiet);
        }

        SessionsCommand::Usage { from, to } => {
            let from = util::parse_instant("from", &from)?;
            let to = util::parse_instant("to", &to)?;
            let usage = view.usage(tenant, from, to)?;
            let out = output::render_list(&global.output, &usage, |u| UsageRow::from(u), |u| {
                u.owner.clone()
            })?;
            output::print_output(&out, global.quiet);
        }

        SessionsCommand::Disconnect { session_id } => {
            if !util::confirm(&format!("Disconnect session {session_id}?"), global.yes)? {
                return Ok(());
            }
            let live = view.disconnect(tenant, &session_id).await?;
            if !global.quiet {
                eprintln!("Disconnected live session {} for {session_id}", live.id);
            }
        }
    }
    Ok(())
}
