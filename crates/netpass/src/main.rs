mod cli;
mod commands;
mod error;
mod nas;
mod output;
mod state;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use netpass_config::Config;
use netpass_core::{Engine, Stores, SystemClock, TenantId};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::commands::Context;
use crate::error::CliError;
use crate::nas::NasLink;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Stateless commands: no config, no tenant, no state file
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "netpass", &mut std::io::stdout());
            Ok(())
        }

        Command::Rate(args) => {
            commands::rate::handle(&args, &cli.global);
            Ok(())
        }

        cmd => {
            let config = netpass_config::load_config(cli.global.config.as_deref())?;
            let ctx = build_context(&config, &cli.global)?;
            let mutates = cmd.mutates();

            tracing::debug!(command = ?cmd, tenant = ?ctx.tenant, "dispatching command");
            let result = commands::dispatch(cmd, &ctx, &cli.global).await;

            // Batches can fail part-way with earlier items already written
            if mutates {
                ctx.save()?;
            }
            result
        }
    }
}

/// Load the state file and wire an engine over it for the selected tenant.
fn build_context(config: &Config, global: &GlobalOpts) -> Result<Context, CliError> {
    let tenant = resolve_tenant(config, global)?;
    let state_path = global
        .state
        .clone()
        .unwrap_or_else(|| netpass_config::state_path(config));

    let store = Arc::new(state::load(&state_path)?);
    if let Some(tenant) = tenant {
        store.add_tenant(tenant);
    }

    let live = match config.nas.as_ref() {
        Some(profile) => NasLink::Hotspot(netpass_config::nas_client(profile)?),
        None => NasLink::Offline,
    };

    let engine = Engine::new(
        Stores::memory(&store),
        Arc::new(live),
        Arc::new(SystemClock),
        config.engine_config()?,
    )?;

    Ok(Context {
        engine,
        store,
        tenant,
        state_path,
    })
}

/// `--tenant` / `NETPASS_TENANT`, else `default_tenant` from config.
fn resolve_tenant(config: &Config, global: &GlobalOpts) -> Result<Option<TenantId>, CliError> {
    if let Some(raw) = global.tenant.as_deref() {
        return raw
            .parse()
            .map(Some)
            .map_err(|_| CliError::validation("tenant", format!("'{raw}' is not a UUID")));
    }
    Ok(config.default_tenant()?)
}
