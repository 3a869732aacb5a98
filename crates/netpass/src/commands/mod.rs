//! Command handlers, one module per top-level subcommand.

pub mod rate;
pub mod rows;
pub mod sessions;
pub mod subscribers;
pub mod sweep;
pub mod sync;
pub mod util;
pub mod vouchers;

use std::path::PathBuf;
use std::sync::Arc;

use netpass_core::{Engine, MemoryStore, TenantId};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::nas::NasLink;

/// Everything a stateful command needs: the engine over the loaded store,
/// the selected tenant, and where to persist.
pub struct Context {
    pub engine: Engine<NasLink>,
    pub store: Arc<MemoryStore>,
    pub tenant: Option<TenantId>,
    pub state_path: PathBuf,
}

impl Context {
    /// The selected tenant. Only `sweep` runs without one.
    pub fn tenant(&self) -> Result<TenantId, CliError> {
        self.tenant.ok_or_else(|| CliError::NoTenant {
            config_path: netpass_config::config_path().display().to_string(),
        })
    }

    pub fn save(&self) -> Result<(), CliError> {
        crate::state::save(&self.state_path, &self.store)
    }
}

/// Route a stateful command to its handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Vouchers(args) => vouchers::handle(args, ctx, global),
        Command::Subscribers(args) => subscribers::handle(args, ctx, global),
        Command::Sync(args) => sync::handle(args, ctx, global),
        Command::Rows(args) => rows::handle(&args, ctx, global),
        Command::Sessions(args) => sessions::handle(args, ctx, global).await,
        Command::Sweep(args) => sweep::handle(&args, ctx, global).await,
        Command::Rate(_) | Command::Completions(_) => Err(CliError::Internal(
            "stateless command routed through dispatch".into(),
        )),
    }
}
