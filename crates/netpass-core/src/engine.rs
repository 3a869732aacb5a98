// ── Engine facade ──
//
// Wires every service against one set of stores, one clock and one live
// channel. Front ends build an `Engine` and call into its services.

use std::sync::Arc;

use crate::accounts::AccountManager;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::credentials::SecretHasher;
use crate::error::CoreError;
use crate::live::LiveSessions;
use crate::reconcile::Reconciler;
use crate::session::SessionView;
use crate::store::Stores;
use crate::sweeper::Sweeper;
use crate::sync::SyncOrchestrator;
use crate::voucher::VoucherManager;

pub struct Engine<L> {
    pub sync: SyncOrchestrator,
    pub vouchers: VoucherManager,
    pub accounts: AccountManager,
    pub reconciler: Reconciler,
    pub sessions: SessionView<L>,
    stores: Stores,
    live: Arc<L>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl<L: LiveSessions + 'static> Engine<L> {
    pub fn new(
        stores: Stores,
        live: Arc<L>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Result<Self, CoreError> {
        let hasher = SecretHasher::new(config.hash)?;
        let sync = SyncOrchestrator::new(stores.clone(), Arc::clone(&clock));

        Ok(Self {
            vouchers: VoucherManager::new(
                stores.clone(),
                sync.clone(),
                Arc::clone(&clock),
                hasher.clone(),
                config.vouchers.clone(),
            ),
            accounts: AccountManager::new(stores.clone(), sync.clone(), hasher),
            reconciler: Reconciler::new(stores.clone(), sync.clone()),
            sessions: SessionView::new(stores.clone(), Arc::clone(&live), Arc::clone(&clock)),
            sync,
            stores,
            live,
            clock,
            config,
        })
    }

    /// A sweeper sharing this engine's stores, clock and live channel.
    pub fn sweeper(&self) -> Sweeper<L> {
        Sweeper::new(
            self.stores.clone(),
            self.sync.clone(),
            Arc::clone(&self.live),
            Arc::clone(&self.clock),
            self.config.sweep_interval,
        )
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
