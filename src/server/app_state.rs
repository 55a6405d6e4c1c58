use std::sync::Arc;

use tracing::info;

use crate::auth::AdminSessionSigner;
use crate::config::settings::Config;
use crate::services::{LogNotifier, RegistrationNotifier, RegistrationService};
use crate::storage::Storage;

/// Application state that is shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Storage backend (ledger and users)
    pub storage: Arc<dyn Storage>,
    /// Registration, login and profile operations
    pub registration: Arc<RegistrationService>,
    /// Admin session signing key
    pub admin_signer: Arc<AdminSessionSigner>,
}

impl AppState {
    /// State with the logging notifier
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        Self::new_with_notifier(config, storage, Arc::new(LogNotifier))
    }

    pub fn new_with_notifier(
        config: Config,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn RegistrationNotifier>,
    ) -> Self {
        let registration = Arc::new(RegistrationService::new(storage.clone(), notifier, &config));
        let admin_signer = Arc::new(AdminSessionSigner::from_config(&config.admin));

        info!(
            "App state ready (storage={}, legacy_fallback={})",
            storage.storage_type(),
            config.access.legacy_fallback
        );

        Self {
            config: Arc::new(config),
            storage,
            registration,
            admin_signer,
        }
    }
}
