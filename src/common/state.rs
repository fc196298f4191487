// Application state shared across all modules

use std::sync::Arc;

use crate::auth::codec::ClaimsCodec;
use crate::auth::password::CredentialHasher;
use crate::auth::service::AccountService;
use crate::auth::tokens::TokenPairManager;
use crate::common::config::{AuthConfig, ConfigError};
use crate::store::IdentityStore;

/// Application state: the identity store plus the auth components built from
/// the startup configuration. Immutable after construction.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IdentityStore>,
    pub codec: Arc<ClaimsCodec>,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new(config: &AuthConfig, store: Arc<dyn IdentityStore>) -> Result<Self, ConfigError> {
        let hasher = CredentialHasher::new(config)?;
        let codec = ClaimsCodec::new(config);
        Ok(Self::from_parts(store, hasher, codec))
    }

    pub fn from_parts(
        store: Arc<dyn IdentityStore>,
        hasher: CredentialHasher,
        codec: ClaimsCodec,
    ) -> Self {
        let codec = Arc::new(codec);
        let tokens = TokenPairManager::new(codec.clone(), store.clone());
        let accounts = AccountService::new(store.clone(), hasher, tokens);

        Self {
            store,
            codec,
            accounts,
        }
    }
}
