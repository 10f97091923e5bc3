use std::sync::Arc;

use crate::auth::{AuthProvider, SessionStore, StaticCredentials};
use crate::config::Config;
use crate::db::{ConnectionConfig, Pool};

pub struct AppState {
    pub pool: Pool,
    pub auth: Arc<dyn AuthProvider>,
    pub sessions: SessionStore,
    pub require_session: bool,
}

impl AppState {
    /// With `require_session` set, data routes need a live session token.
    pub fn new(
        pool: Pool,
        auth: Arc<dyn AuthProvider>,
        sessions: SessionStore,
        require_session: bool,
    ) -> Self {
        Self {
            pool,
            auth,
            sessions,
            require_session,
        }
    }

    /// Opens the pool and builds the credential check from `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let pool = Pool::new(ConnectionConfig::from_config(config), config.pool_max_idle)?;
        let credentials = StaticCredentials::from_config(&config.auth)?;
        Ok(Self::new(
            pool,
            Arc::new(credentials),
            SessionStore::new(config.auth.session_ttl_secs),
            config.auth.require_session,
        ))
    }
}
