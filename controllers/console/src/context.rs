//! Shared handles for one console invocation.

use crate::config::Config;
use crate::error::ConsoleError;
use ipam_client::{IpamClient, IpamService};
use ipam_view::{FileStore, SessionContext};
use std::sync::Arc;
use tracing::{debug, info};

/// Data access, session store and settings
#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    pub service: IpamService,
    pub session: SessionContext<FileStore>,
}

impl AppContext {
    /// Build the REST client and load the persisted session
    pub fn new(config: Config) -> Result<Self, ConsoleError> {
        let client = IpamClient::with_timeout(config.api_url.clone(), config.api_timeout)?;
        info!("Using IPAC API at {}", config.api_url);

        let store = FileStore::in_dir(&config.state_dir);
        debug!("Session store: {}", store.path().display());
        let session = SessionContext::init(store)?;

        Ok(Self {
            service: IpamService::new(Arc::new(client)),
            session,
            config,
        })
    }

    /// Fail unless a user is signed in
    pub fn require_login(&self) -> Result<(), ConsoleError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(ConsoleError::NotAuthenticated)
        }
    }
}
