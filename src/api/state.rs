use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::domain::{MigrationError, Space, SpaceForm};
use crate::kaiten::KaitenClient;

/// Shared by all handlers. Holds no per-operator data: credentials and
/// selections travel with each request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub sse_tx: broadcast::Sender<String>,
    pub http_client: reqwest::Client,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        sse_tx: broadcast::Sender<String>,
        http_client: reqwest::Client,
        config: Arc<Config>,
    ) -> Self {
        Self {
            sse_tx,
            http_client,
            config,
        }
    }

    /// Validates the form side named `role` and builds a client for it.
    pub fn connect(
        &self,
        form: &SpaceForm,
        role: &str,
    ) -> Result<(Space, KaitenClient), MigrationError> {
        let space = form.validate(role, &self.config.domain_suffix)?;
        let client = KaitenClient::new(&space, &self.config.kaiten_scheme, self.http_client.clone());
        Ok((space, client))
    }
}
