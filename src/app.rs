use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::api::start_api_server;
use crate::config::Config;
use crate::session::SessionRegistry;
use crate::utils::error::Result;

const DIAGNOSTIC_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Wires configuration, the session registry, and the HTTP server together.
pub struct Application {
    config: Config,
    registry: SessionRegistry,
    server_handle: Option<JoinHandle<()>>,
    diagnostics_handle: Option<JoinHandle<()>>,
}

impl Application {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: SessionRegistry::new(),
            server_handle: None,
            diagnostics_handle: None,
        }
    }

    /// Start the HTTP server and the diagnostic loop; resolves once the
    /// server task exits (normally only on bind/accept failure).
    pub async fn run(&mut self) -> Result<()> {
        let handle = start_api_server(&self.config, self.registry.clone()).await?;
        self.server_handle = Some(handle);
        self.diagnostics_handle = Some(self.spawn_diagnostics());

        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
        Ok(())
    }

    fn spawn_diagnostics(&self) -> JoinHandle<()> {
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(DIAGNOSTIC_INTERVAL);
            loop {
                interval.tick().await;
                info!(active_sessions = registry.count(), "diagnostic tick");
            }
        })
    }

    pub async fn shutdown(&self) {
        if let Some(handle) = &self.server_handle {
            handle.abort();
        }
        if let Some(handle) = &self.diagnostics_handle {
            handle.abort();
        }
    }
}
