//! `GambitServer` builder and serve loop.
//!
//! This is the entry point for running a relay. It ties the layers
//! together: HTTP routes → connection handler → relay → sweep.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gambit_relay::{PeriodicSweep, Relay};
use gambit_rules::RulesEngine;
use gambit_tick::TickConfig;
use tokio::net::TcpListener;

use crate::{GambitError, ServerConfig, router};

/// Builder for configuring and starting a Gambit server.
///
/// # Example
///
/// ```rust,ignore
/// use gambit::prelude::*;
///
/// let server = GambitServer::builder()
///     .bind("127.0.0.1:8000")
///     .sweep_interval(Duration::from_millis(500))
///     .build::<ChessEngine>()
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone, Default)]
pub struct GambitServerBuilder {
    config: ServerConfig,
}

impl GambitServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets how often every session is re-broadcast.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep = TickConfig {
            interval,
            ..self.config.sweep
        };
        self
    }

    /// Binds the listener and creates an empty relay for rules engine `E`.
    ///
    /// # Errors
    /// [`GambitError::Io`] if the address cannot be bound.
    pub async fn build<E: RulesEngine>(
        self,
    ) -> Result<GambitServer<E>, GambitError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        Ok(GambitServer {
            listener,
            relay: Arc::new(Relay::new()),
            config: self.config,
        })
    }
}

/// A bound Gambit server.
///
/// Call [`run()`](Self::run) to start serving.
pub struct GambitServer<E: RulesEngine> {
    listener: TcpListener,
    relay: Arc<Relay<E>>,
    config: ServerConfig,
}

impl<E: RulesEngine> GambitServer<E> {
    /// Creates a new builder.
    pub fn builder() -> GambitServerBuilder {
        GambitServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The relay this server feeds. Shared with every connection task.
    pub fn relay(&self) -> Arc<Relay<E>> {
        Arc::clone(&self.relay)
    }

    /// Serves until Ctrl-C.
    pub async fn run(self) -> Result<(), GambitError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serves until `shutdown` resolves, then stops the sweep.
    ///
    /// Connections already upgraded keep running on their own tasks.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), GambitError> {
        let addr = self.listener.local_addr()?;
        tracing::info!(
            %addr,
            sweep_interval_ms = self.config.sweep.interval.as_millis() as u64,
            "Gambit server running"
        );

        let sweep =
            PeriodicSweep::spawn(Arc::clone(&self.relay), self.config.sweep);
        let app = router(Arc::clone(&self.relay));

        let served = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        sweep.stop().await;
        tracing::info!("Gambit server stopped");
        served.map_err(GambitError::Io)
    }
}
