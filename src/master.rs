//! The master process: owns the listening socket and the topic registry.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use crate::broker::TopicRegistry;
use crate::config::{BrokerSettings, Settings};
use crate::transport::serve;
use crate::utils::Result;

#[derive(Debug)]
pub struct Master {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: Arc<TopicRegistry>,
    settings: BrokerSettings,
}

impl Master {
    /// Binds the listener described by `settings.master`. Port 0 picks a free port.
    pub async fn bind(settings: &Settings) -> Result<Self> {
        let listener = TcpListener::bind(settings.master.addr()).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "master listening");

        Ok(Self {
            listener,
            local_addr,
            registry: Arc::new(TopicRegistry::new()),
            settings: settings.broker.clone(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> Arc<TopicRegistry> {
        self.registry.clone()
    }

    /// Serves connections until `signal` completes or accepting fails.
    ///
    /// On return the listener is closed and every connection task has been
    /// told to stop; they unregister themselves as they unwind.
    pub async fn run_until<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let result = tokio::select! {
            res = serve(self.listener, self.registry.clone(), self.settings, shutdown_rx) => {
                if let Err(e) = &res {
                    error!(error = %e, "accept loop failed");
                }
                res
            }
            _ = signal => {
                info!("master shutting down");
                Ok(())
            }
        };

        let _ = shutdown_tx.send(true);
        result
    }
}
