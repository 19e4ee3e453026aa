use std::{net::SocketAddr, sync::Arc, time::Duration};

use tokio::{net::TcpListener, sync::watch};
use tracing::{error, info};

use crate::{connection, state::DaemonState};

/// Pause after a failed `accept` so a persistent error (e.g. out of file
/// descriptors) does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The listening socket plus the state every connection shares.
pub struct Server {
    listener: TcpListener,
    state: Arc<DaemonState>,
}

impl Server {
    /// Bind to `state.config.daemon.addr()`. Port `0` picks a free port.
    pub async fn bind(state: Arc<DaemonState>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(state.config.daemon.addr()).await?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. Runs until `shutdown` broadcasts `true` or its sender is
    /// dropped. Accept failures are logged and the loop keeps going.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(addr = ?self.listener.local_addr().ok(), "listener started, waiting for tasks");
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(connection::handle_connection(stream, peer, state));
                    }
                    Err(e) => {
                        error!("error accepting connection: {e}");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("listener shutting down");
                        break;
                    }
                }
            }
        }
    }
}
