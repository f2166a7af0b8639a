//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::{BlockKvError, Result};
use crate::protocol::Application;

use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Clonable handle that stops a running server
#[derive(Clone, Debug, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server exposing an application
pub struct Server {
    config: Config,
    app: Arc<dyn Application>,
    listener: Option<TcpListener>,
    shutdown: ShutdownHandle,
    active_connections: Arc<AtomicUsize>,
}

impl Server {
    /// Create a new server with the given config and application
    pub fn new(config: Config, app: Arc<dyn Application>) -> Self {
        Self {
            config,
            app,
            listener: None,
            shutdown: ShutdownHandle::default(),
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bind the listen address (done by `run` if not called first)
    ///
    /// Returns the bound address, useful with port 0.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        if let Some(listener) = &self.listener {
            return Ok(listener.local_addr()?);
        }

        let listener = TcpListener::bind(&self.config.network.listen_addr).map_err(|e| {
            BlockKvError::Network(format!(
                "bind {}: {}",
                self.config.network.listen_addr, e
            ))
        })?;
        listener.set_nonblocking(true)?;

        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        let addr = self.bind()?;
        let listener = self
            .listener
            .take()
            .ok_or_else(|| BlockKvError::Network("listener not bound".to_string()))?;

        tracing::info!("Listening on {}", addr);

        while !self.shutdown.is_shutdown() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    let active = self.active_connections.load(Ordering::SeqCst);
                    if active >= self.config.network.max_connections {
                        tracing::warn!(
                            "Rejecting {}: {} connections open (max {})",
                            peer,
                            active,
                            self.config.network.max_connections
                        );
                        continue;
                    }

                    // One bad socket must not take the acceptor down
                    if let Err(e) = self.admit(stream) {
                        tracing::warn!("Dropping connection from {}: {}", peer, e);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Server on {} stopped accepting", addr);
        Ok(())
    }

    fn admit(&self, stream: TcpStream) -> Result<()> {
        // Accepted sockets inherit non-blocking mode on some platforms
        stream.set_nonblocking(false)?;
        let mut connection = Connection::new(stream, Arc::clone(&self.app))?;
        let net = &self.config.network;
        connection.set_timeouts(net.read_timeout_ms, net.write_timeout_ms)?;

        let active = Arc::clone(&self.active_connections);
        active.fetch_add(1, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", connection.peer_addr()))
            .spawn(move || {
                if let Err(e) = connection.handle() {
                    tracing::debug!(
                        "Connection {} closed with error: {}",
                        connection.peer_addr(),
                        e
                    );
                }
                active.fetch_sub(1, Ordering::SeqCst);
            });

        if let Err(e) = spawned {
            self.active_connections.fetch_sub(1, Ordering::SeqCst);
            return Err(BlockKvError::Network(format!("spawn connection thread: {}", e)));
        }
        Ok(())
    }

    /// Signal the server to stop accepting connections
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }
}
