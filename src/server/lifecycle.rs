//! Server lifecycle: bind, serve, drain on interrupt
//!
//! ```text
//! Idle --bind--> Serving --interrupt--> Draining --drained--> Stopped
//!                   \--transport error--> Failed ------------> Stopped
//! ```
//!
//! Two tasks run once the server starts:
//! - the interrupt watcher awaits a single interrupt and fires the
//!   [`ShutdownController`](super::shutdown::ShutdownController)
//! - the serving task runs axum with graceful shutdown bound to that signal,
//!   then fires the [`CompletionLatch`] with how it ended
//!
//! The latch fires exactly once on every path, including a panic in the
//! serving task, so [`RunningServer::wait`] always returns. The drain itself
//! has no deadline.

use crate::config::ServerConfig;
use crate::server::shutdown::{shutdown_channel, CompletionLatch, Termination};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// A bound listener plus the router it will serve
///
/// Consumed by [`start`](Application::start), so only the lifecycle code can
/// trigger shutdown of the server it owns.
pub struct Application {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl Application {
    /// Bind the configured address
    ///
    /// Binding happens here rather than in `start` so a port conflict is
    /// reported before any task is spawned.
    ///
    /// # Errors
    /// Returns `ServerError::Bind` if the address does not resolve or the
    /// port cannot be bound.
    pub async fn bind(config: &ServerConfig, router: Router) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let bind_error = |source| ServerError::Bind {
            addr: addr.clone(),
            source,
        };

        let listener = TcpListener::bind(addr.as_str()).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        // Log after successful bind - server is actually listening
        info!(addr = %local_addr, "Listening on {}", local_addr);

        Ok(Self {
            listener,
            router,
            local_addr,
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start serving
    ///
    /// `interrupt` resolves once when shutdown should begin; in the binary
    /// this is [`wait_for_interrupt`](super::shutdown::wait_for_interrupt).
    /// Only its first completion is observed.
    pub fn start<I>(self, interrupt: I) -> RunningServer
    where
        I: Future<Output = ()> + Send + 'static,
    {
        let (controller, signal) = shutdown_channel();
        let completion = CompletionLatch::new();

        let watcher = tokio::spawn(async move {
            interrupt.await;
            info!("Interrupt received. Gracefully shutting down");
            controller.shutdown();
        });

        let drain_signal = signal.clone();
        let serve_completion = completion.clone();
        let Application {
            listener,
            router,
            local_addr,
        } = self;
        let server = tokio::spawn(async move {
            let _guard = FireOnDrop(serve_completion.clone());
            let mut signal = signal;

            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { signal.wait().await })
                .await;

            let termination = match result {
                Ok(()) => {
                    info!("Server drained");
                    Termination::Drained
                }
                Err(e) => {
                    error!(error = %e, draining = drain_signal.is_shutdown(), "Server error");
                    Termination::Failed
                }
            };
            serve_completion.fire(termination);
        });

        RunningServer {
            local_addr,
            completion,
            watcher,
            server,
        }
    }

    /// Start serving and block until the server has stopped
    pub async fn run<I>(self, interrupt: I) -> Termination
    where
        I: Future<Output = ()> + Send + 'static,
    {
        self.start(interrupt).wait().await
    }
}

/// Fires the latch as failed if the serving task ends without firing it
struct FireOnDrop(CompletionLatch);

impl Drop for FireOnDrop {
    fn drop(&mut self) {
        if self.0.fire(Termination::Failed) {
            warn!("Serving task ended without reporting completion");
        }
    }
}

/// Handle to a server that is serving or draining
pub struct RunningServer {
    local_addr: SocketAddr,
    completion: CompletionLatch,
    watcher: JoinHandle<()>,
    server: JoinHandle<()>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Observer for the completion latch
    pub fn completion(&self) -> CompletionLatch {
        self.completion.clone()
    }

    /// Block until the server has stopped
    ///
    /// Returns after the completion latch fires. By then the listener has
    /// been dropped and no new connections are accepted.
    pub async fn wait(self) -> Termination {
        let termination = self.completion.wait().await;

        // Still pending if serving failed before any interrupt arrived
        self.watcher.abort();
        if let Err(e) = self.server.await {
            error!(error = %e, "Serving task did not finish cleanly");
        }

        info!(termination = ?termination, "Server stopped");
        termination
    }
}

/// Bind, serve, and block until the server has stopped
///
/// # Errors
/// Returns `ServerError::Bind` if the listener cannot be bound; nothing is
/// spawned in that case.
pub async fn serve<I>(
    config: &ServerConfig,
    router: Router,
    interrupt: I,
) -> Result<Termination, ServerError>
where
    I: Future<Output = ()> + Send + 'static,
{
    let app = Application::bind(config, router).await?;
    Ok(app.run(interrupt).await)
}
