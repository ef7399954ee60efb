use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::AddrIncoming;
use hyper::service::{make_service_fn, service_fn};
use log::{info, warn};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::timeout;

use crate::routes;
use crate::rules::RoutingTable;

/// How long in-flight requests get to finish after the shutdown trigger.
const GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Guard against clients that open a connection and trickle the request in.
const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind listener: {0}")]
    Bind(#[source] hyper::Error),
    #[error("server error: {0}")]
    Serve(#[source] hyper::Error),
}

pub struct Server {
    incoming: AddrIncoming,
}

impl Server {
    /// Binding happens before serving so that a bad port aborts startup, and
    /// so callers can learn the actual address when binding port 0.
    pub fn bind(addr: &SocketAddr) -> Result<Self, ServerError> {
        let incoming = AddrIncoming::bind(addr).map_err(ServerError::Bind)?;
        Ok(Self { incoming })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.incoming.local_addr()
    }

    /// Serves requests against `table` until `shutdown` resolves, then stops
    /// accepting and drains in-flight requests for up to the grace period.
    /// Connections still open when it expires are dropped; that is reported
    /// but is not a failure.
    ///
    /// `shutdown` is injected rather than registered here, so tests can
    /// trigger it without delivering real signals.
    pub async fn serve<S>(self, table: RoutingTable, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()>,
    {
        let table = Arc::new(table);
        let make_svc = make_service_fn(move |_conn| {
            let table = Arc::clone(&table);
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let table = Arc::clone(&table);
                    async move {
                        Ok::<_, Infallible>(routes::respond_to_request(&req, &table))
                    }
                }))
            }
        });

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = hyper::Server::builder(self.incoming)
            .http1_header_read_timeout(HEADER_READ_TIMEOUT)
            .serve(make_svc)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            });
        tokio::pin!(server);

        tokio::select! {
            res = &mut server => res.map_err(ServerError::Serve),
            _ = shutdown => {
                info!("shutting down, draining in-flight requests");
                let _ = stop_tx.send(());
                match timeout(GRACE_PERIOD, &mut server).await {
                    Ok(res) => res.map_err(ServerError::Serve),
                    Err(_) => {
                        warn!("grace period expired, closing remaining connections");
                        Ok(())
                    }
                }
            }
        }
    }
}
