use super::codec::{HttpCodec, HttpCodecError};
use super::config::HttpConfig;
use super::response::{CommittedResponse, MockResponse};
use crate::common::OriginServerTrait;
use crate::router::Router;
use crate::security::ConnectionTracker;
use crate::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep_until, timeout};
use tokio::signal;
use tokio_util::codec::Framed;
use tracing::{Instrument, debug, error, info, warn};

/// Mock HTTP origin server
///
/// Accepts HTTP/1.x connections and answers every request through the
/// [`Router`]. Connections are kept alive according to the request's
/// version and `Connection` header.
///
/// # Examples
///
/// ```no_run
/// use mock_origin::common::OriginServerTrait;
/// use mock_origin::http::{HttpConfig, MockOriginServer};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = HttpConfig {
///         bind_addr: "127.0.0.1:8080".parse()?,
///         ..HttpConfig::default()
///     };
///
///     let server = MockOriginServer::new(config);
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct MockOriginServer {
    config: HttpConfig,
    router: Arc<Router>,
    shutdown_signal: Arc<broadcast::Sender<()>>,
}

impl MockOriginServer {
    pub fn new(config: HttpConfig) -> Self {
        let (shutdown_signal, _) = broadcast::channel(1);
        let router = Arc::new(Router::new((&config).into()));
        Self {
            config,
            router,
            shutdown_signal: Arc::new(shutdown_signal),
        }
    }

    /// Serves connections from an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, "Mock HTTP origin listening");

        let tracker = ConnectionTracker::new(self.config.max_connections);
        let mut shutdown_rx = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let guard = match tracker.try_acquire() {
                                Ok(guard) => guard,
                                Err(e) => {
                                    let metrics = tracker.metrics();
                                    warn!(
                                        %addr,
                                        error = %e,
                                        active_connections = metrics.active_connections,
                                        total_connections = metrics.total_connections,
                                        available_slots = metrics.available_slots,
                                        "Connection rejected"
                                    );
                                    continue;
                                }
                            };
                            let current = guard.active_connections();
                            info!(%addr, current, "Accepted connection");

                            let config = self.config.clone();
                            let router = Arc::clone(&self.router);
                            let span = tracing::info_span!("connection", %addr);

                            tokio::spawn(async move {
                                let result = handle_connection(stream, addr, router, config)
                                    .instrument(span)
                                    .await;
                                if let Err(e) = result {
                                    error!(%addr, error = %e, "Error handling connection");
                                }
                                drop(guard);
                                info!(%addr, "Connection closed");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        info!("Mock HTTP origin stopped");
        Ok(())
    }
}

#[async_trait]
impl OriginServerTrait for MockOriginServer {
    async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }
}

/// Answers requests on one connection until it closes or keep-alive ends
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    router: Arc<Router>,
    config: HttpConfig,
) -> Result<()> {
    let codec = HttpCodec::new(addr.ip().to_string(), config.max_request_size);
    let mut framed = Framed::new(stream, codec);

    loop {
        let request = match timeout(config.read_timeout, framed.next()).await {
            Ok(Some(Ok(request))) => request,
            Ok(Some(Err(e))) => {
                warn!(error = %e, "Rejecting malformed request");
                if let Some(status) = e.status() {
                    let response = error_response(&config.server_name, status, true);
                    let _ = timeout(config.write_timeout, framed.send(response)).await;
                }
                return match e {
                    HttpCodecError::Io(e) => Err(e.into()),
                    _ => Ok(()),
                };
            }
            Ok(None) => {
                debug!("Client closed connection");
                break;
            }
            Err(_) => {
                debug!("Read timeout");
                break;
            }
        };

        let keep_alive = request.keep_alive();
        let response = match router.respond(&request) {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %request.method, path = %request.path, error = %e, "Synthesis failed");
                error_response(&config.server_name, e.status(), false)
            }
        };

        info!(
            method = %request.method,
            target = %request.target(),
            status = response.status(),
            size = response.content_length(),
            "Served request"
        );

        if let Some(delay) = response.delay() {
            let delay = delay.min(config.max_delay);
            if !wait_out_delay(framed.get_ref(), delay).await {
                info!(delay_ms = delay.as_millis(), "Client went away during delay");
                break;
            }
        }

        match timeout(config.write_timeout, framed.send(response)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                warn!("Write timeout");
                break;
            }
        }

        if !keep_alive {
            break;
        }
    }

    Ok(())
}

/// Sleeps for `delay`, returning `false` as soon as the peer disconnects
///
/// A half-close (EOF on read) still gets its response; only a socket error
/// abandons it.
async fn wait_out_delay(stream: &TcpStream, delay: Duration) -> bool {
    let deadline = Instant::now() + delay;
    let mut peeked = [0u8; 1];

    tokio::select! {
        _ = sleep_until(deadline) => true,
        result = stream.peek(&mut peeked) => match result {
            Err(e) => {
                debug!(error = %e, "Socket error while delaying");
                false
            }
            // Pipelined bytes or a half-close, neither is a disconnect
            Ok(_) => {
                sleep_until(deadline).await;
                true
            }
        },
    }
}

/// Plain-text answer for requests that never reach the directive pipeline
pub fn error_response(server_name: &str, status: u16, close: bool) -> CommittedResponse {
    let mut response = MockResponse::new(status);
    response.headers.set("Server", server_name);
    response.headers.set("Content-Type", "text/plain");
    response.headers.set("Cache-Control", "private, no-store");
    if close {
        response.headers.set("Connection", "close");
    }
    response.body = format!("{}: {}\n", status, response.reason_phrase()).into();
    response.commit()
}
