use crate::http::{HttpConfig, MockOriginServer};
use crate::{OriginError, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Starts a mock origin on an ephemeral loopback port for integration tests
///
/// `bind_addr` in `config` is ignored; the returned address is the one the
/// server is actually listening on. The listener is bound before this
/// returns, so clients can connect immediately.
pub async fn spawn_test_server(
    config: HttpConfig,
) -> Result<(JoinHandle<Result<()>>, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| OriginError::Config(format!("Failed to bind listener: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| OriginError::Config(format!("Failed to get local address: {e}")))?;

    let server = MockOriginServer::new(HttpConfig {
        bind_addr: addr,
        ..config
    });
    let server_handle = tokio::spawn(async move { server.serve(listener).await });

    Ok((server_handle, addr))
}
