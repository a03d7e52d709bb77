use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the mock HTTP origin
///
/// # Examples
///
/// ```rust
/// use mock_origin::http::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig {
///     bind_addr: "127.0.0.1:8080".parse().unwrap(),
///     max_connections: 100,
///     read_timeout: Duration::from_secs(30),
///     write_timeout: Duration::from_secs(30),
///     server_name: "Origin/1.0".to_string(),
///     max_request_size: 1024 * 1024,
///     max_content_length: 16 * 1024 * 1024,
///     max_delay: Duration::from_secs(10),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Network address to bind to
    pub bind_addr: SocketAddr,
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// How long to wait for the next request on a connection
    pub read_timeout: Duration,
    /// Write timeout for responses
    pub write_timeout: Duration,
    /// Value of the `Server` header
    pub server_name: String,
    /// Largest request body accepted, in bytes
    pub max_request_size: usize,
    /// Largest body a `content` directive may generate, in bytes
    pub max_content_length: usize,
    /// Upper bound on the time a `delay` directive actually sleeps
    pub max_delay: Duration,
}

impl HttpConfig {
    pub fn default_server_name() -> String {
        format!("Rust/Tokio/Mock_HTTP_Origin/{}", env!("CARGO_PKG_VERSION"))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_connections: 1000,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            server_name: Self::default_server_name(),
            max_request_size: 1024 * 1024,
            max_content_length: 64 * 1024 * 1024,
            max_delay: Duration::from_secs(60),
        }
    }
}
