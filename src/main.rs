use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use mock_origin::{HttpConfig, MockOriginServer, OriginServerTrait};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mock-origin")]
#[command(about = "Mock HTTP origin driven by query-string directives", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Maximum number of concurrent connections
    #[arg(long, default_value_t = 1000)]
    max_connections: usize,

    /// Seconds to wait for the next request on a connection
    #[arg(long, default_value_t = 30)]
    read_timeout: u64,

    /// Seconds allowed to write one response
    #[arg(long, default_value_t = 30)]
    write_timeout: u64,

    /// Value of the Server header (defaults to the crate name and version)
    #[arg(long)]
    server_name: Option<String>,

    /// Largest accepted request body, in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    max_request_size: usize,

    /// Largest body a content directive may generate, in bytes
    #[arg(long, default_value_t = 64 * 1024 * 1024)]
    max_content_length: usize,

    /// Upper bound in seconds on the time a delay directive sleeps
    #[arg(long, default_value_t = 60.0)]
    max_delay: f64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "mock_origin=info")]
    log_filter: String,
}

impl Args {
    fn to_config(&self) -> Result<HttpConfig> {
        let max_delay = Duration::try_from_secs_f64(self.max_delay)
            .wrap_err_with(|| format!("Invalid --max-delay value {}", self.max_delay))?;

        Ok(HttpConfig {
            bind_addr: self.bind,
            max_connections: self.max_connections,
            read_timeout: Duration::from_secs(self.read_timeout),
            write_timeout: Duration::from_secs(self.write_timeout),
            server_name: self
                .server_name
                .clone()
                .unwrap_or_else(HttpConfig::default_server_name),
            max_request_size: self.max_request_size,
            max_content_length: self.max_content_length,
            max_delay,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_filter))
        .wrap_err("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.to_config()?;
    info!(
        address = %config.bind_addr,
        max_connections = config.max_connections,
        server_name = %config.server_name,
        "Starting mock HTTP origin"
    );

    let server = MockOriginServer::new(config);
    server.run().await.wrap_err("Failed to run mock HTTP origin")?;

    Ok(())
}
