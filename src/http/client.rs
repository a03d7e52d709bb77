use super::headers::HeaderList;
use super::request::Method;
use bytes::{Buf, Bytes, BytesMut};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Configuration for origin clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Read timeout for operations
    pub read_timeout: Duration,
    /// Write timeout for operations
    pub write_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Buffer size for reading data
    pub buffer_size: usize,
    /// Maximum response size to prevent memory exhaustion
    pub max_response_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            buffer_size: 4096,
            max_response_size: 128 * 1024 * 1024,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Timeout error: {0}")]
    Timeout(String),
    #[error("Malformed response: {0}")]
    Parse(String),
    #[error("Response size exceeds maximum allowed size of {0} bytes")]
    TooLarge(usize),
    #[error("Connection closed before the response was complete")]
    Closed,
}

/// Response as read off the wire
#[derive(Debug, Clone)]
pub struct ClientResponse {
    pub status: u16,
    pub reason: String,
    pub headers: HeaderList,
    pub body: Bytes,
}

impl ClientResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Minimal HTTP/1.1 client for exercising the origin
///
/// Sends one request at a time over a persistent connection and reads
/// responses framed by `Content-Length`.
///
/// # Examples
///
/// ```no_run
/// use mock_origin::http::OriginClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let addr = "127.0.0.1:8080".parse()?;
///     let mut client = OriginClient::connect(addr).await?;
///
///     let response = client.get("/any?status=404").await?;
///     assert_eq!(response.status, 404);
///     Ok(())
/// }
/// ```
pub struct OriginClient {
    stream: TcpStream,
    addr: SocketAddr,
    config: ClientConfig,
    buffer: BytesMut,
}

impl OriginClient {
    /// Connect to a server with custom configuration
    pub async fn connect_with_config(
        addr: SocketAddr,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::Timeout("Connection timeout".to_string()))??;

        Ok(Self {
            stream,
            addr,
            buffer: BytesMut::with_capacity(config.buffer_size),
            config,
        })
    }

    /// Connect with default configuration
    pub async fn connect(addr: SocketAddr) -> Result<Self, ClientError> {
        Self::connect_with_config(addr, ClientConfig::default()).await
    }

    pub async fn get(&mut self, target: &str) -> Result<ClientResponse, ClientError> {
        self.send(Method::Get, target, &[], &[]).await
    }

    /// Send one request and read its response
    ///
    /// A `Host` header is added unless `headers` carries one; `Content-Length`
    /// is added whenever there is a body.
    pub async fn send(
        &mut self,
        method: Method,
        target: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<ClientResponse, ClientError> {
        let mut head = format!("{method} {target} HTTP/1.1\r\n");
        if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("host")) {
            head.push_str(&format!("Host: {}\r\n", self.addr));
        }
        for (name, value) in headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        if !body.is_empty() {
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        head.push_str("\r\n");

        let mut request = Vec::with_capacity(head.len() + body.len());
        request.extend_from_slice(head.as_bytes());
        request.extend_from_slice(body);
        self.send_raw(&request).await?;

        self.read_response(method == Method::Head).await
    }

    /// Write raw bytes to the connection
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<(), ClientError> {
        timeout(self.config.write_timeout, self.stream.write_all(data))
            .await
            .map_err(|_| ClientError::Timeout("Write timeout".to_string()))??;
        timeout(self.config.write_timeout, self.stream.flush())
            .await
            .map_err(|_| ClientError::Timeout("Flush timeout".to_string()))??;
        Ok(())
    }

    /// Read one response; `head_only` skips the body as for `HEAD`
    pub async fn read_response(&mut self, head_only: bool) -> Result<ClientResponse, ClientError> {
        let (head_len, status, reason, headers) = loop {
            if let Some(parsed) = parse_head(&self.buffer)? {
                break parsed;
            }
            if self.fill_buffer().await? == 0 {
                return Err(ClientError::Closed);
            }
        };
        self.buffer.advance(head_len);

        if head_only {
            return Ok(ClientResponse {
                status,
                reason,
                headers,
                body: Bytes::new(),
            });
        }

        let body = match headers.get("Content-Length") {
            Some(value) => {
                let length: usize = value
                    .trim()
                    .parse()
                    .map_err(|_| ClientError::Parse(format!("invalid Content-Length: {value}")))?;
                if length > self.config.max_response_size {
                    return Err(ClientError::TooLarge(self.config.max_response_size));
                }
                while self.buffer.len() < length {
                    if self.fill_buffer().await? == 0 {
                        return Err(ClientError::Closed);
                    }
                }
                self.buffer.split_to(length).freeze()
            }
            // Without framing the body runs until the server closes
            None => {
                while self.fill_buffer().await? != 0 {}
                self.buffer.split().freeze()
            }
        };

        Ok(ClientResponse {
            status,
            reason,
            headers,
            body,
        })
    }

    async fn fill_buffer(&mut self) -> Result<usize, ClientError> {
        if self.buffer.len() > self.config.max_response_size {
            return Err(ClientError::TooLarge(self.config.max_response_size));
        }
        self.buffer.reserve(self.config.buffer_size);
        let n = timeout(self.config.read_timeout, self.stream.read_buf(&mut self.buffer))
            .await
            .map_err(|_| ClientError::Timeout("Read timeout".to_string()))??;
        Ok(n)
    }
}

type ParsedHead = (usize, u16, String, HeaderList);

fn parse_head(buffer: &[u8]) -> Result<Option<ParsedHead>, ClientError> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut response = httparse::Response::new(&mut headers);
    match response.parse(buffer) {
        Ok(httparse::Status::Complete(len)) => {
            let status = response
                .code
                .ok_or_else(|| ClientError::Parse("missing status code".to_string()))?;
            let reason = response.reason.unwrap_or_default().to_string();
            let headers = response
                .headers
                .iter()
                .map(|h| (h.name, String::from_utf8_lossy(h.value).into_owned()))
                .collect();
            Ok(Some((len, status, reason, headers)))
        }
        Ok(httparse::Status::Partial) => Ok(None),
        Err(e) => Err(ClientError::Parse(e.to_string())),
    }
}
