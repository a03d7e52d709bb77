use super::headers::HeaderList;
use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

/// Request methods understood by the mock origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Connect,
    Trace,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
            Method::Connect => "CONNECT",
            Method::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a method token is not one of [`Method`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown method {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Method tokens are case-sensitive
        match s {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "OPTIONS" => Ok(Method::Options),
            "CONNECT" => Ok(Method::Connect),
            "TRACE" => Ok(Method::Trace),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// Immutable snapshot of one inbound request
///
/// Everything the response synthesis needs is captured here; nothing reads
/// from the live connection once a `ParsedRequest` exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub method: Method,
    /// Path component of the request target, without the query string
    pub path: String,
    /// Raw query string, without the leading `?` (empty if absent)
    pub query: String,
    /// Minor HTTP version (`1` for HTTP/1.1, `0` for HTTP/1.0)
    pub version: u8,
    pub headers: HeaderList,
    pub body: Bytes,
    /// IP address of the transport peer, without the port
    pub peer_addr: String,
}

impl ParsedRequest {
    /// Builds a request from a raw target such as `/path?key=value`
    pub fn new(method: Method, target: &str, peer_addr: impl Into<String>) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (target.to_string(), String::new()),
        };
        Self {
            method,
            path,
            query,
            version: 1,
            headers: HeaderList::new(),
            body: Bytes::new(),
            peer_addr: peer_addr.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// The request target as it appeared on the request line
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    pub fn version_str(&self) -> &'static str {
        if self.version == 0 { "HTTP/1.0" } else { "HTTP/1.1" }
    }

    /// Whether the connection should stay open after answering this request
    pub fn keep_alive(&self) -> bool {
        let connection = self.headers.get("Connection").map(str::to_ascii_lowercase);
        match (self.version, connection.as_deref()) {
            (_, Some(value)) if value.split(',').any(|t| t.trim() == "close") => false,
            (0, Some(value)) => value.split(',').any(|t| t.trim() == "keep-alive"),
            (0, None) => false,
            _ => true,
        }
    }
}
