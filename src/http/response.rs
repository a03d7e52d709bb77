use super::headers::HeaderList;
use bytes::Bytes;
use std::time::Duration;

/// Default reason phrase for a status code, `Unknown` outside the registry
pub fn default_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

/// Response under construction
///
/// Headers, status and body may be changed freely until [`MockResponse::commit`]
/// frames the response. Framing headers (`Content-Length`) are only ever
/// written by `commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    /// Overrides the default reason phrase when set
    pub reason: Option<String>,
    pub headers: HeaderList,
    pub body: Bytes,
    /// Time to suspend before the response is transmitted
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: None,
            headers: HeaderList::new(),
            body: Bytes::new(),
            delay: None,
        }
    }

    pub fn reason_phrase(&self) -> &str {
        self.reason.as_deref().unwrap_or_else(|| default_reason(self.status))
    }

    /// Finalizes framing and freezes the response
    ///
    /// Any `Content-Length` a directive may have written is replaced by the
    /// length of the body that will actually be sent.
    pub fn commit(mut self) -> CommittedResponse {
        self.headers.set("Content-Length", self.body.len().to_string());
        CommittedResponse {
            status: self.status,
            reason: self.reason_phrase().to_string(),
            headers: self.headers,
            body: self.body,
            delay: self.delay,
            head_only: false,
        }
    }
}

/// A framed response that can no longer be altered
///
/// Exactly one `Content-Length` header is present and it matches the body
/// produced by the synthesis (for HEAD requests the body is withheld while
/// the header keeps the length a GET would have received).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedResponse {
    status: u16,
    reason: String,
    headers: HeaderList,
    body: Bytes,
    delay: Option<Duration>,
    head_only: bool,
}

impl CommittedResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// Bytes that will be written after the header block
    pub fn body(&self) -> &[u8] {
        if self.head_only { &[] } else { &self.body }
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Withholds the body while keeping every header, as a HEAD answer does
    pub fn without_body(mut self) -> Self {
        self.head_only = true;
        self
    }

    /// Status line and header block, terminated by the empty line
    pub fn head_bytes(&self) -> Vec<u8> {
        format!("HTTP/1.1 {} {}\r\n{}\r\n", self.status, self.reason, self.headers).into_bytes()
    }
}
