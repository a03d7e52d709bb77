use super::request::{Method, ParsedRequest};
use super::response::CommittedResponse;
use crate::security::{SizeError, SizeValidator};
use bytes::{Buf, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Maximum number of request headers httparse will accept
const MAX_HEADERS: usize = 64;
/// Largest request head (request line plus headers) we buffer
const MAX_HEAD_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum HttpCodecError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP parsing error: {0}")]
    HttpParse(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Request head exceeds {0} bytes")]
    HeadTooLarge(usize),
    #[error("Method {0} not implemented")]
    UnknownMethod(String),
    #[error("Chunked request bodies are not supported")]
    ChunkedBody,
    #[error(transparent)]
    TooLarge(#[from] SizeError),
}

impl HttpCodecError {
    /// Status to answer with before closing, `None` when the peer is gone
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpCodecError::Io(_) => None,
            HttpCodecError::HttpParse(_) | HttpCodecError::InvalidRequest(_) => Some(400),
            HttpCodecError::HeadTooLarge(_) => Some(431),
            HttpCodecError::UnknownMethod(_) | HttpCodecError::ChunkedBody => Some(501),
            HttpCodecError::TooLarge(_) => Some(413),
        }
    }
}

/// Request head that has been parsed while its body is still arriving
#[derive(Debug)]
struct PendingRequest {
    request: ParsedRequest,
    content_length: usize,
}

/// HTTP/1.x framing for one connection
///
/// Decodes requests delimited by `Content-Length` and encodes committed
/// responses. The codec keeps the head of a request whose body has not fully
/// arrived yet, so partial reads never re-parse the head.
#[derive(Debug)]
pub struct HttpCodec {
    peer_addr: String,
    body_limit: SizeValidator,
    pending: Option<PendingRequest>,
}

impl HttpCodec {
    pub fn new(peer_addr: impl Into<String>, max_request_size: usize) -> Self {
        Self {
            peer_addr: peer_addr.into(),
            body_limit: SizeValidator::new(max_request_size),
            pending: None,
        }
    }

    fn decode_head(&self, src: &[u8]) -> Result<Option<(usize, PendingRequest)>, HttpCodecError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut headers);

        let head_len = match req.parse(src) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) => {
                if src.len() > MAX_HEAD_SIZE {
                    return Err(HttpCodecError::HeadTooLarge(MAX_HEAD_SIZE));
                }
                return Ok(None);
            }
            Err(e) => {
                return Err(HttpCodecError::HttpParse(format!(
                    "Failed to parse request head: {e}"
                )));
            }
        };

        let method_token = req.method.unwrap_or_default();
        let method: Method = method_token
            .parse()
            .map_err(|_| HttpCodecError::UnknownMethod(method_token.to_string()))?;
        let target = req
            .path
            .ok_or_else(|| HttpCodecError::InvalidRequest("missing request target".to_string()))?;

        let mut request = ParsedRequest::new(method, target, self.peer_addr.as_str());
        request.version = req.version.unwrap_or(1);
        for header in req.headers.iter() {
            request
                .headers
                .append(header.name, String::from_utf8_lossy(header.value).into_owned());
        }

        if request.headers.contains("Transfer-Encoding") {
            return Err(HttpCodecError::ChunkedBody);
        }

        let content_length = match request.headers.get("Content-Length") {
            Some(value) => value.trim().parse::<usize>().map_err(|_| {
                HttpCodecError::InvalidRequest(format!("invalid Content-Length: {value}"))
            })?,
            None => 0,
        };
        self.body_limit.validate_size(content_length)?;

        Ok(Some((
            head_len,
            PendingRequest {
                request,
                content_length,
            },
        )))
    }
}

impl Decoder for HttpCodec {
    type Item = ParsedRequest;
    type Error = HttpCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<ParsedRequest>, HttpCodecError> {
        if self.pending.is_none() {
            match self.decode_head(src)? {
                Some((head_len, pending)) => {
                    src.advance(head_len);
                    self.pending = Some(pending);
                }
                None => return Ok(None),
            }
        }

        let Some(content_length) = self.pending.as_ref().map(|p| p.content_length) else {
            return Ok(None);
        };
        if src.len() < content_length {
            src.reserve(content_length - src.len());
            return Ok(None);
        }

        let body = src.split_to(content_length).freeze();
        Ok(self.pending.take().map(|pending| pending.request.with_body(body)))
    }
}

impl Encoder<CommittedResponse> for HttpCodec {
    type Error = HttpCodecError;

    fn encode(&mut self, item: CommittedResponse, dst: &mut BytesMut) -> Result<(), HttpCodecError> {
        let head = item.head_bytes();
        dst.reserve(head.len() + item.body().len());
        dst.extend_from_slice(&head);
        dst.extend_from_slice(item.body());
        Ok(())
    }
}
