use crate::directive::Encoding;
use crate::http::{MockResponse, ParsedRequest};
use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::{self, Write};
use tracing::debug;

/// Gzip-encodes `body`, returning the encoded bytes and the matching
/// `Content-Encoding` value
pub fn compress(body: &[u8]) -> io::Result<(Bytes, &'static str)> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(body.len() / 2 + 32), Compression::default());
    encoder.write_all(body)?;
    let encoded = encoder.finish()?;
    Ok((Bytes::from(encoded), "gzip"))
}

/// Whether an `Accept-Encoding` value admits gzip (explicitly or via `*`)
pub fn accepts_gzip(accept_encoding: Option<&str>) -> bool {
    let Some(accept_encoding) = accept_encoding else {
        return false;
    };

    let mut gzip = None;
    let mut wildcard = None;
    for entry in accept_encoding.split(',') {
        let mut parts = entry.split(';');
        let coding = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let quality = parts
            .filter_map(|param| param.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);
        match coding.as_str() {
            "gzip" | "x-gzip" => gzip = Some(quality),
            "*" => wildcard = Some(quality),
            _ => {}
        }
    }
    gzip.or(wildcard).is_some_and(|q| q > 0.0)
}

/// Content types worth compressing when the client negotiates it
pub fn is_compressible(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime.starts_with("text/")
        || mime.ends_with("+xml")
        || mime.ends_with("+json")
        || mime.ends_with("/json")
        || mime.ends_with("/xml")
        || mime.ends_with("/javascript")
}

/// Applies forced or negotiated gzip to the response body
///
/// - Empty bodies are never encoded
/// - `Some(Identity)` suppresses compression entirely
/// - `Some(Gzip)` always compresses
/// - `None` negotiates: compressible `200` responses without a preset
///   `Content-Encoding` are gzipped when the request accepts it, and carry
///   `Vary: Accept-Encoding` either way
pub fn apply(
    response: &mut MockResponse,
    forced: Option<Encoding>,
    request: &ParsedRequest,
) -> io::Result<()> {
    if response.body.is_empty() {
        return Ok(());
    }

    let compress_body = match forced {
        Some(Encoding::Identity) => false,
        Some(Encoding::Gzip) => true,
        None => {
            let negotiable = is_compressible(response.headers.get("Content-Type"))
                && !response.headers.contains("Content-Encoding");
            if negotiable {
                let varies = response
                    .headers
                    .get_all("Vary")
                    .any(|v| v.to_ascii_lowercase().contains("accept-encoding"));
                if !varies {
                    response.headers.append("Vary", "Accept-Encoding");
                }
            }
            negotiable && response.status == 200 && accepts_gzip(request.headers.get("Accept-Encoding"))
        }
    };

    if compress_body {
        let original = response.body.len();
        let (encoded, coding) = compress(&response.body)?;
        debug!(original, compressed = encoded.len(), "Compressed response body");
        response.body = encoded;
        response.headers.set("Content-Encoding", coding);
    }
    Ok(())
}
