//! Request/response transcripts used as diagnostic bodies.
//!
//! The text form follows the familiar verbose-client convention:
//! `>` request line and headers, `*` informational lines, `<` status line
//! and response headers. Framing headers are finalized after the body is
//! rendered, so `Content-Length` and `Content-Encoding` never appear.

use crate::directive::Directive;
use crate::http::{MockResponse, ParsedRequest};
use serde::Serialize;
use std::fmt::Write;
use url::form_urlencoded;

/// Renders the request/response transcript, ending with a lone `<` line
pub fn render(request: &ParsedRequest, response: &MockResponse) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "> {} {} {}", request.method, request.target(), request.version_str());
    for (name, value) in request.headers.iter() {
        let _ = writeln!(out, "> {name}: {value}");
    }
    out.push_str(">\n");

    if !request.body.is_empty() {
        let _ = writeln!(out, "* {} DATA {}", request.method, bytes_repr(&request.body));
    }

    let _ = writeln!(out, "< HTTP/1.1 {} {}", response.status, response.reason_phrase());
    for (name, value) in response.headers.iter() {
        let _ = writeln!(out, "< {name}: {value}");
    }
    out.push_str("<\n");
    out
}

/// Transcript wrapped in the catch-all route's commentary
pub fn render_echo(request: &ParsedRequest, response: &MockResponse) -> String {
    format!(
        "* Mock HTTP origin: request and response as seen by the server\n{}* Append ?quiet for the bare transcript, see /test/help for every directive\n",
        render(request, response)
    )
}

/// Argument and directive dump followed by the transcript
pub fn render_debug(
    request: &ParsedRequest,
    directives: &[Directive],
    response: &MockResponse,
) -> String {
    let mut out = String::from("# DEBUG: request.arguments\n");

    let mut arguments: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in form_urlencoded::parse(request.query.as_bytes()).into_owned() {
        match arguments.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => arguments.push((key, vec![value])),
        }
    }
    for (key, values) in &arguments {
        let _ = writeln!(out, "#   {key} = {values:?}");
    }

    out.push_str("# DEBUG: directives\n");
    for directive in directives {
        let _ = writeln!(out, "#   {directive}");
    }
    out.push_str("#\n");
    out.push_str(&render(request, response));
    out
}

#[derive(Serialize)]
struct EchoDocument<'a> {
    request: RequestEcho<'a>,
    response: ResponseEcho<'a>,
}

#[derive(Serialize)]
struct RequestEcho<'a> {
    method: &'a str,
    uri: String,
    path: &'a str,
    query: &'a str,
    version: &'a str,
    remote_ip: &'a str,
    headers: Vec<[&'a str; 2]>,
    body: String,
}

#[derive(Serialize)]
struct ResponseEcho<'a> {
    status_code: u16,
    reason: &'a str,
    headers: Vec<[&'a str; 2]>,
}

/// JSON rendering of the same transcript
///
/// Headers are lists of `[name, value]` pairs so repeated names survive.
pub fn render_json(
    request: &ParsedRequest,
    response: &MockResponse,
) -> serde_json::Result<Vec<u8>> {
    let document = EchoDocument {
        request: RequestEcho {
            method: request.method.as_str(),
            uri: request.target(),
            path: &request.path,
            query: &request.query,
            version: request.version_str(),
            remote_ip: &request.peer_addr,
            headers: request.headers.iter().map(|(n, v)| [n, v]).collect(),
            body: String::from_utf8_lossy(&request.body).into_owned(),
        },
        response: ResponseEcho {
            status_code: response.status,
            reason: response.reason_phrase(),
            headers: response.headers.iter().map(|(n, v)| [n, v]).collect(),
        },
    };
    let mut body = serde_json::to_vec_pretty(&document)?;
    body.push(b'\n');
    Ok(body)
}

/// Byte-literal style rendering of a payload: `b'...'`
pub fn bytes_repr(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() + 3);
    out.push_str("b'");
    for &byte in data {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\x{byte:02x}");
            }
        }
    }
    out.push('\'');
    out
}
