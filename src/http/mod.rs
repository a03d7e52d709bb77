//! HTTP/1.x transport for the mock origin
//!
//! Request parsing and response framing, the TCP server loop and a small
//! client used to drive the server in tests and benchmarks.

pub mod client;
pub mod codec;
pub mod config;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

#[cfg(test)]
mod tests;

pub use client::{ClientConfig, ClientError, ClientResponse, OriginClient};
pub use codec::{HttpCodec, HttpCodecError};
pub use config::HttpConfig;
pub use headers::HeaderList;
pub use request::{Method, ParsedRequest};
pub use response::{CommittedResponse, MockResponse};
pub use server::MockOriginServer;
