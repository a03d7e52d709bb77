use super::codec::{HttpCodec, HttpCodecError};
use super::request::Method;
use super::response::MockResponse;
use super::server::error_response;
use crate::common::test_utils::spawn_test_server;
use crate::common::OriginServerTrait;
use crate::http::{HttpConfig, MockOriginServer, OriginClient};
use bytes::BytesMut;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Decoder, Encoder};

fn codec() -> HttpCodec {
    HttpCodec::new("127.0.0.1", 1024)
}

#[test]
fn test_decode_simple_get() {
    let mut codec = codec();
    let mut buf = BytesMut::from(
        "GET /test/any?status=404&reason=Gone HTTP/1.1\r\nHost: localhost\r\nx-wr-test: 1\r\n\r\n",
    );

    let request = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.path, "/test/any");
    assert_eq!(request.query, "status=404&reason=Gone");
    assert_eq!(request.version, 1);
    assert_eq!(request.peer_addr, "127.0.0.1");
    assert_eq!(request.headers.get("x-wr-test"), Some("1"));
    assert!(request.body.is_empty());
    assert!(buf.is_empty());
}

#[test]
fn test_decode_body_across_reads() {
    let mut codec = codec();
    let mut buf = BytesMut::from("POST /ping HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello");

    assert!(codec.decode(&mut buf).unwrap().is_none());
    buf.extend_from_slice(b" worldGET");

    let request = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(request.method, Method::Post);
    assert_eq!(&request.body[..], b"hello worl");
    // The rest belongs to the next request
    assert_eq!(&buf[..], b"dGET");
}

#[test]
fn test_decode_partial_head() {
    let mut codec = codec();
    let mut buf = BytesMut::from("GET / HTTP/1.1\r\nHost: loc");
    assert!(codec.decode(&mut buf).unwrap().is_none());

    buf.extend_from_slice(b"alhost\r\n\r\n");
    let request = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(request.headers.get("Host"), Some("localhost"));
}

#[test]
fn test_decode_pipelined_requests() {
    let mut codec = codec();
    let mut buf = BytesMut::from("GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.0\r\n\r\n");

    let first = codec.decode(&mut buf).unwrap().unwrap();
    let second = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(first.path, "/a");
    assert_eq!(second.path, "/b");
    assert_eq!(second.version, 0);
    assert!(codec.decode(&mut buf).unwrap().is_none());
}

#[test]
fn test_decode_errors() {
    let cases: [(&str, u16); 5] = [
        ("BREW /pot HTTP/1.1\r\n\r\n", 501),
        ("POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n", 501),
        ("POST / HTTP/1.1\r\nContent-Length: 2048\r\n\r\n", 413),
        ("POST / HTTP/1.1\r\nContent-Length: ten\r\n\r\n", 400),
        ("GET / HTTP/1.1\r\nBad Header\r\n\r\n", 400),
    ];

    for (raw, status) in cases {
        let mut buf = BytesMut::from(raw);
        let err = codec().decode(&mut buf).unwrap_err();
        assert_eq!(err.status(), Some(status), "{raw:?} gave {err}");
    }

    let io = HttpCodecError::Io(std::io::Error::other("reset"));
    assert_eq!(io.status(), None);
}

#[test]
fn test_encode_response() {
    let mut response = MockResponse::new(404);
    response.headers.set("Server", "test");
    response.body = "gone".into();

    let mut dst = BytesMut::new();
    codec().encode(response.commit(), &mut dst).unwrap();
    assert_eq!(
        &dst[..],
        b"HTTP/1.1 404 Not Found\r\nServer: test\r\nContent-Length: 4\r\n\r\ngone"
    );
}

#[test]
fn test_encode_head_response_keeps_length() {
    let mut response = MockResponse::new(200);
    response.body = "twelve bytes".into();

    let mut dst = BytesMut::new();
    codec().encode(response.commit().without_body(), &mut dst).unwrap();
    assert_eq!(&dst[..], b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\n");
}

#[test]
fn test_error_response() {
    let response = error_response("test", 501, true);
    assert_eq!(response.status(), 501);
    assert_eq!(response.body(), b"501: Not Implemented\n");
    assert_eq!(response.headers().get("Connection"), Some("close"));
    assert_eq!(response.headers().get("Content-Length"), Some("21"));
}

#[tokio::test]
async fn test_server_keep_alive() {
    let (_handle, addr) = spawn_test_server(HttpConfig::default()).await.unwrap();
    let mut client = OriginClient::connect(addr).await.unwrap();

    for _ in 0..3 {
        let response = client.get("/ping").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(&response.body[..], b"pong\n");
    }
}

#[tokio::test]
async fn test_server_closes_after_http10() {
    let (_handle, addr) = spawn_test_server(HttpConfig::default()).await.unwrap();
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET /ping HTTP/1.0\r\n\r\n").await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    let text = String::from_utf8_lossy(&response);
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.ends_with("\r\n\r\npong\n"));
}

#[tokio::test]
async fn test_server_rejects_chunked_request() {
    let (_handle, addr) = spawn_test_server(HttpConfig::default()).await.unwrap();
    let mut client = OriginClient::connect(addr).await.unwrap();

    client
        .send_raw(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n")
        .await
        .unwrap();
    let response = client.read_response(false).await.unwrap();
    assert_eq!(response.status, 501);
    assert_eq!(response.header("Connection"), Some("close"));
}

#[tokio::test]
async fn test_server_trace_method_not_implemented() {
    let (_handle, addr) = spawn_test_server(HttpConfig::default()).await.unwrap();
    let mut client = OriginClient::connect(addr).await.unwrap();

    let response = client.send(Method::Trace, "/", &[], &[]).await.unwrap();
    assert_eq!(response.status, 501);

    // Still usable afterwards
    let response = client.get("/ping").await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_server_clamps_delay() {
    let config = HttpConfig {
        max_delay: Duration::from_millis(50),
        ..HttpConfig::default()
    };
    let (_handle, addr) = spawn_test_server(config).await.unwrap();
    let mut client = OriginClient::connect(addr).await.unwrap();

    let started = Instant::now();
    let response = client.get("/any?delay=30").await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(response.header("X-Delay"), Some("30 set by query string"));
}

#[tokio::test]
async fn test_delay_does_not_block_other_requests() {
    let (_handle, addr) = spawn_test_server(HttpConfig::default()).await.unwrap();

    let slow = tokio::spawn(async move {
        let mut client = OriginClient::connect(addr).await.unwrap();
        client.get("/slow?delay=1").await.unwrap()
    });

    let started = Instant::now();
    let mut client = OriginClient::connect(addr).await.unwrap();
    let fast = client.get("/ping").await.unwrap();
    assert_eq!(fast.status, 200);
    assert!(started.elapsed() < Duration::from_millis(900));

    let slow = slow.await.unwrap();
    assert_eq!(slow.status, 200);
}

#[tokio::test]
async fn test_disconnect_during_delay_frees_connection() {
    let config = HttpConfig {
        max_connections: 1,
        ..HttpConfig::default()
    };
    let (_handle, addr) = spawn_test_server(config).await.unwrap();

    let mut stream = TcpStream::connect(addr).await.unwrap();
    // Zero linger turns the close into a reset
    #[allow(deprecated)]
    stream.set_linger(Some(Duration::ZERO)).unwrap();
    stream
        .write_all(b"GET /any?delay=30 HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(stream);

    // The abandoned connection gives its slot back well before the delay ends
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let attempt = async {
            let mut client = OriginClient::connect(addr).await.ok()?;
            client.get("/ping").await.ok()
        };
        if let Ok(Some(response)) =
            tokio::time::timeout(Duration::from_millis(500), attempt).await
        {
            assert_eq!(response.status, 200);
            break;
        }
        assert!(Instant::now() < deadline, "connection slot was never released");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_half_closed_client_still_gets_delayed_response() {
    let (_handle, addr) = spawn_test_server(HttpConfig::default()).await.unwrap();
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /x?delay=0.25&status=201 HTTP/1.0\r\n\r\n")
        .await
        .unwrap();
    stream.shutdown().await.unwrap();

    let started = Instant::now();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(200));
    let text = String::from_utf8_lossy(&response);
    assert!(text.starts_with("HTTP/1.1 201 Created\r\n"), "{text}");
    assert!(text.contains("X-Delay: 0.25 set by query string\r\n"));
}

#[tokio::test]
async fn test_server_shutdown_signal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server = std::sync::Arc::new(MockOriginServer::new(HttpConfig::default()));
    let shutdown = server.shutdown_signal();

    let running = std::sync::Arc::clone(&server);
    let handle = tokio::spawn(async move { running.serve(listener).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    shutdown.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap();
    assert!(result.unwrap().is_ok());
}
