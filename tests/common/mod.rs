#![allow(dead_code)]

use querybind::hello;
use querybind::server::{AppService, HttpServer, ServerHandle};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Once;
use std::time::Duration;

static STACK: Once = Once::new();

/// Running hello server, stopped on drop.
pub struct TestServer {
    handle: Option<ServerHandle>,
}

impl TestServer {
    pub fn start() -> Self {
        // ensure coroutines have enough stack for tests
        STACK.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
        let router = hello::router().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let handle = HttpServer(AppService::new(router)).start(addr).unwrap();
        handle.wait_ready().unwrap();
        assert_eq!(handle.addr(), addr);
        Self {
            handle: Some(handle),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.handle
            .as_ref()
            .map(ServerHandle::addr)
            .expect("server is running")
    }

    /// `GET path?param=<encoded value>`, or without a query when `param` is `None`.
    pub fn get_param(&self, path: &str, param: Option<&str>) -> Response {
        let target = match param {
            Some(value) => format!("{path}?param={}", encode(value)),
            None => path.to_string(),
        };
        self.request("GET", &target)
    }

    pub fn request(&self, method: &str, target: &str) -> Response {
        let raw = send_request(
            &self.addr(),
            &format!("{method} {target} HTTP/1.1\r\nHost: localhost\r\n\r\n"),
        );
        parse_response(&raw)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl Response {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or_default()
    }
}

/// Percent-encode a query value.
pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn content_length(head: &str) -> Option<usize> {
    head.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// Write a raw request and read one response, stopping once the declared body arrived.
pub fn send_request(addr: &SocketAddr, req: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(req.as_bytes()).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(1000)))
        .unwrap();
    let mut buf = Vec::new();
    loop {
        let mut tmp = [0u8; 1024];
        match stream.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                break
            }
            Err(e) => panic!("read error: {:?}", e),
        }
        let text = String::from_utf8_lossy(&buf);
        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            if content_length(head).is_some_and(|len| body.len() >= len) {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

pub fn parse_response(resp: &str) -> Response {
    let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
    let mut status = 0;
    let mut content_type = String::new();
    for line in head.lines() {
        if line.starts_with("HTTP/1.1") {
            status = line
                .split_whitespace()
                .nth(1)
                .unwrap_or("0")
                .parse()
                .unwrap();
        } else if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-type") {
                content_type = value.trim().to_string();
            }
        }
    }
    Response {
        status,
        content_type,
        body: body.to_string(),
    }
}
