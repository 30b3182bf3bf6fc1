//! Minimal HTTP/1.1 server with scripted redirect chains for resolver tests.
//!
//! Routes:
//! - `/hop/N`: 302 to `/hop/N-1` (relative Location); `/hop/0` answers 200.
//! - `/nohead/N`: HEAD answers 405; GET redirects to `/hop/N`.
//! - `/stall/N`: redirects down to `/stall/0`, which never answers in time.
//! - `/empty-location`: 302 with an empty Location header.
//! - `/slow-body/N`: HEAD answers 405; GET sends its headers at once (200 for
//!   N = 0, else 302 to `/hop/N-1`) and then trickles the body over [`TRICKLE`].

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

/// How long `/stall/0` sits on the request before answering.
pub const STALL: Duration = Duration::from_secs(3);

/// Time `/slow-body/N` takes to deliver its whole body.
pub const TRICKLE: Duration = Duration::from_secs(3);
const TRICKLE_BYTES: u32 = 30;

/// Starts the server in a background thread. Returns the base URL without a
/// trailing slash (e.g. "http://127.0.0.1:12345"). Runs until the process exits.
pub fn start() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || handle(stream));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

fn handle(mut stream: TcpStream) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let mut first = request.lines().next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("/");
    let is_head = method.eq_ignore_ascii_case("HEAD");

    if let Some(head) = slow_body_head(path, is_head) {
        if stream.write_all(head.as_bytes()).is_err() {
            return;
        }
        let _ = stream.flush();
        for _ in 0..TRICKLE_BYTES {
            thread::sleep(TRICKLE / TRICKLE_BYTES);
            // The client hangs up once it has the headers.
            if stream.write_all(b"x").is_err() || stream.flush().is_err() {
                return;
            }
        }
        return;
    }

    let response = route(path, is_head);
    let _ = stream.write_all(response.as_bytes());
}

/// Headers for a `/slow-body/N` GET; the body follows separately.
fn slow_body_head(path: &str, is_head: bool) -> Option<String> {
    let n: u32 = path.strip_prefix("/slow-body/")?.parse().ok()?;
    if is_head {
        return None;
    }
    let head = if n == 0 {
        "HTTP/1.1 200 OK\r\n".to_string()
    } else {
        format!("HTTP/1.1 302 Found\r\nLocation: /hop/{}\r\n", n - 1)
    };
    Some(format!(
        "{}Content-Length: {}\r\nConnection: close\r\n\r\n",
        head, TRICKLE_BYTES
    ))
}

fn route(path: &str, is_head: bool) -> String {
    let mut parts = path.trim_start_matches('/').splitn(2, '/');
    let kind = parts.next().unwrap_or("");
    let n: Option<u32> = parts.next().and_then(|s| s.parse().ok());

    match (kind, n) {
        ("hop", Some(0)) => ok(is_head),
        ("hop", Some(n)) => redirect(&format!("/hop/{}", n - 1)),
        ("nohead", Some(_)) if is_head => status_only("405 Method Not Allowed"),
        ("nohead", Some(n)) => redirect(&format!("/hop/{}", n)),
        ("stall", Some(0)) => {
            thread::sleep(STALL);
            ok(is_head)
        }
        ("stall", Some(n)) => redirect(&format!("/stall/{}", n - 1)),
        ("empty-location", _) => redirect(""),
        ("slow-body", Some(_)) => status_only("405 Method Not Allowed"),
        _ => status_only("404 Not Found"),
    }
}

fn redirect(location: &str) -> String {
    format!(
        "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        location
    )
}

fn ok(is_head: bool) -> String {
    let body = "done";
    format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        if is_head { "" } else { body }
    )
}

fn status_only(status: &str) -> String {
    format!("HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status)
}
