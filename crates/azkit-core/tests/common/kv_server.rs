//! Minimal HTTP/1.1 server returning canned JSON responses for client tests.
//!
//! Routes are keyed by "METHOD path" (path compared without the query
//! string). A key ending in `*` matches by prefix, which covers request
//! paths containing generated segments. `{base}` in a response body is
//! replaced with the server's own base URL so canned pagination links work.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

/// Starts a server in a background thread and returns its base URL
/// (e.g. "http://127.0.0.1:12345"). The server runs until the process exits.
pub fn start(routes: HashMap<String, (u16, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base = format!("http://127.0.0.1:{port}");

    let routes: HashMap<String, (u16, String)> = routes
        .into_iter()
        .map(|(key, (status, body))| (key, (status, body.replace("{base}", &base))))
        .collect();
    let routes = Arc::new(routes);

    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            thread::spawn(move || handle(stream, &routes));
        }
    });

    base
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, (u16, String)>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));

    let request = match read_request(&mut stream) {
        Some(request) => request,
        None => return,
    };
    let Some((method, path)) = parse_request_line(&request) else {
        return;
    };

    let key = format!("{method} {path}");
    let (status, body) = lookup(routes, &key).unwrap_or((
        404,
        r#"{"error":{"code":"NotFound","message":"no canned route"}}"#.to_string(),
    ));

    let reason = match status {
        200 => "OK",
        201 => "Created",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
}

fn lookup(routes: &HashMap<String, (u16, String)>, key: &str) -> Option<(u16, String)> {
    if let Some(found) = routes.get(key) {
        return Some(found.clone());
    }
    routes.iter().find_map(|(pattern, response)| {
        pattern
            .strip_suffix('*')
            .filter(|prefix| key.starts_with(prefix))
            .map(|_| response.clone())
    })
}

/// Read headers plus, when Content-Length says so, the full body, so the
/// client never sees the connection closed mid-upload.
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };
        data.extend_from_slice(&buf[..n]);
        if let Some(header_end) = find_blank_line(&data) {
            let headers = String::from_utf8_lossy(&data[..header_end]);
            let content_length = content_length(&headers);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
        if data.len() > (1 << 20) {
            break;
        }
    }
    if data.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&data).to_string())
    }
}

fn find_blank_line(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|window| window == b"\r\n\r\n")
}

fn content_length(headers: &str) -> usize {
    headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

/// Returns (method, path-without-query) from the request line.
fn parse_request_line(request: &str) -> Option<(String, String)> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    let path = target.split('?').next().unwrap_or(target).to_string();
    Some((method, path))
}
