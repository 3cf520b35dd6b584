//! Minimal static file server for local development.
//!
//! Just enough HTTP/1.1 to preview a rendered library in a browser: `GET`
//! and `HEAD`, one request per connection, one short-lived thread per
//! connection. Files are read from disk on every request, so a rebuild is
//! visible on the next reload. There is no locking against a running
//! rebuild; the staged swap in [`crate::publish`] keeps pages whole, but a
//! request that lands exactly during the swap can get a 404.
//!
//! Request paths are percent-decoded (page links to `sub%20dir/My%20Book.pdf`
//! must find `sub dir/My Book.pdf`) and any `..` segment is refused.

use log::{debug, warn};
use percent_encoding::percent_decode_str;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// A response ready to be written.
#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    pub status: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    fn not_found() -> Self {
        Self {
            status: "404 Not Found",
            content_type: "text/plain; charset=utf-8",
            body: b"Not Found".to_vec(),
        }
    }

    fn method_not_allowed() -> Self {
        Self {
            status: "405 Method Not Allowed",
            content_type: "text/plain; charset=utf-8",
            body: b"Method Not Allowed".to_vec(),
        }
    }

    fn bad_request() -> Self {
        Self {
            status: "400 Bad Request",
            content_type: "text/plain; charset=utf-8",
            body: b"Bad Request".to_vec(),
        }
    }
}

/// Content type from the file extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "epub" => "application/epub+zip",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Map a request target to a file under `root`.
///
/// Returns `None` for targets that try to leave `root`.
pub fn resolve_request_path(root: &Path, target: &str) -> Option<PathBuf> {
    let path = target.split(['?', '#']).next().unwrap_or("/");
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let mut resolved = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains('\\') => return None,
            s => resolved.push(s),
        }
    }
    if resolved.is_dir() {
        resolved.push("index.html");
    }
    Some(resolved)
}

/// Build the response for one request line.
pub fn respond(root: &Path, method: &str, target: &str) -> Response {
    if method != "GET" && method != "HEAD" {
        return Response::method_not_allowed();
    }
    let Some(path) = resolve_request_path(root, target) else {
        return Response::bad_request();
    };
    match fs::read(&path) {
        Ok(body) if path.is_file() => Response {
            status: "200 OK",
            content_type: content_type(&path),
            body,
        },
        _ => Response::not_found(),
    }
}

fn handle_connection(stream: TcpStream, root: &Path) -> io::Result<()> {
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next()) {
        (Some(method), Some(target)) => (method.to_string(), target.to_string()),
        _ => return Ok(()),
    };
    // Drain headers; nothing in them changes the response.
    let mut line = String::new();
    while reader.read_line(&mut line)? > 2 {
        line.clear();
    }

    let response = respond(root, &method, &target);
    debug!("{method} {target} → {}", response.status);

    let mut stream = reader.into_inner();
    let header = format!(
        "HTTP/1.1 {}\r\n\
         Content-Type: {}\r\n\
         Content-Length: {}\r\n\
         Cache-Control: no-store\r\n\
         Connection: close\r\n\
         \r\n",
        response.status,
        response.content_type,
        response.body.len()
    );
    stream.write_all(header.as_bytes())?;
    if method != "HEAD" {
        stream.write_all(&response.body)?;
    }
    stream.flush()
}

/// Accept connections forever, serving files under `root`.
pub fn serve(listener: TcpListener, root: PathBuf) {
    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => {
                let root = root.clone();
                thread::spawn(move || {
                    if let Err(err) = handle_connection(stream, &root) {
                        debug!("connection error: {err}");
                    }
                });
            }
            Err(err) => warn!("accept error: {err}"),
        }
    }
}

/// Bind `127.0.0.1:port` and serve `root` on a background thread.
pub fn spawn(port: u16, root: PathBuf) -> io::Result<(std::net::SocketAddr, thread::JoinHandle<()>)> {
    let listener = TcpListener::bind(("127.0.0.1", port))?;
    let addr = listener.local_addr()?;
    let handle = thread::spawn(move || serve(listener, root));
    Ok((addr, handle))
}
