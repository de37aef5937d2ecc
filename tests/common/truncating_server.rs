//! Minimal HTTP/1.1 server that promises a body it never finishes sending.
//!
//! Responds to every request with `Content-Length: {promised}` and then writes
//! only `sent` bytes before closing the connection.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

/// Starts the server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345"). The server runs until the process exits.
pub fn start(promised: usize, sent: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
            let mut buf = [0u8; 8192];
            if !matches!(stream.read(&mut buf), Ok(n) if n > 0) {
                continue;
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {promised}\r\nConnection: close\r\n\r\n"
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&vec![b'x'; sent]);
            let _ = stream.flush();
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    });
    format!("http://127.0.0.1:{port}")
}
