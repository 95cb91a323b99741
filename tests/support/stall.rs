//! Raw HTTP server that sends the start of a body and then stops writing.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::socket_guard::should_skip_socket_bound_test;

/// Running stalling server; aborted on drop.
pub struct StallingServer {
    pub uri: String,
    handle: JoinHandle<()>,
}

impl Drop for StallingServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Answers one GET with a `total`-byte 200 response but only sends `head`.
pub async fn start_stalling_server_or_skip(
    head: &'static [u8],
    total: usize,
) -> Option<StallingServer> {
    if should_skip_socket_bound_test() {
        return None;
    }
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        let headers = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {total}\r\nContent-Type: application/zip\r\n\r\n"
        );
        if socket.write_all(headers.as_bytes()).await.is_err() {
            return;
        }
        let _ = socket.write_all(head).await;
        let _ = socket.flush().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
    });
    Some(StallingServer {
        uri: format!("http://{addr}"),
        handle,
    })
}
