//! One-shot HTTP stub for client tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request captured by the stub.
pub(crate) struct CapturedRequest {
    /// Request line, e.g. `POST /execute HTTP/1.1`.
    pub request_line: String,
    pub body: String,
}

/// Serves a single request with `status` and a JSON `body`, then exits.
///
/// Returns the base URL to point a client at and a handle resolving to the
/// captured request.
pub(crate) async fn serve_once(
    status: u16,
    body: &str,
) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let address = listener.local_addr().expect("stub address");
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut raw = Vec::new();
        let mut buffer = [0u8; 4096];
        let (head_len, content_length) = loop {
            let read = socket.read(&mut buffer).await.expect("read request");
            assert!(read > 0, "connection closed before headers");
            raw.extend_from_slice(&buffer[..read]);
            if let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&raw[..end]).to_string();
                let length = head
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                break (end + 4, length);
            }
        };
        while raw.len() < head_len + content_length {
            let read = socket.read(&mut buffer).await.expect("read body");
            assert!(read > 0, "connection closed before body");
            raw.extend_from_slice(&buffer[..read]);
        }

        let response = format!(
            "HTTP/1.1 {status} Stub\r\n\
             content-type: application/json\r\n\
             content-length: {}\r\n\
             connection: close\r\n\r\n{body}",
            body.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.ok();

        let text = String::from_utf8_lossy(&raw).to_string();
        CapturedRequest {
            request_line: text.lines().next().unwrap_or_default().to_string(),
            body: text[head_len..].to_string(),
        }
    });

    (format!("http://{address}"), handle)
}
