//! `reqwest`-backed HTTP transport.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::trace;
use url::Url;

use crate::error::Result;
use crate::protocol::{Envelope, Method, RawResponse};

use super::{Transport, join_url};

// ============================================================================
// Constants
// ============================================================================

/// User agent sent with every request.
const USER_AGENT: &str = concat!("remote-webdriver/", env!("CARGO_PKG_VERSION"), " (rust)");

/// Content type of JSON request bodies.
const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

// ============================================================================
// HttpTransport
// ============================================================================

/// HTTP transport over a shared `reqwest` client.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with no client-level timeout.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Http`] if the client cannot be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Creates a transport whose requests fail after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Http`] if the client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Wraps a preconfigured client.
    #[inline]
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: &Url, envelope: &Envelope) -> Result<RawResponse> {
        let url = join_url(endpoint, &envelope.path)?;
        let method = match envelope.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut request = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(body) = envelope.body_json()? {
            request = request.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        trace!(command = %envelope.command, status, bytes = body.len(), "HTTP response");
        Ok(RawResponse::new(status, body))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    use crate::error::Error;
    use crate::protocol::CommandRegistry;

    /// Reads one HTTP request (headers plus `Content-Length` body).
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8(buf).unwrap()
    }

    /// Serves one request with `status`/`body`, reporting what it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (Url, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(request);
        });

        (Url::parse(&format!("http://127.0.0.1:{port}/wd/hub")).unwrap(), rx)
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let (endpoint, received) = serve_once("200 OK", r#"{"value":null}"#).await;
        let envelope = CommandRegistry::standard()
            .encode("get", json!({"sessionId": "s1", "url": "https://example.com"}))
            .unwrap();

        let response = HttpTransport::new().unwrap().send(&endpoint, &envelope).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.decode().unwrap(), json!(null));

        let request = received.await.unwrap();
        assert!(request.starts_with("POST /wd/hub/session/s1/url HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"url":"https://example.com"}"#));
    }

    #[tokio::test]
    async fn test_get_has_no_body_and_error_status_is_returned() {
        let (endpoint, received) = serve_once(
            "404 Not Found",
            r#"{"value":{"error":"no such window","message":"gone"}}"#,
        )
        .await;
        let envelope = CommandRegistry::standard()
            .encode("getTitle", json!({"sessionId": "s1"}))
            .unwrap();

        let response = HttpTransport::new().unwrap().send(&endpoint, &envelope).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(response.decode().is_err());

        let request = received.await.unwrap();
        assert!(request.starts_with("GET /wd/hub/session/s1/title HTTP/1.1"));
        assert!(!request.to_ascii_lowercase().contains("content-type"));
    }

    #[tokio::test]
    async fn test_client_timeout_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let endpoint = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
        let envelope = CommandRegistry::standard().encode("status", json!({})).unwrap();
        let transport = HttpTransport::with_timeout(Duration::from_millis(200)).unwrap();

        let err = transport.send(&endpoint, &envelope).await.unwrap_err();
        assert!(matches!(err, Error::Http(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
        let envelope = CommandRegistry::standard().encode("status", json!({})).unwrap();

        let err = HttpTransport::new()
            .unwrap()
            .send(&endpoint, &envelope)
            .await
            .unwrap_err();
        assert!(err.is_connection_error());
    }
}
