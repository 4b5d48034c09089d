// Outbound notification transport

use crate::models::notification::{DispatchError, DispatchResult, NotificationPayload};
use async_trait::async_trait;
use std::time::Duration;

/// What the endpoint answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Delivers one notification to an endpoint
///
/// Non-success responses are reported as [`DispatchError::Status`].
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(
        &self,
        endpoint: &str,
        payload: &NotificationPayload,
    ) -> DispatchResult<TransportResponse>;
}

/// JSON-over-HTTP transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> DispatchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl NotificationTransport for HttpTransport {
    async fn send(
        &self,
        endpoint: &str,
        payload: &NotificationPayload,
    ) -> DispatchResult<TransportResponse> {
        let response = self.client.post(endpoint).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            // The status is the error; an unreadable body does not replace it
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::notification::PayloadTemplate;
    use chrono::{TimeZone, Utc};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve a single HTTP exchange and hand back the raw request
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let response = format!(
            "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        serve_raw_once(response).await
    }

    /// Like [`serve_once`], but writes `response` verbatim
    async fn serve_raw_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/notify", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    /// An endpoint that accepts connections and never answers
    pub(crate) async fn silent_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/notify", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        url
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    fn payload() -> NotificationPayload {
        PayloadTemplate::default().stamp(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[tokio::test]
    async fn test_posts_json_payload() {
        let (url, server) = serve_once("HTTP/1.1 200 OK", r#"{"ok":true}"#).await;
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

        let response = transport.send(&url, &payload()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"ok":true}"#);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /notify HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.contains(r#""machine_code":"MCL001_MC001""#));
        assert!(request.contains(r#""operator_id":12"#));
        assert!(request.contains(r#""working_time":1700000000"#));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (url, server) = serve_once("HTTP/1.1 500 Internal Server Error", "boom").await;
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

        let result = transport.send(&url, &payload()).await;
        match result {
            Err(DispatchError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_failure_is_reported() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();

        let result = transport
            .send(&format!("http://127.0.0.1:{}/notify", port), &payload())
            .await;
        assert!(matches!(
            result,
            Err(DispatchError::Transport(_)) | Err(DispatchError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let url = silent_endpoint().await;
        let transport = HttpTransport::new(Duration::from_millis(300)).unwrap();

        let started = std::time::Instant::now();
        let result = transport.send(&url, &payload()).await;
        assert!(matches!(result, Err(DispatchError::Timeout(_))), "got {:?}", result);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_error_status_survives_truncated_body() {
        let response =
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort"
                .to_string();
        let (url, server) = serve_raw_once(response).await;
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

        let result = transport.send(&url, &payload()).await;
        assert!(
            matches!(result, Err(DispatchError::Status { status: 503, .. })),
            "got {:?}",
            result
        );
        server.await.unwrap();
    }
}
