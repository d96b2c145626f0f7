//! Helpers for tests that talk to a canned HTTP endpoint.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve exactly one request with `response`. The handle yields the raw request text.
pub(crate) async fn serve_once(response: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.expect("read request");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if request_complete(&request) {
                break;
            }
        }

        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{}", addr), handle)
}

fn request_complete(buf: &[u8]) -> bool {
    let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
    let body_len = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    buf.len() >= end + 4 + body_len
}

/// Build a raw HTTP/1.1 response.
pub(crate) fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!(
        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n",
        status,
        body.len()
    );
    for (name, value) in headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str("\r\n");
    response.push_str(body);
    response
}

/// Body of a captured request.
pub(crate) fn request_body(raw: &str) -> serde_json::Value {
    let body = raw.split("\r\n\r\n").nth(1).unwrap_or_default();
    serde_json::from_str(body).unwrap_or(serde_json::Value::Null)
}

/// One captured send.
#[derive(Debug, Clone)]
pub(crate) struct SentEmail {
    pub template_id: String,
    pub recipient: String,
    pub payload: serde_json::Value,
    pub at: tokio::time::Instant,
}

/// Mail sender that records every call and fails for chosen templates.
#[derive(Default)]
pub(crate) struct RecordingMailer {
    sent: parking_lot::Mutex<Vec<SentEmail>>,
    failing: Vec<&'static str>,
}

impl RecordingMailer {
    pub fn failing_on(templates: &[&'static str]) -> Self {
        Self {
            sent: parking_lot::Mutex::new(Vec::new()),
            failing: templates.to_vec(),
        }
    }

    /// Every attempted send, including the failed ones.
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait::async_trait]
impl sambal_core::ports::EmailSender for RecordingMailer {
    async fn send_templated(
        &self,
        template_id: &str,
        recipient: &str,
        payload: &serde_json::Value,
    ) -> Result<sambal_core::ports::SendReceipt, sambal_core::ports::MailError> {
        self.sent.lock().push(SentEmail {
            template_id: template_id.to_string(),
            recipient: recipient.to_string(),
            payload: payload.clone(),
            at: tokio::time::Instant::now(),
        });

        if self.failing.contains(&template_id) {
            return Err(sambal_core::ports::MailError::Rejected {
                status: 500,
                body: "provider unavailable".to_string(),
            });
        }

        Ok(sambal_core::ports::SendReceipt {
            message_id: Some(format!("test-{}", template_id)),
        })
    }
}
