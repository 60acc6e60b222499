// tests/http_invoker.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use migradag::config::RetryPolicy;
use migradag::errors::{MigradagError, ToolError};
use migradag::tool::{Credentials, HealthProbe, HttpToolInvoker, ToolCall, ToolInvoker, ToolName};
use migradag_test_utils::{init_tracing, with_timeout};

/// One canned HTTP answer. `None` holds the connection open without replying.
type Canned = Option<(u16, String)>;

/// Minimal collaborator stub: answers each connection with the next canned
/// reply (the last one repeats) and records request heads and bodies.
struct Stub {
    url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl Stub {
    async fn start(replies: Vec<Canned>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let counter = Arc::clone(&hits);
        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            let mut replies = replies.into_iter();
            let mut last: Canned = None;
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                if let Some(next) = replies.next() {
                    last = next;
                }
                let reply = last.clone();
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let request = read_request(&mut socket).await;
                    log.lock().unwrap().push(request);
                    match reply {
                        Some((status, body)) => {
                            let response = format!(
                                "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                                body.len()
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        }
                        None => tokio::time::sleep(Duration::from_secs(5)).await,
                    }
                });
            }
        });

        Self {
            url: format!("http://{addr}/tool"),
            hits,
            requests,
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn request(&self, index: usize) -> (String, String) {
        self.requests.lock().unwrap()[index].clone()
    }
}

async fn read_request(socket: &mut TcpStream) -> (String, String) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return (String::from_utf8_lossy(&buf).into_owned(), String::new()),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let body = String::from_utf8_lossy(&buf[head_end..]).into_owned();
    (head, body)
}

fn ok(body: Value) -> Canned {
    Some((200, body.to_string()))
}

fn fast_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(40),
    }
}

/// Address of a port that nothing listens on.
async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/tool")
}

fn size_call() -> ToolCall {
    ToolCall::new(ToolName::GetDbSize).arg("project_id", "demo")
}

#[tokio::test]
async fn success_envelope_yields_output_and_request_is_flat() {
    init_tracing();
    let stub = Stub::start(vec![ok(json!({"status": "success", "output": {"size_gb": 42}}))]).await;
    let invoker = HttpToolInvoker::new(&stub.url, fast_retries(0), Credentials::none());

    let out = with_timeout(invoker.invoke(size_call(), Duration::from_secs(2)))
        .await
        .unwrap();

    assert_eq!(out, json!({"size_gb": 42}));
    let (head, body) = stub.request(0);
    assert!(head.starts_with("POST /tool"));
    let sent: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(sent, json!({"tool": "get_db_size", "project_id": "demo"}));
}

#[tokio::test]
async fn tool_error_is_not_retried() {
    let stub = Stub::start(vec![ok(json!({"status": "error", "message": "quota exceeded"}))]).await;
    let invoker = HttpToolInvoker::new(&stub.url, fast_retries(3), Credentials::none());

    let err = with_timeout(invoker.invoke(size_call(), Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ToolError::ToolExecutionError {
            tool: "get_db_size".into(),
            message: "quota exceeded".into(),
        }
    );
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn unknown_tool_reply_maps_to_unknown_tool() {
    let stub = Stub::start(vec![ok(json!({"status": "error", "message": "Unknown tool: get_db_size"}))]).await;
    let invoker = HttpToolInvoker::new(&stub.url, fast_retries(3), Credentials::none());

    let err = with_timeout(invoker.invoke(size_call(), Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert_eq!(err, ToolError::UnknownTool("get_db_size".into()));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let stub = Stub::start(vec![
        Some((503, "busy".to_string())),
        Some((502, "bad gateway".to_string())),
        ok(json!({"status": "success", "output": {"size_gb": 7}})),
    ])
    .await;
    let invoker = HttpToolInvoker::new(&stub.url, fast_retries(3), Credentials::none());

    let out = with_timeout(invoker.invoke(size_call(), Duration::from_secs(2)))
        .await
        .unwrap();

    assert_eq!(out["size_gb"], json!(7));
    assert_eq!(stub.hits(), 3);
}

#[tokio::test]
async fn retries_are_bounded() {
    let stub = Stub::start(vec![Some((500, "down".to_string()))]).await;
    let invoker = HttpToolInvoker::new(&stub.url, fast_retries(2), Credentials::none());

    let err = with_timeout(invoker.invoke(size_call(), Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::ToolUnreachable { .. }), "{err}");
    assert_eq!(stub.hits(), 3);
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let url = closed_port_url().await;
    let invoker = HttpToolInvoker::new(url, fast_retries(1), Credentials::none());

    let err = with_timeout(invoker.invoke(size_call(), Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::ToolUnreachable { .. }), "{err}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn deadline_turns_a_hung_call_into_unreachable() {
    let stub = Stub::start(vec![None]).await;
    let invoker = HttpToolInvoker::new(&stub.url, fast_retries(0), Credentials::none());

    let err = with_timeout(invoker.invoke(size_call(), Duration::from_millis(100)))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::ToolUnreachable { .. }), "{err}");
}

#[tokio::test]
async fn bad_envelope_is_malformed_output() {
    let stub = Stub::start(vec![ok(json!({"size_gb": 42}))]).await;
    let invoker = HttpToolInvoker::new(&stub.url, fast_retries(3), Credentials::none());

    let err = with_timeout(invoker.invoke(size_call(), Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::MalformedOutput { .. }), "{err}");
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn unauthorized_refreshes_the_token_and_retries() {
    let stub = Stub::start(vec![
        Some((401, "expired".to_string())),
        ok(json!({"status": "success", "output": {}})),
    ])
    .await;
    let reads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reads);
    let credentials = Credentials::from_source(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Some(format!("token-{n}"))
    });
    let invoker = HttpToolInvoker::new(&stub.url, fast_retries(2), credentials);

    with_timeout(invoker.invoke(size_call(), Duration::from_secs(2)))
        .await
        .unwrap();

    assert_eq!(reads.load(Ordering::SeqCst), 2);
    assert!(stub.request(0).0.contains("token-0"));
    assert!(stub.request(1).0.contains("token-1"));
}

#[tokio::test]
async fn health_probe_accepts_only_status_ok() {
    let healthy = Stub::start(vec![ok(json!({"status": "ok"}))]).await;
    HealthProbe::new(&healthy.url, Duration::from_secs(2))
        .check()
        .await
        .unwrap();

    let degraded = Stub::start(vec![ok(json!({"status": "degraded"}))]).await;
    let err = HealthProbe::new(&degraded.url, Duration::from_secs(2))
        .check()
        .await
        .unwrap_err();
    assert!(matches!(err, MigradagError::HealthCheckFailed(_)), "{err}");

    let failing = Stub::start(vec![Some((500, "oops".to_string()))]).await;
    assert!(
        HealthProbe::new(&failing.url, Duration::from_secs(2))
            .check()
            .await
            .is_err()
    );

    let url = closed_port_url().await;
    assert!(HealthProbe::new(url, Duration::from_secs(2)).check().await.is_err());
}
