//! End-to-end tests for the request chain runner
//!
//! Each test starts a small HTTP responder on a loopback port, writes a
//! suite file pointing at it, and runs the chain through the same entry
//! point the CLI uses.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use reqchain::common::config::{Config, RevisitPolicy};
use reqchain::testing::{Outcome, Summary};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as seen by the test server
#[derive(Debug, Clone)]
struct Recorded {
    request_line: String,
    body: String,
}

type Route = Arc<dyn Fn(&str) -> (u16, String) + Send + Sync>;

/// Loopback HTTP/1.1 responder answering one request per connection
struct TestServer {
    base: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    async fn start(route: impl Fn(&str) -> (u16, String) + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let route: Route = Arc::new(route);

        let log = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let log = log.clone();
                let route = route.clone();
                tokio::spawn(async move {
                    serve(stream, route, log).await;
                });
            }
        });

        Self { base, requests }
    }

    /// Accepts connections but never answers
    async fn silent() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve(mut stream: TcpStream, route: Route, log: Arc<Mutex<Vec<Recorded>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let request_line = head.lines().next().unwrap_or_default().to_string();
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    let (status, reply) = route(&request_line);
    log.lock().unwrap().push(Recorded { request_line, body });

    let response = format!(
        "HTTP/1.1 {} X\r\nContent-Length: {}\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n{}",
        status,
        reply.len(),
        reply
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn write_suite(dir: &Path, suite: &Value) -> PathBuf {
    let path = dir.join("suite.json");
    std::fs::write(&path, serde_json::to_string_pretty(suite).unwrap()).unwrap();
    path
}

fn status_is(code: &str) -> Value {
    json!([{"type": "status_code", "pass_if": "eq", "expected": code}])
}

async fn run_suite(suite: &Value, config: &Config) -> Summary {
    let dir = tempfile::tempdir().unwrap();
    let path = write_suite(dir.path(), suite);
    reqchain::cli::run(&path, config, RevisitPolicy::Stop, "Integration")
        .await
        .unwrap()
}

#[tokio::test]
async fn test_single_passing_step() {
    let server = TestServer::start(|_| (200, "pong".to_string())).await;
    let suite = json!({
        "1": {
            "method": "get",
            "url": server.url("/ping"),
            "assume": [
                {"type": "status_code", "pass_if": "eq", "expected": "200"},
                {"type": "text", "pass_if": "eq", "expected": "pong"}
            ]
        }
    });

    let summary = run_suite(&suite, &Config::default()).await;

    assert_eq!(summary.total, 1);
    assert_eq!(summary.pass, 1);
    assert_eq!(summary.pass_pct, 100.0);
    assert_eq!(summary.tests[0].outcome, Outcome::Ok);
    assert_eq!(server.requests()[0].request_line, "GET /ping HTTP/1.1");
}

#[tokio::test]
async fn test_error_status_fails_step() {
    let server = TestServer::start(|_| (404, "nope".to_string())).await;
    let suite = json!({
        "1": {"method": "get", "url": server.url("/missing"), "assume": status_is("200")}
    });

    let summary = run_suite(&suite, &Config::default()).await;

    assert_eq!(summary.fail, 1);
    let result = &summary.tests[0];
    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result.cause.contains("404"), "cause was {}", result.cause);
}

#[tokio::test]
async fn test_json_reply_feeds_next_query() {
    let server = TestServer::start(|line| {
        if line.starts_with("POST /login") {
            (200, r#"{"session": {"token": "abc"}}"#.to_string())
        } else {
            (200, r#"{"name": "ada"}"#.to_string())
        }
    })
    .await;
    let suite = json!({
        "1": {
            "method": "post",
            "url": server.url("/login"),
            "next": "2",
            "assume": status_is("200")
        },
        "2": {
            "method": "get",
            "url": server.url("/profile"),
            "send_data": [{
                "param_name": {"value": "token"},
                "param_value": {"type": "json", "value": ["session", "token"]}
            }],
            "assume": [{"type": "json", "pass_if": "eq", "expected": "ada", "got": ["name"]}]
        }
    });

    let summary = run_suite(&suite, &Config::default()).await;

    assert_eq!(summary.pass, 2, "{:?}", summary.tests);
    let requests = server.requests();
    assert_eq!(requests[1].request_line, "GET /profile?token=abc HTTP/1.1");
}

#[tokio::test]
async fn test_file_param_sent_as_body() {
    let dir = tempfile::tempdir().unwrap();
    let upload = dir.path().join("upload.txt");
    std::fs::write(&upload, "line one\nline two").unwrap();

    let server = TestServer::start(|_| (201, String::new())).await;
    let suite = json!({
        "1": {
            "method": "put",
            "url": server.url("/upload"),
            "send_data": [{"param_value": {"type": "file", "value": upload.to_str().unwrap()}}],
            "assume": status_is("201")
        }
    });

    let summary = run_suite(&suite, &Config::default()).await;

    assert_eq!(summary.pass, 1, "{:?}", summary.tests);
    let requests = server.requests();
    assert!(requests[0].request_line.starts_with("PUT /upload"));
    assert_eq!(requests[0].body, "line one\nline two");
}

#[tokio::test]
async fn test_connection_refused_is_recorded() {
    // Bind then drop to get a port with nothing listening
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let suite = json!({
        "1": {
            "method": "get",
            "url": format!("http://127.0.0.1:{port}/"),
            "next": "2",
            "assume": status_is("200")
        },
        "2": {
            "method": "get",
            "url": format!("http://127.0.0.1:{port}/again"),
            "assume": status_is("200")
        }
    });

    let summary = run_suite(&suite, &Config::default()).await;

    assert_eq!(summary.total, 2);
    assert_eq!(summary.fail, 2);
    assert!(summary.tests[0].cause.starts_with("Request failed:"));
}

#[tokio::test]
async fn test_timeout_fails_step() {
    let base = TestServer::silent().await;
    let mut config = Config::default();
    config.http.timeout_secs = 1;
    let suite = json!({
        "1": {"method": "get", "url": format!("{base}/slow"), "assume": status_is("200")}
    });

    let summary = run_suite(&suite, &config).await;

    assert_eq!(summary.tests[0].outcome, Outcome::Failed);
    assert!(summary.tests[0].cause.starts_with("Request failed:"));
}

#[tokio::test]
async fn test_invalid_suite_sends_nothing() {
    let server = TestServer::start(|_| (200, String::new())).await;
    let suite = json!({
        "1": {"method": "get", "url": server.url("/a"), "next": "2", "assume": status_is("200")},
        "2": {"method": "fetch", "url": server.url("/b"), "assume": status_is("200")}
    });

    let dir = tempfile::tempdir().unwrap();
    let path = write_suite(dir.path(), &suite);
    let err = reqchain::cli::run(&path, &Config::default(), RevisitPolicy::Warn, "t")
        .await
        .unwrap_err();

    assert!(err.is_invalid_step());
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_report_written_to_result_dir() {
    let server = TestServer::start(|_| (200, "ok".to_string())).await;
    let suite = json!({
        "1": {"method": "head", "url": server.url("/"), "assume": status_is("200")}
    });

    let summary = run_suite(&suite, &Config::default()).await;
    let out = tempfile::tempdir().unwrap();
    let path = reqchain::testing::write_report(&summary, &out.path().join("results")).unwrap();

    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("result-") && name.ends_with(".json"));

    let report: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(report["title"], "Integration");
    assert_eq!(report["total"], 1);
    assert_eq!(report["tests"][0]["result"], "OK");
    assert_eq!(report["tests"][0]["method"], "HEAD");
}
