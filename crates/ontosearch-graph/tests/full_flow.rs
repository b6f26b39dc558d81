use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use ontosearch_core::config::GraphSettings;
use ontosearch_core::error::SourceFailure;
use ontosearch_core::traits::GraphIndexer;
use ontosearch_core::types::ManualRecord;
use ontosearch_graph::SparqlIndexer;

// Port 9 (discard) on loopback is closed on test hosts, so connects are refused fast.
fn unreachable_settings() -> GraphSettings {
    GraphSettings {
        query_endpoint: "http://127.0.0.1:9/ds/query".to_string(),
        update_endpoint: "http://127.0.0.1:9/ds/update".to_string(),
        candidate_limit: 50,
        timeout_ms: 500,
    }
}

#[tokio::test]
async fn zero_tokens_short_circuit_without_network() {
    let graph = SparqlIndexer::new(&unreachable_settings()).expect("graph");
    let candidates = graph.candidates(&[]).await.expect("no tokens is not a failure");
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn unreachable_endpoint_is_a_source_failure() {
    let graph = SparqlIndexer::new(&unreachable_settings()).expect("graph");
    let started = std::time::Instant::now();
    let result = graph.candidates(&["bearing_fault".to_string()]).await;
    assert!(matches!(result, Err(SourceFailure::Unreachable(_) | SourceFailure::Timeout(_))), "got {result:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn failed_update_surfaces_as_error() {
    let graph = SparqlIndexer::new(&unreachable_settings()).expect("graph");
    let records = vec![ManualRecord { id: "1".into(), title: "t".into(), text: "seal_wear".into() }];
    let err = graph.index(&records).await.expect_err("nothing is listening");
    assert!(err.to_string().contains("SPARQL update"));
}

#[test]
fn bad_endpoint_is_rejected_at_construction() {
    let mut settings = unreachable_settings();
    settings.query_endpoint = "::not a url::".to_string();
    assert!(SparqlIndexer::new(&settings).is_err());
}

/// One captured HTTP request: request line plus decoded form body.
struct Captured {
    request_line: String,
    form: Vec<(String, String)>,
}

async fn read_request(socket: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let (head_end, body_len) = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending a full request");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                break (end, len);
            }
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let body = &buf[head_end + 4..head_end + 4 + body_len];
    Captured {
        request_line: head.lines().next().unwrap_or_default().to_string(),
        form: url::form_urlencoded::parse(body).into_owned().collect(),
    }
}

/// Serve `status`/`body` to every connection and forward each request.
async fn serve(status: u16, body: &'static str) -> (String, mpsc::UnboundedReceiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let captured = read_request(&mut socket).await;
                let _ = tx.send(captured);
                let response = format!(
                    "HTTP/1.1 {status} Stub\r\ncontent-type: application/sparql-results+json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            });
        }
    });
    (format!("http://{addr}"), rx)
}

fn settings_for(base: &str, candidate_limit: usize) -> GraphSettings {
    GraphSettings {
        query_endpoint: format!("{base}/ds/query"),
        update_endpoint: format!("{base}/ds/update"),
        candidate_limit,
        timeout_ms: 2_000,
    }
}

const THREE_ROWS: &str = r#"{
  "head": {"vars": ["doc", "title", "text"]},
  "results": {"bindings": [
    {"doc": {"type": "uri", "value": "http://example.org/resource/doc/1"},
     "title": {"type": "literal", "value": "Pump P-100"},
     "text": {"type": "literal", "value": "Noise from bearing_fault and leaks from SEAL_WEAR"}},
    {"doc": {"type": "uri", "value": "http://example.org/resource/doc/2"},
     "title": {"type": "literal", "value": "Fan F-3"},
     "text": {"type": "literal", "value": "Rattle from bearing_fault only"}},
    {"doc": {"type": "uri", "value": "http://example.org/resource/doc/6"},
     "title": {"type": "literal", "value": "Press H-1"},
     "text": {"type": "literal", "value": "seal_wear then bearing_fault"}}
  ]}
}"#;

fn tokens(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|t| (*t).to_string()).collect()
}

#[tokio::test]
async fn documents_missing_a_token_are_not_candidates() {
    let (base, mut requests) = serve(200, THREE_ROWS).await;
    let graph = SparqlIndexer::new(&settings_for(&base, 50)).expect("graph");

    let candidates = graph.candidates(&tokens(&["bearing_fault", "seal_wear"])).await.expect("candidates");
    let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["1", "6"]);
    assert_eq!(candidates[0].title, "Pump P-100");

    let request = requests.recv().await.expect("request");
    assert!(request.request_line.starts_with("POST /ds/query"), "{}", request.request_line);
    let query = request.form.iter().find(|(k, _)| k == "query").map(|(_, v)| v.clone()).expect("query field");
    assert!(query.contains(r#"FILTER(CONTAINS(LCASE(?text), "bearing_fault"))"#), "{query}");
    assert!(query.contains(r#"FILTER(CONTAINS(LCASE(?text), "seal_wear"))"#), "{query}");
    assert!(query.trim_end().ends_with("LIMIT 50"), "{query}");
}

#[tokio::test]
async fn candidates_are_capped_at_the_configured_limit() {
    let (base, mut requests) = serve(200, THREE_ROWS).await;
    let graph = SparqlIndexer::new(&settings_for(&base, 2)).expect("graph");

    let candidates = graph.candidates(&tokens(&["bearing_fault"])).await.expect("candidates");
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].id, "1");
    assert_eq!(candidates[1].id, "2");

    let request = requests.recv().await.expect("request");
    let query = request.form.iter().find(|(k, _)| k == "query").map(|(_, v)| v.clone()).expect("query field");
    assert!(query.trim_end().ends_with("LIMIT 2"), "{query}");
}

#[tokio::test]
async fn error_status_becomes_a_status_failure() {
    let (base, _requests) = serve(500, "dataset unavailable").await;
    let graph = SparqlIndexer::new(&settings_for(&base, 50)).expect("graph");
    let err = graph.candidates(&tokens(&["pump"])).await.unwrap_err();
    assert_eq!(err, SourceFailure::Status { status: 500, body: "dataset unavailable".to_string() });
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let (base, _requests) = serve(200, "<html>maintenance</html>").await;
    let graph = SparqlIndexer::new(&settings_for(&base, 50)).expect("graph");
    let err = graph.candidates(&tokens(&["pump"])).await.unwrap_err();
    assert!(matches!(err, SourceFailure::Malformed(_)), "{err:?}");
}

#[tokio::test]
async fn update_posts_delete_then_insert_to_the_update_endpoint() {
    let (base, mut requests) = serve(204, "").await;
    let graph = SparqlIndexer::new(&settings_for(&base, 50)).expect("graph");
    let records = vec![ManualRecord { id: "3".into(), title: "Gearbox".into(), text: "oil_leak. Procedure: drain oil".into() }];

    let written = graph.index(&records).await.expect("update accepted");
    assert!(written > 0);

    let request = requests.recv().await.expect("request");
    assert!(request.request_line.starts_with("POST /ds/update"), "{}", request.request_line);
    let update = request.form.iter().find(|(k, _)| k == "update").map(|(_, v)| v.clone()).expect("update field");
    assert!(update.starts_with("DELETE WHERE { <http://example.org/resource/doc/3> ?p ?o }"), "{update}");
    assert!(update.contains("INSERT DATA {"), "{update}");
}
