use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use claim_client::{Attachment, ClientConfig, ClientError, HttpTransport, QueryForm};
use std::sync::{Arc, Mutex};

/// A multipart field as the stub backend received it.
#[derive(Debug, Clone)]
struct ReceivedField {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: &'static str,
    requests: Arc<Mutex<Vec<Vec<ReceivedField>>>>,
}

async fn handle_query(State(state): State<StubState>, mut multipart: Multipart) -> (StatusCode, String) {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap().to_vec();
        fields.push(ReceivedField {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    state.requests.lock().unwrap().push(fields);
    (state.status, state.body.to_string())
}

struct StubBackend {
    endpoint: String,
    requests: Arc<Mutex<Vec<Vec<ReceivedField>>>>,
}

impl StubBackend {
    fn transport(&self) -> HttpTransport {
        HttpTransport::new(ClientConfig {
            endpoint: self.endpoint.clone(),
            timeout: None,
        })
        .unwrap()
    }

    fn last_request(&self) -> Vec<ReceivedField> {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

async fn spawn_backend(status: StatusCode, body: &'static str) -> StubBackend {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        status,
        body,
        requests: Arc::clone(&requests),
    };
    let app = Router::new().route("/query", post(handle_query)).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubBackend {
        endpoint: format!("http://{addr}/query"),
        requests,
    }
}

const APPROVED: &str =
    r#"{"decision":"Approved","amount":"100","justification":{"summary":"**ok**","clause_refs":[]}}"#;

#[tokio::test]
async fn query_without_file_sends_only_query_field() {
    let backend = spawn_backend(StatusCode::OK, APPROVED).await;
    let mut form = QueryForm::new();
    form.set_query("46M, knee surgery in Pune, 3-month policy");

    form.submit(&backend.transport()).await.unwrap();

    let fields = backend.last_request();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "query");
    assert_eq!(fields[0].bytes, b"46M, knee surgery in Pune, 3-month policy");
}

#[tokio::test]
async fn query_with_file_sends_both_fields() {
    let backend = spawn_backend(StatusCode::OK, APPROVED).await;
    let mut form = QueryForm::new();
    form.set_query("is cataract covered?");
    form.select_files(vec![Attachment::new("policy.pdf", b"%PDF-1.4".to_vec())]);

    form.submit(&backend.transport()).await.unwrap();

    let fields = backend.last_request();
    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["query", "file"]);
    assert_eq!(fields[1].file_name.as_deref(), Some("policy.pdf"));
    assert_eq!(fields[1].content_type.as_deref(), Some("application/pdf"));
    assert_eq!(fields[1].bytes, b"%PDF-1.4");
}

#[tokio::test]
async fn dropped_files_are_submitted() {
    let backend = spawn_backend(StatusCode::OK, APPROVED).await;
    let mut form = QueryForm::new();
    form.set_query("claim");
    form.drag_over();
    form.drop(vec![
        Attachment::new("dropped.txt", b"first".to_vec()),
        Attachment::new("ignored.txt", b"second".to_vec()),
    ]);

    form.submit(&backend.transport()).await.unwrap();

    let fields = backend.last_request();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[1].file_name.as_deref(), Some("dropped.txt"));
    assert_eq!(fields[1].bytes, b"first");
}

#[tokio::test]
async fn decision_is_rendered_into_result_container() {
    let backend = spawn_backend(StatusCode::OK, APPROVED).await;
    let mut form = QueryForm::new();
    form.set_query("claim");

    let result = form.submit(&backend.transport()).await.unwrap();

    assert_eq!(result.amount, "100");
    let card = form.result().card().unwrap();
    assert_eq!(card.decision_class, "approved");
    let html = form.result().inner_html();
    assert!(html.contains(r#"<h3 class="decision approved">"#));
    assert!(html.contains("100"));
    assert!(html.contains("<strong>ok</strong>"));
}

#[tokio::test]
async fn error_response_is_reported_and_result_untouched() {
    let backend = spawn_backend(
        StatusCode::BAD_GATEWAY,
        r#"{"error":"llm_error","message":"decision backend failed: timeout"}"#,
    )
    .await;
    let mut form = QueryForm::new();
    form.set_query("claim");

    let err = form.submit(&backend.transport()).await.unwrap_err();

    match err {
        ClientError::Server { status, error, message } => {
            assert_eq!(status, 502);
            assert_eq!(error, "llm_error");
            assert!(message.contains("timeout"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(form.result().card().is_none());
    assert_eq!(form.result().inner_html(), "");
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let backend = spawn_backend(StatusCode::OK, r#"{"decision":"Approved"}"#).await;
    let mut form = QueryForm::new();
    form.set_query("claim");

    let err = form.submit(&backend.transport()).await.unwrap_err();

    assert!(matches!(err, ClientError::Decode(_)));
    assert!(form.result().card().is_none());
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let transport = HttpTransport::new(ClientConfig {
        endpoint: "http://127.0.0.1:9/query".to_string(),
        timeout: Some(std::time::Duration::from_secs(5)),
    })
    .unwrap();
    let mut form = QueryForm::new();

    let err = form.submit(&transport).await.unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
}
