use std::sync::{Arc, Mutex};
use std::time::Duration;

use assistant_core::pipeline::{NO_RESPONSE_FALLBACK, DEFAULT_TIMEOUT};
use assistant_core::{
    ChatError, ChatRole, Completion, InferenceProvider, OllamaClient, PipelineStatus,
    SubmissionPipeline,
};
use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::mpsc;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

type Seen = Arc<Mutex<Vec<Value>>>;

async fn ollama_stub(reply: Value) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route(
            "/api/generate",
            post(|State((seen, reply)): State<(Seen, Value)>, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(body);
                Json(reply)
            }),
        )
        .with_state((seen.clone(), reply));
    (serve(router).await, seen)
}

fn pipeline_for(
    provider: Arc<dyn InferenceProvider>,
    timeout: Duration,
) -> (SubmissionPipeline, mpsc::UnboundedReceiver<Completion>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SubmissionPipeline::new(provider, Arc::new(tx), timeout), rx)
}

async fn run_one(
    pipeline: &mut SubmissionPipeline,
    rx: &mut mpsc::UnboundedReceiver<Completion>,
    prompt: &str,
) {
    pipeline.submit(prompt).unwrap();
    let completion = rx.recv().await.expect("completion delivered");
    assert!(pipeline.complete(completion));
}

#[tokio::test]
async fn hello_response_becomes_assistant_turn() {
    let (url, seen) = ollama_stub(json!({"response": "Hello!", "done": true})).await;
    let client = Arc::new(OllamaClient::new(&url, "llama3.2:3b"));
    let (mut pipeline, mut rx) = pipeline_for(client, DEFAULT_TIMEOUT);

    run_one(&mut pipeline, &mut rx, "Say hello").await;

    let turns = pipeline.transcript().all();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[1].role(), ChatRole::User);
    assert_eq!(turns[1].content(), "Say hello");
    assert_eq!(turns[2].role(), ChatRole::Assistant);
    assert_eq!(turns[2].content(), "Hello!");
    assert_eq!(pipeline.status(), PipelineStatus::Ready);
    assert!(!pipeline.is_busy());

    let bodies = seen.lock().unwrap();
    assert_eq!(
        bodies.as_slice(),
        &[json!({"model": "llama3.2:3b", "prompt": "Say hello", "stream": false})]
    );
}

#[tokio::test]
async fn missing_response_field_uses_fallback() {
    let (url, _) = ollama_stub(json!({"done": true})).await;
    let client = Arc::new(OllamaClient::new(&url, "llama3.2:3b"));
    let (mut pipeline, mut rx) = pipeline_for(client, DEFAULT_TIMEOUT);

    run_one(&mut pipeline, &mut rx, "anything").await;

    assert_eq!(pipeline.transcript().last().unwrap().content(), NO_RESPONSE_FALLBACK);
    assert_eq!(pipeline.status(), PipelineStatus::Ready);
}

#[tokio::test]
async fn server_error_status_is_reported() {
    let router = Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::NOT_FOUND, r#"{"error":"model 'x' not found"}"#) }),
    );
    let url = serve(router).await;
    let client = Arc::new(OllamaClient::new(&url, "x"));
    let (mut pipeline, mut rx) = pipeline_for(client, DEFAULT_TIMEOUT);

    run_one(&mut pipeline, &mut rx, "hi").await;

    let content = pipeline.transcript().last().unwrap().content().to_string();
    assert!(content.starts_with("Unexpected Error: "), "got {content}");
    assert!(content.contains("404"));
    assert!(content.contains("not found"));
    assert_eq!(pipeline.status(), PipelineStatus::Error);
}

#[tokio::test]
async fn connection_refused_reports_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Arc::new(OllamaClient::new(&format!("http://{}", addr), "llama3.2:3b"));
    let (mut pipeline, mut rx) = pipeline_for(client, DEFAULT_TIMEOUT);

    pipeline.submit("hi").unwrap();
    let completion = rx.recv().await.unwrap();
    assert!(matches!(completion.outcome, Err(ChatError::ProviderUnreachable(_))));
    pipeline.complete(completion);

    let content = pipeline.transcript().last().unwrap().content().to_string();
    assert!(content.contains("Connection Error"));
    assert!(content.contains(&addr.port().to_string()));
    assert!(!content.contains("Timeout"));
    assert_eq!(pipeline.status(), PipelineStatus::Error);
    assert!(!pipeline.is_busy());
}

struct SlowProvider;

#[async_trait]
impl InferenceProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    fn model(&self) -> &str {
        "slow-model"
    }

    async fn generate(&self, _prompt: &str) -> Result<Option<String>, ChatError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Some("too late".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn slow_provider_times_out_after_thirty_seconds() {
    let (mut pipeline, mut rx) = pipeline_for(Arc::new(SlowProvider), DEFAULT_TIMEOUT);
    let started = tokio::time::Instant::now();

    pipeline.submit("are you there?").unwrap();
    let completion = rx.recv().await.unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(30) && elapsed < Duration::from_secs(31));
    assert_eq!(completion.outcome, Err(ChatError::ProviderTimeout(DEFAULT_TIMEOUT)));
    pipeline.complete(completion);

    let content = pipeline.transcript().last().unwrap().content().to_string();
    assert!(content.contains("Timeout Error"));
    assert!(!content.contains("Connection Error"));
    assert_eq!(pipeline.status(), PipelineStatus::Error);
}

#[tokio::test]
async fn transcript_order_is_causal_across_requests() {
    let (url, _) = ollama_stub(json!({"response": "ok"})).await;
    let client = Arc::new(OllamaClient::new(&url, "llama3.2:3b"));
    let (mut pipeline, mut rx) = pipeline_for(client, DEFAULT_TIMEOUT);

    for prompt in ["one", "two", "three"] {
        run_one(&mut pipeline, &mut rx, prompt).await;
    }

    let roles: Vec<ChatRole> = pipeline.transcript().all().iter().map(|t| t.role()).collect();
    assert_eq!(
        roles,
        vec![
            ChatRole::Assistant,
            ChatRole::User,
            ChatRole::Assistant,
            ChatRole::User,
            ChatRole::Assistant,
            ChatRole::User,
            ChatRole::Assistant,
        ]
    );
    let users: Vec<&str> = pipeline
        .transcript()
        .all()
        .iter()
        .filter(|t| t.role() == ChatRole::User)
        .map(|t| t.content())
        .collect();
    assert_eq!(users, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn list_models_reads_tags() {
    let router = Router::new().route(
        "/api/tags",
        axum::routing::get(|| async {
            Json(json!({"models": [{"name": "llama3.2:3b"}, {"name": "phi3:mini"}]}))
        }),
    );
    let url = serve(router).await;
    let client = OllamaClient::new(&url, "llama3.2:3b");

    assert_eq!(client.list_models().await.unwrap(), vec!["llama3.2:3b", "phi3:mini"]);
    assert!(client.has_model("phi3:mini").await.unwrap());
    assert!(!client.has_model("mistral").await.unwrap());
}
