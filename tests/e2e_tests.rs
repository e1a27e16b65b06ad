//! End-to-end HTTP tests through [`GraderClient`].

mod common;

use grader::client::{ClientError, GraderClient};
use grader::gateway::ReadyResponse;
use grader::gateway::payload::GenerateRequest;
use reqwest::StatusCode;

use common::fixtures::PASSAGES;
use common::harness::{spawn_test_server, spawn_test_server_with};

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let server = spawn_test_server().await.expect("Server should start");

    let response = reqwest::get(format!("{}/healthz", server.url()))
        .await
        .expect("Health check should succeed");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-rag-status"], "ok");
}

#[tokio::test]
async fn test_ready_reports_stub_components() {
    let server = spawn_test_server().await.expect("Server should start");

    let ready: ReadyResponse = reqwest::get(format!("{}/ready", server.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(ready.status, "ok");
    assert_eq!(ready.components.corpus_passages, PASSAGES.len());
    assert_eq!(ready.components.embedder_mode, "stub");
    assert_eq!(ready.components.generator_mode, "stub");
}

#[tokio::test]
async fn test_generate_photosynthesis() {
    let server = spawn_test_server().await.expect("Server should start");
    let client = GraderClient::new(server.url());

    let answer = client
        .generate(&GenerateRequest::new("How do plants make energy from light?"))
        .await
        .expect("generate should succeed");

    assert_eq!(answer, "photosynthesis converts light to energy.");
}

#[tokio::test]
async fn test_generate_with_request_params() {
    let server = spawn_test_server().await.expect("Server should start");
    let client = GraderClient::new(server.url());

    let request = GenerateRequest::new("What is the capital of France?")
        .with_top_k(1)
        .with_max_context_chars(5);
    let answer = client.generate(&request).await.unwrap();

    assert_eq!(answer, "paris");
}

#[tokio::test]
async fn test_generate_ignores_params_when_disabled() {
    let server = spawn_test_server_with(|config| {
        config.retrieval.honor_request_params = false;
    })
    .await
    .expect("Server should start");
    let client = GraderClient::new(server.url());

    let request = GenerateRequest::new("What is the capital of France?").with_top_k(500);
    let answer = client.generate(&request).await.unwrap();

    assert_eq!(answer, "paris is the capital of france.");
}

#[tokio::test]
async fn test_generate_out_of_range_top_k_is_client_error() {
    let server = spawn_test_server().await.expect("Server should start");
    let client = GraderClient::new(server.url());

    let result = client
        .generate(&GenerateRequest::new("mitosis").with_top_k(0))
        .await;

    match result {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body.contains("top_k"), "body was {}", body);
        }
        other => panic!("expected a 400, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_without_question_is_client_error() {
    let server = spawn_test_server().await.expect("Server should start");
    let client = GraderClient::new(server.url());

    let result: Result<serde_json::Value, _> = client
        .post_json("/generate", &serde_json::json!({"top_k": 3}))
        .await;

    match result {
        Err(ClientError::Status { status, body }) => {
            assert!(status.is_client_error());
            let error: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(error["code"], 400);
        }
        other => panic!("expected a 4xx, got {:?}", other),
    }
}

#[tokio::test]
async fn test_compare_paris() {
    let server = spawn_test_server().await.expect("Server should start");
    let client = GraderClient::new(server.url());

    let score = client
        .compare(
            "Paris is the capital of France.",
            "The capital of France is Paris.",
        )
        .await
        .unwrap();

    assert!((score - 1.0).abs() < 1e-4, "score was {}", score);
}

#[tokio::test]
async fn test_compare_symmetric_and_bounded() {
    let server = spawn_test_server().await.expect("Server should start");
    let client = GraderClient::new(server.url());

    let a = "the heart moves blood";
    let b = "photosynthesis needs light";

    let forward = client.compare(a, b).await.unwrap();
    let backward = client.compare(b, a).await.unwrap();

    assert_eq!(forward, backward);
    assert!((-1.0..=1.0).contains(&forward));
}

#[tokio::test]
async fn test_generated_answer_grades_against_itself() {
    let server = spawn_test_server().await.expect("Server should start");
    let client = GraderClient::new(server.url());

    let answer = client
        .generate(&GenerateRequest::new("What does the heart do?"))
        .await
        .unwrap();
    assert!(!answer.is_empty());

    let score = client.compare(&answer, &answer).await.unwrap();
    assert!((score - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = GraderClient::with_timeout(url, std::time::Duration::from_secs(2));
    let result = client.compare("a", "b").await;

    assert!(matches!(result, Err(ClientError::Transport(_))));
}

#[tokio::test]
async fn test_silent_server_hits_client_timeout() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    // Accept connections but never answer.
    let hold = tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            open.push(stream);
        }
    });

    let client = GraderClient::with_timeout(url, std::time::Duration::from_millis(200));
    let started = std::time::Instant::now();
    let result = client.compare("a", "b").await;

    match result {
        Err(ClientError::Transport(e)) => assert!(e.is_timeout(), "error was {}", e),
        other => panic!("expected a timeout, got {:?}", other),
    }
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
    hold.abort();
}

#[test]
fn test_client_defaults() {
    let client = GraderClient::default();
    assert_eq!(client.base_url(), "http://127.0.0.1:8000");

    let client = GraderClient::new("http://localhost:9000/");
    assert_eq!(client.base_url(), "http://localhost:9000");
}
