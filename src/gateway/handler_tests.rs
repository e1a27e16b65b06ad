//! Router-level tests for the gateway handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::constants::RAG_STATUS_HEADER;
use crate::corpus::Corpus;
use crate::embedding::SentenceEmbedder;
use crate::gateway::create_router_with_state;
use crate::gateway::error::GatewayError;
use crate::gateway::payload::{CompareResponse, ErrorResponse, GenerateResponse};
use crate::gateway::state::HandlerState;
use crate::gateway::{HealthResponse, ReadyResponse};
use crate::generation::{GenerationError, Prompt, T5Generator, TextGenerator};
use crate::index::Metric;
use crate::pipeline::{PipelineError, RagPipeline, build_index};
use crate::retrieval::{RetrievalDefaults, Retriever};

const PASSAGES: [&str; 3] = [
    "photosynthesis converts light to energy.",
    "mitosis is cell division.",
    "paris is the capital of france.",
];

#[derive(Debug, Default)]
struct CountingGenerator {
    calls: AtomicUsize,
}

impl TextGenerator for CountingGenerator {
    fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("context was: {}", prompt.context()))
    }
}

#[derive(Debug)]
struct FailingGenerator;

impl TextGenerator for FailingGenerator {
    fn generate(&self, _prompt: &Prompt) -> Result<String, GenerationError> {
        Err(GenerationError::InferenceFailed {
            reason: "decoder exploded".to_string(),
        })
    }
}

fn test_state<G: TextGenerator>(generator: G) -> HandlerState<G> {
    let embedder = SentenceEmbedder::stub().unwrap();
    let corpus = Corpus::from_passages(PASSAGES);
    let index = build_index(&embedder, &corpus, Metric::L2).unwrap();
    let retriever = Retriever::new(corpus, index).unwrap();
    let pipeline =
        RagPipeline::new(embedder, retriever, generator, RetrievalDefaults::default()).unwrap();
    HandlerState::new(Arc::new(pipeline))
}

async fn post_raw(router: &Router, uri: &str, body: &str, json_content_type: bool) -> Response {
    let mut builder = Request::builder().method("POST").uri(uri);
    if json_content_type {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    router.clone().oneshot(request).await.unwrap()
}

async fn post_json(router: &Router, uri: &str, body: serde_json::Value) -> Response {
    post_raw(router, uri, &body.to_string(), true).await
}

async fn get(router: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn status_header(response: &Response) -> &str {
    response
        .headers()
        .get(RAG_STATUS_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_healthz() {
        let router = create_router_with_state(test_state(CountingGenerator::default()));
        let response = get(&router, "/healthz").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(status_header(&response), "ok");
        let body: HealthResponse = body_json(response).await;
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_ready_reports_components() {
        let state = test_state(T5Generator::stub().unwrap());
        let router = create_router_with_state(state);
        let response = get(&router, "/ready").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(status_header(&response), "ready");

        let body: ReadyResponse = body_json(response).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.components.corpus_passages, 3);
        assert_eq!(body.components.index_dim, 384);
        assert_eq!(body.components.embedder_mode, "stub");
        assert_eq!(body.components.generator_mode, "stub");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let router = create_router_with_state(test_state(CountingGenerator::default()));
        let response = get(&router, "/v1/chat/completions").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

mod generate_tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_returns_answer() {
        let state = test_state(CountingGenerator::default());
        let router = create_router_with_state(state.clone());

        let response = post_json(
            &router,
            "/generate",
            serde_json::json!({"question": "How do plants make energy from light?"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(status_header(&response), "ok");

        let body: GenerateResponse = body_json(response).await;
        assert!(
            body.rag_answer
                .starts_with("context was: photosynthesis converts light to energy.")
        );
        assert_eq!(state.pipeline.generator().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_with_stub_t5() {
        let router = create_router_with_state(test_state(T5Generator::stub().unwrap()));
        let response = post_json(
            &router,
            "/generate",
            serde_json::json!({"question": "What is the capital of France?", "top_k": 1}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: GenerateResponse = body_json(response).await;
        assert_eq!(body.rag_answer, "paris is the capital of france.");
    }

    #[tokio::test]
    async fn test_generate_honors_request_limits() {
        let router = create_router_with_state(test_state(CountingGenerator::default()));
        let response = post_json(
            &router,
            "/generate",
            serde_json::json!({
                "question": "mitosis",
                "top_k": 1,
                "max_context_chars": 7
            }),
        )
        .await;

        let body: GenerateResponse = body_json(response).await;
        assert_eq!(body.rag_answer, "context was: mitosis");
    }

    #[tokio::test]
    async fn test_missing_question_never_generates() {
        let state = test_state(CountingGenerator::default());
        let router = create_router_with_state(state.clone());

        let response = post_json(&router, "/generate", serde_json::json!({"top_k": 2})).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(status_header(&response), "invalid_request");
        let body: ErrorResponse = body_json(response).await;
        assert_eq!(body.code, 400);
        assert!(body.error.contains("question"), "error was {}", body.error);

        assert_eq!(state.pipeline.generator().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_types_rejected() {
        let state = test_state(CountingGenerator::default());
        let router = create_router_with_state(state.clone());

        for body in [
            serde_json::json!({"question": 42}),
            serde_json::json!({"question": null}),
            serde_json::json!({"question": "ok", "top_k": "three"}),
            serde_json::json!("just a string"),
        ] {
            let response = post_json(&router, "/generate", body.clone()).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
        }
        assert_eq!(state.pipeline.generator().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_json_body_rejected_with_json_error() {
        let router = create_router_with_state(test_state(CountingGenerator::default()));

        let response = post_raw(&router, "/generate", "question=hello", true).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = body_json(response).await;
        assert_eq!(body.code, 400);

        let response = post_raw(&router, "/generate", r#"{"question":"hi"}"#, false).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(status_header(&response), "invalid_request");
    }

    #[tokio::test]
    async fn test_out_of_range_top_k_rejected() {
        let state = test_state(CountingGenerator::default());
        let router = create_router_with_state(state.clone());

        for top_k in [0, 11] {
            let response = post_json(
                &router,
                "/generate",
                serde_json::json!({"question": "mitosis", "top_k": top_k}),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = post_json(
            &router,
            "/generate",
            serde_json::json!({"question": "mitosis", "top_k": -1}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(state.pipeline.generator().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generator_failure_is_500() {
        let router = create_router_with_state(test_state(FailingGenerator));
        let response = post_json(
            &router,
            "/generate",
            serde_json::json!({"question": "mitosis"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_header(&response), "generation_error");
        let body: ErrorResponse = body_json(response).await;
        assert_eq!(body.code, 500);
        assert!(body.error.contains("decoder exploded"));
    }
}

mod compare_tests {
    use super::*;

    #[tokio::test]
    async fn test_compare_paris() {
        let router = create_router_with_state(test_state(CountingGenerator::default()));
        let response = post_json(
            &router,
            "/compare",
            serde_json::json!({
                "rag_answer": "Paris is the capital of France.",
                "user_answer": "The capital of France is Paris."
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: CompareResponse = body_json(response).await;
        assert!(body.cosine_similarity > 0.99);
        assert!(body.cosine_similarity <= 1.0);
    }

    #[tokio::test]
    async fn test_compare_is_symmetric() {
        let router = create_router_with_state(test_state(CountingGenerator::default()));
        let a = "plants turn light into energy";
        let b = "mitosis divides a cell";

        let forward: CompareResponse = body_json(
            post_json(
                &router,
                "/compare",
                serde_json::json!({"rag_answer": a, "user_answer": b}),
            )
            .await,
        )
        .await;
        let backward: CompareResponse = body_json(
            post_json(
                &router,
                "/compare",
                serde_json::json!({"rag_answer": b, "user_answer": a}),
            )
            .await,
        )
        .await;

        assert_eq!(forward.cosine_similarity, backward.cosine_similarity);
    }

    #[tokio::test]
    async fn test_compare_missing_or_null_field() {
        let router = create_router_with_state(test_state(CountingGenerator::default()));

        for body in [
            serde_json::json!({"rag_answer": "a"}),
            serde_json::json!({"rag_answer": "a", "user_answer": null}),
            serde_json::json!({}),
        ] {
            let response = post_json(&router, "/compare", body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(status_header(&response), "invalid_request");
        }
    }
}

mod cors_tests {
    use super::*;

    #[tokio::test]
    async fn test_preflight_allows_any_origin() {
        let router = create_router_with_state(test_state(CountingGenerator::default()));
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/generate")
            .header(header::ORIGIN, "http://localhost:8501")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                GatewayError::InvalidRequest("x".into()),
                StatusCode::BAD_REQUEST,
                "invalid_request",
            ),
            (
                GatewayError::EmbeddingFailed("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "embedding_error",
            ),
            (
                GatewayError::RetrievalFailed("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "retrieval_error",
            ),
            (
                GatewayError::GenerationFailed("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "generation_error",
            ),
            (
                GatewayError::ScoringFailed("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "scoring_error",
            ),
            (
                GatewayError::InternalError("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];

        for (error, status, label) in cases {
            let response = error.into_response();
            assert_eq!(response.status(), status);
            assert_eq!(status_header(&response), label);
        }
    }

    #[test]
    fn test_pipeline_error_conversion() {
        let invalid: GatewayError = PipelineError::InvalidRequest("top_k".into()).into();
        assert!(matches!(invalid, GatewayError::InvalidRequest(_)));

        let mismatch: GatewayError = PipelineError::DimensionMismatch {
            index: 8,
            embedder: 384,
        }
        .into();
        assert!(matches!(mismatch, GatewayError::InternalError(_)));

        let generation: GatewayError = PipelineError::Generation(GenerationError::InferenceFailed {
            reason: "boom".into(),
        })
        .into();
        assert!(matches!(generation, GatewayError::GenerationFailed(_)));
    }
}
