//! JSON bodies of the HTTP API, shared by the server and [`crate::client`].

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_context_chars: Option<usize>,
}

impl GenerateRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
            max_context_chars: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = Some(max_context_chars);
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub rag_answer: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompareRequest {
    pub rag_answer: String,
    pub user_answer: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompareResponse {
    pub cosine_similarity: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}
