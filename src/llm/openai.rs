use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// Client for OpenAI-compatible chat and embedding endpoints.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            base_url: normalize_base_url(&base_url),
            api_key,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(self.url(path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

/// Accepts the base URL with or without the `/v1` suffix.
fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    trimmed.strip_suffix("/v1").unwrap_or(trimmed).to_string()
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

fn chat_body(request: &ChatRequest, model_id: &str) -> Value {
    let mut body = json!({
        "model": model_id,
        "messages": request.messages,
        "stream": false,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(t) = request.temperature {
            obj.insert("temperature".to_string(), json!(t));
        }
        if let Some(t) = request.max_tokens {
            obj.insert("max_tokens".to_string(), json!(t));
        }
    }
    body
}

fn parse_embeddings(payload: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>, ApiError> {
    let mut data = payload.data;
    data.sort_by_key(|item| item.index.unwrap_or(usize::MAX));
    if data.len() != expected {
        return Err(ApiError::UpstreamUnavailable(format!(
            "embedding response has {} vectors for {} inputs",
            data.len(),
            expected
        )));
    }
    Ok(data.into_iter().map(|item| item.embedding).collect())
}

async fn error_text(res: reqwest::Response) -> String {
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    format!("{} {}", status, text.trim())
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let mut builder = self.client.get(self.url("models"));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        match builder.send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let body = chat_body(&request, model_id);

        let res = self
            .post("chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            return Err(ApiError::UpstreamUnavailable(format!(
                "chat completion failed: {}",
                error_text(res).await
            )));
        }

        let payload: ChatCompletionResponse = res.json().await.map_err(ApiError::upstream)?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(content)
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self
            .post("embeddings")
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            return Err(ApiError::UpstreamUnavailable(format!(
                "embedding failed: {}",
                error_text(res).await
            )));
        }

        let payload: EmbeddingResponse = res.json().await.map_err(ApiError::upstream)?;
        parse_embeddings(payload, inputs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    async fn spawn_mock(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn provider(base_url: String) -> OpenAiProvider {
        OpenAiProvider::new(base_url, Some("sk-test".into()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn base_url_with_or_without_version_suffix() {
        for base in [
            "https://api.openai.com",
            "https://api.openai.com/",
            "https://api.openai.com/v1",
            "https://api.openai.com/v1/",
        ] {
            assert_eq!(
                provider(base.to_string()).url("chat/completions"),
                "https://api.openai.com/v1/chat/completions"
            );
        }
        assert_eq!(
            provider("http://localhost:1234/v1".to_string()).url("embeddings"),
            "http://localhost:1234/v1/embeddings"
        );
    }

    #[test]
    fn chat_body_includes_optional_parameters() {
        let request = ChatRequest::new(vec![ChatMessage {
            role: "user".into(),
            content: "Oi".into(),
        }])
        .with_temperature(0.2);

        let body = chat_body(&request, "gpt-4o");

        assert_eq!(body["model"], json!("gpt-4o"));
        assert_eq!(body["temperature"], json!(0.2));
        assert_eq!(body["messages"][0]["content"], json!("Oi"));
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn embeddings_are_reordered_by_index() {
        let payload: EmbeddingResponse = serde_json::from_value(json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        }))
        .unwrap();

        let vectors = parse_embeddings(payload, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn embedding_count_mismatch_is_upstream_error() {
        let payload: EmbeddingResponse =
            serde_json::from_value(json!({ "data": [] })).unwrap();
        assert!(matches!(
            parse_embeddings(payload, 1),
            Err(ApiError::UpstreamUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn chat_reads_first_choice() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<Value>| async move {
                let last = body["messages"]
                    .as_array()
                    .and_then(|m| m.last())
                    .and_then(|m| m["content"].as_str())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": format!("eco: {}", last) } }]
                }))
            }),
        );
        let base = spawn_mock(app).await;

        let request = ChatRequest::new(vec![ChatMessage {
            role: "user".into(),
            content: "Olá".into(),
        }]);
        let answer = provider(base).chat(request, "gpt-4o").await.unwrap();

        assert_eq!(answer, "eco: Olá");
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_unavailable() {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let base = spawn_mock(app).await;

        let err = provider(base)
            .embed(&["texto".to_string()], "text-embedding-3-large")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::UpstreamUnavailable(msg) if msg.contains("429")));
    }

    #[tokio::test]
    async fn unreachable_host_is_upstream_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = provider(format!("http://{}", addr));
        let err = provider
            .chat(ChatRequest::new(Vec::new()), "gpt-4o")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::UpstreamUnavailable(_)));
        assert!(!provider.health_check().await.unwrap());
    }
}
