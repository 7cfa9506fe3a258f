use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{AssembleError, Assembly, ContextAssembler, HistoryTurn, RetrievedPassage};
use crate::core::config::ChatSettings;
use crate::core::errors::ApiError;
use crate::llm::{ChatRequest, LlmProvider};
use crate::rag::Retriever;
use crate::render::render_to_markup;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurnRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurnResponse {
    /// Raw answer text.
    pub response: String,
    /// Sanitized HTML of the answer.
    pub formatted_response: String,
    /// Distinct passage sources, in rank order.
    pub sources: Vec<String>,
}

#[async_trait]
pub trait ChatTurnHandler: Send + Sync {
    async fn handle_turn(&self, request: ChatTurnRequest) -> Result<ChatTurnResponse, ApiError>;
}

/// Retrieval-augmented chat over an embedder/model provider and a retriever.
pub struct RagChatHandler {
    llm: Arc<dyn LlmProvider>,
    retriever: Arc<dyn Retriever>,
    assembler: ContextAssembler,
    chat_model: String,
    embedding_model: String,
    temperature: f64,
    max_tokens: Option<u32>,
    top_k: usize,
}

impl RagChatHandler {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        retriever: Arc<dyn Retriever>,
        assembler: ContextAssembler,
        settings: &ChatSettings,
    ) -> Self {
        Self {
            llm,
            retriever,
            assembler,
            chat_model: settings.llm.chat_model.clone(),
            embedding_model: settings.llm.embedding_model.clone(),
            temperature: settings.llm.temperature,
            max_tokens: settings.llm.max_tokens,
            top_k: settings.retrieval.top_k,
        }
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedPassage>, ApiError> {
        let embeddings = self
            .llm
            .embed(&[query.to_string()], &self.embedding_model)
            .await?;
        let query_embedding = embeddings.into_iter().next().ok_or_else(|| {
            ApiError::UpstreamUnavailable("embedding response was empty".to_string())
        })?;

        self.retriever.search(&query_embedding, self.top_k).await
    }
}

#[async_trait]
impl ChatTurnHandler for RagChatHandler {
    async fn handle_turn(&self, request: ChatTurnRequest) -> Result<ChatTurnResponse, ApiError> {
        let started = Instant::now();
        let turn_id = Uuid::new_v4();
        let query = request.message.as_str();
        if query.trim().is_empty() {
            return Err(ApiError::InvalidInput("message must not be empty".to_string()));
        }

        let passages = self.retrieve(query).await?;
        let sources = distinct_sources(&passages);

        let answer = match self
            .assembler
            .prepare(query, &passages, &request.history)
            .map_err(|AssembleError::InvalidInput(msg)| ApiError::InvalidInput(msg))?
        {
            Assembly::ShortCircuit(reply) => {
                tracing::info!(%turn_id, "No passages retrieved; answering without the model");
                reply
            }
            Assembly::Prompt(messages) => {
                let chat_request = ChatRequest::from_prompt(&messages)
                    .with_temperature(self.temperature)
                    .with_max_tokens(self.max_tokens);
                self.llm.chat(chat_request, &self.chat_model).await?
            }
        };

        let formatted_response = render_to_markup(&answer);

        tracing::info!(
            %turn_id,
            passages = passages.len(),
            history = request.history.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat turn completed"
        );

        Ok(ChatTurnResponse {
            response: answer,
            formatted_response,
            sources,
        })
    }
}

fn distinct_sources(passages: &[RetrievedPassage]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for passage in passages {
        if !sources.iter().any(|s| s == &passage.source) {
            sources.push(passage.source.clone());
        }
    }
    sources
}
