use std::sync::Arc;
use std::time::Duration;

use crate::chat::{ChatTurnHandler, RagChatHandler};
use crate::context::{AssemblerConfig, ContextAssembler};
use crate::core::config::{AppPaths, ChatSettings, ConfigService};
use crate::core::errors::ApiError;
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::rag::{PineconeRetriever, Retriever};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Clients are constructed once here from configuration and handed to the
/// chat handler explicitly; nothing below this layer holds global state.
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigService,
    pub settings: ChatSettings,
    pub llm: Arc<dyn LlmProvider>,
    pub retriever: Arc<dyn Retriever>,
    pub chat: Arc<dyn ChatTurnHandler>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// This process includes:
    /// 1. Loading configuration (YAML, secrets, env) relative to `paths`
    /// 2. Building the OpenAI-compatible provider used for embeddings and chat
    /// 3. Connecting the Pinecone retriever
    /// 4. Wiring the RAG chat handler
    pub fn initialize_with_paths(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths);
        let settings = config
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let timeout = Duration::from_secs(settings.llm.timeout_secs);

        if settings.llm.api_key.is_none() {
            tracing::warn!("No LLM API key configured; set OPENAI_API_KEY or llm.api_key");
        }
        let llm: Arc<dyn LlmProvider> = Arc::new(
            OpenAiProvider::new(settings.llm.base_url.clone(), settings.llm.api_key.clone(), timeout)
                .map_err(|e| InitializationError::Llm(e.into()))?,
        );

        let index_host = settings.retrieval.index_host.as_deref().ok_or_else(|| {
            InitializationError::Retriever(
                ApiError::BadRequest(
                    "retrieval.index_host is not configured (or set PINECONE_INDEX_HOST)".to_string(),
                )
                .into(),
            )
        })?;
        let retriever: Arc<dyn Retriever> = Arc::new(
            PineconeRetriever::new(
                index_host,
                settings.retrieval.api_key.clone(),
                settings.retrieval.namespace.clone(),
                timeout,
            )
            .map_err(|e| InitializationError::Retriever(e.into()))?,
        );

        Ok(Arc::new(Self::from_parts(config, settings, llm, retriever)))
    }

    /// Assembles state from already-built collaborators.
    pub fn from_parts(
        config: ConfigService,
        settings: ChatSettings,
        llm: Arc<dyn LlmProvider>,
        retriever: Arc<dyn Retriever>,
    ) -> Self {
        let assembler = ContextAssembler::new(AssemblerConfig {
            window_size: settings.history_window,
            empty_passages: settings.empty_passages,
            no_context_reply: settings.no_context_reply.clone(),
        });
        let chat: Arc<dyn ChatTurnHandler> = Arc::new(RagChatHandler::new(
            llm.clone(),
            retriever.clone(),
            assembler,
            &settings,
        ));

        AppState {
            config,
            settings,
            llm,
            retriever,
            chat,
        }
    }
}
