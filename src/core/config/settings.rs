//! Typed view over the merged configuration document.

use serde::Serialize;
use serde_json::Value;

use crate::context::EmptyPassagePolicy;

pub const DEFAULT_HISTORY_WINDOW: usize = 6;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
pub const DEFAULT_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmSettings {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalSettings {
    pub index_host: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub namespace: Option<String>,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatSettings {
    pub history_window: usize,
    pub empty_passages: EmptyPassagePolicy,
    pub no_context_reply: Option<String>,
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
}

impl ChatSettings {
    pub fn from_config(config: &Value) -> Self {
        let chat = config.get("chat");
        let server = config.get("server");
        let llm = config.get("llm");
        let retrieval = config.get("retrieval");

        let empty_passages = match get_str(chat, "empty_passages").as_deref() {
            Some("short_circuit") => EmptyPassagePolicy::ShortCircuit,
            _ => EmptyPassagePolicy::Proceed,
        };

        Self {
            history_window: get_u64(chat, "history_window")
                .map(|v| v as usize)
                .unwrap_or(DEFAULT_HISTORY_WINDOW),
            empty_passages,
            no_context_reply: get_str(chat, "no_context_reply"),
            server: ServerSettings {
                host: get_str(server, "host").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: get_u64(server, "port")
                    .and_then(|v| u16::try_from(v).ok())
                    .unwrap_or(DEFAULT_PORT),
                cors_allowed_origins: server
                    .and_then(|s| s.get("cors_allowed_origins"))
                    .and_then(|v| v.as_array())
                    .map(|list| {
                        list.iter()
                            .filter_map(|item| item.as_str())
                            .map(str::trim)
                            .filter(|item| !item.is_empty())
                            .map(|item| item.to_string())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            llm: LlmSettings {
                base_url: get_str(llm, "base_url")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                api_key: get_str(llm, "api_key"),
                chat_model: get_str(llm, "chat_model")
                    .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                embedding_model: get_str(llm, "embedding_model")
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
                temperature: llm
                    .and_then(|v| v.get("temperature"))
                    .and_then(|v| v.as_f64())
                    .unwrap_or(DEFAULT_TEMPERATURE),
                max_tokens: get_u64(llm, "max_tokens").map(|v| v as u32),
                timeout_secs: get_u64(llm, "timeout_secs").unwrap_or(60),
            },
            retrieval: RetrievalSettings {
                index_host: get_str(retrieval, "index_host"),
                api_key: get_str(retrieval, "api_key"),
                namespace: get_str(retrieval, "namespace"),
                top_k: get_u64(retrieval, "top_k")
                    .map(|v| v as usize)
                    .unwrap_or(DEFAULT_TOP_K),
            },
        }
    }
}

fn get_str(section: Option<&Value>, key: &str) -> Option<String> {
    section
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn get_u64(section: Option<&Value>, key: &str) -> Option<u64> {
    section.and_then(|v| v.get(key)).and_then(|v| v.as_u64())
}
