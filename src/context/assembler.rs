//! Context Assembler.
//!
//! Turns retrieved passages and a window of chat history into the ordered
//! message sequence sent to the language model:
//! 1. One system message: fixed instructions followed by the passage context
//! 2. The last `window_size` history turns, unmodified
//! 3. The current query as a user message

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::prompt::{format_passages, system_prompt, NO_CONTEXT_REPLY};
use super::types::{HistoryTurn, PromptMessage, RetrievedPassage};
use super::window::history_window;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// What to do when retrieval returns no passages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPassagePolicy {
    /// Build the prompt with an empty context section and let the
    /// instructions force an "information not available" answer.
    #[default]
    Proceed,
    /// Skip the model call and answer with a fixed reply.
    ShortCircuit,
}

/// Configuration for context assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Number of most recent history turns to include
    pub window_size: usize,
    pub empty_passages: EmptyPassagePolicy,
    /// Overrides the built-in short-circuit reply
    pub no_context_reply: Option<String>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            window_size: 6,
            empty_passages: EmptyPassagePolicy::Proceed,
            no_context_reply: None,
        }
    }
}

/// Outcome of [`ContextAssembler::prepare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembly {
    /// Messages ready for the language model.
    Prompt(Vec<PromptMessage>),
    /// Final answer produced without calling the model.
    ShortCircuit(String),
}

/// Builds prompts for one chat turn. Stateless apart from its configuration.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    config: AssemblerConfig,
}

impl ContextAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    /// Applies the empty-passage policy, then assembles the prompt.
    ///
    /// The query is validated before the policy is consulted, so an empty
    /// query fails even when there are no passages.
    pub fn prepare(
        &self,
        query: &str,
        passages: &[RetrievedPassage],
        history: &[HistoryTurn],
    ) -> Result<Assembly, AssembleError> {
        validate_query(query)?;

        if passages.is_empty() && self.config.empty_passages == EmptyPassagePolicy::ShortCircuit {
            let reply = self
                .config
                .no_context_reply
                .clone()
                .unwrap_or_else(|| NO_CONTEXT_REPLY.to_string());
            return Ok(Assembly::ShortCircuit(reply));
        }

        assemble(query, passages, history, self.config.window_size).map(Assembly::Prompt)
    }
}

/// Assembles `1 + min(window_size, history.len()) + 1` prompt messages.
///
/// Passage blocks keep the input order, which callers supply ranked by
/// descending score.
pub fn assemble(
    query: &str,
    passages: &[RetrievedPassage],
    history: &[HistoryTurn],
    window_size: usize,
) -> Result<Vec<PromptMessage>, AssembleError> {
    validate_query(query)?;

    let window = history_window(history, window_size);
    let mut messages = Vec::with_capacity(window.len() + 2);

    messages.push(PromptMessage::system(system_prompt(&format_passages(
        passages,
    ))));
    messages.extend(window.iter().map(PromptMessage::from));
    messages.push(PromptMessage::user(query));

    Ok(messages)
}

fn validate_query(query: &str) -> Result<(), AssembleError> {
    if query.trim().is_empty() {
        return Err(AssembleError::InvalidInput(
            "query must not be empty".to_string(),
        ));
    }
    Ok(())
}
