//! Context assembly module.
//!
//! Builds the prompt for one chat turn from retrieved passages and a bounded
//! window of chat history. Everything here is pure and reentrant.

mod assembler;
pub mod prompt;
mod types;
mod window;

pub use assembler::{
    assemble, AssembleError, AssemblerConfig, Assembly, ContextAssembler, EmptyPassagePolicy,
};
pub use types::{HistoryRole, HistoryTurn, PromptMessage, PromptRole, RetrievedPassage};
pub use window::history_window;
