//! Chat turn handling.
//!
//! Every front-end is a thin adapter over [`ChatTurnHandler`]. The RAG
//! implementation runs one turn as: embed query, search the index, assemble
//! the prompt, call the model, render the answer.

mod handler;

pub use handler::{ChatTurnHandler, ChatTurnRequest, ChatTurnResponse, RagChatHandler};
