pub mod chat;
pub mod context;
pub mod core;
pub mod llm;
pub mod rag;
pub mod render;
pub mod server;
pub mod state;
