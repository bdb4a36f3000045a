//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `transcribe` - Audio upload to transcript
//! - `chat` - Conversation relay to the chat backend
//! - `ui` - Embedded browser client

pub mod api;
pub mod chat;
pub mod messages;
pub mod transcribe;
pub mod ui;

pub use messages::{ChatRequest, ChatResponse, HealthResponse, TranscribeResponse};
