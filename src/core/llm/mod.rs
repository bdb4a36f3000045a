mod base;
mod messages;
mod openai;

pub use base::{ChatBackend, ChatMessage, LlmError};
pub use messages::{ChatCompletionRequest, ChatCompletionResponse, OpenAIError, OpenAIErrorResponse};
pub use openai::{OpenAIChat, OpenAIChatConfig};
