pub mod llm;
pub mod stt;

// Re-export commonly used types for convenience
pub use llm::{ChatBackend, ChatMessage, LlmError, OpenAIChat, OpenAIChatConfig};
pub use stt::{ScratchAudio, SpeechModel, SttError, Transcriber, UnavailableModel};
