//! Completion Collaborator
//!
//! Thin client over an OpenAI-compatible chat-completions endpoint plus
//! the prompt assembly for one evidence chunk. The client carries no
//! retry policy; retrying is the caller's decision.

mod prompt;
mod provider;

pub use prompt::{build_chunk_prompt, verdict_response_format, PromptPart, SYSTEM_PROMPT};
pub use provider::{CompletionError, CompletionProvider, OpenAiProvider};
