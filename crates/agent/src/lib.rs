//! Language-model collaborators for the studio.
//!
//! The model only ever summarizes activity for the admin dashboard. It never
//! touches prices or selections; those stay in `unikron-core`.

pub mod gemini;
pub mod llm;
pub mod trends;

pub use gemini::{GeminiClient, GeminiProbe};
pub use llm::LlmClient;
pub use trends::TrendAnalyst;
