//! Commit message construction: LLM summary line plus the turn transcript.

pub mod message;
pub mod summary;

pub use message::{TRUNCATION_MARKER, compose, truncate};
pub use summary::{
    FALLBACK_SUMMARY, GenerationRequest, TextGenerator, build_summary_prompt, generate_summary,
};
