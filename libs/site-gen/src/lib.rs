//! Static site generation through an OpenAI-compatible chat completions API.
//!
//! The model is asked for a JSON object mapping file names to file contents.
//! Its answer is only ever parsed as JSON, never executed.

mod client;
mod error;
mod parse;
mod prompt;
mod requests;

pub use client::{Generator, GeneratorConfig, DEFAULT_MODEL, GEMINI_CHAT_COMPLETIONS_URL};
pub use error::GenerationError;
pub use parse::{parse_file_set, strip_code_fence, FileSet};
pub use prompt::build_prompt;

/// The page every generated site must contain.
pub const ENTRY_DOCUMENT: &str = "index.html";
/// The optional description document.
pub const DESCRIPTION_DOCUMENT: &str = "README.md";
