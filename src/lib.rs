//! Curriculum documents and question banks generated through Gemini.
//!
//! [`prompt::build`] turns a filled form into an instruction,
//! [`gemini::GeminiClient::generate`] sends it under the retry policy and
//! [`repair::parse_sections`] turns the answer into ordered HTML sections.

pub mod audio;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod export;
pub mod gemini;
pub mod logging;
pub mod params;
pub mod prefs;
pub mod prompt;
pub mod repair;
pub mod retry;
pub mod section;

pub use error::{GenError, Result};
pub use gemini::{GeminiClient, GeminiConfig, ModelSet};
pub use params::GenerationParameters;
pub use prompt::GenerationMode;
pub use retry::{CancelToken, RetryPolicy};
pub use section::GeneratedSection;

/// Outcome of one generation call.
pub type GenerationResult = Result<Vec<GeneratedSection>>;
