//! Summary and acknowledgment generation.

pub mod backend;
pub mod prompt;
pub mod sanitize;

use crate::error::GenerationError;
use crate::generate::backend::TextBackend;
use crate::generate::sanitize::sanitize;

pub const SUMMARY_FALLBACK: &str = "No summary could be generated for this email.";
pub const ACKNOWLEDGMENT_FALLBACK: &str =
    "Thank you for your email. I have received it and will get back to you soon.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Summarize,
    Acknowledge,
}

impl Intent {
    pub fn label(self) -> &'static str {
        match self {
            Intent::Summarize => "summary",
            Intent::Acknowledge => "acknowledgment",
        }
    }
}

/// Text used when the backend fails or returns nothing usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallbacks {
    pub summary: String,
    pub acknowledgment: String,
}

impl Default for Fallbacks {
    fn default() -> Self {
        Self {
            summary: SUMMARY_FALLBACK.to_string(),
            acknowledgment: ACKNOWLEDGMENT_FALLBACK.to_string(),
        }
    }
}

impl Fallbacks {
    pub fn for_intent(&self, intent: Intent) -> &str {
        match intent {
            Intent::Summarize => &self.summary,
            Intent::Acknowledge => &self.acknowledgment,
        }
    }
}

#[derive(Debug)]
pub struct GenerationResult {
    pub raw_output: String,
    /// Never empty, never an echo of the prompt.
    pub cleaned_text: String,
    /// Set when the backend itself failed and `cleaned_text` is the fallback.
    pub failure: Option<GenerationError>,
}

pub struct GenerationClient {
    backend: Box<dyn TextBackend>,
    fallbacks: Fallbacks,
}

impl GenerationClient {
    pub fn new(backend: Box<dyn TextBackend>, fallbacks: Fallbacks) -> Self {
        Self { backend, fallbacks }
    }

    /// One backend attempt. Never fails: errors become the fallback text
    /// with the cause kept in [`GenerationResult::failure`].
    pub fn generate(&self, intent: Intent, prompt: &str) -> GenerationResult {
        let fallback = self.fallbacks.for_intent(intent);

        match self.backend.complete(prompt) {
            Ok(raw_output) => {
                let cleaned_text = sanitize(&raw_output, prompt, fallback);
                if cleaned_text == fallback {
                    log::debug!("{} output unusable, using fallback", intent.label());
                }
                GenerationResult {
                    raw_output,
                    cleaned_text,
                    failure: None,
                }
            }
            Err(e) => GenerationResult {
                raw_output: String::new(),
                cleaned_text: fallback.to_string(),
                failure: Some(e),
            },
        }
    }
}
