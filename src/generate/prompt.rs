//! Prompt templates for the generation backend.

use crate::generate::Intent;

/// Opens the instruction block. Never expected inside ordinary mail text.
pub const INSTRUCTION_START: &str = "[INST]";
/// Closes the instruction block; the email body follows it verbatim.
pub const INSTRUCTION_END: &str = "[/INST]";

const SUMMARIZE_INSTRUCTION: &str = "Summarize the following email as a short list of concise bullet points. \
Cover the key points, requests and any dates mentioned. Reply with the bullet points only.";

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    owner_name: String,
}

impl PromptBuilder {
    pub fn new(owner_name: impl Into<String>) -> Self {
        Self {
            owner_name: owner_name.into(),
        }
    }

    /// Deterministic: the same intent and body always give the same prompt.
    pub fn build(&self, intent: Intent, body: &str) -> String {
        let instruction = match intent {
            Intent::Summarize => SUMMARIZE_INSTRUCTION.to_string(),
            Intent::Acknowledge => format!(
                "Write a single polite paragraph acknowledging receipt of the following email \
on behalf of {}. Say that it has been received and that a proper reply will follow soon. \
Reply with the acknowledgment only.",
                self.owner_name
            ),
        };
        format!("{INSTRUCTION_START}\n{instruction}\n{INSTRUCTION_END}\n{body}")
    }
}
