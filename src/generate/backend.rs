//! Text-generation backends.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

const OUTPUT_TAIL: usize = 2000;

/// Anything that turns a prompt into raw model text.
pub trait TextBackend {
    fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// How the prompt reaches the external program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptVia {
    /// Appended as the last command-line argument.
    #[default]
    Argument,
    Stdin,
}

/// Runs a local model CLI once per prompt and returns its stdout.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
    prompt_via: PromptVia,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>, prompt_via: PromptVia) -> Self {
        Self {
            program: program.into(),
            args,
            prompt_via,
        }
    }

    fn command(&self, prompt: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        match self.prompt_via {
            PromptVia::Argument => {
                cmd.arg(prompt).stdin(Stdio::null());
            }
            PromptVia::Stdin => {
                cmd.stdin(Stdio::piped());
            }
        }
        cmd
    }

    fn map_spawn_error(&self, err: io::Error) -> GenerationError {
        if err.kind() == io::ErrorKind::NotFound {
            GenerationError::NotFound {
                program: self.program.clone(),
            }
        } else {
            GenerationError::Spawn(err)
        }
    }
}

impl TextBackend for CommandBackend {
    fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        log::debug!("running {} ({} byte prompt)", self.program, prompt.len());

        let mut child = self
            .command(prompt)
            .spawn()
            .map_err(|e| self.map_spawn_error(e))?;

        if self.prompt_via == PromptVia::Stdin
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin.write_all(prompt.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(GenerationError::Failed {
                status: output.status.code(),
                output: tail_string(&combined, OUTPUT_TAIL),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn tail_string(input: &str, max_len: usize) -> String {
    let trimmed = input.trim();
    if trimmed.len() <= max_len {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - max_len;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}
