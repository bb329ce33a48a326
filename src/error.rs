//! Error types for the triage pipeline.

/// Failure classes of a single triage obligation.
///
/// None of these abort a batch: the pipeline logs them and moves on to the
/// next stage or the next message.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("failed to fetch message {id}: {source}")]
    Fetch {
        id: String,
        #[source]
        source: ProviderError,
    },

    #[error("failed to decode message body: {0}")]
    Decode(String),

    #[error("generation backend failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("no valid recipients for reply in thread {thread_id}")]
    NoValidRecipients { thread_id: String },

    #[error("failed to send reply in thread {thread_id}: {source}")]
    Send {
        thread_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("failed to create calendar event: {0}")]
    Calendar(#[source] ProviderError),
}

/// Errors raised by the mail and calendar provider clients.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("could not build outbound message: {0}")]
    Compose(String),

    #[error("own account address unavailable")]
    NoOwnAddress,

    #[error("invalid API base URL: {0}")]
    BaseUrl(String),
}

/// Errors from invoking the text-generation backend.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation program `{program}` not found")]
    NotFound { program: String },

    #[error("failed to run generation program: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("generation program exited with status {status:?}: {output}")]
    Failed { status: Option<i32>, output: String },
}
