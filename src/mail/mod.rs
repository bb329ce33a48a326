pub mod address;
pub mod compose;
pub mod decoders;
pub mod extract;
pub mod gmail;

use crate::domain::message::{InboundMessage, MessageRef};
use crate::error::ProviderError;

/// The mail account the pipeline triages. Every call may fail with a
/// transport error; callers never assume success.
pub trait MailProvider {
    fn list_unread(&self) -> Result<Vec<MessageRef>, ProviderError>;
    fn get_full(&self, id: &str) -> Result<InboundMessage, ProviderError>;
    /// `raw` is the base64url-encoded RFC 5322 message.
    fn send(&self, thread_id: &str, raw: &str) -> Result<(), ProviderError>;
    fn remove_unread_label(&self, id: &str) -> Result<(), ProviderError>;
    fn own_address(&self) -> Result<String, ProviderError>;
}
