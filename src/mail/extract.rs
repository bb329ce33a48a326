//! Turns a provider message into the fields the pipeline works with.

use crate::domain::message::{ExtractedContent, Header, InboundMessage, MessagePart};
use crate::error::TriageError;
use crate::mail::address::parse_address_list;
use crate::mail::decoders::decode_body_data;

pub const NO_SUBJECT: &str = "No Subject";
pub const UNDECODABLE_BODY: &str = "(Unable to decode message body)";

const PLAIN_TEXT: &str = "text/plain";

#[derive(Debug, Default, Clone, Copy)]
pub struct ContentExtractor;

impl ContentExtractor {
    /// Never fails: an unreadable body becomes [`UNDECODABLE_BODY`] so the
    /// message can still be answered and marked read.
    pub fn extract(&self, msg: &InboundMessage) -> ExtractedContent {
        let headers = &msg.payload.headers;

        let plain_text_body = match resolve_body(&msg.payload) {
            Ok(body) => body,
            Err(e) => {
                log::warn!("message {}: {e}; using placeholder body", msg.id);
                UNDECODABLE_BODY.to_string()
            }
        };

        ExtractedContent {
            subject: header(headers, "Subject")
                .unwrap_or(NO_SUBJECT)
                .to_string(),
            sender_address: header(headers, "From").unwrap_or_default().trim().to_string(),
            cc_addresses: parse_address_list(header(headers, "Cc").unwrap_or_default()),
            thread_id: msg.thread_id.clone(),
            in_reply_to_id: header(headers, "Message-ID")
                .or_else(|| header(headers, "Message-Id"))
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            references: header(headers, "References")
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            plain_text_body,
        }
    }
}

/// First header with exactly this name.
pub fn header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.as_str())
}

fn resolve_body(payload: &MessagePart) -> Result<String, TriageError> {
    let data = first_plain_text(&payload.parts)
        .or(payload.body.data.as_deref())
        .ok_or_else(|| TriageError::Decode("message has no inline body data".into()))?;

    decode_body_data(data).map_err(|e| TriageError::Decode(e.to_string()))
}

/// Depth-first, document order. Parts without inline data (attachments
/// referenced by id) are skipped.
fn first_plain_text(parts: &[MessagePart]) -> Option<&str> {
    for part in parts {
        if part.mime_type == PLAIN_TEXT
            && let Some(data) = part.body.data.as_deref()
        {
            return Some(data);
        }
        if let Some(found) = first_plain_text(&part.parts) {
            return Some(found);
        }
    }
    None
}
