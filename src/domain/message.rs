use serde::Deserialize;

pub type MessageId = String;

/// Listing entry returned by the provider's unread query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageRef {
    pub id: MessageId,
    #[serde(rename = "threadId")]
    pub thread_id: String,
}

/// A full message as the mail provider hands it out (`format=full`).
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub id: MessageId,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    #[serde(default)]
    pub payload: MessagePart,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePart {
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    /// URL-safe base64 of the part content.
    pub data: Option<String>,
}

/// Fields the pipeline reads out of an [`InboundMessage`], derived once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub subject: String,
    /// Raw `From` header value, possibly with a display name.
    pub sender_address: String,
    pub cc_addresses: Vec<String>,
    pub thread_id: String,
    /// `Message-ID` of the original, used for threading headers.
    pub in_reply_to_id: Option<String>,
    pub references: Option<String>,
    pub plain_text_body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Addressed to the account's own address (summary delivery).
    SelfOnly,
    /// Sender plus every Cc recipient, minus the account itself.
    ReplyAll,
}

/// A send-ready reply. Built per send and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    pub to: Vec<String>,
    pub cc: Option<Vec<String>>,
    pub subject: String,
    pub body: String,
    pub thread_id: String,
    pub in_reply_to: Option<String>,
    pub references: Option<String>,
}

impl OutboundReply {
    /// Every addressee, `to` first.
    pub fn recipients(&self) -> Vec<&str> {
        self.to
            .iter()
            .chain(self.cc.iter().flatten())
            .map(String::as_str)
            .collect()
    }
}
