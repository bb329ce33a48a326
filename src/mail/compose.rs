//! Reply construction: recipients, threading headers and the wire form.

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use log::warn;

use crate::domain::message::{ExtractedContent, OutboundReply, ReplyMode};
use crate::error::{ProviderError, TriageError};
use crate::mail::address::{parse_address_list, push_unique};
use crate::mail::decoders::encode_raw_message;

const REPLY_PREFIX: &str = "Re: ";

#[derive(Debug, Clone)]
pub struct ReplyComposer {
    own_address: Option<String>,
}

impl ReplyComposer {
    /// `own_address` is `None` when the account profile could not be read;
    /// self-only replies then fail and reply-all skips self filtering.
    pub fn new(own_address: Option<String>) -> Self {
        Self {
            own_address: own_address
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        }
    }

    pub fn own_address(&self) -> Option<&str> {
        self.own_address.as_deref()
    }

    pub fn compose(
        &self,
        content: &ExtractedContent,
        reply_text: &str,
        mode: ReplyMode,
    ) -> Result<OutboundReply, TriageError> {
        let (to, cc) = match mode {
            ReplyMode::SelfOnly => match &self.own_address {
                Some(own) => (vec![own.clone()], None),
                None => (Vec::new(), None),
            },
            ReplyMode::ReplyAll => self.reply_all_recipients(content),
        };

        if to.is_empty() {
            return Err(TriageError::NoValidRecipients {
                thread_id: content.thread_id.clone(),
            });
        }

        // Subjects that already start with "Re:" are prefixed again on purpose.
        let subject = format!("{REPLY_PREFIX}{}", content.subject);

        Ok(OutboundReply {
            to,
            cc,
            subject,
            body: reply_text.to_string(),
            thread_id: content.thread_id.clone(),
            in_reply_to: content.in_reply_to_id.clone(),
            references: references_for(content),
        })
    }

    fn reply_all_recipients(&self, content: &ExtractedContent) -> (Vec<String>, Option<Vec<String>>) {
        let mut seen: Vec<String> = Vec::new();
        if let Some(own) = &self.own_address {
            // Seed with self so it is filtered like any duplicate.
            seen.push(own.clone());
        }

        let mut to = Vec::new();
        for addr in parse_address_list(&content.sender_address) {
            if push_unique(&mut seen, &addr) {
                to.push(addr);
            }
        }

        let mut cc = Vec::new();
        for addr in &content.cc_addresses {
            if push_unique(&mut seen, addr.trim()) {
                cc.push(addr.trim().to_string());
            }
        }

        if to.is_empty() {
            return (cc, None);
        }
        (to, Some(cc).filter(|c| !c.is_empty()))
    }
}

/// Original `References` chain extended with the original `Message-ID`.
fn references_for(content: &ExtractedContent) -> Option<String> {
    let id = content.in_reply_to_id.as_deref()?;
    match content.references.as_deref() {
        Some(refs) if refs.split_whitespace().any(|r| r == id) => Some(refs.to_string()),
        Some(refs) => Some(format!("{refs} {id}")),
        None => Some(id.to_string()),
    }
}

impl OutboundReply {
    /// RFC 5322 bytes with `from` as the sender.
    ///
    /// Recipients that do not parse as a mailbox are left out with a
    /// warning; cc moves up to `To` when no `To` entry survives.
    pub fn to_mime(&self, from: &str) -> Result<Vec<u8>, ProviderError> {
        let mut to = deliverable(&self.to);
        let mut cc = deliverable(self.cc.as_deref().unwrap_or_default());
        if to.is_empty() {
            to = std::mem::take(&mut cc);
        }
        if to.is_empty() {
            return Err(ProviderError::Compose("no deliverable recipients".into()));
        }

        let mut builder = Message::builder()
            .from(mailbox(from)?)
            .subject(self.subject.as_str());

        for addr in to {
            builder = builder.to(addr);
        }
        for addr in cc {
            builder = builder.cc(addr);
        }
        if let Some(id) = &self.in_reply_to {
            builder = builder.in_reply_to(id.clone());
        }
        if let Some(refs) = &self.references {
            builder = builder.references(refs.clone());
        }

        let message = builder
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())
            .map_err(|e| ProviderError::Compose(e.to_string()))?;

        Ok(message.formatted())
    }

    /// The base64url `raw` field for the provider send call.
    pub fn to_raw(&self, from: &str) -> Result<String, ProviderError> {
        Ok(encode_raw_message(&self.to_mime(from)?))
    }
}

fn deliverable(addrs: &[String]) -> Vec<Mailbox> {
    addrs
        .iter()
        .filter_map(|addr| match addr.parse::<Mailbox>() {
            Ok(mailbox) => Some(mailbox),
            Err(e) => {
                warn!("dropping recipient {addr:?}: {e}");
                None
            }
        })
        .collect()
}

fn mailbox(addr: &str) -> Result<Mailbox, ProviderError> {
    addr.parse::<Mailbox>()
        .map_err(|e| ProviderError::Compose(format!("invalid address {addr:?}: {e}")))
}
