//! Single-pass triage of the unread inbox.
//!
//! Each message goes through summary, acknowledgment, calendar event and
//! mark-read in that order. Every stage is attempted no matter how the
//! previous one went; only failing to fetch the message skips it, which
//! leaves it unread for the next pass.

use log::{debug, error, info, warn};

use crate::domain::message::{ExtractedContent, MessageRef, ReplyMode};
use crate::error::{ProviderError, TriageError};
use crate::generate::prompt::PromptBuilder;
use crate::generate::{GenerationClient, Intent};
use crate::mail::MailProvider;
use crate::mail::compose::ReplyComposer;
use crate::mail::extract::ContentExtractor;
use crate::schedule::calendar::CalendarProvider;
use crate::schedule::{CalendarEventBuilder, EventExtractor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Nothing to send to; no provider call was made.
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Provider event id.
    Created(String),
    NoEvent,
    Disabled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReport {
    pub id: String,
    pub thread_id: String,
    pub summary: SendOutcome,
    pub acknowledgment: SendOutcome,
    pub event: EventOutcome,
    pub marked_read: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Unread messages the listing returned.
    pub found: usize,
    pub messages: Vec<MessageReport>,
    /// Ids that could not be fetched and stay unread.
    pub skipped: Vec<String>,
}

/// Calendar side of the pipeline; absent when event creation is off.
pub struct Scheduling<'a> {
    pub calendar: &'a dyn CalendarProvider,
    pub extractor: EventExtractor,
    pub builder: CalendarEventBuilder,
}

pub struct Triage<'a> {
    mail: &'a dyn MailProvider,
    scheduling: Option<Scheduling<'a>>,
    extractor: ContentExtractor,
    prompts: PromptBuilder,
    generator: GenerationClient,
    fallback_address: Option<String>,
    signature: Option<String>,
}

impl<'a> Triage<'a> {
    pub fn new(
        mail: &'a dyn MailProvider,
        prompts: PromptBuilder,
        generator: GenerationClient,
        scheduling: Option<Scheduling<'a>>,
    ) -> Self {
        Self {
            mail,
            scheduling,
            extractor: ContentExtractor,
            prompts,
            generator,
            fallback_address: None,
            signature: None,
        }
    }

    /// Own address to use when the provider profile cannot be read.
    pub fn with_fallback_address(mut self, address: Option<String>) -> Self {
        self.fallback_address = address.filter(|a| !a.trim().is_empty());
        self
    }

    /// Appended to every acknowledgment after a blank line.
    pub fn with_signature(mut self, signature: Option<String>) -> Self {
        self.signature = signature.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn run_once(&self) -> BatchReport {
        let refs = match self.mail.list_unread() {
            Ok(refs) => refs,
            Err(e) => {
                error!("listing unread messages failed: {e}");
                Vec::new()
            }
        };

        let mut report = BatchReport {
            found: refs.len(),
            ..BatchReport::default()
        };
        info!("found {} unread messages", refs.len());
        if refs.is_empty() {
            return report;
        }

        let composer = ReplyComposer::new(self.resolve_own_address());

        for r in &refs {
            match self.process(&composer, r) {
                Ok(message) => report.messages.push(message),
                Err(e) => {
                    warn!("skipping message {}: {e}", r.id);
                    report.skipped.push(r.id.clone());
                }
            }
        }

        report
    }

    fn resolve_own_address(&self) -> Option<String> {
        match self.mail.own_address() {
            Ok(addr) => Some(addr),
            Err(e) => {
                warn!("could not read account profile: {e}");
                self.fallback_address.clone()
            }
        }
    }

    fn process(
        &self,
        composer: &ReplyComposer,
        r: &MessageRef,
    ) -> Result<MessageReport, TriageError> {
        let msg = self
            .mail
            .get_full(&r.id)
            .map_err(|source| TriageError::Fetch {
                id: r.id.clone(),
                source,
            })?;
        let content = self.extractor.extract(&msg);
        debug!("message {}: subject {:?}", msg.id, content.subject);

        let summary = self.generate(&msg.id, Intent::Summarize, &content.plain_text_body);
        let summary_outcome = self.send(&msg.id, composer, &content, &summary, ReplyMode::SelfOnly);

        let mut acknowledgment =
            self.generate(&msg.id, Intent::Acknowledge, &content.plain_text_body);
        if let Some(sig) = &self.signature {
            acknowledgment = format!("{acknowledgment}\n\n{sig}");
        }
        let ack_outcome = self.send(&msg.id, composer, &content, &acknowledgment, ReplyMode::ReplyAll);

        let event = self.schedule(&msg.id, &content, &summary);

        let marked_read = match self.mail.remove_unread_label(&msg.id) {
            Ok(()) => true,
            Err(e) => {
                warn!("message {}: could not mark as read: {e}", msg.id);
                false
            }
        };

        Ok(MessageReport {
            id: msg.id,
            thread_id: content.thread_id,
            summary: summary_outcome,
            acknowledgment: ack_outcome,
            event,
            marked_read,
        })
    }

    fn generate(&self, id: &str, intent: Intent, body: &str) -> String {
        let prompt = self.prompts.build(intent, body);
        let result = self.generator.generate(intent, &prompt);
        if let Some(e) = result.failure {
            warn!(
                "message {id}: {}; using fallback {}",
                TriageError::from(e),
                intent.label()
            );
        }
        result.cleaned_text
    }

    fn send(
        &self,
        id: &str,
        composer: &ReplyComposer,
        content: &ExtractedContent,
        text: &str,
        mode: ReplyMode,
    ) -> SendOutcome {
        let reply = match composer.compose(content, text, mode) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("message {id}: {mode:?} reply not sent: {e}");
                return SendOutcome::Skipped(e.to_string());
            }
        };

        let sent = composer
            .own_address()
            .ok_or(ProviderError::NoOwnAddress)
            .and_then(|from| reply.to_raw(from))
            .and_then(|raw| self.mail.send(&reply.thread_id, &raw));

        match sent {
            Ok(()) => {
                info!("message {id}: {mode:?} reply sent to {}", reply.recipients().join(", "));
                SendOutcome::Sent
            }
            Err(source) => {
                let e = TriageError::Send {
                    thread_id: reply.thread_id.clone(),
                    source,
                };
                warn!("message {id}: {e}");
                SendOutcome::Failed(e.to_string())
            }
        }
    }

    fn schedule(&self, id: &str, content: &ExtractedContent, summary: &str) -> EventOutcome {
        let Some(s) = &self.scheduling else {
            return EventOutcome::Disabled;
        };

        let start = s.extractor.extract(&content.plain_text_body);
        let Some(event) = s.builder.build(&content.subject, Some(summary), start) else {
            debug!("message {id}: no meeting time found");
            return EventOutcome::NoEvent;
        };

        match s.calendar.insert_event(&event.calendar_id, &event) {
            Ok(event_id) => {
                info!("message {id}: created event {event_id} at {}", event.start.to_rfc3339());
                EventOutcome::Created(event_id)
            }
            Err(source) => {
                let e = TriageError::Calendar(source);
                warn!("message {id}: {e}");
                EventOutcome::Failed(e.to_string())
            }
        }
    }
}
