use std::cell::RefCell;
use std::collections::HashMap;

use base64::Engine as _;
use chrono::{DateTime, FixedOffset, Utc};
use mailparse::MailHeaderMap;
use serde_json::json;

use inbox_triage::domain::event::CalendarEvent;
use inbox_triage::domain::message::{InboundMessage, MessageRef};
use inbox_triage::error::{GenerationError, ProviderError};
use inbox_triage::generate::backend::TextBackend;
use inbox_triage::generate::prompt::PromptBuilder;
use inbox_triage::generate::{
    ACKNOWLEDGMENT_FALLBACK, Fallbacks, GenerationClient, SUMMARY_FALLBACK,
};
use inbox_triage::mail::MailProvider;
use inbox_triage::pipeline::{EventOutcome, Scheduling, SendOutcome, Triage};
use inbox_triage::schedule::calendar::CalendarProvider;
use inbox_triage::schedule::recognize::PhraseRecognizer;
use inbox_triage::schedule::{CalendarEventBuilder, EventExtractor};

const BODY: &str = "Let's meet tomorrow at 3pm to discuss the budget.";
const SUMMARY: &str = "- Meeting tomorrow at 3pm about the budget";
const ACK: &str = "Thanks for reaching out. I have received your email and will reply soon.";

// ── Fakes ───────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeMail {
    unread: Vec<MessageRef>,
    messages: HashMap<String, InboundMessage>,
    own: Option<String>,
    fail_list: bool,
    fail_send: bool,
    fail_modify: bool,
    sent: RefCell<Vec<(String, String)>>,
    marked: RefCell<Vec<String>>,
}

fn refused() -> ProviderError {
    ProviderError::Status {
        status: 500,
        body: "backend error".into(),
    }
}

impl FakeMail {
    fn with_message(mut self, msg: InboundMessage) -> Self {
        self.unread.push(MessageRef {
            id: msg.id.clone(),
            thread_id: msg.thread_id.clone(),
        });
        self.messages.insert(msg.id.clone(), msg);
        self
    }
}

impl MailProvider for FakeMail {
    fn list_unread(&self) -> Result<Vec<MessageRef>, ProviderError> {
        if self.fail_list {
            return Err(refused());
        }
        Ok(self.unread.clone())
    }

    fn get_full(&self, id: &str) -> Result<InboundMessage, ProviderError> {
        self.messages.get(id).cloned().ok_or(ProviderError::Status {
            status: 404,
            body: "not found".into(),
        })
    }

    fn send(&self, thread_id: &str, raw: &str) -> Result<(), ProviderError> {
        self.sent
            .borrow_mut()
            .push((thread_id.to_string(), raw.to_string()));
        if self.fail_send { Err(refused()) } else { Ok(()) }
    }

    fn remove_unread_label(&self, id: &str) -> Result<(), ProviderError> {
        self.marked.borrow_mut().push(id.to_string());
        if self.fail_modify { Err(refused()) } else { Ok(()) }
    }

    fn own_address(&self) -> Result<String, ProviderError> {
        self.own.clone().ok_or_else(refused)
    }
}

#[derive(Default)]
struct FakeCalendar {
    fail: bool,
    events: RefCell<Vec<CalendarEvent>>,
}

impl CalendarProvider for FakeCalendar {
    fn insert_event(&self, _calendar_id: &str, event: &CalendarEvent) -> Result<String, ProviderError> {
        self.events.borrow_mut().push(event.clone());
        if self.fail {
            return Err(refused());
        }
        Ok(format!("ev-{}", self.events.borrow().len()))
    }
}

/// Answers like a chatty local model: summaries with a lead-in, and
/// acknowledgments with the whole prompt echoed in front.
struct ChattyModel {
    fail: bool,
}

impl TextBackend for ChattyModel {
    fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        if self.fail {
            return Err(GenerationError::NotFound {
                program: "ollama".into(),
            });
        }
        if prompt.contains("Summarize") {
            Ok(format!("Here is the summary:\n{SUMMARY}\n"))
        } else {
            Ok(format!("{prompt}\n{ACK}"))
        }
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn message(id: &str, body: &str) -> InboundMessage {
    let data = base64::engine::general_purpose::URL_SAFE.encode(body);
    serde_json::from_value(json!({
        "id": id,
        "threadId": format!("thread-{id}"),
        "payload": {
            "mimeType": "multipart/alternative",
            "headers": [
                { "name": "From", "value": "Sam <s@y.com>" },
                { "name": "To", "value": "me@x.com" },
                { "name": "Cc", "value": "me@x.com, b@x.com" },
                { "name": "Subject", "value": "Budget" },
                { "name": "Message-ID", "value": format!("<{id}@y.com>") }
            ],
            "body": { "size": 0 },
            "parts": [
                { "mimeType": "text/plain", "body": { "data": data } },
                { "mimeType": "text/html", "body": { "data": "PGI-aGk8L2I-" } }
            ]
        }
    }))
    .unwrap()
}

fn offset() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
}

/// 2025-03-01T08:00:00+05:30, a Saturday.
fn fixed_clock() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-03-01T02:30:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn scheduling(calendar: &FakeCalendar) -> Scheduling<'_> {
    Scheduling {
        calendar,
        extractor: EventExtractor::new(Box::new(PhraseRecognizer), offset())
            .with_clock(fixed_clock),
        builder: CalendarEventBuilder::new("primary", "Asia/Kolkata"),
    }
}

fn triage<'a>(mail: &'a FakeMail, calendar: Option<&'a FakeCalendar>, model_fails: bool) -> Triage<'a> {
    Triage::new(
        mail,
        PromptBuilder::new("Sam"),
        GenerationClient::new(Box::new(ChattyModel { fail: model_fails }), Fallbacks::default()),
        calendar.map(scheduling),
    )
}

struct SentMail {
    thread_id: String,
    to: String,
    cc: Option<String>,
    subject: String,
    in_reply_to: Option<String>,
    references: Option<String>,
    body: String,
}

fn decode(sent: &(String, String)) -> SentMail {
    let bytes = base64::engine::general_purpose::URL_SAFE
        .decode(&sent.1)
        .unwrap();
    let parsed = mailparse::parse_mail(&bytes).unwrap();
    SentMail {
        thread_id: sent.0.clone(),
        to: parsed.headers.get_first_value("To").unwrap(),
        cc: parsed.headers.get_first_value("Cc"),
        subject: parsed.headers.get_first_value("Subject").unwrap(),
        in_reply_to: parsed.headers.get_first_value("In-Reply-To"),
        references: parsed.headers.get_first_value("References"),
        body: parsed.get_body().unwrap().replace("\r\n", "\n").trim().to_string(),
    }
}

fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

// ── End to end ──────────────────────────────────────────────────────

#[test]
fn meeting_request_is_summarized_acknowledged_and_scheduled() {
    let mail = FakeMail {
        own: Some("me@x.com".into()),
        ..FakeMail::default()
    }
    .with_message(message("m1", BODY));
    let calendar = FakeCalendar::default();

    let report = triage(&mail, Some(&calendar), false).run_once();

    assert_eq!(report.found, 1);
    assert!(report.skipped.is_empty());
    let m = &report.messages[0];
    assert_eq!(m.summary, SendOutcome::Sent);
    assert_eq!(m.acknowledgment, SendOutcome::Sent);
    assert_eq!(m.event, EventOutcome::Created("ev-1".into()));
    assert!(m.marked_read);

    let sent = mail.sent.borrow();
    assert_eq!(sent.len(), 2);

    let summary = decode(&sent[0]);
    assert_eq!(summary.thread_id, "thread-m1");
    assert!(summary.to.contains("me@x.com"));
    assert_eq!(summary.cc, None);
    assert_eq!(summary.subject, "Re: Budget");
    assert_eq!(summary.body, SUMMARY);

    let ack = decode(&sent[1]);
    assert_eq!(ack.thread_id, "thread-m1");
    assert!(ack.to.contains("s@y.com"));
    assert!(!ack.to.contains("me@x.com"));
    let cc = ack.cc.unwrap();
    assert!(cc.contains("b@x.com"));
    assert!(!cc.contains("me@x.com"));
    assert_eq!(ack.subject, "Re: Budget");
    assert_eq!(ack.in_reply_to.as_deref(), Some("<m1@y.com>"));
    assert_eq!(ack.references.as_deref(), Some("<m1@y.com>"));
    assert_eq!(ack.body, ACK);

    let events = calendar.events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].summary, "Budget");
    assert_eq!(events[0].description.as_deref(), Some(SUMMARY));
    assert_eq!(events[0].start, at("2025-03-02T15:00:00+05:30"));
    assert_eq!(events[0].end, at("2025-03-02T16:00:00+05:30"));
    assert_eq!(events[0].calendar_id, "primary");

    assert_eq!(*mail.marked.borrow(), vec!["m1".to_string()]);
}

#[test]
fn every_stage_is_attempted_when_providers_fail() {
    let mail = FakeMail {
        own: Some("me@x.com".into()),
        fail_send: true,
        fail_modify: true,
        ..FakeMail::default()
    }
    .with_message(message("m1", BODY));
    let calendar = FakeCalendar {
        fail: true,
        ..FakeCalendar::default()
    };

    let report = triage(&mail, Some(&calendar), false).run_once();

    let m = &report.messages[0];
    assert!(matches!(m.summary, SendOutcome::Failed(_)));
    assert!(matches!(m.acknowledgment, SendOutcome::Failed(_)));
    assert!(matches!(m.event, EventOutcome::Failed(_)));
    assert!(!m.marked_read);

    assert_eq!(mail.sent.borrow().len(), 2);
    assert_eq!(calendar.events.borrow().len(), 1);
    assert_eq!(mail.marked.borrow().len(), 1);
}

#[test]
fn generation_failure_sends_fallback_texts() {
    let mail = FakeMail {
        own: Some("me@x.com".into()),
        ..FakeMail::default()
    }
    .with_message(message("m1", BODY));

    let report = triage(&mail, None, true).run_once();

    let m = &report.messages[0];
    assert_eq!(m.summary, SendOutcome::Sent);
    assert_eq!(m.acknowledgment, SendOutcome::Sent);
    assert_eq!(m.event, EventOutcome::Disabled);

    let sent = mail.sent.borrow();
    assert_eq!(decode(&sent[0]).body, SUMMARY_FALLBACK);
    assert_eq!(decode(&sent[1]).body, ACKNOWLEDGMENT_FALLBACK);
}

// ── Batch behavior ──────────────────────────────────────────────────

#[test]
fn unfetchable_message_is_skipped_and_left_unread() {
    let mut mail = FakeMail {
        own: Some("me@x.com".into()),
        ..FakeMail::default()
    }
    .with_message(message("m2", "No dates here."));
    mail.unread.insert(
        0,
        MessageRef {
            id: "gone".into(),
            thread_id: "thread-gone".into(),
        },
    );
    let calendar = FakeCalendar::default();

    let report = triage(&mail, Some(&calendar), false).run_once();

    assert_eq!(report.found, 2);
    assert_eq!(report.skipped, vec!["gone".to_string()]);
    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].id, "m2");
    assert_eq!(report.messages[0].event, EventOutcome::NoEvent);
    assert!(calendar.events.borrow().is_empty());
    assert_eq!(*mail.marked.borrow(), vec!["m2".to_string()]);
}

#[test]
fn listing_failure_reports_zero_found() {
    let mail = FakeMail {
        fail_list: true,
        ..FakeMail::default()
    }
    .with_message(message("m1", BODY));

    let report = triage(&mail, None, false).run_once();

    assert_eq!(report.found, 0);
    assert!(report.messages.is_empty());
    assert!(mail.sent.borrow().is_empty());
    assert!(mail.marked.borrow().is_empty());
}

#[test]
fn empty_inbox_does_nothing() {
    let mail = FakeMail::default();
    let report = triage(&mail, None, false).run_once();
    assert_eq!(report.found, 0);
    assert!(mail.sent.borrow().is_empty());
}

// ── Own address ─────────────────────────────────────────────────────

#[test]
fn configured_address_stands_in_for_unreadable_profile() {
    let mail = FakeMail::default().with_message(message("m1", BODY));

    let report = triage(&mail, None, false)
        .with_fallback_address(Some("me@x.com".into()))
        .run_once();

    let m = &report.messages[0];
    assert_eq!(m.summary, SendOutcome::Sent);
    assert_eq!(m.acknowledgment, SendOutcome::Sent);
    assert!(decode(&mail.sent.borrow()[0]).to.contains("me@x.com"));
}

#[test]
fn unknown_own_address_skips_summary_and_fails_acknowledgment() {
    let mail = FakeMail::default().with_message(message("m1", BODY));

    let report = triage(&mail, None, false).run_once();

    let m = &report.messages[0];
    assert!(matches!(m.summary, SendOutcome::Skipped(_)));
    assert!(matches!(m.acknowledgment, SendOutcome::Failed(_)));
    assert!(m.marked_read);
    assert!(mail.sent.borrow().is_empty());
}

#[test]
fn signature_is_appended_to_acknowledgments_only() {
    let mail = FakeMail {
        own: Some("me@x.com".into()),
        ..FakeMail::default()
    }
    .with_message(message("m1", BODY));

    triage(&mail, None, false)
        .with_signature(Some("-- Sam".into()))
        .run_once();

    let sent = mail.sent.borrow();
    assert_eq!(decode(&sent[0]).body, SUMMARY);
    assert_eq!(decode(&sent[1]).body, format!("{ACK}\n\n-- Sam"));
}
