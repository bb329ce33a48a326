//! Meeting-time extraction and calendar event construction.

pub mod calendar;
pub mod recognize;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

use crate::domain::event::{CalendarEvent, DEFAULT_CALENDAR_ID};
use crate::schedule::recognize::TimeRecognizer;

/// Events created from mail always last this long.
pub const EVENT_LENGTH_MINUTES: i64 = 60;

pub struct EventExtractor {
    recognizer: Box<dyn TimeRecognizer>,
    offset: FixedOffset,
    clock: fn() -> DateTime<Utc>,
}

impl EventExtractor {
    /// Relative phrases resolve against the current time in `offset`.
    pub fn new(recognizer: Box<dyn TimeRecognizer>, offset: FixedOffset) -> Self {
        Self {
            recognizer,
            offset,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn extract(&self, body: &str) -> Option<DateTime<FixedOffset>> {
        let now = (self.clock)().with_timezone(&self.offset);
        self.extract_at(body, now)
    }

    pub fn extract_at(
        &self,
        body: &str,
        now: DateTime<FixedOffset>,
    ) -> Option<DateTime<FixedOffset>> {
        self.recognizer.recognize(body, now)
    }
}

#[derive(Debug, Clone)]
pub struct CalendarEventBuilder {
    calendar_id: String,
    time_zone: String,
}

impl CalendarEventBuilder {
    pub fn new(calendar_id: impl Into<String>, time_zone: impl Into<String>) -> Self {
        let calendar_id = calendar_id.into();
        Self {
            calendar_id: if calendar_id.trim().is_empty() {
                DEFAULT_CALENDAR_ID.to_string()
            } else {
                calendar_id
            },
            time_zone: time_zone.into(),
        }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// `None` when no start time was found; no event is created then.
    pub fn build(
        &self,
        summary: &str,
        description: Option<&str>,
        start: Option<DateTime<FixedOffset>>,
    ) -> Option<CalendarEvent> {
        let start = start?;
        let end = start.checked_add_signed(TimeDelta::minutes(EVENT_LENGTH_MINUTES))?;

        Some(CalendarEvent {
            summary: summary.to_string(),
            description: description.map(str::to_string),
            start,
            end,
            time_zone: self.time_zone.clone(),
            calendar_id: self.calendar_id.clone(),
        })
    }
}
