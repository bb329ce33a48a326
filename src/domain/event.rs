use chrono::{DateTime, FixedOffset};
use serde::Serialize;

pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// A one-hour calendar event derived from a time mentioned in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: Option<String>,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// IANA zone label sent alongside the timestamps.
    pub time_zone: String,
    pub calendar_id: String,
}

/// Calendar v3 `events.insert` request body.
#[derive(Debug, Serialize)]
pub struct EventPayload<'a> {
    pub summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    pub start: EventTime<'a>,
    pub end: EventTime<'a>,
}

#[derive(Debug, Serialize)]
pub struct EventTime<'a> {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: &'a str,
}

impl CalendarEvent {
    pub fn payload(&self) -> EventPayload<'_> {
        EventPayload {
            summary: &self.summary,
            description: self.description.as_deref(),
            start: EventTime {
                date_time: self.start.to_rfc3339(),
                time_zone: &self.time_zone,
            },
            end: EventTime {
                date_time: self.end.to_rfc3339(),
                time_zone: &self.time_zone,
            },
        }
    }
}
