//! Google Calendar v3 client behind [`CalendarProvider`].

use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use crate::auth::session::Session;
use crate::domain::event::CalendarEvent;
use crate::error::ProviderError;
use crate::http::{build_client, checked, parse};

pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

pub trait CalendarProvider {
    /// Creates the event and returns the provider's event id.
    fn insert_event(&self, calendar_id: &str, event: &CalendarEvent) -> Result<String, ProviderError>;
}

pub struct GoogleCalendar {
    http: Client,
    base_url: Url,
    session: Session,
}

#[derive(Debug, Deserialize)]
struct InsertedEvent {
    #[serde(default)]
    id: String,
}

impl GoogleCalendar {
    pub fn new(session: Session) -> Result<Self, ProviderError> {
        Self::with_base_url(session, CALENDAR_API_BASE)
    }

    pub fn with_base_url(
        session: Session,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let base_url = base_url.into();
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ProviderError::BaseUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            http: build_client()?,
            base_url,
            session,
        })
    }

    /// `{base}/calendars/{id}/events`, with the id escaped as one path segment.
    fn events_url(&self, calendar_id: &str) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);
        Ok(url)
    }
}

impl CalendarProvider for GoogleCalendar {
    fn insert_event(&self, calendar_id: &str, event: &CalendarEvent) -> Result<String, ProviderError> {
        let url = self.events_url(calendar_id)?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(self.session.bearer())
            .json(&event.payload())
            .send()?;
        let inserted: InsertedEvent = parse(checked(resp)?)?;
        Ok(inserted.id)
    }
}
