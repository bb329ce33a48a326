//! Gmail REST client behind [`MailProvider`].

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use crate::auth::session::Session;
use crate::domain::message::{InboundMessage, MessageRef};
use crate::error::ProviderError;
use crate::http::{build_client, checked, parse};
use crate::mail::MailProvider;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

const INBOX_LABEL: &str = "INBOX";
const UNREAD_LABEL: &str = "UNREAD";
const UNREAD_QUERY: &str = "is:unread";

pub struct GmailClient {
    http: Client,
    base_url: String,
    session: Session,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(rename = "emailAddress")]
    email_address: String,
}

impl GmailClient {
    pub fn new(session: Session) -> Result<Self, ProviderError> {
        Self::with_base_url(session, GMAIL_API_BASE)
    }

    pub fn with_base_url(
        session: Session,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/users/me/{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(self.session.bearer())
    }

    fn fetch_unread_page(&self, page_token: Option<&str>) -> Result<ListResponse, ProviderError> {
        let mut req = self
            .authed(self.http.get(self.url("messages")))
            .query(&[("labelIds", INBOX_LABEL), ("q", UNREAD_QUERY)]);
        if let Some(token) = page_token {
            req = req.query(&[("pageToken", token)]);
        }
        parse(checked(req.send()?)?)
    }
}

impl MailProvider for GmailClient {
    /// Follows `nextPageToken` until the listing is exhausted.
    fn list_unread(&self) -> Result<Vec<MessageRef>, ProviderError> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_unread_page(page_token.as_deref())?;
            out.extend(page.messages);
            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        log::debug!("listed {} unread messages", out.len());
        Ok(out)
    }

    fn get_full(&self, id: &str) -> Result<InboundMessage, ProviderError> {
        let req = self
            .authed(self.http.get(self.url(&format!("messages/{id}"))))
            .query(&[("format", "full")]);
        parse(checked(req.send()?)?)
    }

    fn send(&self, thread_id: &str, raw: &str) -> Result<(), ProviderError> {
        let req = self
            .authed(self.http.post(self.url("messages/send")))
            .json(&json!({ "raw": raw, "threadId": thread_id }));
        checked(req.send()?)?;
        Ok(())
    }

    fn remove_unread_label(&self, id: &str) -> Result<(), ProviderError> {
        let req = self
            .authed(self.http.post(self.url(&format!("messages/{id}/modify"))))
            .json(&json!({ "removeLabelIds": [UNREAD_LABEL] }));
        checked(req.send()?)?;
        Ok(())
    }

    fn own_address(&self) -> Result<String, ProviderError> {
        let req = self.authed(self.http.get(self.url("profile")));
        let profile: Profile = parse(checked(req.send()?)?)?;
        Ok(profile.email_address)
    }
}
