//! Google Calendar integration: OAuth authorization-code flow and event
//! creation against the Calendar v3 REST API.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::db::Platform;

/// Calendar events are created with a fixed 30-minute duration.
const EVENT_DURATION_MINUTES: i64 = 30;

/// Fixed timezone for event start/end times.
const EVENT_TIMEZONE: &str = "America/Denver";

const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

static PUBLISH_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*(AM|PM)$").expect("valid regex"));

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Google Calendar credentials are not configured")]
    NotConfigured,
    #[error("Google API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("request to Google API failed")]
    Request(#[from] reqwest::Error),
    #[error("Google OAuth did not return a refresh token")]
    MissingRefreshToken,
}

/// Tokens returned by the OAuth code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// The fields of a content item that become a calendar event.
#[derive(Debug, Clone)]
pub struct EventDetails<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// YYYY-MM-DD
    pub date: &'a str,
    /// "9:00 AM" format
    pub time: &'a str,
    pub platform: Platform,
}

/// A created calendar event.
#[derive(Debug, Clone)]
pub struct CreatedEvent {
    pub event_id: String,
    pub html_link: String,
}

#[derive(Debug, Serialize)]
struct EventRequest<'a> {
    summary: String,
    description: &'a str,
    start: EventTime,
    end: EventTime,
    #[serde(rename = "colorId")]
    color_id: &'static str,
}

#[derive(Debug, Serialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: &'static str,
}

#[derive(Debug, Deserialize)]
struct EventResponse {
    id: Option<String>,
    #[serde(rename = "htmlLink")]
    html_link: Option<String>,
}

/// Client for the Google Calendar API and its OAuth token endpoints.
#[derive(Debug, Clone)]
pub struct GoogleCalendar {
    http: Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    calendar_id: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    api_base: String,
}

impl GoogleCalendar {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            calendar_id: config.google_calendar_id.clone(),
            redirect_uri: config.google_redirect_uri(),
            auth_url: config.google_auth_url.clone(),
            token_url: config.google_token_url.clone(),
            api_base: config.google_api_base.clone(),
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    fn credentials(&self) -> Result<(&str, &str), CalendarError> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(CalendarError::NotConfigured),
        }
    }

    /// Build the consent-screen URL for the authorization-code flow.
    /// `state` carries the user id through the round trip.
    pub fn authorization_url(&self, state: &str) -> Result<String, CalendarError> {
        let (client_id, _) = self.credentials()?;

        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&access_type=offline&prompt=consent&scope={}&state={}",
            self.auth_url,
            urlencoding::encode(client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(OAUTH_SCOPE),
            urlencoding::encode(state),
        ))
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, CalendarError> {
        let (client_id, client_secret) = self.credentials()?;

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", &self.redirect_uri),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }

    /// Exchange a stored refresh token for a short-lived access token.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, CalendarError> {
        let (client_id, client_secret) = self.credentials()?;

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: RefreshResponse = response.json().await?;
        Ok(body.access_token)
    }

    /// Create one calendar event for a content item.
    pub async fn create_event(
        &self,
        access_token: &str,
        event: &EventDetails<'_>,
    ) -> Result<CreatedEvent, CalendarError> {
        self.credentials()?;

        let start = parse_publish_datetime(event.date, event.time);
        let end = start + chrono::Duration::minutes(EVENT_DURATION_MINUTES);

        let request = EventRequest {
            summary: format!("[{}] {}", event.platform.as_str(), event.title),
            description: event.description,
            start: EventTime {
                date_time: start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                time_zone: EVENT_TIMEZONE,
            },
            end: EventTime {
                date_time: end.format("%Y-%m-%dT%H:%M:%S").to_string(),
                time_zone: EVENT_TIMEZONE,
            },
            color_id: platform_color_id(event.platform),
        };

        let response = self
            .http
            .post(format!(
                "{}/calendar/v3/calendars/{}/events",
                self.api_base,
                urlencoding::encode(&self.calendar_id)
            ))
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: EventResponse = response.json().await?;

        Ok(CreatedEvent {
            event_id: body.id.unwrap_or_default(),
            html_link: body.html_link.unwrap_or_default(),
        })
    }
}

/// Parse a publish date and "h:MM AM/PM" time into a naive datetime,
/// falling back to 09:00 when the time doesn't match.
fn parse_publish_datetime(date: &str, time: &str) -> NaiveDateTime {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid date"));

    let parsed_time = PUBLISH_TIME_RE.captures(time.trim()).and_then(|caps| {
        let mut hours: u32 = caps[1].parse().ok()?;
        let minutes: u32 = caps[2].parse().ok()?;
        let period = caps[3].to_ascii_uppercase();

        if period == "PM" && hours != 12 {
            hours += 12;
        }
        if period == "AM" && hours == 12 {
            hours = 0;
        }

        NaiveTime::from_hms_opt(hours, minutes, 0)
    });

    let time_of_day =
        parsed_time.unwrap_or_else(|| NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"));

    day.and_time(time_of_day)
}

/// Google Calendar color IDs, keyed by platform.
fn platform_color_id(platform: Platform) -> &'static str {
    match platform {
        Platform::Igfb => "7",     // Peacock (cyan)
        Platform::LinkedIn => "1", // Lavender (blue)
        Platform::Blog => "9",     // Blueberry (indigo)
        Platform::YouTube => "11", // Tomato (red)
        Platform::X => "8",        // Graphite (gray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_publish_datetime() {
        let dt = parse_publish_datetime("2026-03-02", "9:00 AM");
        assert_eq!(dt.format("%Y-%m-%dT%H:%M:%S").to_string(), "2026-03-02T09:00:00");

        let dt = parse_publish_datetime("2026-03-02", "2:30 PM");
        assert_eq!(dt.format("%H:%M").to_string(), "14:30");

        let dt = parse_publish_datetime("2026-03-02", "12:00 AM");
        assert_eq!(dt.format("%H:%M").to_string(), "00:00");

        let dt = parse_publish_datetime("2026-03-02", "12:15 PM");
        assert_eq!(dt.format("%H:%M").to_string(), "12:15");
    }

    #[test]
    fn test_parse_publish_datetime_fallback() {
        // Unparseable time falls back to 9:00 AM
        let dt = parse_publish_datetime("2026-03-02", "morning");
        assert_eq!(dt.format("%H:%M").to_string(), "09:00");
    }

    #[test]
    fn test_platform_color_ids() {
        assert_eq!(platform_color_id(Platform::Igfb), "7");
        assert_eq!(platform_color_id(Platform::LinkedIn), "1");
        assert_eq!(platform_color_id(Platform::Blog), "9");
        assert_eq!(platform_color_id(Platform::YouTube), "11");
        assert_eq!(platform_color_id(Platform::X), "8");
    }

    #[test]
    fn test_event_duration() {
        let start = parse_publish_datetime("2026-03-02", "9:00 AM");
        let end = start + chrono::Duration::minutes(EVENT_DURATION_MINUTES);
        assert_eq!(end.format("%H:%M").to_string(), "09:30");
    }
}
