use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum RsvpResponse {
    Going,
    Maybe,
    Pass,
}

impl RsvpResponse {
    pub const ALL: [RsvpResponse; 3] = [RsvpResponse::Going, RsvpResponse::Maybe, RsvpResponse::Pass];

    pub fn as_str(self) -> &'static str {
        match self {
            RsvpResponse::Going => "going",
            RsvpResponse::Maybe => "maybe",
            RsvpResponse::Pass => "pass",
        }
    }
}

impl std::fmt::Display for RsvpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RsvpResponse {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "going" => Ok(RsvpResponse::Going),
            "maybe" => Ok(RsvpResponse::Maybe),
            "pass" => Ok(RsvpResponse::Pass),
            _ => Err("Invalid response".to_string()),
        }
    }
}

/// Status of one invited user as shown in the attendee roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendeeStatus {
    #[serde(rename = "going")]
    Going,
    #[serde(rename = "maybe")]
    Maybe,
    #[serde(rename = "not going")]
    NotGoing,
    #[serde(rename = "no response")]
    NoResponse,
}

impl From<Option<RsvpResponse>> for AttendeeStatus {
    fn from(response: Option<RsvpResponse>) -> Self {
        match response {
            Some(RsvpResponse::Going) => AttendeeStatus::Going,
            Some(RsvpResponse::Maybe) => AttendeeStatus::Maybe,
            Some(RsvpResponse::Pass) => AttendeeStatus::NotGoing,
            None => AttendeeStatus::NoResponse,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: String,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub organizer: String,
    pub created_at: String,
}

impl Event {
    /// Builds a row from an already validated request. `date` is the value
    /// [`NewEvent::validate`] parsed, stored zero-padded so that text
    /// comparison and ordering match calendar order.
    pub fn new(organizer: String, date: NaiveDate, new_event: NewEvent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: new_event.title.trim().to_string(),
            date: date.format(DATE_FORMAT).to_string(),
            time: non_blank(new_event.time),
            location: non_blank(new_event.location),
            description: non_blank(new_event.description),
            organizer,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, FromRow)]
pub struct Invitation {
    pub event_id: String,
    pub username: String,
    pub response: Option<RsvpResponse>,
    pub invited_at: String,
    pub responded_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewEvent {
    pub fn validate(&self) -> Result<NaiveDate, String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if self.title.chars().count() > 200 {
            return Err("Title must be under 200 characters".to_string());
        }
        if self.date.trim().is_empty() {
            return Err("Date is required".to_string());
        }
        NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT)
            .map_err(|_| "Date must be formatted as YYYY-MM-DD".to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rsvps {
    pub going: Vec<String>,
    pub maybe: Vec<String>,
    pub pass: Vec<String>,
}

/// An event as returned by the API, with its invite list and RSVP buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOut {
    pub id: String,
    pub title: String,
    pub date: String,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub organizer: String,
    pub attendees: Vec<String>,
    pub rsvps: Rsvps,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeEntry {
    pub username: String,
    pub status: AttendeeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeSummary {
    pub event_title: String,
    pub total_invited: usize,
    pub total_going: usize,
    pub total_maybe: usize,
    pub total_not_going: usize,
    pub no_response: usize,
    pub attendees: Vec<AttendeeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsvpRequest {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteRequest {
    pub usernames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteResult {
    pub message: String,
    pub invited: Vec<String>,
    pub already_invited: Vec<String>,
    pub total_invited: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}
