//! Invite list and RSVP state of a single event.
//!
//! Every invited username maps to at most one response, so the going, maybe
//! and pass buckets can never overlap. Handlers build a [`Roster`] from the
//! stored invitations, apply the requested change to it, and persist only what
//! the roster accepted.

use std::collections::BTreeMap;

use crate::models::{AttendeeEntry, AttendeeStatus, AttendeeSummary, Invitation, RsvpResponse, Rsvps};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    responses: BTreeMap<String, Option<RsvpResponse>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InviteOutcome {
    /// Names added by this call, in request order.
    pub invited: Vec<String>,
    /// Names that were already on the list, or the organizer.
    pub already_invited: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotInvited(pub String);

impl std::fmt::Display for NotInvited {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is not invited to this event", self.0)
    }
}

impl std::error::Error for NotInvited {}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_invitations<I>(invitations: I) -> Self
    where
        I: IntoIterator<Item = Invitation>,
    {
        Self {
            responses: invitations
                .into_iter()
                .map(|inv| (inv.username, inv.response))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn is_invited(&self, username: &str) -> bool {
        self.responses.contains_key(username)
    }

    /// `None` when the user is not invited at all.
    pub fn response(&self, username: &str) -> Option<Option<RsvpResponse>> {
        self.responses.get(username).copied()
    }

    /// Adds every new name. Repeats and the organizer are reported back
    /// instead of being added twice.
    pub fn invite<I, S>(&mut self, organizer: &str, usernames: I) -> InviteOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut outcome = InviteOutcome::default();
        for username in usernames {
            let username = username.into();
            if username == organizer || self.responses.contains_key(&username) {
                if !outcome.already_invited.contains(&username) {
                    outcome.already_invited.push(username);
                }
                continue;
            }
            self.responses.insert(username.clone(), None);
            outcome.invited.push(username);
        }
        outcome
    }

    /// Replaces the user's previous response. Returns the response it replaced.
    pub fn respond(
        &mut self,
        username: &str,
        response: RsvpResponse,
    ) -> Result<Option<RsvpResponse>, NotInvited> {
        match self.responses.get_mut(username) {
            Some(slot) => Ok(slot.replace(response)),
            None => Err(NotInvited(username.to_string())),
        }
    }

    /// The part of the roster `viewer` may see: everything for the organizer,
    /// their own entry for an invited user, nothing for anyone else.
    pub fn visible_to(&self, organizer: &str, viewer: Option<&str>) -> Roster {
        match viewer {
            Some(name) if name == organizer => self.clone(),
            Some(name) => Roster {
                responses: self
                    .responses
                    .get_key_value(name)
                    .map(|(k, v)| (k.clone(), *v))
                    .into_iter()
                    .collect(),
            },
            None => Roster::new(),
        }
    }

    pub fn attendees(&self) -> Vec<String> {
        self.responses.keys().cloned().collect()
    }

    pub fn bucket(&self, response: RsvpResponse) -> Vec<String> {
        self.responses
            .iter()
            .filter(|(_, r)| **r == Some(response))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn count(&self, response: RsvpResponse) -> usize {
        self.responses
            .values()
            .filter(|r| **r == Some(response))
            .count()
    }

    pub fn rsvps(&self) -> Rsvps {
        Rsvps {
            going: self.bucket(RsvpResponse::Going),
            maybe: self.bucket(RsvpResponse::Maybe),
            pass: self.bucket(RsvpResponse::Pass),
        }
    }

    pub fn summary(&self, event_title: &str) -> AttendeeSummary {
        let total_going = self.count(RsvpResponse::Going);
        let total_maybe = self.count(RsvpResponse::Maybe);
        let total_not_going = self.count(RsvpResponse::Pass);
        AttendeeSummary {
            event_title: event_title.to_string(),
            total_invited: self.len(),
            total_going,
            total_maybe,
            total_not_going,
            no_response: self.len() - total_going - total_maybe - total_not_going,
            attendees: self
                .responses
                .iter()
                .map(|(username, response)| AttendeeEntry {
                    username: username.clone(),
                    status: AttendeeStatus::from(*response),
                })
                .collect(),
        }
    }
}
