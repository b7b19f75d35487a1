//! Event lists as one signed-in user sees them.
//!
//! Every mutating command goes through the API client and is followed by a
//! full reload of the lists; local state is never patched in place. A failed
//! command leaves the lists as they were and records the error message.

use crate::client::{ApiClient, ClientError};
use crate::forms::{parse_usernames, LoginForm, SignupForm};
use crate::models::{
    AttendeeSummary, EventOut, InviteResult, NewEvent, Role, RsvpResponse, SearchParams, UserOut,
};

#[derive(Debug, Clone, Default)]
pub struct EventBoard {
    pub user: Option<UserOut>,
    pub events: Vec<EventOut>,
    pub organized: Vec<EventOut>,
    pub invited: Vec<EventOut>,
    pub error: Option<String>,
}

impl EventBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_organizer(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|u| u.role == Role::Organizer)
    }

    /// The current user's RSVP for an event in the loaded lists.
    pub fn my_response(&self, event_id: &str) -> Option<RsvpResponse> {
        let username = &self.user.as_ref()?.username;
        let event = self
            .events
            .iter()
            .chain(&self.invited)
            .find(|e| e.id == event_id)?;
        let has = |bucket: &Vec<String>| bucket.iter().any(|n| n == username);
        if has(&event.rsvps.going) {
            Some(RsvpResponse::Going)
        } else if has(&event.rsvps.maybe) {
            Some(RsvpResponse::Maybe)
        } else if has(&event.rsvps.pass) {
            Some(RsvpResponse::Pass)
        } else {
            None
        }
    }

    fn fail<T>(&mut self, err: ClientError) -> Result<T, ClientError> {
        self.error = Some(err.to_string());
        Err(err)
    }

    pub async fn sign_up(
        &mut self,
        client: &ApiClient,
        form: &SignupForm,
    ) -> Result<(), ClientError> {
        let request = match form.validate() {
            Ok(request) => request,
            Err(msg) => return self.fail(ClientError::Validation(msg)),
        };
        if let Err(e) = client.signup(&request).await {
            return self.fail(e);
        }
        self.log_in(
            client,
            &LoginForm {
                username: request.username,
                password: request.password,
            },
        )
        .await
    }

    pub async fn log_in(&mut self, client: &ApiClient, form: &LoginForm) -> Result<(), ClientError> {
        let request = match form.validate() {
            Ok(request) => request,
            Err(msg) => return self.fail(ClientError::Validation(msg)),
        };
        if let Err(e) = client.login(&request.username, &request.password).await {
            return self.fail(e);
        }
        self.refresh(client).await
    }

    pub fn log_out(&mut self, client: &ApiClient) {
        client.logout();
        *self = Self::default();
    }

    /// Reloads the user and all three lists. Nothing is replaced unless every
    /// request succeeds.
    pub async fn refresh(&mut self, client: &ApiClient) -> Result<(), ClientError> {
        let loaded = async {
            let user = client.me().await?;
            let events = client.list_events().await?;
            let organized = client.my_organized().await?;
            let invited = client.my_invited().await?;
            Ok::<_, ClientError>((user, events, organized, invited))
        }
        .await;

        match loaded {
            Ok((user, events, organized, invited)) => {
                self.user = Some(user);
                self.events = events;
                self.organized = organized;
                self.invited = invited;
                self.error = None;
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    async fn settle<T>(
        &mut self,
        client: &ApiClient,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        match result {
            Ok(value) => {
                self.refresh(client).await?;
                Ok(value)
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn create_event(
        &mut self,
        client: &ApiClient,
        event: NewEvent,
    ) -> Result<EventOut, ClientError> {
        if let Err(msg) = event.validate() {
            return self.fail(ClientError::Validation(msg));
        }
        let result = client.create_event(&event).await;
        self.settle(client, result).await
    }

    pub async fn delete_event(
        &mut self,
        client: &ApiClient,
        event_id: &str,
    ) -> Result<(), ClientError> {
        let result = client.delete_event(event_id).await.map(|_| ());
        self.settle(client, result).await
    }

    /// `input` is the raw comma separated invite box.
    pub async fn invite(
        &mut self,
        client: &ApiClient,
        event_id: &str,
        input: &str,
    ) -> Result<InviteResult, ClientError> {
        let usernames = match parse_usernames(input) {
            Ok(usernames) => usernames,
            Err(msg) => return self.fail(ClientError::Validation(msg)),
        };
        let result = client.invite(event_id, &usernames).await;
        self.settle(client, result).await
    }

    pub async fn rsvp(
        &mut self,
        client: &ApiClient,
        event_id: &str,
        response: RsvpResponse,
    ) -> Result<EventOut, ClientError> {
        let result = client.rsvp(event_id, response).await;
        self.settle(client, result).await
    }

    pub async fn attendees(
        &mut self,
        client: &ApiClient,
        event_id: &str,
    ) -> Result<AttendeeSummary, ClientError> {
        match client.attendees(event_id).await {
            Ok(summary) => Ok(summary),
            Err(e) => self.fail(e),
        }
    }

    /// Search results are returned, not stored; the board lists stay as loaded.
    pub async fn search(
        &mut self,
        client: &ApiClient,
        params: &SearchParams,
    ) -> Result<Vec<EventOut>, ClientError> {
        match client.search(params).await {
            Ok(events) => Ok(events),
            Err(e) => self.fail(e),
        }
    }
}
