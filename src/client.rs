//! HTTP client for the event planner API.
//!
//! The bearer token lives in a [`Session`] handed to the client at
//! construction. Logging in starts the session and logging out ends it, so
//! several clients (or a client and a test) can share one session value.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::models::{
    AttendeeSummary, EventOut, InviteRequest, InviteResult, LoginRequest, Message, NewEvent,
    RsvpRequest, RsvpResponse, SearchParams, SignupRequest, TokenOut, UserOut,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Request { status: StatusCode, message: String },
    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),
    /// An authenticated call was made without an active session.
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("failed to reach server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Request { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, token: String) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn end(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_active(&self) -> bool {
        self.token().is_some()
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    detail: Option<serde_json::Value>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8000`.
    pub fn new(base_url: &str, session: Session) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// Attaches the session token, failing before any request when there is
    /// none.
    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.session.token().ok_or(ClientError::NotLoggedIn)?;
        Ok(req.bearer_auth(token))
    }

    fn maybe_authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let message = resp
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|err| err.detail)
                .and_then(|detail| detail.as_str().map(str::to_string))
                .unwrap_or_else(|| fallback.to_string());
            tracing::debug!(%status, %message, "request failed");
            return Err(ClientError::Request { status, message });
        }

        Ok(resp.json().await?)
    }

    /// POST /api/auth/signup
    pub async fn signup(&self, req: &SignupRequest) -> Result<UserOut, ClientError> {
        let url = self.url("api/auth/signup")?;
        self.send(self.http.post(url).json(req), "Signup failed").await
    }

    /// POST /api/auth/login, starting the session on success.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenOut, ClientError> {
        let url = self.url("api/auth/login")?;
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let token: TokenOut = self.send(self.http.post(url).json(&body), "Login failed").await?;
        self.session.begin(token.access_token.clone());
        Ok(token)
    }

    pub fn logout(&self) {
        self.session.end();
    }

    /// GET /api/users/me
    pub async fn me(&self) -> Result<UserOut, ClientError> {
        let url = self.url("api/users/me")?;
        self.send(self.authorized(self.http.get(url))?, "Failed to get user")
            .await
    }

    /// GET /api/events/
    pub async fn list_events(&self) -> Result<Vec<EventOut>, ClientError> {
        let url = self.url("api/events/")?;
        self.send(self.authorized(self.http.get(url))?, "Failed to fetch events")
            .await
    }

    /// GET /api/events/my/organized
    pub async fn my_organized(&self) -> Result<Vec<EventOut>, ClientError> {
        let url = self.url("api/events/my/organized")?;
        self.send(
            self.authorized(self.http.get(url))?,
            "Failed to fetch organized events",
        )
            .await
    }

    /// GET /api/events/my/invited
    pub async fn my_invited(&self) -> Result<Vec<EventOut>, ClientError> {
        let url = self.url("api/events/my/invited")?;
        self.send(
            self.authorized(self.http.get(url))?,
            "Failed to fetch invited events",
        )
            .await
    }

    /// GET /api/events/{id}. Works without a session, but then the roster
    /// comes back empty.
    pub async fn get_event(&self, event_id: &str) -> Result<EventOut, ClientError> {
        let url = self.url(&format!("api/events/{event_id}"))?;
        self.send(self.maybe_authorized(self.http.get(url)), "Failed to fetch event")
            .await
    }

    /// GET /api/events/{id}/attendees
    pub async fn attendees(&self, event_id: &str) -> Result<AttendeeSummary, ClientError> {
        let url = self.url(&format!("api/events/{event_id}/attendees"))?;
        self.send(self.authorized(self.http.get(url))?, "Failed to fetch attendees")
            .await
    }

    /// POST /api/events/
    pub async fn create_event(&self, event: &NewEvent) -> Result<EventOut, ClientError> {
        let url = self.url("api/events/")?;
        self.send(
            self.authorized(self.http.post(url).json(event))?,
            "Failed to create event",
        )
            .await
    }

    /// DELETE /api/events/{id}
    pub async fn delete_event(&self, event_id: &str) -> Result<Message, ClientError> {
        let url = self.url(&format!("api/events/{event_id}"))?;
        self.send(self.authorized(self.http.delete(url))?, "Failed to delete event")
            .await
    }

    /// POST /api/events/{id}/rsvp
    pub async fn rsvp(
        &self,
        event_id: &str,
        response: RsvpResponse,
    ) -> Result<EventOut, ClientError> {
        let url = self.url(&format!("api/events/{event_id}/rsvp"))?;
        let body = RsvpRequest {
            response: response.to_string(),
        };
        self.send(self.authorized(self.http.post(url).json(&body))?, "Failed to RSVP")
            .await
    }

    /// POST /api/events/{id}/invite
    pub async fn invite(
        &self,
        event_id: &str,
        usernames: &[String],
    ) -> Result<InviteResult, ClientError> {
        let url = self.url(&format!("api/events/{event_id}/invite"))?;
        let body = InviteRequest {
            usernames: usernames.to_vec(),
        };
        self.send(
            self.authorized(self.http.post(url).json(&body))?,
            "Failed to send invite",
        )
            .await
    }

    /// GET /api/events/search
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<EventOut>, ClientError> {
        let url = self.url("api/events/search")?;
        self.send(
            self.authorized(self.http.get(url).query(params))?,
            "Failed to search events",
        )
            .await
    }
}
