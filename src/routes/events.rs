use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{
    AttendeeSummary, Event, EventOut, InviteRequest, InviteResult, Invitation, Message, NewEvent,
    RsvpRequest, RsvpResponse, SearchParams, User, DATE_FORMAT,
};
use crate::roster::Roster;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events/", get(list_events).post(create_event))
        .route("/api/events/my/organized", get(list_organized))
        .route("/api/events/my/invited", get(list_invited))
        .route("/api/events/search", get(search_events))
        .route("/api/events/{id}", get(show_event).delete(delete_event))
        .route("/api/events/{id}/attendees", get(list_attendees))
        .route("/api/events/{id}/rsvp", post(rsvp))
        .route("/api/events/{id}/invite", post(invite))
}

async fn load_roster<'e, E>(executor: E, event_id: &str) -> Result<Roster, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let invitations: Vec<Invitation> =
        sqlx::query_as("SELECT * FROM invitations WHERE event_id = ? ORDER BY username")
            .bind(event_id)
            .fetch_all(executor)
            .await?;
    Ok(Roster::from_invitations(invitations))
}

async fn find_event<'e, E>(executor: E, id: &str) -> Result<Event, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let event: Option<Event> = sqlx::query_as("SELECT * FROM events WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    event.ok_or_else(|| AppError::not_found("Event not found"))
}

/// Only the organizer sees the whole roster; invited users see their own
/// entry and everyone else sees none.
fn event_out(event: Event, roster: &Roster, viewer: Option<&str>) -> EventOut {
    let roster = roster.visible_to(&event.organizer, viewer);
    EventOut {
        id: event.id,
        title: event.title,
        date: event.date,
        time: event.time,
        location: event.location,
        description: event.description,
        organizer: event.organizer,
        attendees: roster.attendees(),
        rsvps: roster.rsvps(),
        created_at: event.created_at,
    }
}

async fn with_rosters(
    db: &SqlitePool,
    events: Vec<Event>,
    viewer: &str,
) -> Result<Vec<EventOut>, sqlx::Error> {
    let mut out = Vec::with_capacity(events.len());
    for event in events {
        let roster = load_roster(db, &event.id).await?;
        out.push(event_out(event, &roster, Some(viewer)));
    }
    Ok(out)
}

fn require_organizer(event: &Event, user: &User, action: &str) -> Result<(), AppError> {
    if event.organizer != user.username {
        tracing::info!(
            event_id = %event.id,
            username = %user.username,
            "rejected non-organizer attempt to {action}"
        );
        return Err(AppError::forbidden(format!("Only organizer can {action}")));
    }
    Ok(())
}

async fn list_events(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<EventOut>>, AppError> {
    let events: Vec<Event> =
        sqlx::query_as("SELECT * FROM events ORDER BY date DESC, created_at DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(with_rosters(&state.db, events, &user.username).await?))
}

async fn list_organized(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<EventOut>>, AppError> {
    let events: Vec<Event> = sqlx::query_as(
        "SELECT * FROM events WHERE organizer = ? ORDER BY date DESC, created_at DESC",
    )
    .bind(&user.username)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(with_rosters(&state.db, events, &user.username).await?))
}

async fn list_invited(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<EventOut>>, AppError> {
    let events: Vec<Event> = sqlx::query_as(
        r#"
        SELECT e.* FROM events e
        JOIN invitations i ON i.event_id = e.id
        WHERE i.username = ?
        ORDER BY e.date DESC, e.created_at DESC
        "#,
    )
    .bind(&user.username)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(with_rosters(&state.db, events, &user.username).await?))
}

fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

async fn search_events(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<EventOut>>, AppError> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT e.* FROM events e WHERE 1 = 1");

    if let Some(keyword) = present(&params.keyword) {
        let pattern = like_pattern(keyword);
        query
            .push(" AND (LOWER(e.title) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(COALESCE(e.description, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(COALESCE(e.location, '')) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    if let Some(date) = present(&params.date) {
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| AppError::bad_request("Date must be formatted as YYYY-MM-DD"))?;
        query
            .push(" AND e.date = ")
            .push_bind(date.format(DATE_FORMAT).to_string());
    }

    match present(&params.role) {
        None => {}
        Some("organizer") => {
            query
                .push(" AND e.organizer = ")
                .push_bind(user.username.clone());
        }
        Some("attendee") | Some("invited") => {
            query
                .push(" AND e.id IN (SELECT event_id FROM invitations WHERE username = ")
                .push_bind(user.username.clone())
                .push(")");
        }
        Some(other) => {
            return Err(AppError::bad_request(format!("Unknown role filter: {other}")));
        }
    }

    query.push(" ORDER BY e.date DESC, e.created_at DESC");

    let events: Vec<Event> = query.build_query_as().fetch_all(&state.db).await?;
    Ok(Json(with_rosters(&state.db, events, &user.username).await?))
}

async fn show_event(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<EventOut>, AppError> {
    let event = find_event(&state.db, &id).await?;
    let roster = load_roster(&state.db, &id).await?;
    let viewer = viewer.map(|AuthUser(user)| user.username);
    Ok(Json(event_out(event, &roster, viewer.as_deref())))
}

async fn create_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<NewEvent>,
) -> Result<impl IntoResponse, AppError> {
    if !user.is_organizer() {
        return Err(AppError::forbidden("Only organizers can create events"));
    }
    let date = payload.validate().map_err(AppError::BadRequest)?;

    let event = Event::new(user.username, date, payload);

    sqlx::query(
        "INSERT INTO events (id, title, date, time, location, description, organizer, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&event.id)
    .bind(&event.title)
    .bind(&event.date)
    .bind(&event.time)
    .bind(&event.location)
    .bind(&event.description)
    .bind(&event.organizer)
    .bind(&event.created_at)
    .execute(&state.db)
    .await?;

    tracing::info!(event_id = %event.id, organizer = %event.organizer, "event created");

    let organizer = event.organizer.clone();
    Ok((
        StatusCode::CREATED,
        Json(event_out(event, &Roster::new(), Some(&organizer))),
    ))
}

async fn delete_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    let event = find_event(&state.db, &id).await?;
    require_organizer(&event, &user, "delete")?;

    sqlx::query("DELETE FROM events WHERE id = ? AND organizer = ?")
        .bind(&id)
        .bind(&user.username)
        .execute(&state.db)
        .await?;

    tracing::info!(event_id = %id, "event deleted");

    Ok(Json(Message {
        message: "Event deleted".to_string(),
    }))
}

async fn list_attendees(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AttendeeSummary>, AppError> {
    let event = find_event(&state.db, &id).await?;
    require_organizer(&event, &user, "view attendees")?;

    let roster = load_roster(&state.db, &id).await?;
    Ok(Json(roster.summary(&event.title)))
}

async fn rsvp(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<RsvpRequest>,
) -> Result<Json<EventOut>, AppError> {
    let response: RsvpResponse = payload.response.parse().map_err(AppError::BadRequest)?;
    let event = find_event(&state.db, &id).await?;

    let mut roster = load_roster(&state.db, &id).await?;
    let previous = roster
        .respond(&user.username, response)
        .map_err(|_| AppError::forbidden("You are not invited to this event"))?;

    // A single UPDATE swaps the bucket, so readers never see the user in two
    // buckets or in none.
    let now = chrono::Utc::now().to_rfc3339();
    let updated = sqlx::query(
        "UPDATE invitations SET response = ?, responded_at = ? WHERE event_id = ? AND username = ?",
    )
    .bind(response)
    .bind(&now)
    .bind(&id)
    .bind(&user.username)
    .execute(&state.db)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::forbidden("You are not invited to this event"));
    }

    tracing::info!(
        event_id = %id,
        username = %user.username,
        previous = ?previous,
        response = %response,
        "rsvp recorded"
    );

    let roster = load_roster(&state.db, &id).await?;
    Ok(Json(event_out(event, &roster, Some(&user.username))))
}

fn clean_usernames(usernames: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for name in usernames {
        let name = name.trim();
        if !name.is_empty() && !cleaned.iter().any(|n| n == name) {
            cleaned.push(name.to_string());
        }
    }
    cleaned
}

async fn invite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<InviteRequest>,
) -> Result<Json<InviteResult>, AppError> {
    let usernames = clean_usernames(payload.usernames);
    if usernames.is_empty() {
        return Err(AppError::bad_request("No usernames provided"));
    }

    let mut tx = state.db.begin().await?;

    let event = find_event(&mut *tx, &id).await?;
    require_organizer(&event, &user, "invite")?;

    let mut missing = Vec::new();
    for name in &usernames {
        let found: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;
        if found.is_none() {
            missing.push(name.as_str());
        }
    }
    if !missing.is_empty() {
        return Err(AppError::not_found(format!(
            "User not found: {}",
            missing.join(", ")
        )));
    }

    let mut roster = load_roster(&mut *tx, &id).await?;
    let outcome = roster.invite(&event.organizer, usernames);

    let now = chrono::Utc::now().to_rfc3339();
    for name in &outcome.invited {
        sqlx::query(
            "INSERT OR IGNORE INTO invitations (event_id, username, response, invited_at) VALUES (?, ?, NULL, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        event_id = %id,
        invited = outcome.invited.len(),
        already_invited = outcome.already_invited.len(),
        "invites recorded"
    );

    Ok(Json(InviteResult {
        message: format!("Invited {} user(s)", outcome.invited.len()),
        invited: outcome.invited,
        already_invited: outcome.already_invited,
        total_invited: roster.len(),
    }))
}
