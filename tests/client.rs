mod common;

use common::{TestApp, PASSWORD};
use event_planner::client::{ApiClient, ClientError, Session};
use event_planner::forms::{LoginForm, SignupForm};
use event_planner::models::{NewEvent, Role, RsvpResponse, SearchParams, SignupRequest};
use event_planner::view::EventBoard;
use reqwest::StatusCode;

async fn connect() -> (TestApp, String) {
    let app = TestApp::new().await;
    let base = app.spawn().await;
    (app, base)
}

fn client(base: &str) -> ApiClient {
    ApiClient::new(base, Session::new()).unwrap()
}

fn signup_form(username: &str, role: Role) -> SignupForm {
    SignupForm {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
        role,
    }
}

fn meetup() -> NewEvent {
    NewEvent {
        title: "Design Meetup".to_string(),
        date: "2025-03-14".to_string(),
        time: Some("18:00".to_string()),
        location: Some("Studio 4".to_string()),
        description: None,
    }
}

#[tokio::test]
async fn login_starts_and_logout_ends_session() {
    let (_app, base) = connect().await;
    let api = client(&base);

    let user = api
        .signup(&SignupRequest {
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: PASSWORD.to_string(),
            role: Role::User,
        })
        .await
        .unwrap();
    assert_eq!(user.username, "bob");
    assert!(!api.session().is_active());

    api.login("bob", PASSWORD).await.unwrap();
    assert!(api.session().is_active());
    assert_eq!(api.me().await.unwrap().username, "bob");

    api.logout();
    let err = api.me().await.unwrap_err();
    assert!(matches!(err, ClientError::NotLoggedIn));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn error_message_comes_from_detail() {
    let (_app, base) = connect().await;
    let api = client(&base);

    let err = api.login("nobody", PASSWORD).await.unwrap_err();
    assert!(matches!(err, ClientError::Request { .. }));
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!api.session().is_active());
}

#[tokio::test]
async fn error_message_falls_back_without_detail() {
    let (_app, base) = connect().await;

    // Unrouted paths answer 404 with an empty body.
    let err = client(&format!("{base}/nowhere"))
        .get_event("abc")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.to_string(), "Failed to fetch event");
}

#[tokio::test]
async fn shared_session_is_visible_to_every_client() {
    let (app, base) = connect().await;
    app.signup("bob", "user").await;

    let session = Session::new();
    let first = ApiClient::new(&base, session.clone()).unwrap();
    let second = ApiClient::new(&base, session.clone()).unwrap();

    first.login("bob", PASSWORD).await.unwrap();
    assert_eq!(second.me().await.unwrap().username, "bob");

    session.end();
    assert!(second.me().await.is_err());
}

#[tokio::test]
async fn board_flow_for_organizer_and_guest() {
    let (_app, base) = connect().await;
    let jane_api = client(&base);
    let bob_api = client(&base);

    let mut jane = EventBoard::new();
    jane.sign_up(&jane_api, &signup_form("jane", Role::Organizer))
        .await
        .unwrap();
    assert!(jane.is_organizer());

    let mut bob = EventBoard::new();
    bob.sign_up(&bob_api, &signup_form("bob", Role::User))
        .await
        .unwrap();
    assert!(!bob.is_organizer());

    let event = jane.create_event(&jane_api, meetup()).await.unwrap();
    assert_eq!(jane.organized.len(), 1);
    assert_eq!(jane.events.len(), 1);

    let result = jane.invite(&jane_api, &event.id, "bob, bob").await.unwrap();
    assert_eq!(result.invited, vec!["bob"]);
    assert_eq!(jane.organized[0].attendees, vec!["bob"]);

    bob.refresh(&bob_api).await.unwrap();
    assert_eq!(bob.invited.len(), 1);
    assert_eq!(bob.my_response(&event.id), None);

    bob.rsvp(&bob_api, &event.id, RsvpResponse::Maybe).await.unwrap();
    assert_eq!(bob.my_response(&event.id), Some(RsvpResponse::Maybe));

    let summary = jane.attendees(&jane_api, &event.id).await.unwrap();
    assert_eq!(summary.event_title, "Design Meetup");
    assert_eq!(summary.total_invited, 1);
    assert_eq!(summary.total_going, 0);
    assert_eq!(summary.total_maybe, 1);
    assert_eq!(summary.total_not_going, 0);

    bob.rsvp(&bob_api, &event.id, RsvpResponse::Going).await.unwrap();
    assert_eq!(bob.my_response(&event.id), Some(RsvpResponse::Going));
    assert!(bob.invited[0].rsvps.maybe.is_empty());

    let found = bob
        .search(
            &bob_api,
            &SearchParams {
                keyword: Some("design".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    jane.delete_event(&jane_api, &event.id).await.unwrap();
    assert!(jane.events.is_empty());
    assert!(jane.organized.is_empty());

    bob.refresh(&bob_api).await.unwrap();
    assert!(bob.invited.is_empty());
}

#[tokio::test]
async fn failed_command_keeps_previous_lists() {
    let (_app, base) = connect().await;
    let jane_api = client(&base);
    let bob_api = client(&base);

    let mut jane = EventBoard::new();
    jane.sign_up(&jane_api, &signup_form("jane", Role::Organizer))
        .await
        .unwrap();
    let event = jane.create_event(&jane_api, meetup()).await.unwrap();

    let mut bob = EventBoard::new();
    bob.sign_up(&bob_api, &signup_form("bob", Role::User))
        .await
        .unwrap();
    let before = bob.events.clone();

    let err = bob.delete_event(&bob_api, &event.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    assert_eq!(bob.error.as_deref(), Some("Only organizer can delete"));
    assert_eq!(bob.events, before);

    let err = bob.rsvp(&bob_api, &event.id, RsvpResponse::Going).await.unwrap_err();
    assert_eq!(err.to_string(), "You are not invited to this event");
    assert_eq!(bob.events, before);

    // A successful refresh clears the error.
    bob.refresh(&bob_api).await.unwrap();
    assert_eq!(bob.error, None);
}

#[tokio::test]
async fn validation_short_circuits_before_network() {
    // Nothing listens here; a request would fail with a transport error.
    let api = client("http://127.0.0.1:9");
    let mut board = EventBoard::new();

    let mut form = signup_form("bob", Role::User);
    form.confirm_password = "different".to_string();
    let err = board.sign_up(&api, &form).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(board.error.as_deref(), Some("Passwords don't match"));

    let err = board.log_in(&api, &LoginForm::default()).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    let mut event = meetup();
    event.title = String::new();
    let err = board.create_event(&api, event).await.unwrap_err();
    assert_eq!(err.to_string(), "Title is required");

    let err = board.invite(&api, "some-event", " , ").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn log_out_resets_board() {
    let (_app, base) = connect().await;
    let api = client(&base);
    let mut board = EventBoard::new();

    board
        .sign_up(&api, &signup_form("jane", Role::Organizer))
        .await
        .unwrap();
    board.create_event(&api, meetup()).await.unwrap();
    assert!(board.user.is_some());

    board.log_out(&api);
    assert!(board.user.is_none());
    assert!(board.events.is_empty());
    assert!(!api.session().is_active());
}
