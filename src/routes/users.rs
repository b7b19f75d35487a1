use axum::{routing::get, Json, Router};

use crate::auth::AuthUser;
use crate::models::UserOut;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/users/me", get(me))
}

async fn me(AuthUser(user): AuthUser) -> Json<UserOut> {
    Json(UserOut::from(&user))
}
