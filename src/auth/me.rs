//! The endpoint for getting the profile of the logged in user.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{UserID, UserProfile, get_user_by_id},
};

/// The state needed for looking up the current user.
#[derive(Debug, Clone)]
pub struct CurrentUserState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CurrentUserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler that responds with the profile of the user the token was issued to.
///
/// A valid token for a user that no longer exists is treated as an invalid token.
pub async fn get_current_user(
    State(state): State<CurrentUserState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<UserProfile>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_user_by_id(user_id, &connection)
        .map(|user| Json(user.into()))
        .map_err(|error| match error {
            Error::NotFound => Error::InvalidToken,
            error => error,
        })
}
