//! The endpoint for logging in with an email and password.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{TokenKeys, TokenResponse, get_user_by_email, issue_token},
};

/// The state needed for logging in a user.
#[derive(Clone)]
pub struct LogInState {
    /// The keys used to sign the token returned to the user.
    pub token_keys: TokenKeys,
    /// How long the returned token is valid for.
    pub token_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials entered during log in.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Email entered during log-in.
    pub email: Option<String>,
    /// Password entered during log-in.
    pub password: Option<String>,
}

/// Handler for log-in requests.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email or password is missing.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn log_in(
    State(state): State<LogInState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<TokenResponse>, Error> {
    let Json(credentials) =
        payload.map_err(|rejection| Error::InvalidRequestBody(rejection.body_text()))?;

    let (email, password) = match (credentials.email, credentials.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => {
            return Err(Error::MissingFields(
                "Email and password are required and must be strings",
            ));
        }
    };

    let user = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        get_user_by_email(&email, &connection).map_err(|error| match error {
            Error::NotFound => {
                tracing::debug!("Log in attempt for unknown email");
                Error::InvalidCredentials
            }
            error => error,
        })?
    };

    let password_is_correct = user.password_hash.verify(&password).map_err(|error| {
        tracing::error!("Error verifying password: {}", error);
        Error::HashingError(error.to_string())
    })?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    let token = issue_token(
        user.id,
        &state.token_keys,
        OffsetDateTime::now_utc(),
        state.token_duration,
    )?;

    Ok(Json(TokenResponse { token }))
}
