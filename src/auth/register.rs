//! The endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{PasswordHash, TokenKeys, ValidatedPassword, create_user, issue_token},
};

/// The state needed for creating a new user.
#[derive(Clone)]
pub struct RegistrationState {
    /// The keys used to sign the token returned to the new user.
    pub token_keys: TokenKeys,
    /// How long the returned token is valid for.
    pub token_duration: Duration,
    /// The bcrypt cost used to hash the new user's password.
    pub password_hash_cost: u32,
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            token_duration: state.token_duration,
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The registration details sent by the client.
///
/// Fields are optional so that a missing field is reported as a validation
/// error rather than a deserialisation error.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// The response body for a successful registration or log in.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The bearer token for the user.
    pub token: String,
}

/// Route handler for registering a new user, responds with a token for the new user.
pub async fn register_user(
    State(state): State<RegistrationState>,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(form) = payload.map_err(|rejection| Error::InvalidRequestBody(rejection.body_text()))?;

    let (username, email, password) = match (form.username, form.email, form.password) {
        (Some(username), Some(email), Some(password))
            if !username.trim().is_empty() && !email.trim().is_empty() =>
        {
            (username, email, password)
        }
        _ => return Err(Error::MissingFields("All fields are required")),
    };

    let validated_password = ValidatedPassword::new(&password)?;
    let password_hash = PasswordHash::new(validated_password, state.password_hash_cost)?;

    let user = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        create_user(&username, &email, password_hash, &connection)?
    };

    tracing::info!("Registered user {}", user.id);

    let token = issue_token(
        user.id,
        &state.token_keys,
        OffsetDateTime::now_utc(),
        state.token_duration,
    )?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })).into_response())
}
