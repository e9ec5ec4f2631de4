use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    analytics::{Analytics, aggregate},
    auth::UserID,
    transaction::{SortOrder, get_transactions},
};

/// The state needed to summarise a user's transactions.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that responds with the totals, category breakdown and
/// monthly trends of all of the user's transactions.
pub async fn get_analytics(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Analytics>, Error> {
    let transactions = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        get_transactions(user_id, SortOrder::NewestFirst, &connection)?
    };

    Ok(Json(aggregate(&transactions)))
}
