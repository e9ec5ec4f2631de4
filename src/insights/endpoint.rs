use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    analytics::{aggregate, highest_category},
    auth::UserID,
    insights::{
        CompletionClient, InsightSummary, NO_TRANSACTIONS_INSIGHT, SYSTEM_PROMPT, build_prompt,
        fallback_insight,
    },
    transaction::{SortOrder, get_transactions},
};

/// The state needed to generate insights.
#[derive(Clone)]
pub struct InsightState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The client used to generate insights.
    pub completion_client: Arc<dyn CompletionClient>,
    /// The symbol printed before amounts.
    pub currency_symbol: String,
}

impl FromRef<AppState> for InsightState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            completion_client: state.completion_client.clone(),
            currency_symbol: state.currency_symbol.clone(),
        }
    }
}

/// The response body for insights.
#[derive(Debug, Serialize, Deserialize)]
pub struct InsightResponse {
    pub insights: String,
}

/// A route handler that responds with a short written insight on the user's finances.
///
/// If the completion client fails, a summary generated locally is returned
/// instead, so this only fails on database errors.
pub async fn get_insights(
    State(state): State<InsightState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<InsightResponse>, Error> {
    let transactions = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        get_transactions(user_id, SortOrder::Created, &connection)?
    };

    if transactions.is_empty() {
        return Ok(Json(InsightResponse {
            insights: NO_TRANSACTIONS_INSIGHT.to_owned(),
        }));
    }

    let summary = InsightSummary::new(
        &aggregate(&transactions),
        highest_category(&transactions),
    );
    let prompt = build_prompt(&summary, &transactions, &state.currency_symbol);

    let insights = match state
        .completion_client
        .complete(SYSTEM_PROMPT, &prompt)
        .await
    {
        Ok(insights) => insights,
        Err(error) => {
            tracing::warn!("Using fallback insight for user {user_id}: {error}");
            fallback_insight(&summary, &state.currency_symbol)
        }
    };

    Ok(Json(InsightResponse { insights }))
}
