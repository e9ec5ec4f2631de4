use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::TransactionId,
    transaction::{Transaction, TransactionForm, update_transaction},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for editing a transaction, responds with the updated transaction.
///
/// Fields omitted from the request body keep their current values.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<TransactionId>, PathRejection>,
    payload: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Path(transaction_id) = path.map_err(|rejection| {
        tracing::debug!("Rejected edit for invalid transaction id: {rejection}");
        Error::NotFound
    })?;
    let Json(form) =
        payload.map_err(|rejection| Error::InvalidRequestBody(rejection.body_text()))?;
    let update = form.into_update()?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    update_transaction(transaction_id, user_id, update, &connection)
        .inspect_err(|error| {
            if *error == Error::UpdateMissingTransaction {
                tracing::debug!("User {user_id} tried to update missing transaction {transaction_id}");
            }
        })
        .map(Json)
}
