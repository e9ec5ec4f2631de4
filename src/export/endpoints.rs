//! Route handlers for downloading transactions as files.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    export::{REPORT_TITLE, SAMPLE_CSV, render_pdf, report_lines, transactions_to_csv},
    transaction::{SortOrder, Transaction, get_transactions},
};

/// The state needed to export a user's transactions.
#[derive(Debug, Clone)]
pub struct ExportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The symbol printed before amounts in the PDF report.
    pub currency_symbol: String,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            currency_symbol: state.currency_symbol.clone(),
        }
    }
}

fn load_transactions(
    state: &ExportState,
    user_id: UserID,
    order: SortOrder,
) -> Result<Vec<Transaction>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_transactions(user_id, order, &connection)
}

fn attachment(content_type: &'static str, filename: &str, body: impl IntoResponse) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// A route handler that responds with the user's transactions as a CSV file,
/// in the order they were created.
pub async fn export_csv(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let transactions = load_transactions(&state, user_id, SortOrder::Created)?;
    tracing::debug!(
        "Exporting {} transactions as CSV for user {user_id}",
        transactions.len()
    );

    Ok(attachment(
        "text/csv",
        "transactions.csv",
        transactions_to_csv(&transactions),
    ))
}

/// A route handler that responds with a PDF report of the user's transactions,
/// newest first.
pub async fn export_pdf(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let transactions = load_transactions(&state, user_id, SortOrder::NewestFirst)?;
    tracing::debug!(
        "Exporting {} transactions as PDF for user {user_id}",
        transactions.len()
    );

    let lines = report_lines(&transactions, &state.currency_symbol);

    Ok(attachment(
        "application/pdf",
        "transactions.pdf",
        render_pdf(REPORT_TITLE, &lines),
    ))
}

/// A route handler that responds with an example CSV file for importing.
pub async fn get_sample_csv() -> Response {
    attachment("text/csv", "sample_transactions.csv", SAMPLE_CSV)
}
