use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Multipart, State,
        multipart::{Field, MultipartRejection},
    },
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::UserID,
    csv_import::{MAX_IMPORT_ROWS, parse_csv},
    transaction::create_transactions,
};

/// The largest upload accepted by the import endpoint, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body for a successful import.
#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub message: String,
    /// The number of transactions created.
    pub imported: usize,
}

/// Route handler for importing transactions from an uploaded CSV file.
///
/// The file must be in the multipart field `file`. Invalid rows are skipped,
/// the remaining rows are all inserted or none are.
pub async fn import_csv(
    State(state): State<ImportState>,
    Extension(user_id): Extension<UserID>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportResponse>, Error> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!("Rejected import without multipart body: {rejection}");
        Error::NoFileUploaded
    })?;

    let mut csv_data = None;

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        if field.name() == Some("file") {
            csv_data = Some(read_csv_field(field).await?);
            break;
        }
    }

    let csv_data = csv_data.ok_or(Error::NoFileUploaded)?;

    let parsed = parse_csv(&csv_data, MAX_IMPORT_ROWS)?;

    if parsed.transactions.is_empty() {
        return Err(Error::NoValidTransactions);
    }

    let imported = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        let tx = connection
            .unchecked_transaction()
            .inspect_err(|error| tracing::error!("could not start transaction: {error}"))?;
        let imported = create_transactions(user_id, parsed.transactions, &tx)?;
        tx.commit()
            .inspect_err(|error| tracing::error!("could not commit transaction: {error}"))?;

        imported
    };

    tracing::info!(
        "Imported {imported} transactions for user {user_id}, skipped {} rows",
        parsed.skipped
    );

    Ok(Json(ImportResponse {
        message: "CSV imported successfully".to_owned(),
        imported,
    }))
}

async fn read_csv_field(field: Field<'_>) -> Result<String, Error> {
    let is_csv = field
        .content_type()
        .is_some_and(|content_type| content_type.contains("csv"));

    if !is_csv {
        tracing::debug!(
            "Rejected upload with content type {:?}",
            field.content_type()
        );
        return Err(Error::NotCSV);
    }

    let file_name = field.file_name().unwrap_or("<unnamed>").to_owned();
    let data = field.text().await.map_err(map_multipart_error)?;

    tracing::debug!("Received file '{}' that is {} bytes", file_name, data.len());

    Ok(data)
}

fn map_multipart_error(error: axum::extract::multipart::MultipartError) -> Error {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::UploadTooLarge
    } else {
        tracing::debug!("Could not read multipart form: {error}");
        Error::MultipartError(error.body_text())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::{
        TestServer,
        multipart::{MultipartForm, Part},
    };
    use serde_json::Value;

    use crate::{
        csv_import::ImportResponse,
        endpoints,
        export::SAMPLE_CSV,
        test_utils::{get_test_server, log_in_new_user},
        transaction::{RecurrenceInterval, Transaction, TransactionType},
    };

    fn csv_form(text: &str) -> MultipartForm {
        let part = Part::bytes(text.as_bytes().to_vec())
            .file_name("transactions.csv")
            .mime_type("text/csv");

        MultipartForm::new().add_part("file", part)
    }

    async fn list_transactions(server: &TestServer, token: &str) -> Vec<Transaction> {
        server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .await
            .json::<Vec<Transaction>>()
    }

    #[tokio::test]
    async fn imports_sample_file() {
        let server = get_test_server();
        let token = log_in_new_user(&server, "a@x.com").await;

        let response = server
            .post(endpoints::IMPORT_CSV)
            .authorization_bearer(&token)
            .multipart(csv_form(SAMPLE_CSV))
            .await;

        response.assert_status_ok();
        let body = response.json::<ImportResponse>();
        assert_eq!(body.message, "CSV imported successfully");
        assert_eq!(body.imported, 2);

        let mut transactions = list_transactions(&server, &token).await;
        transactions.sort_by_key(|transaction| transaction.id);
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].transaction_type, TransactionType::Income);
        assert_eq!(transactions[0].category, "Salary");
        assert_eq!(transactions[0].amount, 1000.0);
        assert!(transactions[0].recurring);
        assert_eq!(
            transactions[0].recurrence_interval,
            RecurrenceInterval::Monthly
        );
        assert_eq!(transactions[1].transaction_type, TransactionType::Expense);
        assert_eq!(transactions[1].category, "Food");
        assert_eq!(transactions[1].payment_method, "Card");
        assert!(!transactions[1].recurring);
    }

    #[tokio::test]
    async fn export_then_import_gives_same_transactions() {
        let server = get_test_server();
        let alice = log_in_new_user(&server, "a@x.com").await;
        let bob = log_in_new_user(&server, "b@x.com").await;
        server
            .post(endpoints::IMPORT_CSV)
            .authorization_bearer(&alice)
            .multipart(csv_form(
                "type,category,amount,date,note,paymentMethod,recurring,recurrenceInterval\n\
                 Income,Salary,1000,2025-10-14,Monthly salary,Cash,TRUE,Monthly\n\
                 Expense,Food,12.75,03-01-2025,,,FALSE,\n\
                 Expense,Rent,800,01/12/2024,December,Transfer,TRUE,Yearly",
            ))
            .await
            .assert_status_ok();
        let exported = server
            .get(endpoints::EXPORT_CSV)
            .authorization_bearer(&alice)
            .await
            .text();

        server
            .post(endpoints::IMPORT_CSV)
            .authorization_bearer(&bob)
            .multipart(csv_form(&exported))
            .await
            .assert_status_ok();

        let strip_ids = |transactions: Vec<Transaction>| {
            let mut fields: Vec<_> = transactions
                .into_iter()
                .map(|transaction| {
                    (
                        transaction.transaction_type,
                        transaction.category,
                        transaction.amount.to_string(),
                        transaction.date,
                        transaction.note,
                        transaction.payment_method,
                        transaction.recurring,
                        transaction.recurrence_interval.as_str(),
                    )
                })
                .collect();
            fields.sort_by(|a, b| (a.3, &a.1).cmp(&(b.3, &b.1)));
            fields
        };
        assert_eq!(
            strip_ids(list_transactions(&server, &alice).await),
            strip_ids(list_transactions(&server, &bob).await)
        );
    }

    #[tokio::test]
    async fn import_without_valid_rows_is_bad_request() {
        let server = get_test_server();
        let token = log_in_new_user(&server, "a@x.com").await;

        let response = server
            .post(endpoints::IMPORT_CSV)
            .authorization_bearer(&token)
            .multipart(csv_form(
                "type,category,amount,date\nTransfer,Savings,10,14-10-2025",
            ))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["message"],
            "No valid transactions in CSV"
        );
        assert!(list_transactions(&server, &token).await.is_empty());
    }

    #[tokio::test]
    async fn import_without_file_is_bad_request() {
        let server = get_test_server();
        let token = log_in_new_user(&server, "a@x.com").await;

        let response = server
            .post(endpoints::IMPORT_CSV)
            .authorization_bearer(&token)
            .multipart(MultipartForm::new().add_text("note", "no file here"))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["message"], "No file uploaded");
    }

    #[tokio::test]
    async fn import_rejects_non_csv_files() {
        let server = get_test_server();
        let token = log_in_new_user(&server, "a@x.com").await;
        let part = Part::bytes(b"%PDF-1.4".to_vec())
            .file_name("statement.pdf")
            .mime_type("application/pdf");

        let response = server
            .post(endpoints::IMPORT_CSV)
            .authorization_bearer(&token)
            .multipart(MultipartForm::new().add_part("file", part))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["message"],
            "Invalid file type, CSV required"
        );
    }

    #[tokio::test]
    async fn import_rejects_oversized_upload() {
        let server = get_test_server();
        let token = log_in_new_user(&server, "a@x.com").await;
        let row = "Expense,Food,1,14-10-2025\n";
        let text = format!(
            "type,category,amount,date\n{}",
            row.repeat(super::MAX_UPLOAD_BYTES / row.len() + 1)
        );

        server
            .post(endpoints::IMPORT_CSV)
            .authorization_bearer(&token)
            .multipart(csv_form(&text))
            .await
            .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn import_requires_token() {
        let server = get_test_server();

        server
            .post(endpoints::IMPORT_CSV)
            .multipart(csv_form(SAMPLE_CSV))
            .await
            .assert_status_unauthorized();
    }
}
