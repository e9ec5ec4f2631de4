//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more required fields were missing from the request body.
    ///
    /// The string is the message shown to the client.
    #[error("{0}")]
    MissingFields(&'static str),

    /// The request body could not be parsed as JSON of the expected shape.
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    /// The user tried to register with an email that is already taken.
    #[error("User already exists")]
    DuplicateEmail,

    /// The email and password combination does not match a registered user.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The request did not include a bearer token.
    #[error("No token provided")]
    MissingToken,

    /// The bearer token was malformed, signed with the wrong key, expired, or
    /// refers to a user that does not exist.
    #[error("Invalid token")]
    InvalidToken,

    /// A date string was not in one of the accepted formats.
    #[error("invalid date \"{0}\"")]
    InvalidDate(String),

    /// A transaction type was not `Income` or `Expense` after normalisation.
    #[error("invalid transaction type \"{0}\"")]
    InvalidTransactionType(String),

    /// Transactions record non-negative amounts, the type carries the sign.
    #[error("{0} is a negative amount, which is not allowed")]
    NegativeAmount(f64),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist or belongs to
    /// another user.
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist or belongs to
    /// another user.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// The multipart form did not contain a file field.
    #[error("No file uploaded")]
    NoFileUploaded,

    /// The uploaded file was not a CSV file.
    #[error("File is not a CSV")]
    NotCSV,

    /// The multipart form could not be read.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The CSV had more data rows than a single import accepts.
    #[error("CSV file has more than {0} rows")]
    TooManyRows(usize),

    /// The upload was larger than the request body limit.
    #[error("File too large")]
    UploadTooLarge,

    /// None of the rows in an imported CSV file were valid transactions.
    #[error("No valid transactions in CSV")]
    NoValidTransactions,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Error::MissingFields(message) => (StatusCode::BAD_REQUEST, (*message).to_owned()),
            Error::InvalidRequestBody(_) => {
                (StatusCode::BAD_REQUEST, "Invalid request body".to_owned())
            }
            Error::InvalidDate(_) => (
                StatusCode::BAD_REQUEST,
                "Invalid date format. Use DD-MM-YYYY or ISO format.".to_owned(),
            ),
            Error::InvalidTransactionType(_) => (
                StatusCode::BAD_REQUEST,
                "Invalid type. Must be Income or Expense.".to_owned(),
            ),
            Error::NegativeAmount(_) => (
                StatusCode::BAD_REQUEST,
                "Amount cannot be negative.".to_owned(),
            ),
            Error::InvalidCSV(_) => (StatusCode::BAD_REQUEST, "Error parsing CSV".to_owned()),
            Error::NotCSV => (
                StatusCode::BAD_REQUEST,
                "Invalid file type, CSV required".to_owned(),
            ),
            Error::TooManyRows(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::DuplicateEmail
            | Error::InvalidCredentials
            | Error::NoFileUploaded
            | Error::NoValidTransactions => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::UploadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            Error::MultipartError(_) => (
                StatusCode::BAD_REQUEST,
                "Could not read the uploaded file".to_owned(),
            ),
            Error::MissingToken | Error::InvalidToken => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            Error::UpdateMissingTransaction | Error::DeleteMissingTransaction => {
                (StatusCode::NOT_FOUND, "Transaction not found".to_owned())
            }
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found".to_owned()),
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_owned())
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            // Any details of server errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
        } else {
            tracing::debug!("Rejecting request with {status}: {self}");
        }

        (status, Json(json!({ "message": message }))).into_response()
    }
}
