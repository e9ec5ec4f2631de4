//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, auth::UserID, database_id::TransactionId};

// ============================================================================
// MODELS
// ============================================================================

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Money that was earned.
    Income,
    /// Money that was spent.
    Expense,
}

impl TransactionType {
    /// Parse a transaction type after converting `raw` to title case, so
    /// "income", "INCOME" and "Income" are all accepted.
    ///
    /// # Errors
    /// Returns [Error::InvalidTransactionType] if the normalised string is not
    /// exactly "Income" or "Expense".
    pub fn parse_normalized(raw: &str) -> Result<Self, Error> {
        match to_title_case(raw.trim()).as_str() {
            "Income" => Ok(Self::Income),
            "Expense" => Ok(Self::Expense),
            _ => Err(Error::InvalidTransactionType(raw.to_owned())),
        }
    }

    /// The name used in the database, CSV files and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Self::parse_normalized(text).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

fn to_title_case(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// How often a recurring transaction repeats.
///
/// This is a label only, nothing schedules new transactions from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecurrenceInterval {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    /// No interval, serialised as an empty string.
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl RecurrenceInterval {
    /// Parse an interval, treating anything unrecognised as [RecurrenceInterval::Unset].
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim() {
            "Daily" => Self::Daily,
            "Weekly" => Self::Weekly,
            "Monthly" => Self::Monthly,
            "Quarterly" => Self::Quarterly,
            "Yearly" => Self::Yearly,
            _ => Self::Unset,
        }
    }

    /// The name used in the database, CSV files and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Yearly => "Yearly",
            Self::Unset => "",
        }
    }
}

impl ToSql for RecurrenceInterval {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RecurrenceInterval {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Self::parse_lenient)
    }
}

/// An expense or income owned by a single user.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// A free text category, e.g. "Salary" or "Food".
    pub category: String,
    /// The non-negative amount of money earned or spent.
    pub amount: f64,
    /// When the transaction happened.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// An optional note, empty if not set.
    pub note: String,
    /// How the transaction was paid, empty if not set.
    pub payment_method: String,
    /// Whether the transaction repeats.
    pub recurring: bool,
    /// How often the transaction repeats.
    pub recurrence_interval: RecurrenceInterval,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        category: &str,
        amount: f64,
        date: Date,
    ) -> TransactionBuilder {
        TransactionBuilder {
            transaction_type,
            category: category.to_owned(),
            amount,
            date,
            note: String::new(),
            payment_method: String::new(),
            recurring: false,
            recurrence_interval: RecurrenceInterval::Unset,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The optional fields default to empty strings, `false` and
/// [RecurrenceInterval::Unset].
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount: f64,
    pub date: Date,
    pub note: String,
    pub payment_method: String,
    pub recurring: bool,
    pub recurrence_interval: RecurrenceInterval,
}

impl TransactionBuilder {
    /// Set the note for the transaction.
    pub fn note(mut self, note: &str) -> Self {
        self.note = note.to_owned();
        self
    }

    /// Set the payment method for the transaction.
    pub fn payment_method(mut self, payment_method: &str) -> Self {
        self.payment_method = payment_method.to_owned();
        self
    }

    /// Mark the transaction as recurring every `interval`.
    pub fn recurring(mut self, recurring: bool, interval: RecurrenceInterval) -> Self {
        self.recurring = recurring;
        self.recurrence_interval = interval;
        self
    }
}

/// The fields to change on an existing transaction, `None` keeps the stored value.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct TransactionUpdate {
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<Date>,
    pub note: Option<String>,
    pub payment_method: Option<String>,
    pub recurring: Option<bool>,
    pub recurrence_interval: Option<RecurrenceInterval>,
}

/// The order to list a user's transactions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest date first, most recently created first within a day.
    NewestFirst,
    /// The order the transactions were created in.
    Created,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, user_id, type, category, amount, date, note, \
    payment_method, recurring, recurrence_interval";

/// Create a new transaction owned by `user_id` in the database from a builder.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error,
/// including when `user_id` does not refer to a registered user.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (user_id, type, category, amount, date, note, \
                payment_method, recurring, recurrence_interval)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                user_id.as_i64(),
                builder.transaction_type,
                builder.category,
                builder.amount,
                builder.date,
                builder.note,
                builder.payment_method,
                builder.recurring,
                builder.recurrence_interval,
            ],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Insert many transactions owned by `user_id`, returning how many were inserted.
///
/// **Note**: If you want transactional integrity (all or nothing), pass in a
/// transaction for `connection`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn create_transactions(
    user_id: UserID,
    builders: Vec<TransactionBuilder>,
    connection: &Connection,
) -> Result<usize, Error> {
    // Prepare the insert statement once for reuse
    let mut stmt = connection.prepare(
        "INSERT INTO \"transaction\" (user_id, type, category, amount, date, note, \
            payment_method, recurring, recurrence_interval)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;

    let mut inserted = 0;

    for builder in builders {
        inserted += stmt.execute(params![
            user_id.as_i64(),
            builder.transaction_type,
            builder.category,
            builder.amount,
            builder.date,
            builder.note,
            builder.payment_method,
            builder.recurring,
            builder.recurrence_interval,
        ])?;
    }

    Ok(inserted)
}

/// Retrieve the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve all transactions owned by `user_id` in `order`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transactions(
    user_id: UserID,
    order: SortOrder,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let order_by = match order {
        SortOrder::NewestFirst => "date DESC, id DESC",
        SortOrder::Created => "id ASC",
    };

    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE user_id = :user_id ORDER BY {order_by}"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Apply `update` to the transaction `id` owned by `user_id` and return the updated transaction.
///
/// Concurrent updates to the same transaction are applied in the order the
/// database receives them, the last one wins.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
            SET \
                type = COALESCE(?1, type), \
                category = COALESCE(?2, category), \
                amount = COALESCE(?3, amount), \
                date = COALESCE(?4, date), \
                note = COALESCE(?5, note), \
                payment_method = COALESCE(?6, payment_method), \
                recurring = COALESCE(?7, recurring), \
                recurrence_interval = COALESCE(?8, recurrence_interval) \
            WHERE id = ?9 AND user_id = ?10 \
            RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                update.transaction_type,
                update.category,
                update.amount,
                update.date,
                update.note,
                update.payment_method,
                update.recurring,
                update.recurrence_interval,
                id,
                user_id.as_i64(),
            ],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
            error => error.into(),
        })
}

type RowsAffected = usize;

/// Delete the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        &[(":id", &id), (":user_id", &user_id.as_i64())],
    )?;

    match rows_affected {
        0 => Err(Error::DeleteMissingTransaction),
        rows_affected => Ok(rows_affected),
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('Income', 'Expense')),
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                note TEXT NOT NULL DEFAULT '',
                payment_method TEXT NOT NULL DEFAULT '',
                recurring INTEGER NOT NULL DEFAULT 0,
                recurrence_interval TEXT NOT NULL DEFAULT '',
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Every query is scoped by user and most are sorted by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        transaction_type: row.get(2)?,
        category: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        note: row.get(6)?,
        payment_method: row.get(7)?,
        recurring: row.get(8)?,
        recurrence_interval: row.get(9)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        auth::{PasswordHash, User, create_user},
        db::initialize,
        transaction::{
            RecurrenceInterval, SortOrder, Transaction, TransactionType, TransactionUpdate,
            create_transaction, create_transactions, delete_transaction, get_transaction,
            get_transactions, update_transaction,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_user(email: &str, conn: &Connection) -> User {
        create_user("test", email, PasswordHash::new_unchecked("hunter2"), conn).unwrap()
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user = create_test_user("a@x.com", &conn);

        let transaction = create_transaction(
            user.id,
            Transaction::build(TransactionType::Income, "Salary", 1000.0, date!(2025 - 10 - 14))
                .note("Monthly salary")
                .payment_method("Cash")
                .recurring(true, RecurrenceInterval::Monthly),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.user_id, user.id);
        assert_eq!(transaction.amount, 1000.0);
        assert_eq!(transaction.note, "Monthly salary");
        assert_eq!(transaction.recurrence_interval, RecurrenceInterval::Monthly);
        assert_eq!(
            get_transaction(transaction.id, user.id, &conn),
            Ok(transaction)
        );
    }

    #[test]
    fn create_fails_for_unknown_user() {
        let conn = get_test_connection();
        let missing_user = create_test_user("a@x.com", &conn).id;
        conn.execute("DELETE FROM user", ()).unwrap();

        let result = create_transaction(
            missing_user,
            Transaction::build(TransactionType::Income, "Salary", 1.0, date!(2025 - 10 - 14)),
            &conn,
        );

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn get_is_scoped_by_owner() {
        let conn = get_test_connection();
        let alice = create_test_user("a@x.com", &conn);
        let bob = create_test_user("b@x.com", &conn);
        let transaction = create_transaction(
            alice.id,
            Transaction::build(TransactionType::Expense, "Food", 50.0, date!(2025 - 10 - 14)),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(transaction.id, bob.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn list_newest_first() {
        let conn = get_test_connection();
        let user = create_test_user("a@x.com", &conn);
        for date in [
            date!(2025 - 01 - 01),
            date!(2025 - 03 - 01),
            date!(2025 - 02 - 01),
        ] {
            create_transaction(
                user.id,
                Transaction::build(TransactionType::Expense, "Food", 1.0, date),
                &conn,
            )
            .unwrap();
        }

        let dates: Vec<_> = get_transactions(user.id, SortOrder::NewestFirst, &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.date)
            .collect();

        assert_eq!(
            dates,
            [
                date!(2025 - 03 - 01),
                date!(2025 - 02 - 01),
                date!(2025 - 01 - 01)
            ]
        );
    }

    #[test]
    fn list_only_contains_own_transactions() {
        let conn = get_test_connection();
        let alice = create_test_user("a@x.com", &conn);
        let bob = create_test_user("b@x.com", &conn);
        create_transaction(
            alice.id,
            Transaction::build(TransactionType::Expense, "Food", 1.0, date!(2025 - 01 - 01)),
            &conn,
        )
        .unwrap();

        let bobs = get_transactions(bob.id, SortOrder::Created, &conn).unwrap();

        assert!(bobs.is_empty());
    }

    #[test]
    fn create_many() {
        let conn = get_test_connection();
        let user = create_test_user("a@x.com", &conn);
        let builders = vec![
            Transaction::build(TransactionType::Income, "Salary", 1000.0, date!(2025 - 10 - 14)),
            Transaction::build(TransactionType::Expense, "Food", 50.0, date!(2025 - 10 - 14)),
        ];

        let inserted = create_transactions(user.id, builders, &conn).unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(
            get_transactions(user.id, SortOrder::Created, &conn)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn update_keeps_unset_fields() {
        let conn = get_test_connection();
        let user = create_test_user("a@x.com", &conn);
        let transaction = create_transaction(
            user.id,
            Transaction::build(TransactionType::Expense, "Food", 50.0, date!(2025 - 10 - 14))
                .note("Groceries"),
            &conn,
        )
        .unwrap();

        let updated = update_transaction(
            transaction.id,
            user.id,
            TransactionUpdate {
                amount: Some(75.5),
                recurring: Some(true),
                recurrence_interval: Some(RecurrenceInterval::Weekly),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(updated.amount, 75.5);
        assert!(updated.recurring);
        assert_eq!(updated.recurrence_interval, RecurrenceInterval::Weekly);
        assert_eq!(updated.category, "Food");
        assert_eq!(updated.note, "Groceries");
        assert_eq!(updated.date, date!(2025 - 10 - 14));
    }

    #[test]
    fn update_fails_for_other_owner() {
        let conn = get_test_connection();
        let alice = create_test_user("a@x.com", &conn);
        let bob = create_test_user("b@x.com", &conn);
        let transaction = create_transaction(
            alice.id,
            Transaction::build(TransactionType::Expense, "Food", 50.0, date!(2025 - 10 - 14)),
            &conn,
        )
        .unwrap();

        let result = update_transaction(
            transaction.id,
            bob.id,
            TransactionUpdate {
                amount: Some(0.0),
                ..Default::default()
            },
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
        assert_eq!(
            get_transaction(transaction.id, alice.id, &conn)
                .unwrap()
                .amount,
            50.0
        );
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let user = create_test_user("a@x.com", &conn);
        let transaction = create_transaction(
            user.id,
            Transaction::build(TransactionType::Expense, "Food", 50.0, date!(2025 - 10 - 14)),
            &conn,
        )
        .unwrap();

        let rows_affected = delete_transaction(transaction.id, user.id, &conn).unwrap();

        assert_eq!(rows_affected, 1);
        assert_eq!(
            get_transaction(transaction.id, user.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_fails_for_other_owner() {
        let conn = get_test_connection();
        let alice = create_test_user("a@x.com", &conn);
        let bob = create_test_user("b@x.com", &conn);
        let transaction = create_transaction(
            alice.id,
            Transaction::build(TransactionType::Expense, "Food", 50.0, date!(2025 - 10 - 14)),
            &conn,
        )
        .unwrap();

        assert_eq!(
            delete_transaction(transaction.id, bob.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
        assert!(get_transaction(transaction.id, alice.id, &conn).is_ok());
    }
}
