//! CSV export of a user's transactions and the sample file for imports.

use crate::transaction::{Transaction, format_day_month_year};

/// The header row shared by exported files, the sample file and imports.
pub const CSV_HEADER: &str =
    "type,category,amount,date,note,paymentMethod,recurring,recurrenceInterval";

/// An example of the CSV format accepted by the import endpoint.
pub const SAMPLE_CSV: &str = "type,category,amount,date,note,paymentMethod,recurring,recurrenceInterval
Income,Salary,1000,14-10-2025,Monthly salary,Cash,TRUE,Monthly
Expense,Food,50,14-10-2025,Groceries,Card,FALSE,";

/// Writes `transactions` as CSV, one line per transaction after the header.
///
/// Fields are written as is. A comma in a category, note or payment method
/// ends up as an extra column, and double quotes are read back as CSV quoting
/// on import.
pub fn transactions_to_csv(transactions: &[Transaction]) -> String {
    let mut lines = Vec::with_capacity(transactions.len() + 1);
    lines.push(CSV_HEADER.to_owned());

    for transaction in transactions {
        lines.push(format!(
            "{},{},{},{},{},{},{},{}",
            transaction.transaction_type,
            transaction.category,
            transaction.amount,
            format_day_month_year(transaction.date),
            transaction.note,
            transaction.payment_method,
            if transaction.recurring { "TRUE" } else { "FALSE" },
            transaction.recurrence_interval.as_str(),
        ));
    }

    lines.join("\n")
}
