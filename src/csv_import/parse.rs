//! Parses uploaded CSV files into transactions.
//!
//! Columns are matched by the names in the header row, so they may appear in
//! any order. A missing column reads as an empty field. Rows with an invalid
//! date, type, category or amount are skipped.
//!
//! Fields follow CSV quoting rules. Double quotes written unescaped by the
//! export are read as quoting, so a note `"big" shop` imports as `big shop`.

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{
    Error,
    transaction::{
        RecurrenceInterval, Transaction, TransactionBuilder, TransactionType, parse_date,
    },
};

/// The most data rows accepted in a single import.
pub const MAX_IMPORT_ROWS: usize = 10_000;

/// The transactions found in a CSV file.
#[derive(Debug, PartialEq)]
pub struct ParsedCsv {
    /// The valid rows, in file order.
    pub transactions: Vec<TransactionBuilder>,
    /// How many rows were skipped for being invalid.
    pub skipped: usize,
}

struct Columns {
    transaction_type: Option<usize>,
    category: Option<usize>,
    amount: Option<usize>,
    date: Option<usize>,
    note: Option<usize>,
    payment_method: Option<usize>,
    recurring: Option<usize>,
    recurrence_interval: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let position = |name: &str| headers.iter().position(|header| header == name);

        Self {
            transaction_type: position("type"),
            category: position("category"),
            amount: position("amount"),
            date: position("date"),
            note: position("note"),
            payment_method: position("paymentMethod"),
            recurring: position("recurring"),
            recurrence_interval: position("recurrenceInterval"),
        }
    }
}

fn field(record: &StringRecord, column: Option<usize>) -> &str {
    column
        .and_then(|index| record.get(index))
        .unwrap_or_default()
}

/// Parses `text` as CSV with a header row.
///
/// # Errors
/// Returns an [Error::InvalidCSV] if the CSV is malformed, or
/// [Error::TooManyRows] if it has more than `max_rows` data rows.
pub fn parse_csv(text: &str, max_rows: usize) -> Result<ParsedCsv, Error> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?;
    let columns = Columns::from_headers(headers);

    let mut transactions = Vec::new();
    let mut skipped = 0;

    for (index, record) in reader.records().enumerate() {
        if index == max_rows {
            return Err(Error::TooManyRows(max_rows));
        }

        let record = record.map_err(|error| Error::InvalidCSV(error.to_string()))?;

        match parse_row(&record, &columns) {
            Ok(transaction) => transactions.push(transaction),
            Err(error) => {
                // Header is line 1.
                tracing::debug!("Skipping CSV line {}: {error}", index + 2);
                skipped += 1;
            }
        }
    }

    Ok(ParsedCsv {
        transactions,
        skipped,
    })
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<TransactionBuilder, Error> {
    let date = parse_date(field(record, columns.date))?;
    let transaction_type = TransactionType::parse_normalized(field(record, columns.transaction_type))?;

    let category = field(record, columns.category);
    if category.is_empty() {
        return Err(Error::MissingFields("category"));
    }

    let amount = field(record, columns.amount).parse().unwrap_or(0.0);
    if amount < 0.0 || !f64::is_finite(amount) {
        return Err(Error::NegativeAmount(amount));
    }

    let recurring = field(record, columns.recurring) == "TRUE";
    let interval = RecurrenceInterval::parse_lenient(field(record, columns.recurrence_interval));

    Ok(Transaction::build(transaction_type, category, amount, date)
        .note(field(record, columns.note))
        .payment_method(field(record, columns.payment_method))
        .recurring(recurring, interval))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        export::SAMPLE_CSV,
        transaction::{RecurrenceInterval, Transaction, TransactionType},
    };

    use super::{MAX_IMPORT_ROWS, parse_csv};

    #[test]
    fn parses_sample_file() {
        let parsed = parse_csv(SAMPLE_CSV, MAX_IMPORT_ROWS).unwrap();

        assert_eq!(parsed.skipped, 0);
        assert_eq!(
            parsed.transactions,
            [
                Transaction::build(
                    TransactionType::Income,
                    "Salary",
                    1000.0,
                    date!(2025 - 10 - 14)
                )
                .note("Monthly salary")
                .payment_method("Cash")
                .recurring(true, RecurrenceInterval::Monthly),
                Transaction::build(TransactionType::Expense, "Food", 50.0, date!(2025 - 10 - 14))
                    .note("Groceries")
                    .payment_method("Card"),
            ]
        );
    }

    #[test]
    fn matches_columns_by_header_name() {
        let text = "date,amount,category,type\n2025-01-31,12.5,Fuel,expense";

        let parsed = parse_csv(text, MAX_IMPORT_ROWS).unwrap();

        assert_eq!(
            parsed.transactions,
            [Transaction::build(TransactionType::Expense, "Fuel", 12.5, date!(2025 - 01 - 31))]
        );
    }

    #[test]
    fn skips_invalid_rows() {
        let text = "type,category,amount,date\n\
            Income,Salary,1000,14-10-2025\n\
            Transfer,Savings,10,14-10-2025\n\
            Expense,Food,5,someday\n\
            Expense,,5,14-10-2025\n\
            Expense,Food,-5,14-10-2025";

        let parsed = parse_csv(text, MAX_IMPORT_ROWS).unwrap();

        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.skipped, 4);
    }

    #[test]
    fn unparseable_amount_defaults_to_zero() {
        let text = "type,category,amount,date\nExpense,Food,lots,14-10-2025";

        let parsed = parse_csv(text, MAX_IMPORT_ROWS).unwrap();

        assert_eq!(parsed.transactions[0].amount, 0.0);
    }

    #[test]
    fn recurring_requires_literal_true() {
        let text = "type,category,amount,date,recurring,recurrenceInterval\n\
            Expense,Rent,800,01-10-2025,TRUE,Monthly\n\
            Expense,Rent,800,01-11-2025,yes,Monthly\n\
            Expense,Gym,30,01-11-2025,TRUE,Fortnightly";

        let parsed = parse_csv(text, MAX_IMPORT_ROWS).unwrap();

        let flags: Vec<_> = parsed
            .transactions
            .iter()
            .map(|transaction| (transaction.recurring, transaction.recurrence_interval))
            .collect();
        assert_eq!(
            flags,
            [
                (true, RecurrenceInterval::Monthly),
                (false, RecurrenceInterval::Monthly),
                (true, RecurrenceInterval::Unset),
            ]
        );
    }

    #[test]
    fn trims_fields_and_skips_blank_lines() {
        let text = "type,category,amount,date\n\n  income , Salary , 1000 , 14/10/2025 \n\n";

        let parsed = parse_csv(text, MAX_IMPORT_ROWS).unwrap();

        assert_eq!(
            parsed.transactions,
            [Transaction::build(
                TransactionType::Income,
                "Salary",
                1000.0,
                date!(2025 - 10 - 14)
            )]
        );
    }

    #[test]
    fn reads_double_quotes_as_quoting() {
        let text = "type,category,amount,date,note\nExpense,Food,10,14-10-2025,\"big\" shop";

        let parsed = parse_csv(text, MAX_IMPORT_ROWS).unwrap();

        assert_eq!(parsed.transactions[0].note, "big shop");
    }

    #[test]
    fn rejects_too_many_rows() {
        let text = "type,category,amount,date\n\
            Income,Salary,1,14-10-2025\n\
            Income,Salary,2,14-10-2025\n\
            Income,Salary,3,14-10-2025";

        assert_eq!(parse_csv(text, 2), Err(Error::TooManyRows(2)));
        assert_eq!(parse_csv(text, 3).unwrap().transactions.len(), 3);
    }
}
