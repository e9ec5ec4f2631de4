//! The JSON body clients send when creating or editing a transaction.

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    transaction::{
        RecurrenceInterval, Transaction, TransactionBuilder, TransactionType, TransactionUpdate,
        parse_date,
    },
};

/// The transaction fields sent by the client.
///
/// Every field is optional so that creation can report missing fields itself
/// and editing can leave omitted fields unchanged.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransactionForm {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub note: Option<String>,
    pub payment_method: Option<String>,
    pub recurring: Option<bool>,
    pub recurrence_interval: Option<String>,
}

impl TransactionForm {
    /// Validate the form for creating a new transaction.
    ///
    /// A zero amount counts as missing.
    ///
    /// # Errors
    /// Returns an error if a required field is missing, or if the date, type
    /// or amount is invalid.
    pub fn into_builder(self) -> Result<TransactionBuilder, Error> {
        let (raw_type, category, amount, raw_date) = match (
            self.transaction_type,
            self.category,
            self.amount,
            self.date,
        ) {
            (Some(raw_type), Some(category), Some(amount), Some(raw_date))
                if !raw_type.trim().is_empty()
                    && !category.trim().is_empty()
                    && amount != 0.0
                    && !raw_date.trim().is_empty() =>
            {
                (raw_type, category, amount, raw_date)
            }
            _ => return Err(Error::MissingFields("Missing required fields")),
        };

        let date = parse_date(&raw_date)?;
        let transaction_type = TransactionType::parse_normalized(&raw_type)?;
        let amount = validate_amount(amount)?;

        let recurring = self.recurring.unwrap_or(false);
        let interval = self
            .recurrence_interval
            .as_deref()
            .map(RecurrenceInterval::parse_lenient)
            .unwrap_or_default();

        Ok(
            Transaction::build(transaction_type, category.trim(), amount, date)
                .note(self.note.as_deref().unwrap_or_default())
                .payment_method(self.payment_method.as_deref().unwrap_or_default())
                .recurring(recurring, interval),
        )
    }

    /// Validate the fields present in the form for editing a transaction.
    ///
    /// A blank type or category is treated as omitted, so the stored value is kept.
    ///
    /// # Errors
    /// Returns an error if the date, type or amount is present but invalid.
    pub fn into_update(self) -> Result<TransactionUpdate, Error> {
        let date = self.date.as_deref().map(parse_date).transpose()?;
        let transaction_type = non_blank(self.transaction_type)
            .as_deref()
            .map(TransactionType::parse_normalized)
            .transpose()?;
        let amount = self.amount.map(validate_amount).transpose()?;

        Ok(TransactionUpdate {
            transaction_type,
            category: non_blank(self.category).map(|category| category.trim().to_owned()),
            amount,
            date,
            note: self.note,
            payment_method: self.payment_method,
            recurring: self.recurring,
            recurrence_interval: self
                .recurrence_interval
                .as_deref()
                .map(RecurrenceInterval::parse_lenient),
        })
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.trim().is_empty())
}

fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount < 0.0 || !amount.is_finite() {
        Err(Error::NegativeAmount(amount))
    } else {
        Ok(amount)
    }
}
