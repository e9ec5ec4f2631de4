//! Transaction management.
//!
//! This module contains everything related to a user's transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - Date parsing shared with CSV import
//! - The JSON endpoints for listing, creating, editing and deleting transactions

mod core;
mod create_endpoint;
mod date;
mod delete_endpoint;
mod edit_endpoint;
mod form;
mod list_endpoint;

pub use core::{
    RecurrenceInterval, SortOrder, Transaction, TransactionBuilder, TransactionType,
    TransactionUpdate, create_transaction, create_transaction_table, create_transactions,
    delete_transaction, get_transactions, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use date::{format_day_month_year, parse_date};
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use form::TransactionForm;
pub use list_endpoint::list_transactions_endpoint;

#[cfg(test)]
pub use core::get_transaction;
