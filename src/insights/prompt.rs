//! The text sent to the completion API and the local summary used instead
//! when the API cannot be used.

use crate::{analytics::Analytics, transaction::Transaction};

/// Tells the model how to answer.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful financial advisor. Provide concise, positive insights based on the data.";

/// The reply when the user has nothing to analyse.
pub const NO_TRANSACTIONS_INSIGHT: &str =
    "No transactions found. Add some transactions to get insights.";

/// How many transactions are included in the prompt.
pub const PROMPT_TRANSACTION_LIMIT: usize = 10;

/// The figures an insight is based on.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_balance: f64,
    /// The category with the greatest summed amount, empty if there is none.
    pub highest_category: String,
    pub highest_category_amount: f64,
}

impl InsightSummary {
    /// Combine the totals from `analytics` with the highest category.
    pub fn new(analytics: &Analytics, highest_category: (String, f64)) -> Self {
        Self {
            total_income: analytics.total_income,
            total_expenses: analytics.total_expenses,
            net_balance: analytics.net_balance,
            highest_category: highest_category.0,
            highest_category_amount: highest_category.1,
        }
    }
}

/// Builds the prompt asking for an insight on `summary`, with the first
/// [PROMPT_TRANSACTION_LIMIT] of `transactions` attached as JSON.
pub fn build_prompt(
    summary: &InsightSummary,
    transactions: &[Transaction],
    currency_symbol: &str,
) -> String {
    let sample = &transactions[..transactions.len().min(PROMPT_TRANSACTION_LIMIT)];
    let transactions_json = serde_json::to_string(sample).unwrap_or_else(|error| {
        tracing::warn!("Could not serialise transactions for prompt: {error}");
        "[]".to_owned()
    });

    format!(
        "Analyze this financial data and provide a concise, positive insight:\n\
         - Total Income: {currency_symbol}{:.2}\n\
         - Total Expenses: {currency_symbol}{:.2}\n\
         - Net Balance: {currency_symbol}{:.2}\n\
         - Highest Spending Category: {} ({currency_symbol}{:.2})\n\
         - Transactions: {transactions_json}\n\
         Make it encouraging and actionable, 1-2 sentences.",
        summary.total_income,
        summary.total_expenses,
        summary.net_balance,
        summary.highest_category,
        summary.highest_category_amount,
    )
}

/// Summarises `summary` without a completion API.
pub fn fallback_insight(summary: &InsightSummary, currency_symbol: &str) -> String {
    let (verdict, sign) = if summary.net_balance >= 0.0 {
        ("good", "positive")
    } else {
        ("concerning", "negative")
    };

    format!(
        "Spending is {verdict}: Net balance {currency_symbol}{:.2} is {sign}. \
         {} spending ({currency_symbol}{:.2}) is the highest.",
        summary.net_balance, summary.highest_category, summary.highest_category_amount,
    )
}
