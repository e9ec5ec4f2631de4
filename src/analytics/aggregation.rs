//! Transaction data aggregation.
//!
//! Sums a user's transactions into totals, a per-category breakdown and
//! per-month income and expenses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::transaction::{Transaction, TransactionType};

/// The income and expenses for a single month.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub income: f64,
    pub expenses: f64,
}

/// The summary of a set of transactions.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    /// The sum of all income amounts.
    pub total_income: f64,
    /// The sum of all expense amounts.
    pub total_expenses: f64,
    /// Total income minus total expenses.
    pub net_balance: f64,
    /// The summed amount per category, regardless of transaction type.
    pub category_breakdown: BTreeMap<String, f64>,
    /// Income and expenses keyed by month label, e.g. "October 2025".
    pub monthly_trends: BTreeMap<String, MonthlyTrend>,
}

/// Aggregates `transactions` into totals, a category breakdown and monthly trends.
///
/// The result does not depend on the order of `transactions` other than
/// through floating point rounding.
pub fn aggregate(transactions: &[Transaction]) -> Analytics {
    let mut analytics = Analytics::default();

    for transaction in transactions {
        let trend = analytics
            .monthly_trends
            .entry(month_label(transaction.date))
            .or_default();

        match transaction.transaction_type {
            TransactionType::Income => {
                analytics.total_income += transaction.amount;
                trend.income += transaction.amount;
            }
            TransactionType::Expense => {
                analytics.total_expenses += transaction.amount;
                trend.expenses += transaction.amount;
            }
        }

        *analytics
            .category_breakdown
            .entry(transaction.category.clone())
            .or_insert(0.0) += transaction.amount;
    }

    analytics.net_balance = analytics.total_income - analytics.total_expenses;

    analytics
}

/// Formats the month of `date` with the full month name, e.g. "October 2025".
pub fn month_label(date: Date) -> String {
    format!("{} {}", date.month(), date.year())
}

/// Finds the category with the greatest summed amount.
///
/// Ties go to the category that appears first in `transactions`.
/// Returns an empty category and zero when no category sums to more than zero.
pub fn highest_category(transactions: &[Transaction]) -> (String, f64) {
    let mut totals: Vec<(&str, f64)> = Vec::new();

    for transaction in transactions {
        match totals
            .iter_mut()
            .find(|entry| entry.0 == transaction.category)
        {
            Some(entry) => entry.1 += transaction.amount,
            None => totals.push((transaction.category.as_str(), transaction.amount)),
        }
    }

    let mut highest = ("", 0.0);

    for (category, total) in totals {
        if total > highest.1 {
            highest = (category, total);
        }
    }

    (highest.0.to_owned(), highest.1)
}
