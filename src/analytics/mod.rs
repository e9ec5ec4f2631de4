//! Summaries of a user's transactions.

mod aggregation;
mod endpoint;

pub use aggregation::{Analytics, aggregate, highest_category};
pub use endpoint::get_analytics;
