//! Short written insights on a user's finances.
//!
//! Insights are generated by a chat completion API when one is configured.
//! Any failure falls back to a summary generated locally.

mod client;
mod endpoint;
mod prompt;

pub use client::{
    ChatCompletionClient, CompletionClient, DEFAULT_COMPLETION_MODEL, DEFAULT_COMPLETION_TIMEOUT,
    DEFAULT_COMPLETION_URL, InsightError,
};
pub use endpoint::get_insights;
pub use prompt::{
    InsightSummary, NO_TRANSACTIONS_INSIGHT, SYSTEM_PROMPT, build_prompt, fallback_insight,
};

#[cfg(test)]
pub use endpoint::InsightResponse;
