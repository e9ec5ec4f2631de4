//! Importing transactions from CSV files.

mod endpoint;
mod parse;

pub use endpoint::{MAX_UPLOAD_BYTES, import_csv};
pub use parse::{MAX_IMPORT_ROWS, parse_csv};

#[cfg(test)]
pub use endpoint::ImportResponse;
