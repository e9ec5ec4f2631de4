//! Downloads of a user's transactions as CSV and PDF files.

mod csv;
mod endpoints;
mod pdf;

pub use self::csv::{SAMPLE_CSV, transactions_to_csv};
pub use endpoints::{export_csv, export_pdf, get_sample_csv};
pub use pdf::{REPORT_TITLE, render_pdf, report_lines};
