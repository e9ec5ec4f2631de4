//! Parsing and formatting of the date formats clients send and exports use.

use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::Error;

/// Parse a transaction date.
///
/// Accepts `DD-MM-YYYY`, `DD/MM/YYYY`, `YYYY-MM-DD` and RFC 3339 timestamps.
/// Timestamps are converted to UTC and only the date is kept.
/// Free-form dates such as `Oct 14, 2025` are not accepted, on import or
/// through the API.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is not a valid date in any of the
/// accepted formats.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    let text = text.trim();

    let day_month_year_dash = format_description!("[day]-[month]-[year]");
    let day_month_year_slash = format_description!("[day]/[month]/[year]");
    let year_month_day = format_description!("[year]-[month]-[day]");

    Date::parse(text, day_month_year_dash)
        .or_else(|_| Date::parse(text, day_month_year_slash))
        .or_else(|_| Date::parse(text, year_month_day))
        .or_else(|_| {
            OffsetDateTime::parse(text, &Rfc3339)
                .map(|date_time| date_time.to_offset(time::UtcOffset::UTC).date())
        })
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}

/// Format `date` as `DD/MM/YYYY`.
pub fn format_day_month_year(date: Date) -> String {
    format!(
        "{:02}/{:02}/{}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}
