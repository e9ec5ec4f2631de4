//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/{transaction_id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/auth/login";
/// The route for getting the profile of the logged in user.
pub const CURRENT_USER: &str = "/auth/me";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to edit or delete a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The route for the totals, category breakdown and monthly trends.
pub const ANALYTICS: &str = "/transactions/analytics";
/// The route to download all transactions as a CSV file.
pub const EXPORT_CSV: &str = "/transactions/export/csv";
/// The route to download all transactions as a PDF report.
pub const EXPORT_PDF: &str = "/transactions/export/pdf";
/// The route to download an example CSV file for importing.
pub const SAMPLE_CSV: &str = "/transactions/sample/csv";
/// The route to upload a CSV file of transactions.
pub const IMPORT_CSV: &str = "/transactions/import/csv";
/// The route for a short written summary of the user's finances.
pub const AI_INSIGHTS: &str = "/transactions/ai-insights";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with a right brace, e.g.
/// '{transaction_id}' in '/transactions/{transaction_id}'.
/// If no parameter is found, `endpoint_path` is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| start + offset + 1);

    format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end..])
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::REGISTER,
            endpoints::LOG_IN,
            endpoints::CURRENT_USER,
            endpoints::TRANSACTIONS,
            endpoints::ANALYTICS,
            endpoints::EXPORT_CSV,
            endpoints::EXPORT_PDF,
            endpoints::SAMPLE_CSV,
            endpoints::IMPORT_CSV,
            endpoints::AI_INSIGHTS,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }

        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::TRANSACTION, 1));
    }

    #[test]
    fn replaces_parameter() {
        assert_eq!(
            format_endpoint(endpoints::TRANSACTION, 42),
            "/transactions/42"
        );
        assert_eq!(format_endpoint("/hello/{world}/bye", 1), "/hello/1/bye");
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        assert_eq!(format_endpoint("/hello/world", 1), "/hello/world");
    }
}
