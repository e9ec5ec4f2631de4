//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};

use crate::{
    AppState, Error,
    analytics::get_analytics,
    auth::{auth_guard, get_current_user, log_in, register_user},
    csv_import::{MAX_UPLOAD_BYTES, import_csv},
    endpoints,
    export::{export_csv, export_pdf, get_sample_csv},
    insights::get_insights,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(log_in));

    let protected_routes = Router::new()
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::ANALYTICS, get(get_analytics))
        .route(endpoints::EXPORT_CSV, get(export_csv))
        .route(endpoints::EXPORT_PDF, get(export_pdf))
        .route(endpoints::SAMPLE_CSV, get(get_sample_csv))
        .route(
            endpoints::IMPORT_CSV,
            post(import_csv).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(endpoints::AI_INSIGHTS, get(get_insights))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use crate::{
        endpoints,
        test_utils::{get_test_server, log_in_new_user},
    };

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let server = get_test_server();

        let response = server.get("/does/not/exist").await;

        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "Not found");
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let server = get_test_server();

        for path in [
            endpoints::CURRENT_USER,
            endpoints::TRANSACTIONS,
            endpoints::ANALYTICS,
            endpoints::EXPORT_CSV,
            endpoints::EXPORT_PDF,
            endpoints::SAMPLE_CSV,
            endpoints::AI_INSIGHTS,
        ] {
            let response = server.get(path).await;

            response.assert_status_unauthorized();
            assert_eq!(response.json::<Value>()["message"], "No token provided");
        }
    }

    #[tokio::test]
    async fn static_routes_are_not_taken_as_transaction_ids() {
        let server = get_test_server();
        let token = log_in_new_user(&server, "a@x.com").await;

        server
            .get(endpoints::ANALYTICS)
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
        server
            .get(endpoints::AI_INSIGHTS)
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
    }
}
