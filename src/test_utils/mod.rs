#![allow(missing_docs)]

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, build_router, endpoints,
    auth::TokenResponse,
    insights::{
        ChatCompletionClient, CompletionClient, DEFAULT_COMPLETION_MODEL,
        DEFAULT_COMPLETION_TIMEOUT, DEFAULT_COMPLETION_URL,
    },
    transaction::Transaction,
};

pub(crate) const TEST_TOKEN_SECRET: &str = "nafstenoas";

/// A server with no completion API key, so insights always use the fallback.
pub(crate) fn get_test_server() -> TestServer {
    let client = ChatCompletionClient::new(
        DEFAULT_COMPLETION_URL,
        DEFAULT_COMPLETION_MODEL,
        None,
        DEFAULT_COMPLETION_TIMEOUT,
    )
    .expect("Could not create completion client");

    get_test_server_with_client(Arc::new(client))
}

pub(crate) fn get_test_server_with_client(
    completion_client: Arc<dyn CompletionClient>,
) -> TestServer {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    let mut state = AppState::new(connection, TEST_TOKEN_SECRET, completion_client, "₹")
        .expect("Could not create app state");
    // The lowest cost bcrypt allows, hashing at the default cost makes the tests slow.
    state.password_hash_cost = 4;

    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

pub(crate) async fn register_test_user(
    server: &TestServer,
    username: &str,
    email: &str,
    password: &str,
) {
    server
        .post(endpoints::REGISTER)
        .json(&json!({
            "username": username,
            "email": email,
            "password": password,
        }))
        .await
        .assert_status(StatusCode::CREATED);
}

pub(crate) async fn log_in_test_user(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({
            "email": email,
            "password": password,
        }))
        .await;

    response.assert_status_ok();
    response.json::<TokenResponse>().token
}

/// Register a user with `email` and return their token.
pub(crate) async fn log_in_new_user(server: &TestServer, email: &str) -> String {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({
            "username": "test",
            "email": email,
            "password": "hunter2",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    response.json::<TokenResponse>().token
}

pub(crate) async fn post_transaction(server: &TestServer, token: &str, body: Value) -> Transaction {
    let response = server
        .post(endpoints::TRANSACTIONS)
        .authorization_bearer(token)
        .json(&body)
        .await;

    response.assert_status(StatusCode::CREATED);
    response.json::<Transaction>()
}
