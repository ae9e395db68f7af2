//! Defines the endpoint for creating a new expense.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    body::Bytes,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::{TypedHeader, typed_header::TypedHeaderRejection};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    expense::{create_expense_and_key, parse_expense},
    idempotency::{IdempotencyKey, key_exists},
};

/// The state needed to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response for a request whose idempotency key has already been used.
///
/// It does not say which expense the earlier request created.
#[derive(Debug, Clone, Copy)]
pub struct AlreadyProcessed;

impl IntoResponse for AlreadyProcessed {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            Json(json!({ "message": "Request already processed" })),
        )
            .into_response()
    }
}

/// A route handler for creating a new expense.
///
/// Responds with `201 Created` and the new expense, or with
/// [AlreadyProcessed] if the `Idempotency-Key` has been seen before. A
/// repeated key short-circuits before the body is read, so a retry with a
/// different body is ignored.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    idempotency_key: Result<TypedHeader<IdempotencyKey>, TypedHeaderRejection>,
    body: Bytes,
) -> Result<Response, Error> {
    let idempotency_key = match idempotency_key {
        Ok(TypedHeader(idempotency_key)) => idempotency_key,
        Err(rejection) => {
            tracing::debug!("rejected expense request: {rejection}");
            return Err(Error::MissingIdempotencyKey);
        }
    };

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    if key_exists(&idempotency_key, &connection)? {
        tracing::info!(
            "skipping expense for idempotency key {:?}, already processed",
            idempotency_key.as_str()
        );
        return Ok(AlreadyProcessed.into_response());
    }

    let new_expense = parse_expense(&body)?;

    match create_expense_and_key(new_expense, &idempotency_key, &connection) {
        Ok(expense) => Ok((StatusCode::CREATED, Json(expense)).into_response()),
        Err(Error::DuplicateIdempotencyKey) => {
            tracing::warn!(
                "idempotency key {:?} was recorded by a concurrent request",
                idempotency_key.as_str()
            );
            Ok(AlreadyProcessed.into_response())
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod create_expense_endpoint_tests {
    use std::future::IntoFuture;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{AppState, build_router, endpoints};

    fn get_test_server() -> (TestServer, AppState) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state = AppState::new(connection, "static").expect("Could not create app state");
        let server =
            TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

        (server, state)
    }

    fn count_rows(table: &str, state: &AppState) -> i64 {
        state
            .db_connection
            .lock()
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), (), |row| {
                row.get(0)
            })
            .unwrap()
    }

    fn lunch() -> Value {
        json!({
            "amount": "12.50",
            "category": "Food",
            "description": "Lunch",
            "date": "2025-03-14",
        })
    }

    #[tokio::test]
    async fn creates_expense() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "abc-123")
            .json(&lunch())
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["id"], 1);
        assert_eq!(body["amount"], "12.50");
        assert_eq!(body["category"], "Food");
        assert_eq!(body["description"], "Lunch");
        assert_eq!(body["date"], "2025-03-14");
        assert!(body["created_at"].is_string());
        assert_eq!(count_rows("expense", &state), 1);
        assert_eq!(count_rows("idempotency_key", &state), 1);
    }

    #[tokio::test]
    async fn missing_key_is_bad_request() {
        let (server, state) = get_test_server();

        let response = server.post(endpoints::EXPENSES).json(&lunch()).await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "error": "Idempotency-Key header required" }));
        assert_eq!(count_rows("expense", &state), 0);
    }

    #[tokio::test]
    async fn empty_key_is_bad_request() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "")
            .json(&lunch())
            .await;

        response.assert_status_bad_request();
        assert_eq!(count_rows("expense", &state), 0);
    }

    #[tokio::test]
    async fn repeated_key_is_already_processed() {
        let (server, state) = get_test_server();
        server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "retry-me")
            .json(&lunch())
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "retry-me")
            .json(&lunch())
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Request already processed" }));
        assert_eq!(count_rows("expense", &state), 1);
    }

    #[tokio::test]
    async fn repeated_key_ignores_different_payload() {
        let (server, state) = get_test_server();
        server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "retry-me")
            .json(&lunch())
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "retry-me")
            .json(&json!({ "amount": "not a number" }))
            .await;

        response.assert_status_ok();
        assert_eq!(count_rows("expense", &state), 1);
        let stored_amount: String = state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT amount FROM expense", (), |row| row.get(0))
            .unwrap();
        assert_eq!(stored_amount, "12.50");
    }

    #[tokio::test]
    async fn invalid_payload_records_nothing() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "fix-me")
            .json(&json!({ "amount": "12.345", "category": "Food" }))
            .await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert_eq!(
            body["amount"],
            json!(["Ensure that there are no more than 2 decimal places."])
        );
        assert_eq!(body["date"], json!(["This field is required."]));
        assert_eq!(count_rows("expense", &state), 0);
        assert_eq!(count_rows("idempotency_key", &state), 0);
    }

    #[tokio::test]
    async fn corrected_retry_with_same_key_succeeds() {
        let (server, state) = get_test_server();
        server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "fix-me")
            .json(&json!({ "amount": "12.50", "category": "Food" }))
            .await
            .assert_status_bad_request();

        let response = server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "fix-me")
            .json(&lunch())
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(count_rows("expense", &state), 1);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "broken")
            .content_type("application/json")
            .bytes("{\"amount\":".into())
            .await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert!(body["non_field_errors"].is_array());
        assert_eq!(count_rows("expense", &state), 0);
    }

    #[tokio::test]
    async fn concurrent_requests_with_same_key_create_one_expense() {
        let (server, state) = get_test_server();
        let other_payload = json!({
            "amount": "99.99",
            "category": "Travel",
            "date": "2025-03-15",
        });

        let first = server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "same-key")
            .json(&lunch());
        let second = server
            .post(endpoints::EXPENSES)
            .add_header("Idempotency-Key", "same-key")
            .json(&other_payload);
        let (first, second) = tokio::join!(first.into_future(), second.into_future());

        let mut statuses = vec![first.status_code(), second.status_code()];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CREATED]);
        assert_eq!(count_rows("expense", &state), 1);
    }
}
