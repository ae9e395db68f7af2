//! Expense tracker is a small web API for recording expenses and querying
//! them.
//!
//! Clients create expenses with `POST /expenses/`, sending an
//! `Idempotency-Key` header so that retried requests are applied at most once,
//! and list, filter and total expenses with `GET /expenses/`.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod amount;
mod app_state;
mod database_id;
mod db;
mod endpoints;
mod error;
mod expense;
mod html;
mod idempotency;
mod logging;
mod routing;
#[cfg(test)]
mod test_utils;

pub use amount::{Amount, AmountError};
pub use app_state::AppState;
pub use database_id::{DatabaseId, ExpenseId};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use expense::{
    Expense, ExpenseFilter, NewExpense, SortOrder, ValidationErrors, create_expense_and_key,
    list_expenses, total_amount,
};
pub use idempotency::{IdempotencyKey, key_exists};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
