//! Application router configuration.

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::services::ServeDir;

use crate::{
    AppState, Error, endpoints,
    expense::{create_expense_endpoint, get_index_page, list_expenses_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.static_dir);

    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .nest_service(endpoints::STATIC, static_dir)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
