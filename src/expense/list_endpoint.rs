//! Defines the endpoint for listing, filtering and totalling expenses.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Amount, AppState, Error,
    expense::{Expense, ExpenseFilter, SortOrder, list_expenses, total_amount},
};

/// The query string value that selects [SortOrder::DateDesc].
pub const SORT_DATE_DESC: &str = "date_desc";

/// The state needed to list expenses.
#[derive(Debug, Clone)]
pub struct ListExpensesState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for listing expenses.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ExpenseQuery {
    /// Only include expenses in this category. Empty means all categories.
    pub category: Option<String>,
    /// `date_desc` to sort by date only. Anything else uses the default order.
    pub sort: Option<String>,
}

impl From<ExpenseQuery> for ExpenseFilter {
    fn from(query: ExpenseQuery) -> Self {
        let category = query.category.filter(|category| !category.is_empty());
        let sort = match query.sort.as_deref() {
            Some(SORT_DATE_DESC) => SortOrder::DateDesc,
            _ => SortOrder::Default,
        };

        Self { category, sort }
    }
}

/// The expenses matching a query and the sum of their amounts.
#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    /// The matching expenses.
    pub expenses: Vec<Expense>,
    /// The exact sum of the amounts of `expenses`.
    pub total: Amount,
}

/// A route handler for listing expenses.
pub async fn list_expenses_endpoint(
    State(state): State<ListExpensesState>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<ExpenseListResponse>, Error> {
    let filter = ExpenseFilter::from(query);

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let expenses = list_expenses(&filter, &connection)?;
    let total = total_amount(&expenses);

    tracing::debug!(
        "listing {} expenses for {filter:?} with total {total}",
        expenses.len()
    );

    Ok(Json(ExpenseListResponse { expenses, total }))
}

#[cfg(test)]
mod expense_query_tests {
    use crate::expense::{ExpenseFilter, ExpenseQuery, SortOrder};

    #[test]
    fn no_parameters_is_unfiltered_default_order() {
        let filter = ExpenseFilter::from(ExpenseQuery::default());

        assert_eq!(filter, ExpenseFilter::default());
    }

    #[test]
    fn empty_category_is_not_a_filter() {
        let filter = ExpenseFilter::from(ExpenseQuery {
            category: Some(String::new()),
            sort: None,
        });

        assert_eq!(filter.category, None);
    }

    #[test]
    fn date_desc_selects_date_sort() {
        let filter = ExpenseFilter::from(ExpenseQuery {
            category: Some("Food".to_owned()),
            sort: Some("date_desc".to_owned()),
        });

        assert_eq!(filter.category.as_deref(), Some("Food"));
        assert_eq!(filter.sort, SortOrder::DateDesc);
    }

    #[test]
    fn unknown_sort_uses_default_order() {
        let filter = ExpenseFilter::from(ExpenseQuery {
            category: None,
            sort: Some("amount_asc".to_owned()),
        });

        assert_eq!(filter.sort, SortOrder::Default);
    }
}
