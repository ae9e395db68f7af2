//! Expenses: the data model, database queries, JSON endpoints and UI page.

mod core;
mod create_endpoint;
mod form;
mod index_page;
mod list_endpoint;

pub use core::{
    Expense, ExpenseFilter, NewExpense, SortOrder, create_expense_and_key, create_expense_table,
    list_expenses, total_amount,
};
pub use create_endpoint::{AlreadyProcessed, CreateExpenseState, create_expense_endpoint};
pub use form::{ValidationErrors, parse_expense};
pub use index_page::get_index_page;
pub use list_endpoint::{
    ExpenseListResponse, ExpenseQuery, ListExpensesState, list_expenses_endpoint,
};
