//! Defines the core data models and database queries for expenses.

use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{
    Amount, Error,
    database_id::ExpenseId,
    expense::form::ValidationErrors,
    idempotency::{IdempotencyKey, insert_idempotency_key},
};

/// The longest category name that can be stored.
pub const MAX_CATEGORY_LENGTH: usize = 100;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

// ============================================================================
// MODELS
// ============================================================================

/// Money spent on a given day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// How much was spent.
    pub amount: Amount,
    /// A short label used for filtering, e.g. "Food".
    pub category: String,
    /// What the money was spent on. May be empty.
    pub description: String,
    /// The accounting date of the expense.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The validated fields for an expense that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    amount: Amount,
    category: String,
    description: String,
    date: Date,
}

impl NewExpense {
    /// Create a new expense from its fields.
    ///
    /// Surrounding whitespace is trimmed from `category` and `description`.
    ///
    /// # Errors
    /// Returns [ValidationErrors] for the `category` field if it is blank or
    /// longer than [MAX_CATEGORY_LENGTH] characters.
    pub fn new(
        amount: Amount,
        category: &str,
        description: &str,
        date: Date,
    ) -> Result<Self, ValidationErrors> {
        let category = validate_category(category).map_err(|message| {
            let mut errors = ValidationErrors::default();
            errors.add("category", message);
            errors
        })?;

        Ok(Self {
            amount,
            category: category.to_owned(),
            description: description.trim().to_owned(),
            date,
        })
    }

    /// How much was spent.
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// The trimmed category name.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The trimmed description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The accounting date.
    pub fn date(&self) -> Date {
        self.date
    }
}

/// Trim `category` and check that it can be stored.
///
/// Returns the message to show the client if it cannot.
pub(crate) fn validate_category(category: &str) -> Result<&str, &'static str> {
    let category = category.trim();

    if category.is_empty() {
        Err("This field may not be blank.")
    } else if category.chars().count() > MAX_CATEGORY_LENGTH {
        Err("Ensure this field has no more than 100 characters.")
    } else {
        Ok(category)
    }
}

/// How to order the expenses returned by [list_expenses].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recent date first, then most recently created first.
    #[default]
    Default,
    /// Most recent date first. Expenses on the same date keep insertion order.
    DateDesc,
}

impl SortOrder {
    fn order_by_clause(self) -> &'static str {
        match self {
            SortOrder::Default => "date DESC, created_at DESC, id DESC",
            SortOrder::DateDesc => "date DESC, id ASC",
        }
    }
}

/// Which expenses to return from [list_expenses] and in what order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    /// Only return expenses whose category is exactly this value.
    pub category: Option<String>,
    /// The order of the returned expenses.
    pub sort: SortOrder,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            amount TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_category_date ON expense(category, date)",
        (),
    )?;

    Ok(())
}

/// Save `new_expense` and record `key` as processed, atomically.
///
/// Both rows are inserted in one transaction. If either insert fails the
/// transaction is rolled back when it is dropped, so there is never an expense
/// without its key or a key without its expense.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateIdempotencyKey] if `key` was recorded by another request,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense_and_key(
    new_expense: NewExpense,
    key: &IdempotencyKey,
    connection: &Connection,
) -> Result<Expense, Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;
    let created_at = OffsetDateTime::now_utc();

    let expense = transaction
        .prepare(
            "INSERT INTO expense (amount, category, description, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, amount, category, description, date, created_at",
        )?
        .query_row(
            (
                new_expense.amount,
                new_expense.category,
                new_expense.description,
                new_expense.date,
                created_at,
            ),
            map_expense_row,
        )?;

    insert_idempotency_key(key, created_at, &transaction)?;

    transaction.commit()?;

    tracing::debug!(
        "created expense {} for idempotency key {:?}",
        expense.id,
        key.as_str()
    );

    Ok(expense)
}

/// Get the expenses matching `filter`.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails or a row cannot be read.
pub fn list_expenses(
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let where_clause = if filter.category.is_some() {
        "WHERE category = ?1"
    } else {
        ""
    };
    let query = format!(
        "SELECT id, amount, category, description, date, created_at
         FROM expense
         {where_clause}
         ORDER BY {}",
        filter.sort.order_by_clause()
    );

    let mut statement = connection.prepare(&query)?;
    let rows = match &filter.category {
        Some(category) => statement.query_map((category,), map_expense_row)?,
        None => statement.query_map((), map_expense_row)?,
    };

    rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
}

/// The exact sum of the amounts of `expenses`, `0.00` if there are none.
pub fn total_amount(expenses: &[Expense]) -> Amount {
    expenses.iter().map(|expense| &expense.amount).sum()
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        amount: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        date: row.get(4)?,
        created_at: row.get(5)?,
    })
}
