//! Database schema initialization.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, expense::create_expense_table, idempotency::create_idempotency_key_table};

/// Create the tables for the domain models if they do not already exist.
///
/// All tables are created in a single exclusive transaction, so a database is
/// either fully initialized or left untouched.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_expense_table(&transaction)?;
    create_idempotency_key_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
