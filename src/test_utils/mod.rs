#![allow(missing_docs)]

pub(crate) mod html;
pub(crate) mod http;

use rusqlite::Connection;

use crate::db::initialize;

pub(crate) use html::{assert_valid_html, parse_html_document};
pub(crate) use http::{assert_content_type, parse_json};

/// An in-memory database with all tables created.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}
