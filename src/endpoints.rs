//! The API endpoints URIs.

/// The page for recording and browsing expenses.
pub const ROOT: &str = "/";
/// The route for static files.
pub const STATIC: &str = "/static";
/// The route to create and list expenses.
///
/// The trailing slash is part of the public API.
pub const EXPENSES: &str = "/expenses/";
