//! Validation of the JSON body sent to create an expense.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use serde_json::{Map, Value};
use time::{Date, macros::format_description};

use crate::{
    Amount,
    expense::{NewExpense, core::validate_category},
};

const REQUIRED: &str = "This field is required.";
const INVALID_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
const INVALID_STRING: &str = "Not a valid string.";
const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field-level validation messages, keyed by field name.
///
/// Serializes as `{"field": ["message", ...], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Add `message` to the list of errors for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// The messages for `field`, if there are any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Whether no errors have been added.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(NON_FIELD_ERRORS, message);
        errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect::<Vec<_>>();

        write!(f, "{}", fields.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Parse and validate the body of a create expense request.
///
/// The body must be a JSON object with the fields `amount` (string or number),
/// `category` (string), `date` (`YYYY-MM-DD`) and optionally `description`
/// (string). An empty body is treated as an empty object so that every missing
/// field is reported.
///
/// # Errors
/// Returns every problem found, not just the first.
pub fn parse_expense(body: &[u8]) -> Result<NewExpense, ValidationErrors> {
    let payload = parse_object(body)?;

    let amount = match payload.get("amount") {
        None | Some(Value::Null) => Err(REQUIRED.to_owned()),
        Some(Value::String(text)) => Amount::parse(text).map_err(|error| error.to_string()),
        Some(Value::Number(number)) => {
            Amount::parse(&number.to_string()).map_err(|error| error.to_string())
        }
        Some(_) => Err("A valid number is required.".to_owned()),
    };

    let category = match payload.get("category") {
        None | Some(Value::Null) => Err(REQUIRED),
        Some(value) => string_field(value)
            .ok_or(INVALID_STRING)
            .and_then(|category| validate_category(&category).map(str::to_owned)),
    };

    let description = match payload.get("description") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(value) => string_field(value).ok_or(INVALID_STRING),
    };

    let date = match payload.get("date") {
        None | Some(Value::Null) => Err(REQUIRED),
        Some(Value::String(text)) => parse_date(text).ok_or(INVALID_DATE),
        Some(_) => Err(INVALID_DATE),
    };

    match (amount, category, description, date) {
        (Ok(amount), Ok(category), Ok(description), Ok(date)) => {
            NewExpense::new(amount, &category, &description, date)
        }
        (amount, category, description, date) => {
            let mut errors = ValidationErrors::default();

            if let Err(message) = amount {
                errors.add("amount", message);
            }
            if let Err(message) = category {
                errors.add("category", message);
            }
            if let Err(message) = description {
                errors.add("description", message);
            }
            if let Err(message) = date {
                errors.add("date", message);
            }

            Err(errors)
        }
    }
}

fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ValidationErrors> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationErrors::non_field(
            "Invalid data. Expected a JSON object.",
        )),
        Err(error) => Err(ValidationErrors::non_field(format!(
            "JSON parse error - {error}"
        ))),
    }
}

/// Strings are taken as is, numbers are converted to their text.
fn string_field(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]")).ok()
}
