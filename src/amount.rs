//! Fixed-point money amounts.
//!
//! Amounts are stored as [Decimal] with exactly two decimal places and never
//! pass through floating point, so sums of many amounts stay exact to the
//! cent.

use std::{fmt, iter::Sum, ops::Add, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// The number of digits stored after the decimal point.
pub const DECIMAL_PLACES: u32 = 2;

/// The maximum number of significant digits an amount may have, including the
/// decimal places.
pub const MAX_DIGITS: u32 = 10;

/// An amount of money with two decimal places and at most ten digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

/// The reasons text can be rejected as an [Amount].
///
/// The messages are shown to API clients as field errors.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum AmountError {
    /// The text is not a finite decimal number.
    #[error("A valid number is required.")]
    NotANumber,

    /// The number has more than [MAX_DIGITS] digits.
    #[error("Ensure that there are no more than 10 digits in total.")]
    TooManyDigits,

    /// The number has more than [DECIMAL_PLACES] digits after the decimal
    /// point.
    #[error("Ensure that there are no more than 2 decimal places.")]
    TooManyDecimalPlaces,

    /// The number has more digits before the decimal point than fit alongside
    /// the decimal places.
    #[error("Ensure that there are no more than 8 digits before the decimal point.")]
    TooManyWholeDigits,
}

impl Amount {
    /// Zero with two decimal places.
    pub fn zero() -> Self {
        Self(Decimal::new(0, DECIMAL_PLACES))
    }

    /// Parse a decimal string such as `"12.5"` or `"-3.99"`.
    ///
    /// Scientific notation (`"1e2"`) is accepted. Leading and trailing
    /// whitespace is ignored. Precision is checked on the digits as written,
    /// so `"1.500"` is rejected for having three decimal places.
    ///
    /// # Errors
    /// Returns an [AmountError] describing the first precision rule the
    /// number breaks, or [AmountError::NotANumber] if it cannot be parsed.
    pub fn parse(text: &str) -> Result<Self, AmountError> {
        let text = text.trim();

        let value = Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|_| AmountError::NotANumber)?;

        check_precision(value)?;

        Ok(Self::from_decimal_unchecked(value))
    }

    fn from_decimal_unchecked(value: Decimal) -> Self {
        let mut value = value;
        value.rescale(DECIMAL_PLACES);
        Self(value)
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

/// Count the digits as written and check them against the column limits.
///
/// The checks run in order: total digits, then decimal places, then whole
/// digits.
fn check_precision(value: Decimal) -> Result<(), AmountError> {
    let digit_count = count_digits(value.mantissa().unsigned_abs());
    let scale = value.scale();

    let (total_digits, decimal_places) = if scale == 0 {
        (digit_count, 0)
    } else if digit_count > scale {
        (digit_count, scale)
    } else {
        // e.g. "0.05" has one significant digit but two decimal places.
        (scale, scale)
    };
    let whole_digits = total_digits - decimal_places;

    if total_digits > MAX_DIGITS {
        return Err(AmountError::TooManyDigits);
    }

    if decimal_places > DECIMAL_PLACES {
        return Err(AmountError::TooManyDecimalPlaces);
    }

    if whole_digits > MAX_DIGITS - DECIMAL_PLACES {
        return Err(AmountError::TooManyWholeDigits);
    }

    Ok(())
}

fn count_digits(mut value: u128) -> u32 {
    let mut count = 1;

    while value >= 10 {
        value /= 10;
        count += 1;
    }

    count
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_decimal_unchecked(self.0 + rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Amounts are serialized as strings, e.g. `"12.50"`, so that JSON clients do
/// not round them through floating point.
impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        Decimal::from_str(text)
            .map(Self::from_decimal_unchecked)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}


#[cfg(test)]
mod sum_tests {
    use super::Amount;

    #[test]
    fn sum_is_exact() {
        let amounts = [
            Amount::parse("0.10").unwrap(),
            Amount::parse("0.20").unwrap(),
        ];

        let total: Amount = amounts.iter().sum();

        assert_eq!(total, Amount::parse("0.30").unwrap());
        assert_eq!(total.to_string(), "0.30");
    }

    #[test]
    fn sum_of_many_cents_does_not_drift() {
        let cent = Amount::parse("0.01").unwrap();

        let total: Amount = std::iter::repeat_n(cent, 100_000).sum();

        assert_eq!(total.to_string(), "1000.00");
    }

    #[test]
    fn empty_sum_is_zero_with_two_decimal_places() {
        let total: Amount = std::iter::empty::<Amount>().sum();

        assert_eq!(total.to_string(), "0.00");
    }
}

#[cfg(test)]
mod sql_tests {
    use rusqlite::Connection;

    use super::Amount;

    #[test]
    fn stored_as_text_with_two_decimal_places() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute("CREATE TABLE money (amount TEXT NOT NULL)", ())
            .unwrap();
        let amount = Amount::parse("7.5").unwrap();

        connection
            .execute("INSERT INTO money (amount) VALUES (?1)", (amount,))
            .unwrap();

        let text: String = connection
            .query_row("SELECT amount FROM money", (), |row| row.get(0))
            .unwrap();
        let got: Amount = connection
            .query_row("SELECT amount FROM money", (), |row| row.get(0))
            .unwrap();
        assert_eq!(text, "7.50");
        assert_eq!(got, amount);
    }
}
