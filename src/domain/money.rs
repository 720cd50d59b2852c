use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Money is an arbitrary-precision decimal. Intermediate results keep full
/// precision; rounding happens once, at the point an amount is reported or
/// realized into a ledger entry.
pub type Amount = Decimal;

/// Round an amount to cent precision, half-up (midpoint away from zero).
/// Example: 25.005 -> 25.01, -25.005 -> -25.01
pub fn round_money(amount: Amount) -> Amount {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as a currency string with two decimal places.
/// Example: 5000 -> "5000.00", -12.3 -> "-12.30"
pub fn format_amount(amount: Amount) -> String {
    format!("{:.2}", round_money(amount))
}

/// Parse a decimal string into an Amount at cent precision.
/// Example: "50.00" -> 50.00, "12.5" -> 12.50, "100" -> 100
/// Sub-cent digits are rounded half-up: "100.999" -> 101.00
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let amount = Decimal::from_str(input.trim()).map_err(|_| ParseAmountError::InvalidFormat)?;
    Ok(round_money(amount))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseAmountError {}
