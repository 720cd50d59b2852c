use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;

use super::Amount;

/// Whole calendar months elapsed between `anchor` and `evaluation`.
/// Computed as year*12+month arithmetic; the day of month is ignored, so a
/// withdrawal on the same day-of-month as the anchor completes that month.
/// An evaluation before the anchor counts as zero elapsed time.
pub fn elapsed_months(anchor: DateTime<Utc>, evaluation: DateTime<Utc>) -> u32 {
    let months = (evaluation.year() - anchor.year()) * 12 + evaluation.month() as i32
        - anchor.month() as i32;
    months.max(0) as u32
}

/// Simple (non-compounding) interest accrued on `principal` between `anchor`
/// and `evaluation` at `yearly_rate_percent` (5.0 means 5%/year).
///
/// interest = principal * elapsed_months * yearly_rate_percent / 1200
///
/// The single division comes last, so exact inputs produce exact results.
/// The result is unrounded; callers round once when they realize it.
pub fn accrued_interest(
    principal: Amount,
    yearly_rate_percent: Amount,
    anchor: DateTime<Utc>,
    evaluation: DateTime<Utc>,
) -> Result<Amount, InterestError> {
    if principal < Amount::ZERO {
        return Err(InterestError::NegativePrincipal);
    }
    if yearly_rate_percent < Amount::ZERO {
        return Err(InterestError::NegativeRate);
    }

    let months = Decimal::from(elapsed_months(anchor, evaluation));
    Ok(principal * months * yearly_rate_percent / Decimal::from(1200))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterestError {
    NegativePrincipal,
    NegativeRate,
}

impl std::fmt::Display for InterestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterestError::NegativePrincipal => write!(f, "principal must not be negative"),
            InterestError::NegativeRate => write!(f, "yearly rate must not be negative"),
        }
    }
}

impl std::error::Error for InterestError {}
