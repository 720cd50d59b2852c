use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Amount;

pub type ProductId = Uuid;

/// A deposit product carries the yearly interest rate an account earns.
/// `yearly_rate` is a percentage: 5.0 means 5% per year.
///
/// The engine reads the rate at call time and never caches it across
/// operations; edits made through the directory take effect on the next
/// withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositProduct {
    pub id: ProductId,
    pub name: String,
    pub yearly_rate: Amount,
    pub created_at: DateTime<Utc>,
}

impl DepositProduct {
    pub fn new(name: String, yearly_rate: Amount) -> Self {
        assert!(
            yearly_rate >= Amount::ZERO,
            "Yearly rate must be non-negative"
        );
        Self {
            id: Uuid::new_v4(),
            name,
            yearly_rate,
            created_at: Utc::now(),
        }
    }
}
