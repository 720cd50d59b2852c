use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, CustomerId, ProductId};

pub type AccountId = Uuid;

/// A deposit account: belongs to exactly one customer and one product.
/// `start_date` is the accrual anchor interest is measured from.
///
/// The balance is mutated only by the transaction engine, inside the
/// repository's atomic unit; accounts open at zero so the balance always
/// equals the signed sum of the transaction history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub balance: Amount,
    pub start_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(customer_id: CustomerId, product_id: ProductId, start_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            product_id,
            balance: Amount::ZERO,
            start_date,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_opens_at_zero() {
        let account = Account::new(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
        assert_eq!(account.balance, Amount::ZERO);
    }
}
