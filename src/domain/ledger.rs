use super::{Amount, Transaction};

/// Compute an account balance from its transaction history.
/// Amounts are signed, so the balance is the plain sum of the entries.
pub fn compute_balance(entries: &[Transaction]) -> Amount {
    entries.iter().map(|entry| entry.amount).sum()
}

/// The core ledger invariant: a stored balance must equal the signed sum of
/// the account's history.
pub fn balance_matches_history(balance: Amount, entries: &[Transaction]) -> bool {
    balance == compute_balance(entries)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_compute_balance_empty() {
        assert_eq!(compute_balance(&[]), Amount::ZERO);
    }

    #[test]
    fn test_compute_balance_mixed_entries() {
        let account = Uuid::new_v4();
        let entries = vec![
            Transaction::deposit(account, dec!(1000), Utc::now()),
            Transaction::interest(account, dec!(30.00), Utc::now()),
            Transaction::withdrawal(account, dec!(700), Utc::now()),
        ];

        assert_eq!(compute_balance(&entries), dec!(330.00));
    }

    #[test]
    fn test_balance_matches_history() {
        let account = Uuid::new_v4();
        let entries = vec![
            Transaction::deposit(account, dec!(250), Utc::now()),
            Transaction::withdrawal(account, dec!(100), Utc::now()),
        ];

        assert!(balance_matches_history(dec!(150), &entries));
        assert!(!balance_matches_history(dec!(250), &entries));
    }
}
