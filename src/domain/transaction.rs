use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Amount};

pub type TransactionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Credit from the customer; stored with a positive amount
    Deposit,
    /// Debit to the customer; stored with a negative amount
    Withdraw,
    /// Interest realized at withdrawal time; stored with a positive amount
    Interest,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdraw => "WITHDRAW",
            TransactionKind::Interest => "INTEREST",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DEPOSIT" => Some(TransactionKind::Deposit),
            "WITHDRAW" => Some(TransactionKind::Withdraw),
            "INTEREST" => Some(TransactionKind::Interest),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable ledger entry for a single account. Once written it is never
/// modified; corrections are made by appending further entries.
///
/// Amounts are signed: deposits and interest are positive, withdrawals
/// negative. Every reader relies on this — an account's balance is the plain
/// sum of its entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Monotonically increasing sequence number for ordering
    pub sequence: i64,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    /// Signed amount (see the kind's sign convention)
    pub amount: Amount,
    /// When the operation occurred
    pub transaction_date: DateTime<Utc>,
    /// When we recorded this entry in the system
    pub recorded_at: DateTime<Utc>,
}

impl Transaction {
    fn new(
        kind: TransactionKind,
        account_id: AccountId,
        amount: Amount,
        transaction_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0, // Will be set by repository
            account_id,
            kind,
            amount,
            transaction_date,
            recorded_at: Utc::now(),
        }
    }

    /// Create a deposit entry. `amount` is the credited magnitude.
    pub fn deposit(account_id: AccountId, amount: Amount, date: DateTime<Utc>) -> Self {
        assert!(amount > Amount::ZERO, "Deposit amount must be positive");
        Self::new(TransactionKind::Deposit, account_id, amount, date)
    }

    /// Create a withdrawal entry. `amount` is the debited magnitude; the
    /// entry stores it negated.
    pub fn withdrawal(account_id: AccountId, amount: Amount, date: DateTime<Utc>) -> Self {
        assert!(amount > Amount::ZERO, "Withdrawal amount must be positive");
        Self::new(TransactionKind::Withdraw, account_id, -amount, date)
    }

    /// Create an interest entry. `amount` is the realized interest.
    pub fn interest(account_id: AccountId, amount: Amount, date: DateTime<Utc>) -> Self {
        assert!(amount > Amount::ZERO, "Interest amount must be positive");
        Self::new(TransactionKind::Interest, account_id, amount, date)
    }

    /// Unsigned size of the entry, for display.
    pub fn magnitude(&self) -> Amount {
        self.amount.abs()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_deposit_entry() {
        let account = Uuid::new_v4();
        let entry = Transaction::deposit(account, dec!(50.00), Utc::now());

        assert_eq!(entry.kind, TransactionKind::Deposit);
        assert_eq!(entry.amount, dec!(50.00));
        assert_eq!(entry.account_id, account);
    }

    #[test]
    fn test_withdrawal_entry_is_negative() {
        let entry = Transaction::withdrawal(Uuid::new_v4(), dec!(700), Utc::now());

        assert_eq!(entry.kind, TransactionKind::Withdraw);
        assert_eq!(entry.amount, dec!(-700));
        assert_eq!(entry.magnitude(), dec!(700));
    }

    #[test]
    fn test_interest_entry() {
        let entry = Transaction::interest(Uuid::new_v4(), dec!(30.00), Utc::now());

        assert_eq!(entry.kind, TransactionKind::Interest);
        assert_eq!(entry.amount, dec!(30.00));
    }

    #[test]
    #[should_panic(expected = "Deposit amount must be positive")]
    fn test_deposit_requires_positive_amount() {
        Transaction::deposit(Uuid::new_v4(), dec!(0), Utc::now());
    }

    #[test]
    #[should_panic(expected = "Withdrawal amount must be positive")]
    fn test_withdrawal_requires_positive_amount() {
        Transaction::withdrawal(Uuid::new_v4(), dec!(-5), Utc::now());
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            TransactionKind::Deposit,
            TransactionKind::Withdraw,
            TransactionKind::Interest,
        ] {
            assert_eq!(TransactionKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::from_str("TRANSFER"), None);
    }
}
