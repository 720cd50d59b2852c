use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{AccountId, Amount, Transaction, accrued_interest, round_money};
use crate::storage::{CommitOutcome, Repository};

use super::AppError;

/// Attempts at the guarded commit before giving up. Every retry re-reads the
/// account and re-runs the sufficiency check, so a retry can still end in
/// InsufficientFunds against the freshly committed balance.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// The transaction engine: deposits and withdrawals, each atomic with
/// respect to the store.
///
/// Account state, product rate, and associations are re-read on every call;
/// nothing is cached across operations. The balance is never mutated outside
/// the repository's guarded atomic unit.
pub struct TransactionEngine {
    repo: Repository,
}

/// Result of a successful withdrawal.
pub struct WithdrawalOutcome {
    /// Interest realized by this withdrawal (zero if none had accrued)
    pub interest_earned: Amount,
    /// Balance plus realized interest, before the withdrawal was applied
    pub balance_before_withdraw: Amount,
    /// Account balance after the withdrawal
    pub updated_balance: Amount,
    /// The ledger entries this withdrawal appended, in order
    pub transactions: Vec<Transaction>,
}

impl TransactionEngine {
    /// Create a new engine over the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Deposit `amount` into an account, appending a DEPOSIT entry and
    /// incrementing the balance in one atomic unit.
    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount: Amount,
        date: DateTime<Utc>,
    ) -> Result<Transaction, AppError> {
        if amount <= Amount::ZERO {
            return Err(AppError::InvalidAmount(
                "Deposit amount must be positive".to_string(),
            ));
        }

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let account = self
                .repo
                .get_account(account_id)
                .await?
                .ok_or(AppError::AccountNotFound(account_id))?;

            let new_balance = account.balance + amount;
            let mut entries = vec![Transaction::deposit(account_id, amount, date)];

            match self
                .repo
                .commit_entries(account_id, account.balance, new_balance, &mut entries)
                .await?
            {
                CommitOutcome::Committed => {
                    debug!(%account_id, amount = %amount, "deposit committed");
                    return Ok(entries.remove(0));
                }
                CommitOutcome::StaleBalance => {
                    warn!(%account_id, attempt, "balance moved under deposit, retrying");
                }
            }
        }

        Err(AppError::Database(anyhow!(
            "deposit kept losing the balance race for account {account_id}"
        )))
    }

    /// Withdraw `amount` from an account. Interest accrued since the
    /// account's start date is realized first; the withdrawal must fit
    /// within balance plus realized interest.
    ///
    /// On success the atomic unit holds an INTEREST entry (when interest is
    /// positive), the WITHDRAW entry, and the balance update. On
    /// insufficient funds nothing is written.
    pub async fn withdraw(
        &self,
        account_id: AccountId,
        amount: Amount,
        date: DateTime<Utc>,
    ) -> Result<WithdrawalOutcome, AppError> {
        if amount <= Amount::ZERO {
            return Err(AppError::InvalidAmount(
                "Withdrawal amount must be positive".to_string(),
            ));
        }

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let (account, product) = self
                .repo
                .get_account_with_product(account_id)
                .await?
                .ok_or(AppError::AccountNotFound(account_id))?;

            // Realize accrued interest at cent precision: the rounded value
            // is what lands in the ledger, so the sufficiency check and the
            // new balance must use the same figure.
            let interest_earned = round_money(accrued_interest(
                account.balance,
                product.yearly_rate,
                account.start_date,
                date,
            )?);

            let available = account.balance + interest_earned;
            if amount > available {
                return Err(AppError::InsufficientFunds {
                    available: round_money(available),
                });
            }
            let updated_balance = available - amount;

            let mut entries = Vec::with_capacity(2);
            if interest_earned > Amount::ZERO {
                entries.push(Transaction::interest(account_id, interest_earned, date));
            }
            entries.push(Transaction::withdrawal(account_id, amount, date));

            match self
                .repo
                .commit_entries(account_id, account.balance, updated_balance, &mut entries)
                .await?
            {
                CommitOutcome::Committed => {
                    debug!(
                        %account_id,
                        amount = %amount,
                        interest = %interest_earned,
                        "withdrawal committed"
                    );
                    return Ok(WithdrawalOutcome {
                        interest_earned,
                        balance_before_withdraw: available,
                        updated_balance,
                        transactions: entries,
                    });
                }
                CommitOutcome::StaleBalance => {
                    warn!(%account_id, attempt, "balance moved under withdrawal, retrying");
                }
            }
        }

        Err(AppError::Database(anyhow!(
            "withdrawal kept losing the balance race for account {account_id}"
        )))
    }

    /// The account's full transaction history, oldest first.
    pub async fn history(&self, account_id: AccountId) -> Result<Vec<Transaction>, AppError> {
        self.repo
            .get_account(account_id)
            .await?
            .ok_or(AppError::AccountNotFound(account_id))?;
        Ok(self.repo.list_transactions_for_account(account_id).await?)
    }
}
