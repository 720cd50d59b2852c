use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccountId, Amount, DepositProduct, TransactionKind, balance_matches_history, compute_balance,
};
use crate::storage::Repository;

use super::AppError;

/// Ledger-wide totals plus recent activity, bucketed by calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overview {
    pub generated_at: DateTime<Utc>,
    pub total_customers: i64,
    pub total_accounts: i64,
    pub total_balance: Amount,
    pub window_days: i64,
    pub daily_activity: Vec<DailyActivity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    /// Sum of DEPOSIT amounts for the day
    pub deposited: Amount,
    /// Sum of WITHDRAW magnitudes for the day
    pub withdrawn: Amount,
    /// Sum of INTEREST amounts for the day
    pub interest_credited: Amount,
    pub transaction_count: i64,
}

/// How accounts and balances spread across products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductShare {
    pub product: DepositProduct,
    pub account_count: i64,
    pub total_balance: Amount,
}

/// Result of verifying every stored balance against its history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub account_count: i64,
    pub transaction_count: i64,
    pub mismatches: Vec<BalanceMismatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceMismatch {
    pub account_id: AccountId,
    pub stored_balance: Amount,
    pub computed_balance: Amount,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Read-only aggregates over the ledger.
pub struct Reports {
    repo: Repository,
}

impl Reports {
    /// Create a new reporting service over the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Totals plus daily activity for the trailing `days`-day window.
    /// Every day in the window appears, including quiet ones.
    ///
    /// Monetary sums are folded here rather than in SQL: amounts are stored
    /// as decimal text, which SQL aggregation would coerce lossily.
    pub async fn overview(&self, days: i64) -> Result<Overview, AppError> {
        let generated_at = Utc::now();
        let total_customers = self.repo.count_customers().await?;
        let total_accounts = self.repo.count_accounts().await?;

        let accounts = self.repo.list_accounts().await?;
        let total_balance = accounts.iter().map(|account| account.balance).sum();

        let window_start = (generated_at - Duration::days(days.max(0)))
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc();
        let recent = self.repo.list_transactions_since(window_start).await?;

        let mut buckets: HashMap<NaiveDate, DailyActivity> = HashMap::new();
        for entry in &recent {
            let day = entry.transaction_date.date_naive();
            let bucket = buckets.entry(day).or_insert_with(|| DailyActivity {
                date: day,
                deposited: Amount::ZERO,
                withdrawn: Amount::ZERO,
                interest_credited: Amount::ZERO,
                transaction_count: 0,
            });
            match entry.kind {
                TransactionKind::Deposit => bucket.deposited += entry.amount,
                TransactionKind::Withdraw => bucket.withdrawn += entry.magnitude(),
                TransactionKind::Interest => bucket.interest_credited += entry.amount,
            }
            bucket.transaction_count += 1;
        }

        let daily_activity = (0..=days.max(0))
            .map(|offset| {
                let date = window_start.date_naive() + Duration::days(offset);
                buckets.remove(&date).unwrap_or(DailyActivity {
                    date,
                    deposited: Amount::ZERO,
                    withdrawn: Amount::ZERO,
                    interest_credited: Amount::ZERO,
                    transaction_count: 0,
                })
            })
            .collect();

        Ok(Overview {
            generated_at,
            total_customers,
            total_accounts,
            total_balance,
            window_days: days,
            daily_activity,
        })
    }

    /// Account count and summed balance per product.
    pub async fn product_distribution(&self) -> Result<Vec<ProductShare>, AppError> {
        let products = self.repo.list_products().await?;
        let accounts = self.repo.list_accounts().await?;

        Ok(products
            .into_iter()
            .map(|product| {
                let owned = accounts
                    .iter()
                    .filter(|account| account.product_id == product.id);
                let (account_count, total_balance) =
                    owned.fold((0, Amount::ZERO), |(count, total), account| {
                        (count + 1, total + account.balance)
                    });
                ProductShare {
                    product,
                    account_count,
                    total_balance,
                }
            })
            .collect())
    }

    /// Verify every account's stored balance against the signed sum of its
    /// transaction history.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let accounts = self.repo.list_accounts().await?;
        let transaction_count = self.repo.count_transactions().await?;

        let mut mismatches = Vec::new();
        for account in &accounts {
            let history = self.repo.list_transactions_for_account(account.id).await?;
            if !balance_matches_history(account.balance, &history) {
                mismatches.push(BalanceMismatch {
                    account_id: account.id,
                    stored_balance: account.balance,
                    computed_balance: compute_balance(&history),
                });
            }
        }

        Ok(IntegrityReport {
            account_count: accounts.len() as i64,
            transaction_count,
            mismatches,
        })
    }
}
