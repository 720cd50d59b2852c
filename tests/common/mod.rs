// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use deposito::Repository;
use deposito::application::{Directory, Reports, TransactionEngine};
use deposito::domain::{AccountId, Amount};
use tempfile::TempDir;

/// The three services, sharing one repository.
pub struct TestLedger {
    pub directory: Directory,
    pub engine: TransactionEngine,
    pub reports: Reports,
}

/// Helper to create test services over a temporary database
pub async fn test_ledger() -> Result<(TestLedger, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_str().unwrap());
    let repo = Repository::init(&db_url).await?;

    Ok((
        TestLedger {
            directory: Directory::new(repo.clone()),
            engine: TransactionEngine::new(repo.clone()),
            reports: Reports::new(repo),
        },
        temp_dir,
    ))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Test fixture: standard customer/product/account setup
pub struct SavingsFixture;

impl SavingsFixture {
    /// One customer ("Alice Johnson") on one product ("Deposito Silver" at
    /// the given yearly rate), with an account anchored at `start_date`.
    pub async fn single_account(
        ledger: &TestLedger,
        yearly_rate: Amount,
        start_date: &str,
    ) -> Result<AccountId> {
        ledger
            .directory
            .create_customer("Alice Johnson".into())
            .await?;
        ledger
            .directory
            .create_product("Deposito Silver".into(), yearly_rate)
            .await?;
        let account = ledger
            .directory
            .open_account("Alice Johnson", "Deposito Silver", parse_date(start_date))
            .await?;
        Ok(account.id)
    }
}
