mod common;

use anyhow::Result;
use chrono::Utc;
use deposito::io::Exporter;
use rust_decimal_macros::dec;

use common::{SavingsFixture, parse_date, test_ledger};

#[tokio::test]
async fn test_overview_totals_and_daily_activity() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    ledger
        .directory
        .create_customer("Alice Johnson".into())
        .await?;
    ledger
        .directory
        .create_customer("Bob Smith".into())
        .await?;
    ledger
        .directory
        .create_product("Deposito Bronze".into(), dec!(0))
        .await?;

    let now = Utc::now();
    let alice = ledger
        .directory
        .open_account("Alice Johnson", "Deposito Bronze", now)
        .await?;
    let bob = ledger
        .directory
        .open_account("Bob Smith", "Deposito Bronze", now)
        .await?;

    ledger.engine.deposit(alice.id, dec!(1000), now).await?;
    ledger.engine.deposit(bob.id, dec!(250.50), now).await?;
    ledger.engine.withdraw(alice.id, dec!(100), now).await?;

    let overview = ledger.reports.overview(7).await?;
    assert_eq!(overview.total_customers, 2);
    assert_eq!(overview.total_accounts, 2);
    assert_eq!(overview.total_balance, dec!(1150.50));

    // Full window, including quiet days
    assert_eq!(overview.daily_activity.len(), 8);

    let today = overview
        .daily_activity
        .iter()
        .find(|day| day.date == now.date_naive())
        .expect("today must be in the window");
    assert_eq!(today.deposited, dec!(1250.50));
    assert_eq!(today.withdrawn, dec!(100));
    assert_eq!(today.interest_credited, dec!(0));
    assert_eq!(today.transaction_count, 3);

    Ok(())
}

#[tokio::test]
async fn test_product_distribution() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    ledger
        .directory
        .create_customer("Alice Johnson".into())
        .await?;
    ledger
        .directory
        .create_product("Deposito Bronze".into(), dec!(3.0))
        .await?;
    ledger
        .directory
        .create_product("Deposito Gold".into(), dec!(7.0))
        .await?;

    let start = parse_date("2024-01-01");
    let first = ledger
        .directory
        .open_account("Alice Johnson", "Deposito Bronze", start)
        .await?;
    let second = ledger
        .directory
        .open_account("Alice Johnson", "Deposito Bronze", start)
        .await?;
    let third = ledger
        .directory
        .open_account("Alice Johnson", "Deposito Gold", start)
        .await?;

    ledger.engine.deposit(first.id, dec!(100), start).await?;
    ledger.engine.deposit(second.id, dec!(200), start).await?;
    ledger.engine.deposit(third.id, dec!(15000), start).await?;

    let shares = ledger.reports.product_distribution().await?;
    assert_eq!(shares.len(), 2);

    let bronze = shares
        .iter()
        .find(|s| s.product.name == "Deposito Bronze")
        .unwrap();
    assert_eq!(bronze.account_count, 2);
    assert_eq!(bronze.total_balance, dec!(300));

    let gold = shares
        .iter()
        .find(|s| s.product.name == "Deposito Gold")
        .unwrap();
    assert_eq!(gold.account_count, 1);
    assert_eq!(gold.total_balance, dec!(15000));

    Ok(())
}

#[tokio::test]
async fn test_integrity_check_passes_on_engine_written_ledger() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let account_id = SavingsFixture::single_account(&ledger, dec!(12), "2024-01-01").await?;

    ledger
        .engine
        .deposit(account_id, dec!(1000), parse_date("2024-01-01"))
        .await?;
    ledger
        .engine
        .withdraw(account_id, dec!(700), parse_date("2024-04-01"))
        .await?;

    let report = ledger.reports.check_integrity().await?;
    assert!(report.is_ok());
    assert_eq!(report.account_count, 1);
    assert_eq!(report.transaction_count, 3);

    Ok(())
}

#[tokio::test]
async fn test_export_statement_csv_with_running_balance() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let account_id = SavingsFixture::single_account(&ledger, dec!(12), "2024-01-01").await?;

    ledger
        .engine
        .deposit(account_id, dec!(1000), parse_date("2024-01-01"))
        .await?;
    ledger
        .engine
        .withdraw(account_id, dec!(700), parse_date("2024-04-01"))
        .await?;

    let exporter = Exporter::new(&ledger.directory);
    let mut buffer = Vec::new();
    let count = exporter.export_statement_csv(&mut buffer, account_id).await?;
    assert_eq!(count, 3);

    let csv = String::from_utf8(buffer)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4); // header + three entries
    assert_eq!(lines[0], "sequence,transaction_date,kind,amount,balance");
    assert!(lines[1].contains("DEPOSIT") && lines[1].ends_with("1000"));
    assert!(lines[2].contains("INTEREST") && lines[2].ends_with("1030"));
    assert!(lines[3].contains("WITHDRAW") && lines[3].ends_with("330"));

    Ok(())
}

#[tokio::test]
async fn test_export_accounts_csv_and_full_json() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let account_id = SavingsFixture::single_account(&ledger, dec!(5.0), "2024-01-01").await?;
    ledger
        .engine
        .deposit(account_id, dec!(500), parse_date("2024-01-01"))
        .await?;

    let exporter = Exporter::new(&ledger.directory);

    let mut buffer = Vec::new();
    let count = exporter.export_accounts_csv(&mut buffer).await?;
    assert_eq!(count, 1);
    let csv = String::from_utf8(buffer)?;
    assert!(csv.contains("Alice Johnson"));
    assert!(csv.contains("Deposito Silver"));

    let mut buffer = Vec::new();
    let snapshot = exporter.export_full_json(&mut buffer).await?;
    assert_eq!(snapshot.customers.len(), 1);
    assert_eq!(snapshot.products.len(), 1);
    assert_eq!(snapshot.accounts.len(), 1);
    assert_eq!(snapshot.transactions.len(), 1);

    // The snapshot round-trips through serde
    let json = String::from_utf8(buffer)?;
    let parsed: deposito::io::DatabaseSnapshot = serde_json::from_str(&json)?;
    assert_eq!(parsed.transactions[0].amount, dec!(500));

    Ok(())
}
