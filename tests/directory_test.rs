mod common;

use anyhow::Result;
use deposito::application::AppError;
use rust_decimal_macros::dec;

use common::{parse_date, test_ledger};

#[tokio::test]
async fn test_customer_lifecycle() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    let customer = ledger
        .directory
        .create_customer("Bob Smith".into())
        .await?;
    assert_eq!(customer.name, "Bob Smith");

    let fetched = ledger.directory.get_customer("Bob Smith").await?;
    assert_eq!(fetched.id, customer.id);

    let customers = ledger.directory.list_customers().await?;
    assert_eq!(customers.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_customer_name_required_and_unique() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    let result = ledger.directory.create_customer("  ".into()).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));

    ledger
        .directory
        .create_customer("Catherine Lee".into())
        .await?;
    let result = ledger
        .directory
        .create_customer("Catherine Lee".into())
        .await;
    assert!(matches!(result, Err(AppError::CustomerAlreadyExists(_))));

    Ok(())
}

#[tokio::test]
async fn test_delete_customer_cascades_to_accounts_and_history() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    ledger
        .directory
        .create_customer("Alice Johnson".into())
        .await?;
    ledger
        .directory
        .create_product("Deposito Gold".into(), dec!(7.0))
        .await?;
    let account = ledger
        .directory
        .open_account("Alice Johnson", "Deposito Gold", parse_date("2024-01-01"))
        .await?;
    ledger
        .engine
        .deposit(account.id, dec!(500), parse_date("2024-01-01"))
        .await?;
    ledger
        .engine
        .withdraw(account.id, dec!(100), parse_date("2024-01-10"))
        .await?;

    ledger.directory.delete_customer("Alice Johnson").await?;

    let result = ledger.directory.get_customer("Alice Johnson").await;
    assert!(matches!(result, Err(AppError::CustomerNotFound(_))));
    assert!(ledger.directory.list_accounts().await?.is_empty());
    assert!(ledger.directory.list_transactions(None).await?.is_empty());

    // The product survives and is deletable now that nothing references it
    ledger.directory.delete_product("Deposito Gold").await?;

    Ok(())
}

#[tokio::test]
async fn test_product_lifecycle() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    let product = ledger
        .directory
        .create_product("Deposito Bronze".into(), dec!(3.0))
        .await?;
    assert_eq!(product.yearly_rate, dec!(3.0));

    let result = ledger
        .directory
        .create_product("Deposito Bronze".into(), dec!(4.0))
        .await;
    assert!(matches!(result, Err(AppError::ProductAlreadyExists(_))));

    let result = ledger
        .directory
        .create_product("Deposito Broken".into(), dec!(-1))
        .await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));

    let updated = ledger
        .directory
        .update_product("Deposito Bronze", None, Some(dec!(3.5)))
        .await?;
    assert_eq!(updated.yearly_rate, dec!(3.5));

    let renamed = ledger
        .directory
        .update_product("Deposito Bronze", Some("Deposito Basic".into()), None)
        .await?;
    assert_eq!(renamed.name, "Deposito Basic");
    assert_eq!(renamed.yearly_rate, dec!(3.5));

    ledger.directory.delete_product("Deposito Basic").await?;
    let result = ledger.directory.get_product("Deposito Basic").await;
    assert!(matches!(result, Err(AppError::ProductNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_delete_product_refused_while_referenced() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    ledger
        .directory
        .create_customer("Bob Smith".into())
        .await?;
    ledger
        .directory
        .create_product("Deposito Silver".into(), dec!(5.0))
        .await?;
    ledger
        .directory
        .open_account("Bob Smith", "Deposito Silver", parse_date("2024-01-01"))
        .await?;

    let result = ledger.directory.delete_product("Deposito Silver").await;
    match result {
        Err(AppError::ProductInUse {
            name,
            account_count,
        }) => {
            assert_eq!(name, "Deposito Silver");
            assert_eq!(account_count, 1);
        }
        other => panic!("expected ProductInUse, got {:?}", other.map(|_| ())),
    }

    Ok(())
}

#[tokio::test]
async fn test_open_account_starts_at_zero() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    ledger
        .directory
        .create_customer("Catherine Lee".into())
        .await?;
    ledger
        .directory
        .create_product("Deposito Bronze".into(), dec!(3.0))
        .await?;

    let account = ledger
        .directory
        .open_account("Catherine Lee", "Deposito Bronze", parse_date("2025-03-10"))
        .await?;
    assert_eq!(account.balance, dec!(0));
    assert_eq!(account.start_date, parse_date("2025-03-10"));

    let result = ledger
        .directory
        .open_account("Nobody", "Deposito Bronze", parse_date("2025-03-10"))
        .await;
    assert!(matches!(result, Err(AppError::CustomerNotFound(_))));

    let result = ledger
        .directory
        .open_account("Catherine Lee", "Deposito Platinum", parse_date("2025-03-10"))
        .await;
    assert!(matches!(result, Err(AppError::ProductNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_account_info_joins_owner_product_and_history() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    ledger
        .directory
        .create_customer("Alice Johnson".into())
        .await?;
    ledger
        .directory
        .create_product("Deposito Silver".into(), dec!(5.0))
        .await?;
    let account = ledger
        .directory
        .open_account("Alice Johnson", "Deposito Silver", parse_date("2024-06-15"))
        .await?;
    ledger
        .engine
        .deposit(account.id, dec!(5000.50), parse_date("2024-06-15"))
        .await?;

    let info = ledger.directory.get_account_info(account.id).await?;
    assert_eq!(info.customer.name, "Alice Johnson");
    assert_eq!(info.product.name, "Deposito Silver");
    assert_eq!(info.product.yearly_rate, dec!(5.0));
    assert_eq!(info.account.balance, dec!(5000.50));
    assert_eq!(info.transactions.len(), 1);

    let summaries = ledger.directory.list_accounts().await?;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].customer_name, "Alice Johnson");
    assert_eq!(summaries[0].product_name, "Deposito Silver");

    Ok(())
}
