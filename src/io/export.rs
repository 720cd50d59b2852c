use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::Directory;
use crate::domain::{Account, AccountId, Amount, Customer, DepositProduct, Transaction};

/// Database snapshot for full export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub customers: Vec<Customer>,
    pub products: Vec<DepositProduct>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    directory: &'a Directory,
}

impl<'a> Exporter<'a> {
    pub fn new(directory: &'a Directory) -> Self {
        Self { directory }
    }

    /// Export the full transaction ledger to CSV format
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self.directory.list_transactions(None).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record([
            "id",
            "sequence",
            "transaction_date",
            "account_id",
            "kind",
            "amount",
        ])?;

        let mut count = 0;
        for entry in &transactions {
            csv_writer.write_record([
                entry.id.to_string(),
                entry.sequence.to_string(),
                entry.transaction_date.to_rfc3339(),
                entry.account_id.to_string(),
                entry.kind.to_string(),
                entry.amount.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export one account's statement to CSV format, with a running balance
    /// column computed from the signed entries.
    pub async fn export_statement_csv<W: Write>(
        &self,
        writer: W,
        account_id: AccountId,
    ) -> Result<usize> {
        let info = self.directory.get_account_info(account_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(["sequence", "transaction_date", "kind", "amount", "balance"])?;

        let mut balance = Amount::ZERO;
        let mut count = 0;
        for entry in &info.transactions {
            balance += entry.amount;
            csv_writer.write_record([
                entry.sequence.to_string(),
                entry.transaction_date.to_rfc3339(),
                entry.kind.to_string(),
                entry.amount.to_string(),
                balance.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export account balances to CSV format
    pub async fn export_accounts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let summaries = self.directory.list_accounts().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record([
            "account_id",
            "customer",
            "product",
            "balance",
            "start_date",
        ])?;

        let mut count = 0;
        for summary in &summaries {
            csv_writer.write_record([
                summary.account.id.to_string(),
                summary.customer_name.clone(),
                summary.product_name.clone(),
                summary.account.balance.to_string(),
                summary.account.start_date.to_rfc3339(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export full database as JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<DatabaseSnapshot> {
        let customers = self.directory.list_customers().await?;
        let products = self.directory.list_products().await?;
        let accounts = self
            .directory
            .list_accounts()
            .await?
            .into_iter()
            .map(|summary| summary.account)
            .collect();
        let transactions = self.directory.list_transactions(None).await?;

        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            customers,
            products,
            accounts,
            transactions,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
