use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, Sqlite, SqlitePool, Transaction as SqlxTransaction};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, Amount, Customer, CustomerId, DepositProduct, ProductId, Transaction,
    TransactionKind,
};

use super::MIGRATION_001_INITIAL;

/// Outcome of the guarded atomic commit. A stale balance means another
/// writer committed between our read and our write; nothing was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    StaleBalance,
}

/// Repository for persisting and querying the deposit ledger.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Customer operations
    // ========================

    /// Save a new customer to the database.
    pub async fn save_customer(&self, customer: &Customer) -> Result<()> {
        sqlx::query("INSERT INTO customers (id, name, created_at) VALUES (?, ?, ?)")
            .bind(customer.id.to_string())
            .bind(&customer.name)
            .bind(customer.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save customer")?;
        Ok(())
    }

    /// Get a customer by ID.
    pub async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, created_at FROM customers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch customer")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_customer(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a customer by name.
    pub async fn get_customer_by_name(&self, name: &str) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, created_at FROM customers WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch customer by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_customer(&row)?)),
            None => Ok(None),
        }
    }

    /// List all customers.
    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM customers ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list customers")?;

        rows.iter().map(Self::row_to_customer).collect()
    }

    /// Delete a customer together with their accounts and transaction
    /// history, in one atomic unit. Child rows go first.
    pub async fn delete_customer_cascade(&self, id: CustomerId) -> Result<()> {
        let id_str = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin atomic unit")?;

        sqlx::query(
            "DELETE FROM transactions WHERE account_id IN (SELECT id FROM accounts WHERE customer_id = ?)",
        )
        .bind(&id_str)
        .execute(&mut *tx)
        .await
        .context("Failed to delete customer transactions")?;

        sqlx::query("DELETE FROM accounts WHERE customer_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete customer accounts")?;

        sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete customer")?;

        tx.commit().await.context("Failed to commit atomic unit")?;
        Ok(())
    }

    // ========================
    // Product operations
    // ========================

    /// Save a new deposit product to the database.
    pub async fn save_product(&self, product: &DepositProduct) -> Result<()> {
        sqlx::query(
            "INSERT INTO deposit_products (id, name, yearly_rate, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(product.yearly_rate.to_string())
        .bind(product.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save product")?;
        Ok(())
    }

    /// Get a product by ID.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<DepositProduct>> {
        let row = sqlx::query(
            "SELECT id, name, yearly_rate, created_at FROM deposit_products WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_product(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a product by name.
    pub async fn get_product_by_name(&self, name: &str) -> Result<Option<DepositProduct>> {
        let row = sqlx::query(
            "SELECT id, name, yearly_rate, created_at FROM deposit_products WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_product(&row)?)),
            None => Ok(None),
        }
    }

    /// List all products.
    pub async fn list_products(&self) -> Result<Vec<DepositProduct>> {
        let rows =
            sqlx::query("SELECT id, name, yearly_rate, created_at FROM deposit_products ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .context("Failed to list products")?;

        rows.iter().map(Self::row_to_product).collect()
    }

    /// Update a product's name and yearly rate.
    pub async fn update_product(&self, product: &DepositProduct) -> Result<()> {
        sqlx::query("UPDATE deposit_products SET name = ?, yearly_rate = ? WHERE id = ?")
            .bind(&product.name)
            .bind(product.yearly_rate.to_string())
            .bind(product.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update product")?;
        Ok(())
    }

    /// Delete a product. Callers must check it is unreferenced first.
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        sqlx::query("DELETE FROM deposit_products WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete product")?;
        Ok(())
    }

    /// Count accounts referencing a product.
    pub async fn count_accounts_for_product(&self, id: ProductId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM accounts WHERE product_id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count accounts for product")?;
        Ok(row.get("count"))
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account to the database.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, customer_id, product_id, balance, start_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(account.customer_id.to_string())
        .bind(account.product_id.to_string())
        .bind(account.balance.to_string())
        .bind(account.start_date.to_rfc3339())
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, product_id, balance, start_date, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// Get an account together with its product, in one read. This is the
    /// engine's view: balance, accrual anchor, and the current rate.
    pub async fn get_account_with_product(
        &self,
        id: AccountId,
    ) -> Result<Option<(Account, DepositProduct)>> {
        let row = sqlx::query(
            r#"
            SELECT a.id, a.customer_id, a.product_id, a.balance, a.start_date, a.created_at,
                   p.id AS product_pk, p.name AS product_name,
                   p.yearly_rate AS product_yearly_rate, p.created_at AS product_created_at
            FROM accounts a
            JOIN deposit_products p ON p.id = a.product_id
            WHERE a.id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account with product")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let account = Self::row_to_account(&row)?;
        let product = DepositProduct {
            id: Self::parse_uuid(row.get("product_pk"), "product ID")?,
            name: row.get("product_name"),
            yearly_rate: Self::parse_amount(row.get("product_yearly_rate"), "product rate")?,
            created_at: Self::parse_timestamp(row.get("product_created_at"), "product created_at")?,
        };

        Ok(Some((account, product)))
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, product_id, balance, start_date, created_at
            FROM accounts
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// List accounts owned by a customer.
    pub async fn list_accounts_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, product_id, balance, start_date, created_at
            FROM accounts
            WHERE customer_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(customer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts for customer")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    // ========================
    // Transaction operations
    // ========================

    /// The engine's atomic unit: append the given entries and apply the
    /// balance update, all inside one database transaction.
    ///
    /// The balance write is guarded on the value the caller read
    /// (`UPDATE ... WHERE id = ? AND balance = ?`). If another writer
    /// committed in between, the guard misses, the whole unit rolls back,
    /// and `StaleBalance` is returned so the caller can re-read and
    /// re-validate. Sequence numbers are assigned here, inside the unit.
    pub async fn commit_entries(
        &self,
        account_id: AccountId,
        expected_balance: Amount,
        new_balance: Amount,
        entries: &mut [Transaction],
    ) -> Result<CommitOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin atomic unit")?;

        for entry in entries.iter_mut() {
            entry.sequence = Self::next_sequence(&mut tx).await?;

            sqlx::query(
                r#"
                INSERT INTO transactions (id, sequence, account_id, kind, amount, transaction_date, recorded_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(entry.id.to_string())
            .bind(entry.sequence)
            .bind(entry.account_id.to_string())
            .bind(entry.kind.as_str())
            .bind(entry.amount.to_string())
            .bind(entry.transaction_date.to_rfc3339())
            .bind(entry.recorded_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .context("Failed to append transaction")?;
        }

        let updated = sqlx::query("UPDATE accounts SET balance = ? WHERE id = ? AND balance = ?")
            .bind(new_balance.to_string())
            .bind(account_id.to_string())
            .bind(expected_balance.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to update account balance")?;

        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .context("Failed to roll back stale atomic unit")?;
            return Ok(CommitOutcome::StaleBalance);
        }

        tx.commit().await.context("Failed to commit atomic unit")?;
        Ok(CommitOutcome::Committed)
    }

    /// Get the next sequence number and increment the counter.
    async fn next_sequence(tx: &mut SqlxTransaction<'_, Sqlite>) -> Result<i64> {
        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'transaction_sequence'
            RETURNING value
            "#,
        )
        .fetch_one(&mut **tx)
        .await
        .context("Failed to get next sequence number")?;

        Ok(row.get("value"))
    }

    /// List all transactions, ordered by sequence number.
    pub async fn list_transactions(&self, limit: Option<usize>) -> Result<Vec<Transaction>> {
        let mut query = String::from(
            "SELECT id, sequence, account_id, kind, amount, transaction_date, recorded_at FROM transactions ORDER BY sequence",
        );
        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// List transactions for a specific account, ordered by sequence number.
    pub async fn list_transactions_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sequence, account_id, kind, amount, transaction_date, recorded_at
            FROM transactions
            WHERE account_id = ?
            ORDER BY sequence
            "#,
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions for account")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// List transactions dated at or after the given instant.
    pub async fn list_transactions_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sequence, account_id, kind, amount, transaction_date, recorded_at
            FROM transactions
            WHERE transaction_date >= ?
            ORDER BY sequence
            "#,
        )
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list recent transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    // ========================
    // Aggregate counts
    // ========================

    pub async fn count_customers(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM customers")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count customers")?;
        Ok(row.get("count"))
    }

    pub async fn count_accounts(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM accounts")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count accounts")?;
        Ok(row.get("count"))
    }

    pub async fn count_transactions(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM transactions")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count transactions")?;
        Ok(row.get("count"))
    }

    // ========================
    // Row mapping
    // ========================

    fn parse_uuid(value: String, what: &str) -> Result<Uuid> {
        Uuid::parse_str(&value).with_context(|| format!("Invalid {}", what))
    }

    fn parse_amount(value: String, what: &str) -> Result<Amount> {
        Decimal::from_str(&value).with_context(|| format!("Invalid {}", what))
    }

    fn parse_timestamp(value: String, what: &str) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(&value)
            .with_context(|| format!("Invalid {}", what))?
            .with_timezone(&Utc))
    }

    fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer> {
        Ok(Customer {
            id: Self::parse_uuid(row.get("id"), "customer ID")?,
            name: row.get("name"),
            created_at: Self::parse_timestamp(row.get("created_at"), "created_at timestamp")?,
        })
    }

    fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<DepositProduct> {
        Ok(DepositProduct {
            id: Self::parse_uuid(row.get("id"), "product ID")?,
            name: row.get("name"),
            yearly_rate: Self::parse_amount(row.get("yearly_rate"), "yearly rate")?,
            created_at: Self::parse_timestamp(row.get("created_at"), "created_at timestamp")?,
        })
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        Ok(Account {
            id: Self::parse_uuid(row.get("id"), "account ID")?,
            customer_id: Self::parse_uuid(row.get("customer_id"), "customer ID")?,
            product_id: Self::parse_uuid(row.get("product_id"), "product ID")?,
            balance: Self::parse_amount(row.get("balance"), "balance")?,
            start_date: Self::parse_timestamp(row.get("start_date"), "start_date timestamp")?,
            created_at: Self::parse_timestamp(row.get("created_at"), "created_at timestamp")?,
        })
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let kind_str: String = row.get("kind");

        Ok(Transaction {
            id: Self::parse_uuid(row.get("id"), "transaction ID")?,
            sequence: row.get("sequence"),
            account_id: Self::parse_uuid(row.get("account_id"), "account ID")?,
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?,
            amount: Self::parse_amount(row.get("amount"), "amount")?,
            transaction_date: Self::parse_timestamp(
                row.get("transaction_date"),
                "transaction_date timestamp",
            )?,
            recorded_at: Self::parse_timestamp(row.get("recorded_at"), "recorded_at timestamp")?,
        })
    }
}
