use chrono::{DateTime, Utc};

use crate::domain::{
    Account, AccountId, Amount, Customer, DepositProduct, Transaction,
};
use crate::storage::Repository;

use super::AppError;

/// CRUD over customers, deposit products, and accounts. The engine only
/// ever sees this data through its own repository reads; the directory is
/// how the surrounding world manages it.
pub struct Directory {
    repo: Repository,
}

/// A customer with their accounts.
pub struct CustomerInfo {
    pub customer: Customer,
    pub accounts: Vec<Account>,
}

/// An account joined with its owner, product, and history.
pub struct AccountInfo {
    pub account: Account,
    pub customer: Customer,
    pub product: DepositProduct,
    pub transactions: Vec<Transaction>,
}

/// One row of the account listing.
pub struct AccountSummary {
    pub account: Account,
    pub customer_name: String,
    pub product_name: String,
}

impl Directory {
    /// Create a new directory over the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    // ========================
    // Customer operations
    // ========================

    /// Create a new customer. Names are required and unique.
    pub async fn create_customer(&self, name: String) -> Result<Customer, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("Name is required".to_string()));
        }
        if self.repo.get_customer_by_name(&name).await?.is_some() {
            return Err(AppError::CustomerAlreadyExists(name));
        }

        let customer = Customer::new(name);
        self.repo.save_customer(&customer).await?;
        Ok(customer)
    }

    /// Get a customer by name.
    pub async fn get_customer(&self, name: &str) -> Result<Customer, AppError> {
        self.repo
            .get_customer_by_name(name)
            .await?
            .ok_or_else(|| AppError::CustomerNotFound(name.to_string()))
    }

    /// Get a customer together with their accounts.
    pub async fn get_customer_info(&self, name: &str) -> Result<CustomerInfo, AppError> {
        let customer = self.get_customer(name).await?;
        let accounts = self.repo.list_accounts_for_customer(customer.id).await?;
        Ok(CustomerInfo { customer, accounts })
    }

    /// List all customers.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        Ok(self.repo.list_customers().await?)
    }

    /// Delete a customer. Cascades to their accounts and transaction
    /// history in one atomic unit.
    pub async fn delete_customer(&self, name: &str) -> Result<Customer, AppError> {
        let customer = self.get_customer(name).await?;
        self.repo.delete_customer_cascade(customer.id).await?;
        Ok(customer)
    }

    // ========================
    // Product operations
    // ========================

    /// Create a new deposit product. Names are unique; the rate is a yearly
    /// percentage and must be non-negative.
    pub async fn create_product(
        &self,
        name: String,
        yearly_rate: Amount,
    ) -> Result<DepositProduct, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("Name is required".to_string()));
        }
        if yearly_rate < Amount::ZERO {
            return Err(AppError::InvalidInput(
                "Yearly rate must be non-negative".to_string(),
            ));
        }
        if self.repo.get_product_by_name(&name).await?.is_some() {
            return Err(AppError::ProductAlreadyExists(name));
        }

        let product = DepositProduct::new(name, yearly_rate);
        self.repo.save_product(&product).await?;
        Ok(product)
    }

    /// Get a product by name.
    pub async fn get_product(&self, name: &str) -> Result<DepositProduct, AppError> {
        self.repo
            .get_product_by_name(name)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(name.to_string()))
    }

    /// List all products.
    pub async fn list_products(&self) -> Result<Vec<DepositProduct>, AppError> {
        Ok(self.repo.list_products().await?)
    }

    /// Update a product's name and/or yearly rate. Existing accounts pick
    /// up the new rate on their next withdrawal.
    pub async fn update_product(
        &self,
        name: &str,
        new_name: Option<String>,
        new_rate: Option<Amount>,
    ) -> Result<DepositProduct, AppError> {
        let mut product = self.get_product(name).await?;

        if let Some(new_name) = new_name {
            if new_name.trim().is_empty() {
                return Err(AppError::InvalidInput("Name is required".to_string()));
            }
            if new_name != product.name
                && self.repo.get_product_by_name(&new_name).await?.is_some()
            {
                return Err(AppError::ProductAlreadyExists(new_name));
            }
            product.name = new_name;
        }
        if let Some(new_rate) = new_rate {
            if new_rate < Amount::ZERO {
                return Err(AppError::InvalidInput(
                    "Yearly rate must be non-negative".to_string(),
                ));
            }
            product.yearly_rate = new_rate;
        }

        self.repo.update_product(&product).await?;
        Ok(product)
    }

    /// Delete a product. Refused while any account references it.
    pub async fn delete_product(&self, name: &str) -> Result<DepositProduct, AppError> {
        let product = self.get_product(name).await?;

        let account_count = self.repo.count_accounts_for_product(product.id).await?;
        if account_count > 0 {
            return Err(AppError::ProductInUse {
                name: product.name,
                account_count,
            });
        }

        self.repo.delete_product(product.id).await?;
        Ok(product)
    }

    // ========================
    // Account operations
    // ========================

    /// Open an account for a customer on a product. Accounts start at a
    /// zero balance; an opening deposit goes through the engine so the
    /// history matches the balance from the first entry.
    pub async fn open_account(
        &self,
        customer_name: &str,
        product_name: &str,
        start_date: DateTime<Utc>,
    ) -> Result<Account, AppError> {
        let customer = self.get_customer(customer_name).await?;
        let product = self.get_product(product_name).await?;

        let account = Account::new(customer.id, product.id, start_date);
        self.repo.save_account(&account).await?;
        Ok(account)
    }

    /// Get an account joined with its owner, product, and history.
    pub async fn get_account_info(&self, account_id: AccountId) -> Result<AccountInfo, AppError> {
        let (account, product) = self
            .repo
            .get_account_with_product(account_id)
            .await?
            .ok_or(AppError::AccountNotFound(account_id))?;

        let customer = self
            .repo
            .get_customer(account.customer_id)
            .await?
            .ok_or_else(|| AppError::CustomerNotFound(account.customer_id.to_string()))?;

        let transactions = self.repo.list_transactions_for_account(account_id).await?;

        Ok(AccountInfo {
            account,
            customer,
            product,
            transactions,
        })
    }

    /// List transactions across all accounts, oldest first.
    pub async fn list_transactions(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_transactions(limit).await?)
    }

    /// List all accounts with owner and product names.
    pub async fn list_accounts(&self) -> Result<Vec<AccountSummary>, AppError> {
        let accounts = self.repo.list_accounts().await?;
        let mut summaries = Vec::with_capacity(accounts.len());

        for account in accounts {
            let customer = self
                .repo
                .get_customer(account.customer_id)
                .await?
                .ok_or_else(|| AppError::CustomerNotFound(account.customer_id.to_string()))?;
            let product = self
                .repo
                .get_product(account.product_id)
                .await?
                .ok_or_else(|| AppError::ProductNotFound(account.product_id.to_string()))?;

            summaries.push(AccountSummary {
                account,
                customer_name: customer.name,
                product_name: product.name,
            });
        }

        Ok(summaries)
    }
}
