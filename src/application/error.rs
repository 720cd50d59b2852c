use thiserror::Error;

use crate::domain::{AccountId, Amount, InterestError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Customer already exists: {0}")]
    CustomerAlreadyExists(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Product already exists: {0}")]
    ProductAlreadyExists(String),

    #[error("Cannot delete product {name}: {account_count} account(s) still reference it")]
    ProductInUse { name: String, account_count: i64 },

    #[error("Insufficient funds: available balance is {available:.2}")]
    InsufficientFunds { available: Amount },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<InterestError> for AppError {
    fn from(err: InterestError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
