use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{Directory, Reports, TransactionEngine};
use crate::domain::{AccountId, Amount, format_amount, parse_amount};
use crate::storage::Repository;

/// Deposito - Savings Deposit Ledger
#[derive(Parser)]
#[command(name = "deposito")]
#[command(about = "A savings-deposit ledger with interest accrual")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "deposito.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Customer management commands
    #[command(subcommand)]
    Customer(CustomerCommands),

    /// Deposit product management commands
    #[command(subcommand)]
    Product(ProductCommands),

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Deposit money into an account
    Deposit {
        /// Account ID
        account: String,

        /// Amount to deposit (e.g., "250.00" or "250")
        amount: String,

        /// Date of the deposit (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Withdraw money from an account, realizing accrued interest
    Withdraw {
        /// Account ID
        account: String,

        /// Amount to withdraw
        amount: String,

        /// Date of the withdrawal (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List transactions
    Transactions {
        /// Filter by account ID
        #[arg(long)]
        account: Option<String>,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show ledger statistics
    Stats {
        /// Size of the activity window in days
        #[arg(short, long, default_value = "7")]
        days: i64,
    },

    /// Verify ledger integrity
    Check,

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, accounts, full
        export_type: String,

        /// Restrict a transactions export to one account's statement
        #[arg(long)]
        account: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Register a new customer
    Add {
        /// Customer name (must be unique)
        name: String,
    },

    /// List all customers
    List,

    /// Show a customer and their accounts
    Show {
        /// Customer name
        name: String,
    },

    /// Delete a customer, their accounts, and their transaction history
    Delete {
        /// Customer name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// Create a new deposit product
    Add {
        /// Product name (must be unique)
        name: String,

        /// Yearly interest rate as a percentage (e.g., "5.0" for 5%/year)
        #[arg(short, long)]
        rate: String,
    },

    /// List all products
    List,

    /// Update a product's name or rate
    Update {
        /// Product name
        name: String,

        /// New product name
        #[arg(long)]
        new_name: Option<String>,

        /// New yearly rate (percentage)
        #[arg(long)]
        rate: Option<String>,
    },

    /// Delete a product (refused while accounts reference it)
    Delete {
        /// Product name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open an account for a customer on a product
    Open {
        /// Customer name
        customer: String,

        /// Product name
        #[arg(short, long)]
        product: String,

        /// Accrual start date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start_date: Option<String>,

        /// Opening deposit amount
        #[arg(long)]
        deposit: Option<String>,
    },

    /// List all accounts
    List,

    /// Show account details and history
    Show {
        /// Account ID
        id: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                let db_url = format!("sqlite:{}?mode=rwc", self.database);
                Repository::init(&db_url).await?;
                println!("Initialized database at {}", self.database);
                Ok(())
            }
            command => {
                let db_url = format!("sqlite:{}", self.database);
                let repo = Repository::connect(&db_url).await?;
                run_command(repo, command).await
            }
        }
    }
}

async fn run_command(repo: Repository, command: Commands) -> Result<()> {
    let directory = Directory::new(repo.clone());
    let engine = TransactionEngine::new(repo.clone());
    let reports = Reports::new(repo);

    match command {
        Commands::Init => unreachable!("handled in Cli::run"),

        Commands::Customer(cmd) => run_customer_command(&directory, cmd).await?,
        Commands::Product(cmd) => run_product_command(&directory, cmd).await?,
        Commands::Account(cmd) => run_account_command(&directory, &engine, cmd).await?,

        Commands::Deposit {
            account,
            amount,
            date,
        } => {
            let account_id = parse_account_id(&account)?;
            let amount = parse_cli_amount(&amount)?;
            let date = parse_cli_date(date.as_deref())?;

            let entry = engine.deposit(account_id, amount, date).await?;
            println!(
                "Deposited {} into account {} (entry #{})",
                format_amount(entry.amount),
                account_id,
                entry.sequence
            );
        }

        Commands::Withdraw {
            account,
            amount,
            date,
        } => {
            let account_id = parse_account_id(&account)?;
            let amount = parse_cli_amount(&amount)?;
            let date = parse_cli_date(date.as_deref())?;

            let outcome = engine.withdraw(account_id, amount, date).await?;
            println!("Withdrew {} from account {}", format_amount(amount), account_id);
            println!("  Interest earned:  {}", format_amount(outcome.interest_earned));
            println!(
                "  Available before: {}",
                format_amount(outcome.balance_before_withdraw)
            );
            println!(
                "  Updated balance:  {}",
                format_amount(outcome.updated_balance)
            );
        }

        Commands::Transactions { account, limit } => {
            let transactions = match account {
                Some(account) => {
                    let account_id = parse_account_id(&account)?;
                    let mut history = engine.history(account_id).await?;
                    if let Some(lim) = limit {
                        history.truncate(lim);
                    }
                    history
                }
                None => directory.list_transactions(limit).await?,
            };

            if transactions.is_empty() {
                println!("No transactions found.");
            } else {
                println!(
                    "{:<6} {:<12} {:<10} {:>12}  {}",
                    "SEQ", "DATE", "KIND", "AMOUNT", "ACCOUNT"
                );
                println!("{}", "-".repeat(80));
                for entry in transactions {
                    println!(
                        "{:<6} {:<12} {:<10} {:>12}  {}",
                        entry.sequence,
                        entry.transaction_date.format("%Y-%m-%d"),
                        entry.kind.to_string(),
                        format_amount(entry.amount),
                        entry.account_id
                    );
                }
            }
        }

        Commands::Stats { days } => {
            let overview = reports.overview(days).await?;
            println!("Customers:     {}", overview.total_customers);
            println!("Accounts:      {}", overview.total_accounts);
            println!(
                "Total balance: {}",
                format_amount(overview.total_balance)
            );
            println!();
            println!("Activity (last {} days):", overview.window_days);
            println!(
                "{:<12} {:>12} {:>12} {:>12} {:>6}",
                "DATE", "DEPOSITED", "WITHDRAWN", "INTEREST", "TXNS"
            );
            println!("{}", "-".repeat(58));
            for day in &overview.daily_activity {
                println!(
                    "{:<12} {:>12} {:>12} {:>12} {:>6}",
                    day.date,
                    format_amount(day.deposited),
                    format_amount(day.withdrawn),
                    format_amount(day.interest_credited),
                    day.transaction_count
                );
            }

            let distribution = reports.product_distribution().await?;
            if !distribution.is_empty() {
                println!();
                println!("Products:");
                println!(
                    "{:<24} {:>8} {:>10} {:>14}",
                    "NAME", "RATE", "ACCOUNTS", "BALANCE"
                );
                println!("{}", "-".repeat(60));
                for share in &distribution {
                    println!(
                        "{:<24} {:>7}% {:>10} {:>14}",
                        share.product.name,
                        share.product.yearly_rate,
                        share.account_count,
                        format_amount(share.total_balance)
                    );
                }
            }
        }

        Commands::Check => {
            let report = reports.check_integrity().await?;
            println!(
                "Checked {} account(s), {} transaction(s).",
                report.account_count, report.transaction_count
            );
            if report.is_ok() {
                println!("All balances match their transaction history.");
            } else {
                for mismatch in &report.mismatches {
                    println!(
                        "MISMATCH {}: stored {} but history sums to {}",
                        mismatch.account_id,
                        format_amount(mismatch.stored_balance),
                        format_amount(mismatch.computed_balance)
                    );
                }
                anyhow::bail!("ledger integrity check failed");
            }
        }

        Commands::Export {
            export_type,
            account,
            output,
        } => {
            run_export_command(&directory, &export_type, account.as_deref(), output.as_deref())
                .await?
        }
    }

    Ok(())
}

async fn run_customer_command(directory: &Directory, cmd: CustomerCommands) -> Result<()> {
    match cmd {
        CustomerCommands::Add { name } => {
            let customer = directory.create_customer(name).await?;
            println!("Created customer: {} ({})", customer.name, customer.id);
        }

        CustomerCommands::List => {
            let customers = directory.list_customers().await?;
            if customers.is_empty() {
                println!("No customers found.");
            } else {
                println!("{:<24} {:<12}", "NAME", "SINCE");
                println!("{}", "-".repeat(36));
                for customer in customers {
                    println!(
                        "{:<24} {:<12}",
                        customer.name,
                        customer.created_at.format("%Y-%m-%d")
                    );
                }
            }
        }

        CustomerCommands::Show { name } => {
            let info = directory.get_customer_info(&name).await?;
            println!("Customer: {}", info.customer.name);
            println!("  ID:    {}", info.customer.id);
            println!(
                "  Since: {}",
                info.customer.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            if info.accounts.is_empty() {
                println!("  No accounts.");
            } else {
                println!("  Accounts:");
                for account in &info.accounts {
                    println!(
                        "    {}  balance {}  opened {}",
                        account.id,
                        format_amount(account.balance),
                        account.start_date.format("%Y-%m-%d")
                    );
                }
            }
        }

        CustomerCommands::Delete { name } => {
            let customer = directory.delete_customer(&name).await?;
            println!(
                "Deleted customer {} with their accounts and transactions",
                customer.name
            );
        }
    }
    Ok(())
}

async fn run_product_command(directory: &Directory, cmd: ProductCommands) -> Result<()> {
    match cmd {
        ProductCommands::Add { name, rate } => {
            let rate = parse_cli_amount(&rate)?;
            let product = directory.create_product(name, rate).await?;
            println!(
                "Created product: {} at {}%/year",
                product.name, product.yearly_rate
            );
        }

        ProductCommands::List => {
            let products = directory.list_products().await?;
            if products.is_empty() {
                println!("No products found.");
            } else {
                println!("{:<24} {:>8}", "NAME", "RATE");
                println!("{}", "-".repeat(33));
                for product in products {
                    println!("{:<24} {:>7}%", product.name, product.yearly_rate);
                }
            }
        }

        ProductCommands::Update {
            name,
            new_name,
            rate,
        } => {
            let rate = rate.map(|r| parse_cli_amount(&r)).transpose()?;
            let product = directory.update_product(&name, new_name, rate).await?;
            println!(
                "Updated product: {} at {}%/year",
                product.name, product.yearly_rate
            );
        }

        ProductCommands::Delete { name } => {
            let product = directory.delete_product(&name).await?;
            println!("Deleted product: {}", product.name);
        }
    }
    Ok(())
}

async fn run_account_command(
    directory: &Directory,
    engine: &TransactionEngine,
    cmd: AccountCommands,
) -> Result<()> {
    match cmd {
        AccountCommands::Open {
            customer,
            product,
            start_date,
            deposit,
        } => {
            let start_date = parse_cli_date(start_date.as_deref())?;
            let account = directory.open_account(&customer, &product, start_date).await?;
            println!("Opened account {} for {}", account.id, customer);

            if let Some(deposit) = deposit {
                let amount = parse_cli_amount(&deposit)?;
                let entry = engine.deposit(account.id, amount, start_date).await?;
                println!("Recorded opening deposit of {}", format_amount(entry.amount));
            }
        }

        AccountCommands::List => {
            let summaries = directory.list_accounts().await?;
            if summaries.is_empty() {
                println!("No accounts found.");
            } else {
                println!(
                    "{:<38} {:<20} {:<20} {:>14}",
                    "ID", "CUSTOMER", "PRODUCT", "BALANCE"
                );
                println!("{}", "-".repeat(96));
                for summary in summaries {
                    println!(
                        "{:<38} {:<20} {:<20} {:>14}",
                        summary.account.id,
                        summary.customer_name,
                        summary.product_name,
                        format_amount(summary.account.balance)
                    );
                }
            }
        }

        AccountCommands::Show { id } => {
            let account_id = parse_account_id(&id)?;
            let info = directory.get_account_info(account_id).await?;

            println!("Account: {}", info.account.id);
            println!("  Customer:   {}", info.customer.name);
            println!(
                "  Product:    {} ({}%/year)",
                info.product.name, info.product.yearly_rate
            );
            println!("  Balance:    {}", format_amount(info.account.balance));
            println!(
                "  Start date: {}",
                info.account.start_date.format("%Y-%m-%d")
            );
            if info.transactions.is_empty() {
                println!("  No transactions.");
            } else {
                println!("  History:");
                for entry in &info.transactions {
                    println!(
                        "    #{:<5} {} {:<10} {:>12}",
                        entry.sequence,
                        entry.transaction_date.format("%Y-%m-%d"),
                        entry.kind.to_string(),
                        format_amount(entry.amount)
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_export_command(
    directory: &Directory,
    export_type: &str,
    account: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(directory);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "transactions" => match account {
            Some(account) => {
                let account_id = parse_account_id(account)?;
                let count = exporter.export_statement_csv(writer, account_id).await?;
                if output.is_some() {
                    eprintln!("Exported {} statement entries", count);
                }
            }
            None => {
                let count = exporter.export_transactions_csv(writer).await?;
                if output.is_some() {
                    eprintln!("Exported {} transactions", count);
                }
            }
        },
        "accounts" => {
            let count = exporter.export_accounts_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} accounts", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full database: {} customers, {} products, {} accounts, {} transactions",
                    snapshot.customers.len(),
                    snapshot.products.len(),
                    snapshot.accounts.len(),
                    snapshot.transactions.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: transactions, accounts, full",
                export_type
            );
        }
    }

    Ok(())
}

fn parse_account_id(input: &str) -> Result<AccountId> {
    Uuid::parse_str(input).with_context(|| format!("Invalid account ID: {}", input))
}

fn parse_cli_amount(input: &str) -> Result<Amount> {
    parse_amount(input).with_context(|| format!("Invalid amount: {}", input))
}

fn parse_cli_date(input: Option<&str>) -> Result<DateTime<Utc>> {
    match input {
        Some(s) => Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {}", s))?
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc()),
        None => Ok(Utc::now()),
    }
}
