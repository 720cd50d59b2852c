mod account;
mod customer;
mod interest;
mod ledger;
mod money;
mod product;
mod transaction;

pub use account::*;
pub use customer::*;
pub use interest::*;
pub use ledger::*;
pub use money::*;
pub use product::*;
pub use transaction::*;
