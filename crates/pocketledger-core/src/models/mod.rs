//! Data models for the expense tracker API.
//!
//! - `Transaction`, `TransactionInput`, `TransactionFilters`: income/expense entries
//! - `Category`, `CategoryInput`: user-defined groupings per transaction type
//! - `Statistics`, `CategoryTotal`: server-side aggregates for charts
//! - `User`, `Credentials`, `Registration`: account data

pub mod category;
pub mod statistics;
pub mod transaction;
pub mod user;

pub use category::{categories_of_kind, Category, CategoryInput, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON};
pub use statistics::{CategoryBreakdown, CategoryTotal, Statistics, TypeSummary};
pub use transaction::{Transaction, TransactionFilters, TransactionInput, TransactionType};
pub use user::{Credentials, Registration, User};
