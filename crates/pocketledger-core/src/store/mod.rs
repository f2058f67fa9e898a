//! Client-side state for the signed-in user's ledger.

pub mod data;

pub use data::DataStore;
