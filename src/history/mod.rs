// src/history/mod.rs
pub mod reconcile;
pub mod store;

pub use reconcile::{reconcile, Reconciliation};
pub use store::{write_atomically, write_records, AccumulatedStore};
