//! Core domain types and logic.

pub mod bar;
pub mod rsi;
pub mod execution;
pub mod ledger;
pub mod simulator;
pub mod grid;
pub mod summary;
pub mod error;
