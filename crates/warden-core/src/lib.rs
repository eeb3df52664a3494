//! Core types and trait definitions for the Warden moderation ledger.
//!
//! This crate has no HTTP or database dependencies; every other crate
//! depends on it. The account status state machine lives
//! here as plain functions over [`ledger::StrikeLedger`] so every backend
//! applies exactly the same transitions.

pub mod action;
pub mod error;
pub mod ledger;
pub mod store;
pub mod user;
pub mod view;
pub mod violation;

pub use error::{Error, ErrorClass, Result, StoreError};
