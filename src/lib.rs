//! Soma settlement - payment webhook ledger for the Soma marketplace
//!
//! Verifies signed payment webhooks, records orders with their commission
//! split (vendor payouts, platform fees, store-owner profit) and accrues held
//! referral rewards on plan activations, each settlement in one SQLite
//! transaction.

pub mod alerting;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod id;
pub mod models;
pub mod notify;
pub mod payments;
pub mod settlement;
pub mod util;
