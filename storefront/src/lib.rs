// storefront/src/lib.rs

//! Storefront backend: product catalog, saga-driven checkout against a
//! hosted payment processor, and signed-webhook order reconciliation.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod sagas;
pub mod services;
pub mod state;
pub mod web;
