//! Payconf Core - Payment Provider Configuration Backend
//!
//! This crate provides the configuration backend for payment providers:
//! which payment methods a provider supports per country-authority, with
//! which credentials, bank accounts, form fields, STP rules and
//! platform-version restrictions.

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod repository;
pub mod server;
pub mod service;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
