//! # Tender Works Common Library
//!
//! Shared code for the tender management service including:
//! - Database schema, models and queries
//! - Record validation schemas
//! - Bid ranking and comparison analysis
//! - Date normalization and statutory formatting
//! - Currency parsing and rupees-in-words conversion
//! - Configuration loading

pub mod cache;
pub mod config;
pub mod currency;
pub mod dates;
pub mod db;
pub mod error;
pub mod ranking;
pub mod validation;

pub use error::{Error, Result};
