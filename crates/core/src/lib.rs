//! # SelfPay Core
//!
//! Core business logic for the front-desk self-pay checkout tool.
//!
//! This crate contains pure data operations over a read-only service catalog:
//! - Relevance-scored catalog search with keyword expansion
//! - Dependent-fee resolution with data-driven waiver rules
//! - Cart state, totals, and JSON snapshots for external persistence
//!
//! **No API concerns**: HTTP servers, payment-gateway calls, or service
//! interfaces belong in the surrounding binaries.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod fees;
pub mod keywords;
pub mod search;

pub use cart::{Cart, CheckoutSession};
pub use catalog::{Catalog, LabCode, ServiceItem};
pub use config::{resolve_data_dir, CoreConfig};
pub use error::{CheckoutError, CheckoutResult};
pub use fees::{default_waiver_rules, FeeResolver, WaiverRule};
pub use keywords::KeywordMap;
pub use search::SearchEngine;

// Shared vocabulary types live in the selfpay-types crate.
pub use selfpay_types::{FeeTypeError, FeeTypeKey};
