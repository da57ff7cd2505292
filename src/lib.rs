//! LevyLedger - A permissioned fungible-token ledger with taxed transfers
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Ledger
//! - [`ledger`] - Balances, supply cap and delegated allowances
//! - [`policy`] - Transfer legality rules and tax classification
//! - [`access`] - Owner, whitelist, tax exclusions, pools and pause state
//! - [`custody`] - Foreign and native assets held by the ledger itself
//! - [`token`] - The [`TaxToken`] façade tying the components together
//!
//! ## Audit Trail
//! - [`events`] - Hash-chained event records and replay
//! - [`sink`] - Durable event sinks
//!
//! ## Cryptography
//! - [`crypto`] - Identities and SHA-256 derivations
//!
//! ## Configuration & Utilities
//! - [`config`] - TOML configuration
//! - [`error`] - Error types

#![forbid(unsafe_code)]

/// Token quantity in base units (`10^-18` of a whole token).
pub type Amount = u128;

// ============================================================================
// Ledger
// ============================================================================
pub mod access;
pub mod custody;
pub mod ledger;
pub mod policy;
pub mod token;

// ============================================================================
// Audit Trail
// ============================================================================
pub mod events;
pub mod sink;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use crypto::{Address, AssetId, NULL_ADDRESS};
pub use error::{ErrorKind, LedgerError, Result};
pub use events::{EventRecord, LedgerEvent};
pub use policy::{TaxCategory, TaxQuote, TaxRates};
pub use sink::{EventSink, InMemorySink, JsonLinesSink};
pub use token::{TaxToken, TokenParams};
