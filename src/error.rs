//! Error types for LevyLedger

use crate::crypto::{address_to_hex, Address};
use crate::Amount;
use thiserror::Error;

/// Broad classes of failure. Every [`LedgerError`] belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed constructor or administrative arguments
    Validation,
    /// A non-owner called an owner-gated operation
    Authorization,
    /// Transfer policy rejected the call
    Policy,
    /// Balance, allowance or supply arithmetic rejected the call
    Arithmetic,
    /// Event sink, configuration or I/O failure
    Infrastructure,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Zero address not allowed for {0}")]
    ZeroAddress(&'static str),

    #[error("Length mismatch: {accounts} accounts, {statuses} statuses")]
    LengthMismatch { accounts: usize, statuses: usize },

    #[error("Cannot rescue the ledger's own asset")]
    SelfRescueForbidden,

    #[error("Caller {} is not the owner", address_to_hex(.caller))]
    Unauthorized { caller: Address },

    #[error("Token transfer while paused")]
    Paused,

    #[error("Ledger is already paused")]
    AlreadyPaused,

    #[error("Ledger is not paused")]
    NotPaused,

    #[error("Only whitelisted addresses can sell")]
    SellNotAllowed,

    #[error("Trading is locked for non-whitelisted addresses")]
    TradingLocked,

    #[error("Minting is disabled")]
    MintingDisabled,

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: Amount, need: Amount },

    #[error("Supply cap exceeded: max {max}, would have {would_have}")]
    CapacityExceeded { max: Amount, would_have: Amount },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Re-entrant mutation rejected")]
    Reentrancy,

    #[error("Event sink error: {0}")]
    EventSink(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_)
            | LedgerError::ZeroAddress(_)
            | LedgerError::LengthMismatch { .. }
            | LedgerError::SelfRescueForbidden => ErrorKind::Validation,
            LedgerError::Unauthorized { .. } => ErrorKind::Authorization,
            LedgerError::Paused
            | LedgerError::AlreadyPaused
            | LedgerError::NotPaused
            | LedgerError::SellNotAllowed
            | LedgerError::TradingLocked
            | LedgerError::MintingDisabled => ErrorKind::Policy,
            LedgerError::InsufficientBalance { .. }
            | LedgerError::InsufficientAllowance { .. }
            | LedgerError::CapacityExceeded { .. }
            | LedgerError::Overflow => ErrorKind::Arithmetic,
            LedgerError::Reentrancy
            | LedgerError::EventSink(_)
            | LedgerError::Config(_)
            | LedgerError::Io(_) => ErrorKind::Infrastructure,
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::EventSink(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
