//! Identity primitives for LevyLedger

use crate::error::LedgerError;
use sha2::{Digest, Sha256};

/// Type alias for an identity, which is a 32-byte value.
/// Callers arrive already authenticated; the ledger only compares identities.
pub type Address = [u8; 32];

/// The null identity. Used as the sender of mints and the recipient of burns.
pub const NULL_ADDRESS: Address = [0u8; 32];

/// Identifier of a foreign asset held in custody by the ledger.
pub type AssetId = Address;

pub fn is_null(addr: &Address) -> bool {
    *addr == NULL_ADDRESS
}

/// Convenience function to create an address from a string (hashes the string).
/// Useful for testing and for labelled identities in config files.
pub fn address_from_string(s: &str) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hasher.finalize().into()
}

/// Convert an address to a hex string for display.
pub fn address_to_hex(addr: &Address) -> String {
    hex::encode(addr)
}

/// Shortened hex form for log lines and tables.
pub fn short_hex(addr: &Address) -> String {
    let full = hex::encode(addr);
    format!("{}..{}", &full[..8], &full[full.len() - 4..])
}

/// Convert a hex string to an address.
pub fn address_from_hex(hex_str: &str) -> Result<Address, LedgerError> {
    let trimmed = hex_str.trim().trim_start_matches("0x");
    let bytes = hex::decode(trimmed)
        .map_err(|e| LedgerError::Validation(format!("Invalid hex address: {}", e)))?;
    if bytes.len() != 32 {
        return Err(LedgerError::Validation(format!(
            "Address must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    bytes
        .try_into()
        .map_err(|_| LedgerError::Validation("Failed to convert bytes into address".to_string()))
}

/// Derive the identity of a ledger from its name, symbol and creating owner.
/// Two ledgers with the same triple collide, which the host is expected to prevent.
pub fn derive_ledger_id(name: &str, symbol: &str, owner: &Address) -> Address {
    let mut hasher = Sha256::new();
    hasher.update("levyledger".as_bytes());
    hasher.update((name.len() as u64).to_le_bytes());
    hasher.update(name.as_bytes());
    hasher.update((symbol.len() as u64).to_le_bytes());
    hasher.update(symbol.as_bytes());
    hasher.update(owner);
    hasher.finalize().into()
}
