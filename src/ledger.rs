// Thin re-export module: the bookkeeping primitives live in `ledger/core.rs`
// and its submodules (balances and supply, delegated allowances).

pub mod core;
pub use self::core::*;
