// core.rs splits bookkeeping into balances/supply and allowances.
pub mod allowances;
pub mod balances;

pub use allowances::*;
pub use balances::*;
