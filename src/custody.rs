//! Assets held by the ledger itself: foreign assets sent to it by mistake and
//! a native balance. Both can only leave through the owner's rescue calls.

use crate::crypto::AssetId;
use crate::error::LedgerError;
use crate::Amount;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Custody {
    foreign: HashMap<AssetId, Amount>,
    native: Amount,
}

impl Custody {
    pub fn foreign_balance(&self, asset: &AssetId) -> Amount {
        self.foreign.get(asset).copied().unwrap_or(0)
    }

    pub fn native_balance(&self) -> Amount {
        self.native
    }

    pub fn deposit_foreign(&mut self, asset: &AssetId, amount: Amount) -> Result<(), LedgerError> {
        let held = self
            .foreign_balance(asset)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.foreign.insert(*asset, held);
        Ok(())
    }

    pub fn deposit_native(&mut self, amount: Amount) -> Result<(), LedgerError> {
        self.native = self.native.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    pub fn withdraw_foreign(&mut self, asset: &AssetId, amount: Amount) -> Result<(), LedgerError> {
        let have = self.foreign_balance(asset);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }
        self.foreign.insert(*asset, have - amount);
        Ok(())
    }

    pub fn withdraw_native(&mut self, amount: Amount) -> Result<(), LedgerError> {
        if self.native < amount {
            return Err(LedgerError::InsufficientBalance {
                have: self.native,
                need: amount,
            });
        }
        self.native -= amount;
        Ok(())
    }
}
