use crate::crypto::{is_null, Address};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::Amount;
use std::collections::HashMap;

/// Delegated-spend amounts keyed by (owner, spender).
#[derive(Debug, Clone, Default)]
pub struct AllowanceRegistry {
    allowances: HashMap<(Address, Address), Amount>,
}

impl AllowanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Set the allowance to exactly `amount`. Not additive.
    pub fn approve(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        if is_null(owner) {
            return Err(LedgerError::ZeroAddress("approval owner"));
        }
        if is_null(spender) {
            return Err(LedgerError::ZeroAddress("approval spender"));
        }

        self.allowances.insert((*owner, *spender), amount);
        events.push(LedgerEvent::Approval {
            owner: *owner,
            spender: *spender,
            amount,
        });
        Ok(())
    }

    /// Consume `amount` of the allowance. Emits nothing; callers record the
    /// remaining amount alongside their own records.
    pub fn spend(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let have = self.allowance(owner, spender);
        if have < amount {
            return Err(LedgerError::InsufficientAllowance { have, need: amount });
        }
        self.allowances.insert((*owner, *spender), have - amount);
        Ok(())
    }

    pub fn increase_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        added: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<Amount, LedgerError> {
        let updated = self
            .allowance(owner, spender)
            .checked_add(added)
            .ok_or(LedgerError::Overflow)?;
        self.approve(owner, spender, updated, events)?;
        Ok(updated)
    }

    pub fn decrease_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        subtracted: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<Amount, LedgerError> {
        let have = self.allowance(owner, spender);
        let updated = have
            .checked_sub(subtracted)
            .ok_or(LedgerError::InsufficientAllowance {
                have,
                need: subtracted,
            })?;
        self.approve(owner, spender, updated, events)?;
        Ok(updated)
    }
}
