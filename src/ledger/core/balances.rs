use crate::crypto::{is_null, Address, NULL_ADDRESS};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::Amount;
use std::collections::HashMap;

/// Balances and total-supply bookkeeping.
///
/// Every mutator either applies completely or returns an error without
/// touching state, so `sum(balances) == total_supply <= max_supply` holds
/// after each call.
#[derive(Debug, Clone, Default)]
pub struct LedgerCore {
    balances: HashMap<Address, Amount>,
    total_supply: Amount,
    max_supply: Amount,
}

impl LedgerCore {
    pub fn new(max_supply: Amount) -> Self {
        Self {
            balances: HashMap::new(),
            total_supply: 0,
            max_supply,
        }
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn max_supply(&self) -> Amount {
        self.max_supply
    }

    /// Every identity that has ever been credited.
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    pub fn mint(
        &mut self,
        account: &Address,
        amount: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        if is_null(account) {
            return Err(LedgerError::ZeroAddress("mint recipient"));
        }

        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        if new_supply > self.max_supply {
            return Err(LedgerError::CapacityExceeded {
                max: self.max_supply,
                would_have: new_supply,
            });
        }
        // Cannot overflow: the balance is bounded by the supply checked above.
        let new_balance = self.balance_of(account) + amount;

        self.total_supply = new_supply;
        self.balances.insert(*account, new_balance);
        events.push(LedgerEvent::Transfer {
            from: NULL_ADDRESS,
            to: *account,
            amount,
        });
        Ok(())
    }

    pub fn burn(
        &mut self,
        account: &Address,
        amount: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        if is_null(account) {
            return Err(LedgerError::ZeroAddress("burn account"));
        }

        let have = self.balance_of(account);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }

        self.balances.insert(*account, have - amount);
        self.total_supply -= amount;
        events.push(LedgerEvent::Transfer {
            from: *account,
            to: NULL_ADDRESS,
            amount,
        });
        Ok(())
    }

    /// Move `amount` from `from` to `to` with no policy applied.
    pub fn raw_transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        if is_null(from) {
            return Err(LedgerError::ZeroAddress("transfer sender"));
        }
        if is_null(to) {
            return Err(LedgerError::ZeroAddress("transfer recipient"));
        }

        let have = self.balance_of(from);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }

        if from != to {
            let credited = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
            self.balances.insert(*from, have - amount);
            self.balances.insert(*to, credited);
        }

        events.push(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }

    /// Recompute the supply from balances. Used by tests and audits.
    pub fn sum_of_balances(&self) -> Amount {
        self.balances.values().sum()
    }
}
