//! Access control: ownership, whitelist, tax exclusions, pool addresses and
//! the pause / trading-lock switches.
//!
//! The component holds no opinion on who may call what beyond
//! [`AccessControl::ensure_owner`]; the token façade calls it before any
//! owner-gated mutation so that authorization always pre-empts business rules.

use crate::crypto::{is_null, Address, NULL_ADDRESS};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use std::collections::{HashMap, HashSet};

/// Insertion-indexed set: one structure backs both membership lookups and
/// enumeration, so the two views can never disagree.
///
/// Removal swaps the last element into the vacated slot and truncates, so
/// enumeration order is insertion order only until the first removal.
#[derive(Debug, Clone, Default)]
pub struct OrderedSet {
    index: HashMap<Address, usize>,
    items: Vec<Address>,
}

impl OrderedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the identity was already present.
    pub fn insert(&mut self, addr: Address) -> bool {
        if self.index.contains_key(&addr) {
            return false;
        }
        self.index.insert(addr, self.items.len());
        self.items.push(addr);
        true
    }

    /// Returns false when the identity was not present.
    pub fn remove(&mut self, addr: &Address) -> bool {
        let Some(pos) = self.index.remove(addr) else {
            return false;
        };
        self.items.swap_remove(pos);
        if let Some(moved) = self.items.get(pos) {
            self.index.insert(*moved, pos);
        }
        true
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.index.contains_key(addr)
    }

    pub fn as_slice(&self) -> &[Address] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    owner: Option<Address>,
    whitelist: OrderedSet,
    tax_excluded: HashSet<Address>,
    pools: OrderedSet,
    paused: bool,
    trading_locked: bool,
}

impl AccessControl {
    pub fn new(owner: Address, trading_locked: bool) -> Self {
        Self {
            owner: Some(owner),
            trading_locked,
            ..Self::default()
        }
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner
    }

    pub fn is_owner(&self, addr: &Address) -> bool {
        self.owner.as_ref() == Some(addr)
    }

    pub fn ensure_owner(&self, caller: &Address) -> Result<(), LedgerError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized { caller: *caller })
        }
    }

    pub fn transfer_ownership(
        &mut self,
        new_owner: &Address,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        if is_null(new_owner) {
            return Err(LedgerError::ZeroAddress("new owner"));
        }
        let previous = self.owner.replace(*new_owner).unwrap_or(NULL_ADDRESS);
        events.push(LedgerEvent::OwnershipTransferred {
            previous,
            new: *new_owner,
        });
        Ok(())
    }

    /// Clears the owner for good. Nothing can set it again because every
    /// ownership mutation requires the current owner as caller.
    pub fn renounce_ownership(&mut self, events: &mut Vec<LedgerEvent>) {
        let previous = self.owner.take().unwrap_or(NULL_ADDRESS);
        events.push(LedgerEvent::OwnershipTransferred {
            previous,
            new: NULL_ADDRESS,
        });
    }

    // ------------------------------------------------------------------
    // Whitelist
    // ------------------------------------------------------------------

    pub fn is_whitelisted(&self, addr: &Address) -> bool {
        self.whitelist.contains(addr)
    }

    pub fn whitelist(&self) -> &[Address] {
        self.whitelist.as_slice()
    }

    /// Seed an entry without emitting an update record (construction only).
    pub(crate) fn seed_whitelist(&mut self, addr: Address) {
        self.whitelist.insert(addr);
    }

    pub fn update_whitelist(
        &mut self,
        account: &Address,
        status: bool,
        events: &mut Vec<LedgerEvent>,
    ) {
        if status {
            self.whitelist.insert(*account);
        } else {
            self.whitelist.remove(account);
        }
        events.push(LedgerEvent::WhitelistUpdated {
            account: *account,
            status,
        });
    }

    pub fn update_whitelist_batch(
        &mut self,
        accounts: &[Address],
        statuses: &[bool],
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        if accounts.len() != statuses.len() {
            return Err(LedgerError::LengthMismatch {
                accounts: accounts.len(),
                statuses: statuses.len(),
            });
        }
        for (account, status) in accounts.iter().zip(statuses) {
            self.update_whitelist(account, *status, events);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tax exclusion
    // ------------------------------------------------------------------

    pub fn is_excluded_from_tax(&self, addr: &Address) -> bool {
        self.tax_excluded.contains(addr)
    }

    pub fn set_excluded(
        &mut self,
        account: &Address,
        excluded: bool,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        if is_null(account) {
            return Err(LedgerError::ZeroAddress("tax exclusion account"));
        }
        if excluded {
            self.tax_excluded.insert(*account);
        } else {
            self.tax_excluded.remove(account);
        }
        events.push(LedgerEvent::TaxExclusionUpdated {
            account: *account,
            excluded,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pool addresses
    // ------------------------------------------------------------------

    pub fn is_pool(&self, addr: &Address) -> bool {
        self.pools.contains(addr)
    }

    pub fn pools(&self) -> &[Address] {
        self.pools.as_slice()
    }

    pub fn set_pool(
        &mut self,
        pool: &Address,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        if is_null(pool) {
            return Err(LedgerError::ZeroAddress("pool address"));
        }
        self.pools.insert(*pool);
        events.push(LedgerEvent::PoolAddressSet { pool: *pool });
        Ok(())
    }

    /// Returns whether the identity was a pool.
    pub fn remove_pool(&mut self, pool: &Address, events: &mut Vec<LedgerEvent>) -> bool {
        let removed = self.pools.remove(pool);
        if removed {
            events.push(LedgerEvent::PoolAddressRemoved { pool: *pool });
        }
        removed
    }

    // ------------------------------------------------------------------
    // Switches
    // ------------------------------------------------------------------

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(
        &mut self,
        caller: &Address,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::AlreadyPaused);
        }
        self.paused = true;
        events.push(LedgerEvent::Paused { account: *caller });
        Ok(())
    }

    pub fn unpause(
        &mut self,
        caller: &Address,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        self.paused = false;
        events.push(LedgerEvent::Unpaused { account: *caller });
        Ok(())
    }

    pub fn is_trading_locked(&self) -> bool {
        self.trading_locked
    }

    pub fn toggle_trading_lock(&mut self, events: &mut Vec<LedgerEvent>) -> bool {
        self.trading_locked = !self.trading_locked;
        events.push(LedgerEvent::TradingLockToggled {
            locked: self.trading_locked,
        });
        self.trading_locked
    }

    /// Whether `seller` may currently sell into a pool under the trading lock.
    pub fn is_sell_allowed(&self, seller: &Address) -> bool {
        !self.trading_locked || self.is_whitelisted(seller) || self.is_owner(seller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::address_from_string;
    use std::collections::HashSet;

    fn addr(s: &str) -> Address {
        address_from_string(s)
    }

    fn as_set(items: &[Address]) -> HashSet<Address> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_ordered_set_swap_remove() {
        let mut set = OrderedSet::new();
        let (x, y, z) = (addr("x"), addr("y"), addr("z"));
        set.insert(x);
        set.insert(y);
        set.insert(z);

        assert!(set.remove(&y));
        assert_eq!(as_set(set.as_slice()), as_set(&[x, z]));
        assert!(!set.contains(&y));

        // Index of the moved element must still resolve.
        assert!(set.remove(&z));
        assert_eq!(set.as_slice(), &[x]);
        assert!(!set.remove(&z));
    }

    #[test]
    fn test_ordered_set_duplicate_insert() {
        let mut set = OrderedSet::new();
        assert!(set.insert(addr("a")));
        assert!(!set.insert(addr("a")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_ordered_set_views_agree_after_churn() {
        let mut set = OrderedSet::new();
        let ids: Vec<Address> = (0..20).map(|i| addr(&format!("id{}", i))).collect();
        for id in &ids {
            set.insert(*id);
        }
        for id in ids.iter().step_by(3) {
            set.remove(id);
        }
        for id in ids.iter().take(4) {
            set.insert(*id);
        }
        for (pos, id) in set.as_slice().iter().enumerate() {
            assert_eq!(set.index.get(id), Some(&pos));
        }
        assert_eq!(set.index.len(), set.len());
    }

    #[test]
    fn test_whitelist_update_always_emits() {
        let mut access = AccessControl::new(addr("owner"), false);
        let mut events = Vec::new();
        let a = addr("a");

        access.update_whitelist(&a, true, &mut events);
        access.update_whitelist(&a, true, &mut events);

        assert_eq!(access.whitelist(), &[a]);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_batch_length_mismatch_applies_nothing() {
        let mut access = AccessControl::new(addr("owner"), false);
        let mut events = Vec::new();
        let result = access.update_whitelist_batch(&[addr("a"), addr("b")], &[true], &mut events);

        assert_eq!(
            result,
            Err(LedgerError::LengthMismatch {
                accounts: 2,
                statuses: 1
            })
        );
        assert!(access.whitelist().is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn test_pause_unpause_errors() {
        let owner = addr("owner");
        let mut access = AccessControl::new(owner, false);
        let mut events = Vec::new();

        assert_eq!(access.unpause(&owner, &mut events), Err(LedgerError::NotPaused));
        access.pause(&owner, &mut events).unwrap();
        assert_eq!(access.pause(&owner, &mut events), Err(LedgerError::AlreadyPaused));
        access.unpause(&owner, &mut events).unwrap();
        assert_eq!(
            events,
            vec![
                LedgerEvent::Paused { account: owner },
                LedgerEvent::Unpaused { account: owner }
            ]
        );
    }

    #[test]
    fn test_renounce_is_permanent() {
        let owner = addr("owner");
        let mut access = AccessControl::new(owner, false);
        access.renounce_ownership(&mut Vec::new());

        assert_eq!(access.owner(), None);
        assert!(access.ensure_owner(&owner).is_err());
        assert!(access.ensure_owner(&NULL_ADDRESS).is_err());
    }

    #[test]
    fn test_sell_allowed() {
        let owner = addr("owner");
        let seller = addr("seller");
        let mut access = AccessControl::new(owner, true);

        assert!(!access.is_sell_allowed(&seller));
        assert!(access.is_sell_allowed(&owner));
        access.update_whitelist(&seller, true, &mut Vec::new());
        assert!(access.is_sell_allowed(&seller));
        access.update_whitelist(&seller, false, &mut Vec::new());
        access.toggle_trading_lock(&mut Vec::new());
        assert!(access.is_sell_allowed(&seller));
    }

    #[test]
    fn test_exclusion_rejects_null() {
        let mut access = AccessControl::new(addr("owner"), false);
        assert!(matches!(
            access.set_excluded(&NULL_ADDRESS, true, &mut Vec::new()),
            Err(LedgerError::ZeroAddress(_))
        ));
    }
}
