//! The token façade.
//!
//! [`TaxToken`] composes [`LedgerCore`], [`AllowanceRegistry`],
//! [`AccessControl`] and [`TransferPolicyEngine`] over one state value and
//! records every committed mutation in an [`EventLog`].
//!
//! # Concurrency
//!
//! Mutations are serialized by a reentrant writer gate. A thread that
//! re-enters a mutation while one is in progress on the same token (for
//! example from inside an [`EventSink`]) gets [`LedgerError::Reentrancy`];
//! other threads simply wait their turn.
//!
//! Each mutation runs against a staged copy of the state. The resulting
//! records are sealed and handed to the sink; only when the sink accepts them
//! are the staged state and the records committed together under the write
//! lock. Readers therefore only ever observe committed states.

use crate::access::AccessControl;
use crate::crypto::{derive_ledger_id, is_null, short_hex, Address, AssetId, NULL_ADDRESS};
use crate::custody::Custody;
use crate::error::{LedgerError, Result};
use crate::events::{verify_chain, BalanceReplay, EventCursor, EventLog, EventRecord, LedgerEvent};
use crate::ledger::{AllowanceRegistry, LedgerCore};
use crate::policy::{TaxQuote, TaxRates, TransferPolicyEngine};
use crate::sink::EventSink;
use crate::Amount;
use parking_lot::{ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use tracing::{debug, info, warn};

/// Fixed number of decimals of every token.
pub const DECIMALS: u8 = 18;
pub const MAX_NAME_LENGTH: usize = 32;
pub const MAX_SYMBOL_LENGTH: usize = 11;

/// Constructor parameters. Validated as a whole before any state exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub initial_supply: Amount,
    pub whitelist: Vec<Address>,
    pub buy_tax: u8,
    pub sell_tax: u8,
    pub wallet_tax: u8,
    pub logo_url: String,
    pub website: String,
    pub telegram: String,
    pub trading_locked: bool,
    pub mintable: bool,
    pub max_supply: Amount,
    pub owner: Address,
}

impl TokenParams {
    /// Untaxed, unlocked, non-mintable parameters with empty metadata.
    pub fn new(
        name: &str,
        symbol: &str,
        initial_supply: Amount,
        max_supply: Amount,
        owner: Address,
    ) -> Self {
        TokenParams {
            name: name.to_string(),
            symbol: symbol.to_string(),
            initial_supply,
            whitelist: Vec::new(),
            buy_tax: 0,
            sell_tax: 0,
            wallet_tax: 0,
            logo_url: String::new(),
            website: String::new(),
            telegram: String::new(),
            trading_locked: false,
            mintable: false,
            max_supply,
            owner,
        }
    }

    pub fn with_whitelist(mut self, whitelist: Vec<Address>) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn with_taxes(mut self, buy: u8, sell: u8, wallet: u8) -> Self {
        self.buy_tax = buy;
        self.sell_tax = sell;
        self.wallet_tax = wallet;
        self
    }

    pub fn with_info(mut self, logo_url: &str, website: &str, telegram: &str) -> Self {
        self.logo_url = logo_url.to_string();
        self.website = website.to_string();
        self.telegram = telegram.to_string();
        self
    }

    pub fn trading_locked(mut self, locked: bool) -> Self {
        self.trading_locked = locked;
        self
    }

    pub fn mintable(mut self, mintable: bool) -> Self {
        self.mintable = mintable;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_supply > self.max_supply {
            return Err(LedgerError::Validation(format!(
                "Initial supply {} exceeds max supply {}",
                self.initial_supply, self.max_supply
            )));
        }
        TaxRates::new(self.buy_tax, self.sell_tax, self.wallet_tax)?;
        if is_null(&self.owner) {
            return Err(LedgerError::Validation("Zero owner address".to_string()));
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("Name cannot be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(LedgerError::Validation(format!(
                "Name exceeds maximum length of {} characters",
                MAX_NAME_LENGTH
            )));
        }
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return Err(LedgerError::Validation("Symbol cannot be empty".to_string()));
        }
        if symbol.chars().count() > MAX_SYMBOL_LENGTH {
            return Err(LedgerError::Validation(format!(
                "Symbol exceeds maximum length of {} characters",
                MAX_SYMBOL_LENGTH
            )));
        }

        if let Some(pos) = self.whitelist.iter().position(is_null) {
            return Err(LedgerError::Validation(format!(
                "Whitelist entry {} is the zero address",
                pos
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub logo_url: String,
    pub website: String,
    pub telegram: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBasicInfo {
    pub logo_url: String,
    pub website: String,
    pub telegram: String,
    pub trading_locked: bool,
    pub mintable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenNumbers {
    pub max_supply: Amount,
    pub total_supply: Amount,
    pub buy_tax: u8,
    pub sell_tax: u8,
    pub wallet_tax: u8,
}

#[derive(Debug, Clone)]
struct TokenState {
    metadata: TokenMetadata,
    mintable: bool,
    core: LedgerCore,
    allowances: AllowanceRegistry,
    access: AccessControl,
    policy: TransferPolicyEngine,
    custody: Custody,
}

/// Clears the in-progress flag when a mutation ends, however it ends.
struct WriteInProgress<'a>(&'a Cell<bool>);

impl Drop for WriteInProgress<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct TaxToken {
    ledger_id: Address,
    state: RwLock<TokenState>,
    log: EventLog,
    sink: Option<Box<dyn EventSink>>,
    writer: ReentrantMutex<Cell<bool>>,
}

impl TaxToken {
    pub fn new(params: TokenParams) -> Result<Self> {
        Self::build(params, None)
    }

    /// Like [`TaxToken::new`], but every batch of records must be accepted
    /// by `sink` before it is committed, including the construction records.
    pub fn with_sink(params: TokenParams, sink: Box<dyn EventSink>) -> Result<Self> {
        Self::build(params, Some(sink))
    }

    fn build(params: TokenParams, sink: Option<Box<dyn EventSink>>) -> Result<Self> {
        params.validate()?;
        let rates = TaxRates::new(params.buy_tax, params.sell_tax, params.wallet_tax)?;
        let owner = params.owner;
        let name = params.name.trim().to_string();
        let symbol = params.symbol.trim().to_string();

        let mut events = vec![LedgerEvent::OwnershipTransferred {
            previous: NULL_ADDRESS,
            new: owner,
        }];

        let mut access = AccessControl::new(owner, params.trading_locked);
        for addr in &params.whitelist {
            access.seed_whitelist(*addr);
        }
        access.seed_whitelist(owner);

        let mut core = LedgerCore::new(params.max_supply);
        core.mint(&owner, params.initial_supply, &mut events)?;

        let state = TokenState {
            metadata: TokenMetadata {
                name: name.clone(),
                symbol: symbol.clone(),
                decimals: DECIMALS,
                logo_url: params.logo_url,
                website: params.website,
                telegram: params.telegram,
            },
            mintable: params.mintable,
            core,
            allowances: AllowanceRegistry::new(),
            access,
            // Tax proceeds follow the creator, not later owners.
            policy: TransferPolicyEngine::new(rates, owner),
            custody: Custody::default(),
        };

        let log = EventLog::new();
        let records = log.seal(events)?;
        if let Some(sink) = &sink {
            sink.append(&records).map_err(into_sink_error)?;
        }
        log.commit(records);

        info!(
            "Created token {} ({}) with supply {} / {} owned by {}",
            name,
            symbol,
            params.initial_supply,
            params.max_supply,
            short_hex(&owner)
        );

        Ok(TaxToken {
            ledger_id: derive_ledger_id(&name, &symbol, &owner),
            state: RwLock::new(state),
            log,
            sink,
            writer: ReentrantMutex::new(Cell::new(false)),
        })
    }

    /// Apply `op` to a staged copy of the state and commit it together with
    /// the records it produced, or commit nothing.
    ///
    /// Staging clones the whole state, so every mutation costs time and memory
    /// proportional to the number of accounts and allowances.
    fn mutate<T, F>(&self, name: &'static str, op: F) -> Result<T>
    where
        F: FnOnce(&mut TokenState, &mut Vec<LedgerEvent>) -> Result<T>,
    {
        let gate = self.writer.lock();
        if gate.get() {
            warn!("Rejected re-entrant {} while another mutation is in progress", name);
            return Err(LedgerError::Reentrancy);
        }
        gate.set(true);
        let _in_progress = WriteInProgress(&gate);

        let mut staged = self.state.read().clone();
        let mut events = Vec::new();
        let output = op(&mut staged, &mut events).map_err(|e| {
            debug!("{} rejected: {}", name, e);
            e
        })?;

        let records = self.log.seal(events)?;
        if let Some(sink) = &self.sink {
            sink.append(&records).map_err(|e| {
                warn!("Event sink refused {} records for {}: {}", records.len(), name, e);
                into_sink_error(e)
            })?;
        }

        let mut state = self.state.write();
        *state = staged;
        let count = records.len();
        self.log.commit(records);
        drop(state);

        debug!("{} committed with {} records", name, count);
        Ok(output)
    }

    fn read<T>(&self, f: impl FnOnce(&TokenState) -> T) -> T {
        f(&self.state.read())
    }

    // ========================================================================
    // Holder operations
    // ========================================================================

    pub fn transfer(&self, caller: &Address, to: &Address, amount: Amount) -> Result<TaxQuote> {
        self.mutate("transfer", |s, events| {
            s.policy
                .execute(&s.access, &mut s.core, caller, to, amount, events)
        })
    }

    /// Move `amount` from `from` on behalf of `caller`. The transfer rules run
    /// first; the allowance is spent afterwards within the same commit.
    pub fn transfer_from(
        &self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<TaxQuote> {
        self.mutate("transfer_from", |s, events| {
            let quote = s
                .policy
                .execute(&s.access, &mut s.core, from, to, amount, events)?;
            spend_allowance(&mut s.allowances, from, caller, amount, events)?;
            Ok(quote)
        })
    }

    pub fn approve(&self, caller: &Address, spender: &Address, amount: Amount) -> Result<()> {
        self.mutate("approve", |s, events| {
            s.allowances.approve(caller, spender, amount, events)
        })
    }

    pub fn increase_allowance(
        &self,
        caller: &Address,
        spender: &Address,
        added: Amount,
    ) -> Result<Amount> {
        self.mutate("increase_allowance", |s, events| {
            s.allowances
                .increase_allowance(caller, spender, added, events)
        })
    }

    pub fn decrease_allowance(
        &self,
        caller: &Address,
        spender: &Address,
        subtracted: Amount,
    ) -> Result<Amount> {
        self.mutate("decrease_allowance", |s, events| {
            s.allowances
                .decrease_allowance(caller, spender, subtracted, events)
        })
    }

    pub fn burn(&self, caller: &Address, amount: Amount) -> Result<()> {
        self.mutate("burn", |s, events| {
            s.policy.check_legality(&s.access, caller, &NULL_ADDRESS)?;
            s.core.burn(caller, amount, events)
        })
    }

    pub fn burn_from(&self, caller: &Address, account: &Address, amount: Amount) -> Result<()> {
        self.mutate("burn_from", |s, events| {
            s.policy.check_legality(&s.access, account, &NULL_ADDRESS)?;
            s.core.burn(account, amount, events)?;
            spend_allowance(&mut s.allowances, account, caller, amount, events)
        })
    }

    // ========================================================================
    // Owner-gated operations
    // ========================================================================

    pub fn mint(&self, caller: &Address, to: &Address, amount: Amount) -> Result<()> {
        self.mutate("mint", |s, events| {
            s.access.ensure_owner(caller)?;
            if !s.mintable {
                return Err(LedgerError::MintingDisabled);
            }
            s.policy.check_legality(&s.access, &NULL_ADDRESS, to)?;
            s.core.mint(to, amount, events)
        })?;
        info!("Minted {} to {}", amount, short_hex(to));
        Ok(())
    }

    pub fn set_taxes(&self, caller: &Address, buy: u8, sell: u8, wallet: u8) -> Result<()> {
        self.mutate("set_taxes", |s, events| {
            s.access.ensure_owner(caller)?;
            s.policy.set_rates(TaxRates { buy, sell, wallet }, events)
        })?;
        info!("Taxes updated: buy {}%, sell {}%, wallet {}%", buy, sell, wallet);
        Ok(())
    }

    pub fn update_whitelist(&self, caller: &Address, account: &Address, status: bool) -> Result<()> {
        self.mutate("update_whitelist", |s, events| {
            s.access.ensure_owner(caller)?;
            s.access.update_whitelist(account, status, events);
            Ok(())
        })
    }

    pub fn update_whitelist_batch(
        &self,
        caller: &Address,
        accounts: &[Address],
        statuses: &[bool],
    ) -> Result<()> {
        self.mutate("update_whitelist_batch", |s, events| {
            s.access.ensure_owner(caller)?;
            s.access.update_whitelist_batch(accounts, statuses, events)
        })
    }

    pub fn set_excluded_from_tax(
        &self,
        caller: &Address,
        account: &Address,
        excluded: bool,
    ) -> Result<()> {
        self.mutate("set_excluded_from_tax", |s, events| {
            s.access.ensure_owner(caller)?;
            s.access.set_excluded(account, excluded, events)
        })
    }

    pub fn set_pool_address(&self, caller: &Address, pool: &Address) -> Result<()> {
        self.mutate("set_pool_address", |s, events| {
            s.access.ensure_owner(caller)?;
            s.access.set_pool(pool, events)
        })?;
        info!("Pool address set: {}", short_hex(pool));
        Ok(())
    }

    /// Returns whether the identity was a pool.
    pub fn remove_pool_address(&self, caller: &Address, pool: &Address) -> Result<bool> {
        self.mutate("remove_pool_address", |s, events| {
            s.access.ensure_owner(caller)?;
            Ok(s.access.remove_pool(pool, events))
        })
    }

    pub fn pause(&self, caller: &Address) -> Result<()> {
        self.mutate("pause", |s, events| {
            s.access.ensure_owner(caller)?;
            s.access.pause(caller, events)
        })?;
        info!("Ledger paused by {}", short_hex(caller));
        Ok(())
    }

    pub fn unpause(&self, caller: &Address) -> Result<()> {
        self.mutate("unpause", |s, events| {
            s.access.ensure_owner(caller)?;
            s.access.unpause(caller, events)
        })?;
        info!("Ledger unpaused by {}", short_hex(caller));
        Ok(())
    }

    /// Returns the new lock state.
    pub fn toggle_trading_lock(&self, caller: &Address) -> Result<bool> {
        let locked = self.mutate("toggle_trading_lock", |s, events| {
            s.access.ensure_owner(caller)?;
            Ok(s.access.toggle_trading_lock(events))
        })?;
        info!("Trading lock is now {}", if locked { "on" } else { "off" });
        Ok(locked)
    }

    /// Returns the new mintable flag.
    pub fn toggle_mintable(&self, caller: &Address) -> Result<bool> {
        self.mutate("toggle_mintable", |s, events| {
            s.access.ensure_owner(caller)?;
            s.mintable = !s.mintable;
            events.push(LedgerEvent::MintableToggled {
                mintable: s.mintable,
            });
            Ok(s.mintable)
        })
    }

    pub fn transfer_ownership(&self, caller: &Address, new_owner: &Address) -> Result<()> {
        self.mutate("transfer_ownership", |s, events| {
            s.access.ensure_owner(caller)?;
            s.access.transfer_ownership(new_owner, events)
        })?;
        info!(
            "Ownership transferred from {} to {}",
            short_hex(caller),
            short_hex(new_owner)
        );
        Ok(())
    }

    pub fn renounce_ownership(&self, caller: &Address) -> Result<()> {
        self.mutate("renounce_ownership", |s, events| {
            s.access.ensure_owner(caller)?;
            s.access.renounce_ownership(events);
            Ok(())
        })?;
        info!("Ownership renounced by {}", short_hex(caller));
        Ok(())
    }

    pub fn update_token_info(
        &self,
        caller: &Address,
        logo_url: &str,
        website: &str,
        telegram: &str,
    ) -> Result<()> {
        self.mutate("update_token_info", |s, events| {
            s.access.ensure_owner(caller)?;
            s.metadata.logo_url = logo_url.to_string();
            s.metadata.website = website.to_string();
            s.metadata.telegram = telegram.to_string();
            events.push(LedgerEvent::TokenInfoUpdated {
                logo_url: logo_url.to_string(),
                website: website.to_string(),
                telegram: telegram.to_string(),
            });
            Ok(())
        })
    }

    /// Release `amount` of a foreign asset held by the ledger to the owner.
    pub fn rescue_foreign_asset(
        &self,
        caller: &Address,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<()> {
        let ledger_id = self.ledger_id;
        self.mutate("rescue_foreign_asset", |s, events| {
            s.access.ensure_owner(caller)?;
            if *asset == ledger_id {
                return Err(LedgerError::SelfRescueForbidden);
            }
            if is_null(asset) {
                return Err(LedgerError::ZeroAddress("rescued asset"));
            }
            s.custody.withdraw_foreign(asset, amount)?;
            events.push(LedgerEvent::ForeignAssetRescued {
                asset: *asset,
                to: *caller,
                amount,
            });
            Ok(())
        })?;
        info!("Rescued {} of asset {}", amount, short_hex(asset));
        Ok(())
    }

    pub fn rescue_native(&self, caller: &Address, amount: Amount) -> Result<()> {
        self.mutate("rescue_native", |s, events| {
            s.access.ensure_owner(caller)?;
            s.custody.withdraw_native(amount)?;
            events.push(LedgerEvent::NativeRescued { to: *caller, amount });
            Ok(())
        })?;
        info!("Rescued {} native units", amount);
        Ok(())
    }

    // ========================================================================
    // Host operations
    // ========================================================================

    /// Record a foreign asset credited to the ledger by the host environment.
    pub fn deposit_foreign(&self, asset: &AssetId, amount: Amount) -> Result<()> {
        let ledger_id = self.ledger_id;
        self.mutate("deposit_foreign", |s, events| {
            if is_null(asset) {
                return Err(LedgerError::ZeroAddress("deposited asset"));
            }
            if *asset == ledger_id {
                return Err(LedgerError::SelfRescueForbidden);
            }
            s.custody.deposit_foreign(asset, amount)?;
            events.push(LedgerEvent::ForeignAssetDeposited {
                asset: *asset,
                amount,
            });
            Ok(())
        })
    }

    pub fn deposit_native(&self, amount: Amount) -> Result<()> {
        self.mutate("deposit_native", |s, events| {
            s.custody.deposit_native(amount)?;
            events.push(LedgerEvent::NativeDeposited { amount });
            Ok(())
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn ledger_id(&self) -> Address {
        self.ledger_id
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.read(|s| s.core.balance_of(account))
    }

    pub fn allowance_of(&self, owner: &Address, spender: &Address) -> Amount {
        self.read(|s| s.allowances.allowance(owner, spender))
    }

    pub fn total_supply(&self) -> Amount {
        self.read(|s| s.core.total_supply())
    }

    pub fn max_supply(&self) -> Amount {
        self.read(|s| s.core.max_supply())
    }

    /// Tax that a transfer would incur right now, ignoring legality rules.
    pub fn preview_tax(&self, from: &Address, to: &Address, amount: Amount) -> TaxQuote {
        self.read(|s| s.policy.quote(&s.access, from, to, amount))
    }

    pub fn is_sell_allowed(&self, seller: &Address) -> bool {
        self.read(|s| s.access.is_sell_allowed(seller))
    }

    pub fn owner(&self) -> Option<Address> {
        self.read(|s| s.access.owner())
    }

    pub fn tax_receiver(&self) -> Address {
        self.read(|s| s.policy.tax_receiver())
    }

    pub fn tax_rates(&self) -> TaxRates {
        self.read(|s| s.policy.rates())
    }

    pub fn is_whitelisted(&self, account: &Address) -> bool {
        self.read(|s| s.access.is_whitelisted(account))
    }

    /// Enumeration order is not stable across removals.
    pub fn whitelist_addresses(&self) -> Vec<Address> {
        self.read(|s| s.access.whitelist().to_vec())
    }

    pub fn is_excluded_from_tax(&self, account: &Address) -> bool {
        self.read(|s| s.access.is_excluded_from_tax(account))
    }

    pub fn is_pool_address(&self, account: &Address) -> bool {
        self.read(|s| s.access.is_pool(account))
    }

    pub fn pool_addresses(&self) -> Vec<Address> {
        self.read(|s| s.access.pools().to_vec())
    }

    pub fn is_paused(&self) -> bool {
        self.read(|s| s.access.is_paused())
    }

    pub fn is_trading_locked(&self) -> bool {
        self.read(|s| s.access.is_trading_locked())
    }

    pub fn is_mintable(&self) -> bool {
        self.read(|s| s.mintable)
    }

    pub fn name(&self) -> String {
        self.read(|s| s.metadata.name.clone())
    }

    pub fn symbol(&self) -> String {
        self.read(|s| s.metadata.symbol.clone())
    }

    pub fn decimals(&self) -> u8 {
        DECIMALS
    }

    pub fn metadata(&self) -> TokenMetadata {
        self.read(|s| s.metadata.clone())
    }

    pub fn basic_info(&self) -> TokenBasicInfo {
        self.read(|s| TokenBasicInfo {
            logo_url: s.metadata.logo_url.clone(),
            website: s.metadata.website.clone(),
            telegram: s.metadata.telegram.clone(),
            trading_locked: s.access.is_trading_locked(),
            mintable: s.mintable,
        })
    }

    pub fn numbers(&self) -> TokenNumbers {
        self.read(|s| {
            let rates = s.policy.rates();
            TokenNumbers {
                max_supply: s.core.max_supply(),
                total_supply: s.core.total_supply(),
                buy_tax: rates.buy,
                sell_tax: rates.sell,
                wallet_tax: rates.wallet,
            }
        })
    }

    pub fn foreign_custody(&self, asset: &AssetId) -> Amount {
        self.read(|s| s.custody.foreign_balance(asset))
    }

    pub fn native_custody(&self) -> Amount {
        self.read(|s| s.custody.native_balance())
    }

    /// Every credited identity with its balance, sorted by balance descending.
    pub fn accounts(&self) -> Vec<(Address, Amount)> {
        let mut accounts: Vec<(Address, Amount)> =
            self.read(|s| s.core.accounts().map(|(a, b)| (*a, *b)).collect());
        accounts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        accounts
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.log.snapshot()
    }

    pub fn events_from(&self, seq: u64) -> EventCursor {
        self.log.replay_from(seq)
    }

    /// Check the record chain and that replaying its transfers reproduces
    /// the committed balances and supply.
    pub fn verify_audit_trail(&self) -> Result<()> {
        // Hold the read lock so no commit lands between the two snapshots.
        let state = self.state.read();
        let records = self.log.snapshot();
        verify_chain(&records)?;

        let replay = BalanceReplay::from_records(&records)?;
        if replay.total_supply != state.core.total_supply() {
            return Err(LedgerError::Validation(format!(
                "Replayed supply {} differs from ledger supply {}",
                replay.total_supply,
                state.core.total_supply()
            )));
        }
        for (account, balance) in state.core.accounts() {
            if replay.balance_of(account) != *balance {
                return Err(LedgerError::Validation(format!(
                    "Replayed balance of {} differs from ledger",
                    short_hex(account)
                )));
            }
        }
        Ok(())
    }
}

/// Whatever a sink reports is surfaced as an [`LedgerError::EventSink`].
fn into_sink_error(e: LedgerError) -> LedgerError {
    match e {
        LedgerError::EventSink(_) => e,
        other => LedgerError::EventSink(other.to_string()),
    }
}

/// Spend an allowance and record the remaining amount.
fn spend_allowance(
    allowances: &mut AllowanceRegistry,
    owner: &Address,
    spender: &Address,
    amount: Amount,
    events: &mut Vec<LedgerEvent>,
) -> Result<()> {
    allowances.spend(owner, spender, amount)?;
    events.push(LedgerEvent::Approval {
        owner: *owner,
        spender: *spender,
        amount: allowances.allowance(owner, spender),
    });
    Ok(())
}
