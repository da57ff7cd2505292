//! Append-only event log.
//!
//! Records are hash-chained: each carries the hash of its predecessor and a
//! SHA-256 over its own contents, so an exported log can be checked for
//! gaps or edits with [`verify_chain`]. The log is shared behind an
//! `Arc<RwLock<..>>` and can be replayed lazily from any sequence number.

use crate::crypto::{is_null, Address};
use crate::error::LedgerError;
use crate::policy::TaxCategory;
use crate::Amount;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

pub type RecordHash = [u8; 32];

/// Hash that precedes the first record.
pub const GENESIS_HASH: RecordHash = [0u8; 32];

/// A typed state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// Null `from` is a mint, null `to` is a burn.
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
    WhitelistUpdated {
        account: Address,
        status: bool,
    },
    TaxCollected {
        from: Address,
        to: Address,
        amount: Amount,
        category: TaxCategory,
    },
    Paused {
        account: Address,
    },
    Unpaused {
        account: Address,
    },
    /// Null `new` records a renouncement.
    OwnershipTransferred {
        previous: Address,
        new: Address,
    },
    TaxesUpdated {
        buy: u8,
        sell: u8,
        wallet: u8,
    },
    TradingLockToggled {
        locked: bool,
    },
    MintableToggled {
        mintable: bool,
    },
    TaxExclusionUpdated {
        account: Address,
        excluded: bool,
    },
    PoolAddressSet {
        pool: Address,
    },
    PoolAddressRemoved {
        pool: Address,
    },
    TokenInfoUpdated {
        logo_url: String,
        website: String,
        telegram: String,
    },
    ForeignAssetDeposited {
        asset: Address,
        amount: Amount,
    },
    NativeDeposited {
        amount: Amount,
    },
    ForeignAssetRescued {
        asset: Address,
        to: Address,
        amount: Amount,
    },
    NativeRescued {
        to: Address,
        amount: Amount,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Transfer { .. } => "Transfer",
            LedgerEvent::Approval { .. } => "Approval",
            LedgerEvent::WhitelistUpdated { .. } => "WhitelistUpdated",
            LedgerEvent::TaxCollected { .. } => "TaxCollected",
            LedgerEvent::Paused { .. } => "Paused",
            LedgerEvent::Unpaused { .. } => "Unpaused",
            LedgerEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
            LedgerEvent::TaxesUpdated { .. } => "TaxesUpdated",
            LedgerEvent::TradingLockToggled { .. } => "TradingLockToggled",
            LedgerEvent::MintableToggled { .. } => "MintableToggled",
            LedgerEvent::TaxExclusionUpdated { .. } => "TaxExclusionUpdated",
            LedgerEvent::PoolAddressSet { .. } => "PoolAddressSet",
            LedgerEvent::PoolAddressRemoved { .. } => "PoolAddressRemoved",
            LedgerEvent::TokenInfoUpdated { .. } => "TokenInfoUpdated",
            LedgerEvent::ForeignAssetDeposited { .. } => "ForeignAssetDeposited",
            LedgerEvent::NativeDeposited { .. } => "NativeDeposited",
            LedgerEvent::ForeignAssetRescued { .. } => "ForeignAssetRescued",
            LedgerEvent::NativeRescued { .. } => "NativeRescued",
        }
    }
}

/// One entry of the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub prev_hash: RecordHash,
    pub hash: RecordHash,
    pub event: LedgerEvent,
}

impl EventRecord {
    fn seal(
        seq: u64,
        timestamp: i64,
        prev_hash: RecordHash,
        event: LedgerEvent,
    ) -> Result<Self, LedgerError> {
        let hash = Self::compute_hash(seq, timestamp, &prev_hash, &event)?;
        Ok(EventRecord {
            seq,
            timestamp,
            prev_hash,
            hash,
            event,
        })
    }

    pub fn compute_hash(
        seq: u64,
        timestamp: i64,
        prev_hash: &RecordHash,
        event: &LedgerEvent,
    ) -> Result<RecordHash, LedgerError> {
        let body = serde_json::to_vec(event)?;
        let mut hasher = Sha256::new();
        hasher.update(seq.to_le_bytes());
        hasher.update(timestamp.to_le_bytes());
        hasher.update(prev_hash);
        hasher.update(&body);
        Ok(hasher.finalize().into())
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash)
    }
}

/// Shared handle to the append-only record sequence.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Arc<RwLock<Vec<EventRecord>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Turn a batch of events into chained records that continue the current
    /// log, without appending them. The caller must hold the writer gate so
    /// nothing is committed in between.
    pub(crate) fn seal(&self, events: Vec<LedgerEvent>) -> Result<Vec<EventRecord>, LedgerError> {
        let (mut seq, mut prev_hash) = {
            let records = self.records.read();
            (
                records.len() as u64,
                records.last().map(|r| r.hash).unwrap_or(GENESIS_HASH),
            )
        };
        let timestamp = chrono::Utc::now().timestamp_millis();

        let mut sealed = Vec::with_capacity(events.len());
        for event in events {
            let record = EventRecord::seal(seq, timestamp, prev_hash, event)?;
            prev_hash = record.hash;
            seq += 1;
            sealed.push(record);
        }
        Ok(sealed)
    }

    pub(crate) fn commit(&self, batch: Vec<EventRecord>) {
        self.records.write().extend(batch);
    }

    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.records.read().clone()
    }

    pub fn get(&self, seq: u64) -> Option<EventRecord> {
        self.records.read().get(seq as usize).cloned()
    }

    /// Lazy cursor starting at `seq`. It keeps observing records appended
    /// after it was created.
    pub fn replay_from(&self, seq: u64) -> EventCursor {
        EventCursor {
            log: self.clone(),
            next: seq,
        }
    }
}

/// Iterator over an [`EventLog`], reading one record per step.
#[derive(Debug, Clone)]
pub struct EventCursor {
    log: EventLog,
    next: u64,
}

impl EventCursor {
    pub fn position(&self) -> u64 {
        self.next
    }

    pub fn rewind(&mut self) {
        self.next = 0;
    }
}

impl Iterator for EventCursor {
    type Item = EventRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.log.get(self.next)?;
        self.next += 1;
        Some(record)
    }
}

/// Check sequence numbers, hash links and record hashes.
pub fn verify_chain(records: &[EventRecord]) -> Result<(), LedgerError> {
    let mut prev_hash = GENESIS_HASH;
    for (i, record) in records.iter().enumerate() {
        if record.seq != i as u64 {
            return Err(LedgerError::Validation(format!(
                "Record {} has sequence number {}",
                i, record.seq
            )));
        }
        if record.prev_hash != prev_hash {
            return Err(LedgerError::Validation(format!(
                "Record {} does not link to its predecessor",
                record.seq
            )));
        }
        let expected =
            EventRecord::compute_hash(record.seq, record.timestamp, &record.prev_hash, &record.event)?;
        if expected != record.hash {
            return Err(LedgerError::Validation(format!(
                "Record {} hash mismatch: expected {}, found {}",
                record.seq,
                hex::encode(expected),
                record.hash_str()
            )));
        }
        prev_hash = record.hash;
    }
    Ok(())
}

/// Balances and supply rebuilt from `Transfer` records alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceReplay {
    pub balances: HashMap<Address, Amount>,
    pub total_supply: Amount,
}

impl BalanceReplay {
    pub fn from_records<'a, I>(records: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        let mut replay = BalanceReplay::default();
        for record in records {
            if let LedgerEvent::Transfer { from, to, amount } = &record.event {
                replay.apply(from, to, *amount, record.seq)?;
            }
        }
        Ok(replay)
    }

    fn apply(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
        seq: u64,
    ) -> Result<(), LedgerError> {
        if is_null(from) {
            self.total_supply = self
                .total_supply
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
        } else {
            let balance = self.balances.entry(*from).or_insert(0);
            *balance = balance.checked_sub(amount).ok_or_else(|| {
                LedgerError::Validation(format!("Record {} overdraws its sender", seq))
            })?;
        }

        if is_null(to) {
            self.total_supply = self.total_supply.checked_sub(amount).ok_or_else(|| {
                LedgerError::Validation(format!("Record {} burns more than supply", seq))
            })?;
        } else {
            let balance = self.balances.entry(*to).or_insert(0);
            *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        }
        Ok(())
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{address_from_string, NULL_ADDRESS};

    fn mint(to: Address, amount: Amount) -> LedgerEvent {
        LedgerEvent::Transfer {
            from: NULL_ADDRESS,
            to,
            amount,
        }
    }

    #[test]
    fn test_seal_and_commit_chain() {
        let log = EventLog::new();
        let alice = address_from_string("alice");

        let first = log.seal(vec![mint(alice, 10)]).unwrap();
        log.commit(first);
        let second = log
            .seal(vec![LedgerEvent::Paused { account: alice }, mint(alice, 5)])
            .unwrap();
        assert_eq!(second[0].seq, 1);
        log.commit(second);

        let records = log.snapshot();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].prev_hash, records[0].hash);
        assert!(verify_chain(&records).is_ok());
    }

    #[test]
    fn test_sealed_batch_not_visible_until_commit() {
        let log = EventLog::new();
        let batch = log.seal(vec![mint(address_from_string("a"), 1)]).unwrap();
        assert!(log.is_empty());
        log.commit(batch);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_verify_detects_tampering() {
        let log = EventLog::new();
        let alice = address_from_string("alice");
        let batch = log.seal(vec![mint(alice, 10), mint(alice, 20)]).unwrap();
        log.commit(batch);

        let mut records = log.snapshot();
        records[1].event = mint(alice, 2_000);
        assert!(verify_chain(&records).is_err());

        let mut records = log.snapshot();
        records.remove(0);
        assert!(verify_chain(&records).is_err());
    }

    #[test]
    fn test_cursor_is_lazy_and_restartable() {
        let log = EventLog::new();
        let alice = address_from_string("alice");
        log.commit(log.seal(vec![mint(alice, 1)]).unwrap());

        let mut cursor = log.replay_from(0);
        assert_eq!(cursor.next().map(|r| r.seq), Some(0));
        assert!(cursor.next().is_none());

        log.commit(log.seal(vec![mint(alice, 2)]).unwrap());
        assert_eq!(cursor.next().map(|r| r.seq), Some(1));

        cursor.rewind();
        assert_eq!(cursor.count(), 2);
    }

    #[test]
    fn test_balance_replay() {
        let log = EventLog::new();
        let alice = address_from_string("alice");
        let bob = address_from_string("bob");
        let batch = log
            .seal(vec![
                mint(alice, 100),
                LedgerEvent::Transfer {
                    from: alice,
                    to: bob,
                    amount: 30,
                },
                LedgerEvent::Transfer {
                    from: bob,
                    to: NULL_ADDRESS,
                    amount: 10,
                },
            ])
            .unwrap();
        log.commit(batch);

        let records = log.snapshot();
        let replay = BalanceReplay::from_records(&records).unwrap();
        assert_eq!(replay.balance_of(&alice), 70);
        assert_eq!(replay.balance_of(&bob), 20);
        assert_eq!(replay.total_supply, 90);
    }

    #[test]
    fn test_event_json_keeps_wide_amounts() {
        let event = mint(address_from_string("whale"), Amount::MAX);
        let json = serde_json::to_string(&event).unwrap();
        let parsed: LedgerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
