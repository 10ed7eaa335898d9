//! In-memory ledger substrate for tests and local development.
//!
//! Models the parts of a permissioned ledger the contracts depend on:
//! public state, private collections with member sets, per-transaction
//! staging with read-your-writes, and optimistic validation of the read
//! set at commit.

use crate::domain::{commitment, Hash, StoreError};
use crate::ports::{CallerIdentity, KeyValue, LedgerState, ScanIterator, TransactionContext};
use chrono::{DateTime, Utc};
use shared_types::{CollectionName, OrgId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::{Bound, RangeBounds};
use std::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Clone)]
struct Versioned {
    value: Vec<u8>,
    version: u64,
}

#[derive(Debug, Default)]
struct CollectionState {
    members: BTreeSet<OrgId>,
    data: BTreeMap<String, Versioned>,
}

#[derive(Debug, Default)]
struct WorldState {
    public: BTreeMap<String, Versioned>,
    collections: HashMap<CollectionName, CollectionState>,
    height: u64,
}

impl WorldState {
    fn partition(&self, slot: &Slot) -> Result<&BTreeMap<String, Versioned>, StoreError> {
        match slot {
            Slot::Public => Ok(&self.public),
            Slot::Private(name) => self
                .collections
                .get(name)
                .map(|c| &c.data)
                .ok_or_else(|| StoreError::UnknownCollection(name.clone())),
        }
    }

    fn version_of(&self, slot: &Slot, key: &str) -> Option<u64> {
        self.partition(slot)
            .ok()
            .and_then(|data| data.get(key))
            .map(|v| v.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Slot {
    Public,
    Private(CollectionName),
}

impl Slot {
    fn describe(&self, key: &str) -> String {
        match self {
            Slot::Public => format!("public/{}", key.replace('\u{0}', "/")),
            Slot::Private(name) => format!("{}/{}", name, key.replace('\u{0}', "/")),
        }
    }
}

/// In-memory world state shared by all transactions opened on it.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<WorldState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// One private collection per organisation (`<org><suffix>`) plus a
    /// shared collection that every organisation belongs to.
    pub fn for_organisations(orgs: &[OrgId], suffix: &str, shared: &CollectionName) -> Self {
        let ledger = Self::new();
        for org in orgs {
            ledger.define_collection(org.private_collection(suffix), [org.clone()]);
        }
        ledger.define_collection(shared.clone(), orgs.iter().cloned());
        ledger
    }

    /// Declares a collection, replacing the member set if it already exists.
    pub fn define_collection(
        &self,
        name: CollectionName,
        members: impl IntoIterator<Item = OrgId>,
    ) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let entry = state.collections.entry(name).or_default();
        entry.members = members.into_iter().collect();
    }

    /// Number of transactions committed so far.
    pub fn height(&self) -> Result<u64, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.height)
    }

    /// Opens a transaction submitted by `caller`. The executing peer
    /// defaults to the caller's own organisation.
    pub fn begin(&self, caller: OrgId) -> TransactionBuilder<'_> {
        TransactionBuilder {
            ledger: self,
            host: caller.clone(),
            caller,
            timestamp: None,
            transient: HashMap::new(),
        }
    }
}

/// Builder for the per-transaction inputs of an [`InMemoryTransaction`].
pub struct TransactionBuilder<'a> {
    ledger: &'a InMemoryLedger,
    caller: OrgId,
    host: OrgId,
    timestamp: Option<DateTime<Utc>>,
    transient: HashMap<String, Vec<u8>>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn host(mut self, host: OrgId) -> Self {
        self.host = host;
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn transient(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.transient.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> InMemoryTransaction<'a> {
        InMemoryTransaction {
            ledger: self.ledger,
            tx_id: uuid::Uuid::new_v4().to_string(),
            caller: self.caller,
            host: self.host,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            transient: self.transient,
            rw_set: Mutex::new(ReadWriteSet::default()),
        }
    }
}

#[derive(Debug, Default)]
struct ReadWriteSet {
    /// First observed version per key; `None` means observed absent.
    reads: BTreeMap<(Slot, String), Option<u64>>,
    /// Staged values; `None` is a staged delete.
    writes: BTreeMap<(Slot, String), Option<Vec<u8>>>,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub tx_id: String,
    pub height: u64,
    pub writes: usize,
}

/// One transaction against an [`InMemoryLedger`]. Dropping it without
/// calling [`commit`](Self::commit) discards every staged write.
pub struct InMemoryTransaction<'a> {
    ledger: &'a InMemoryLedger,
    tx_id: String,
    caller: OrgId,
    host: OrgId,
    timestamp: DateTime<Utc>,
    transient: HashMap<String, Vec<u8>>,
    rw_set: Mutex<ReadWriteSet>,
}

impl InMemoryTransaction<'_> {
    /// Validates the read set against current state and applies all staged
    /// writes atomically.
    pub fn commit(self) -> Result<CommitReceipt, StoreError> {
        let rw_set = self
            .rw_set
            .into_inner()
            .map_err(|_| StoreError::LockPoisoned)?;
        let mut state = self
            .ledger
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;

        for ((slot, key), observed) in &rw_set.reads {
            if state.version_of(slot, key) != *observed {
                debug!(tx_id = %self.tx_id, key = %slot.describe(key), "Read set invalidated");
                return Err(StoreError::MvccConflict {
                    key: slot.describe(key),
                });
            }
        }

        for (slot, _) in rw_set.writes.keys() {
            state.partition(slot)?;
        }

        let height = state.height + 1;
        let writes = rw_set.writes.len();
        for ((slot, key), value) in rw_set.writes {
            let data = match &slot {
                Slot::Public => &mut state.public,
                Slot::Private(name) => match state.collections.get_mut(name) {
                    Some(collection) => &mut collection.data,
                    None => return Err(StoreError::UnknownCollection(name.clone())),
                },
            };
            match value {
                Some(value) => {
                    data.insert(
                        key,
                        Versioned {
                            value,
                            version: height,
                        },
                    );
                }
                None => {
                    data.remove(&key);
                }
            }
        }
        state.height = height;

        debug!(tx_id = %self.tx_id, height, writes, "Transaction committed");
        Ok(CommitReceipt {
            tx_id: self.tx_id,
            height,
            writes,
        })
    }

    fn check_known(&self, collection: &CollectionName) -> Result<(), StoreError> {
        let state = self.ledger.state.read().map_err(|_| StoreError::LockPoisoned)?;
        if state.collections.contains_key(collection) {
            Ok(())
        } else {
            Err(StoreError::UnknownCollection(collection.clone()))
        }
    }

    fn check_member(&self, collection: &CollectionName) -> Result<(), StoreError> {
        let state = self.ledger.state.read().map_err(|_| StoreError::LockPoisoned)?;
        let entry = state
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.clone()))?;
        if entry.members.contains(&self.host) {
            Ok(())
        } else {
            Err(StoreError::AccessDenied {
                org: self.host.clone(),
                collection: collection.clone(),
            })
        }
    }

    fn read(&self, slot: Slot, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut rw_set = self.rw_set.lock().map_err(|_| StoreError::LockPoisoned)?;
        let slot_key = (slot, key.to_string());
        if let Some(staged) = rw_set.writes.get(&slot_key) {
            return Ok(staged.clone());
        }

        let state = self.ledger.state.read().map_err(|_| StoreError::LockPoisoned)?;
        let current = state.partition(&slot_key.0)?.get(key).cloned();
        rw_set
            .reads
            .entry(slot_key)
            .or_insert(current.as_ref().map(|v| v.version));
        Ok(current.map(|v| v.value))
    }

    fn stage(&self, slot: Slot, key: &str, value: Option<Vec<u8>>) -> Result<(), StoreError> {
        let mut rw_set = self.rw_set.lock().map_err(|_| StoreError::LockPoisoned)?;
        rw_set.writes.insert((slot, key.to_string()), value);
        Ok(())
    }

    fn scan(&self, slot: Slot, start: &str, end: &str) -> Result<ScanIterator<'_>, StoreError> {
        if !start.is_empty() && !end.is_empty() && start > end {
            return Ok(ScanIterator::empty());
        }
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start.to_string())
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end.to_string())
        };
        let range = (lower, upper);

        let mut rw_set = self.rw_set.lock().map_err(|_| StoreError::LockPoisoned)?;
        let state = self.ledger.state.read().map_err(|_| StoreError::LockPoisoned)?;

        let mut merged: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for (key, versioned) in state.partition(&slot)?.range::<String, _>(range.clone()) {
            rw_set
                .reads
                .entry((slot.clone(), key.clone()))
                .or_insert(Some(versioned.version));
            merged.insert(key.clone(), versioned.value.clone());
        }
        for ((staged_slot, key), value) in &rw_set.writes {
            if *staged_slot != slot || !range.contains(key) {
                continue;
            }
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(ScanIterator::new(
            merged
                .into_iter()
                .map(|(key, value)| Ok(KeyValue { key, value })),
        ))
    }
}

impl LedgerState for InMemoryTransaction<'_> {
    fn get_public(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.read(Slot::Public, key)
    }

    fn put_public(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.stage(Slot::Public, key, Some(value))
    }

    fn scan_public(&self, start: &str, end: &str) -> Result<ScanIterator<'_>, StoreError> {
        self.scan(Slot::Public, start, end)
    }

    fn get_private(
        &self,
        collection: &CollectionName,
        key: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_member(collection)?;
        self.read(Slot::Private(collection.clone()), key)
    }

    fn put_private(
        &self,
        collection: &CollectionName,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), StoreError> {
        self.check_known(collection)?;
        self.stage(Slot::Private(collection.clone()), key, Some(value))
    }

    fn delete_private(&self, collection: &CollectionName, key: &str) -> Result<(), StoreError> {
        self.check_known(collection)?;
        self.stage(Slot::Private(collection.clone()), key, None)
    }

    fn scan_private(
        &self,
        collection: &CollectionName,
        start: &str,
        end: &str,
    ) -> Result<ScanIterator<'_>, StoreError> {
        self.check_member(collection)?;
        self.scan(Slot::Private(collection.clone()), start, end)
    }

    fn private_hash(
        &self,
        collection: &CollectionName,
        key: &str,
    ) -> Result<Option<Hash>, StoreError> {
        self.check_known(collection)?;
        let value = self.read(Slot::Private(collection.clone()), key)?;
        Ok(value.map(|bytes| commitment(&bytes)))
    }
}

impl CallerIdentity for InMemoryTransaction<'_> {
    fn caller_org(&self) -> Result<OrgId, StoreError> {
        Ok(self.caller.clone())
    }

    fn host_org(&self) -> Result<OrgId, StoreError> {
        Ok(self.host.clone())
    }
}

impl TransactionContext for InMemoryTransaction<'_> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn tx_timestamp(&self) -> Result<DateTime<Utc>, StoreError> {
        Ok(self.timestamp)
    }

    fn transient(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.transient.get(key).cloned())
    }
}
