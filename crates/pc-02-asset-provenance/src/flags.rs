//! Audit trail of policy violations.
//!
//! Flags are numbered per collection from a counter record stored under
//! `FLAG_SEQ`. The counter is read and bumped in the same transaction that
//! writes the flag, so concurrent violations in one collection conflict at
//! commit instead of overwriting each other.

use crate::domain::PolicyViolation;
use crate::errors::Result;
use crate::session::Session;
use pc_01_ledger_store::TransactionContext;
use provenance_telemetry::{metric_inc, FLAGS_RAISED};
use shared_types::{CollectionName, Flag, FlagSequence, FLAG_SEQUENCE_KEY};
use tracing::warn;

/// Records `violation` in `collection` and returns the new flag.
pub fn raise<C>(
    session: &Session<'_, C>,
    collection: &CollectionName,
    violation: &PolicyViolation,
) -> Result<Flag>
where
    C: TransactionContext + ?Sized,
{
    let store = session.store();
    let sequence: FlagSequence = store
        .get_private(collection, FLAG_SEQUENCE_KEY)?
        .unwrap_or_default();

    let flag = Flag {
        id: Flag::id_for(sequence.next),
        date: session.timestamp()?.to_rfc3339(),
        message: violation.message(),
    };
    store.put_private(collection, &flag.id, &flag)?;
    store.put_private(
        collection,
        FLAG_SEQUENCE_KEY,
        &FlagSequence {
            next: sequence.next + 1,
        },
    )?;

    metric_inc!(FLAGS_RAISED, &[violation.reason()]);
    warn!(
        flag_id = %flag.id,
        collection = %collection,
        reason = violation.reason(),
        "{}",
        flag.message
    );
    Ok(flag)
}

/// Every flag in `collection`, oldest first.
pub fn list<C>(session: &Session<'_, C>, collection: &CollectionName) -> Result<Vec<Flag>>
where
    C: TransactionContext + ?Sized,
{
    let mut flags: Vec<Flag> = session
        .store()
        .scan_private::<Flag>(collection)?
        .into_iter()
        .map(|(_, flag)| flag)
        .filter(|flag| flag.sequence().is_some())
        .collect();
    flags.sort_by_key(|flag| flag.sequence());
    Ok(flags)
}
