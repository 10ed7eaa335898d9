//! # Deferred Deletion Queue
//!
//! Claimed shipment ids wait in a single shared record (`DEL`) until the
//! next mutating transaction drains it. The drain deletes each queued id from
//! the draining organisation's own collection, then resets the list. Only
//! the first drainer after a claim does any deleting.

use crate::errors::Result;
use crate::session::Session;
use pc_01_ledger_store::TransactionContext;
use provenance_telemetry::{metric_add, DELETION_QUEUE_DRAINED};
use shared_types::{DeletionQueue, DELETION_QUEUE_KEY};
use tracing::{debug, info};

/// Appends `shipment_id`, creating the queue if absent.
pub fn enqueue<C>(session: &Session<'_, C>, shipment_id: &str) -> Result<()>
where
    C: TransactionContext + ?Sized,
{
    let shared = session.shared_collection();
    let mut queue = read(session)?.unwrap_or_default();
    queue.pending.push(shipment_id.to_string());
    session
        .store()
        .put_private(shared, DELETION_QUEUE_KEY, &queue)?;
    debug!(shipment_id, pending = queue.pending.len(), "Queued for deletion");
    Ok(())
}

/// Processes and empties the backlog. Returns how many ids were drained.
pub fn drain_and_reset<C>(session: &Session<'_, C>) -> Result<usize>
where
    C: TransactionContext + ?Sized,
{
    let queue = match read(session)? {
        Some(queue) if !queue.pending.is_empty() => queue,
        _ => return Ok(0),
    };

    let own = session.own_collection()?;
    let store = session.store();
    for id in &queue.pending {
        debug!(shipment_id = %id, collection = %own, "Delete");
        store.delete_private(&own, id)?;
    }
    store.put_private(
        session.shared_collection(),
        DELETION_QUEUE_KEY,
        &DeletionQueue::default(),
    )?;

    let drained = queue.pending.len();
    metric_add!(DELETION_QUEUE_DRAINED, drained as f64);
    info!(drained, collection = %own, "Deletion queue drained");
    Ok(drained)
}

pub fn read<C>(session: &Session<'_, C>) -> Result<Option<DeletionQueue>>
where
    C: TransactionContext + ?Sized,
{
    Ok(session
        .store()
        .get_private(session.shared_collection(), DELETION_QUEUE_KEY)?)
}
