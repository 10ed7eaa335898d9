//! # Identity & Rights Gate
//!
//! Resolves who is calling and what they may do.
//!
//! - Hard failures (`Authorization`, `RightsMissing`) abort the transaction.
//! - Role mismatches, non-authority grants and reserved ids are soft
//!   violations: the caller sees success and a flag is recorded.

use crate::domain::{Checked, GrantRightsRequest, PolicyViolation};
use crate::errors::{ProvenanceError, Result};
use crate::session::Session;
use pc_01_ledger_store::TransactionContext;
use shared_types::{is_reserved_key, CollectionName, OrgId, Rights, Role, RIGHTS_KEY};
use tracing::{debug, info};

/// Private collection of the calling organisation. No I/O.
pub fn resolve_org_collection<C>(session: &Session<'_, C>) -> Result<CollectionName>
where
    C: TransactionContext + ?Sized,
{
    session.own_collection()
}

/// Fails unless the caller's organisation hosts the executing peer.
/// Returns the caller.
pub fn require_same_org_as_peer<C>(session: &Session<'_, C>) -> Result<OrgId>
where
    C: TransactionContext + ?Sized,
{
    let caller = session.ctx().caller_org()?;
    let host = session.ctx().host_org()?;
    if caller != host {
        return Err(ProvenanceError::Authorization { caller, host });
    }
    Ok(caller)
}

/// Reserved record ids can never be created by a request.
pub fn reject_reserved_id(id: &str) -> Checked<()> {
    if is_reserved_key(id) {
        return Err(PolicyViolation::ReservedId { id: id.to_string() }.into());
    }
    Ok(())
}

/// Loads the caller's rights and checks the role.
pub fn require_role<C>(
    session: &Session<'_, C>,
    collection: &CollectionName,
    expected: Role,
    operation: &'static str,
) -> Checked<Rights>
where
    C: TransactionContext + ?Sized,
{
    let rights: Rights = session
        .store()
        .get_private(collection, RIGHTS_KEY)?
        .ok_or_else(|| ProvenanceError::RightsMissing {
            collection: collection.clone(),
        })?;
    if rights.role != expected {
        debug!(held = %rights.role, required = %expected, operation, "Role mismatch");
        return Err(PolicyViolation::Unauthorized { operation }.into());
    }
    Ok(rights)
}

/// Only the issuing authority may grant rights or register recipes.
pub fn require_issuing_authority<C>(
    session: &Session<'_, C>,
    caller: &OrgId,
    operation: &'static str,
) -> Checked<()>
where
    C: TransactionContext + ?Sized,
{
    if *caller != session.config().issuing_authority {
        return Err(PolicyViolation::Unauthorized { operation }.into());
    }
    Ok(())
}

/// Writes a rights record into the target organisation's collection.
pub fn grant_rights<C>(session: &Session<'_, C>, request: &GrantRightsRequest) -> Checked<()>
where
    C: TransactionContext + ?Sized,
{
    let caller = require_same_org_as_peer(session)?;
    require_issuing_authority(session, &caller, "grantRights")?;

    let role = request.role()?;
    let collection = CollectionName::new(request.collection.as_str());
    session
        .store()
        .put_private(&collection, RIGHTS_KEY, &Rights::new(role))?;
    info!(collection = %collection, role = %role, "Rights granted");
    Ok(())
}

pub fn read_rights<C>(session: &Session<'_, C>, collection: &CollectionName) -> Result<Rights>
where
    C: TransactionContext + ?Sized,
{
    session
        .store()
        .get_private(collection, RIGHTS_KEY)?
        .ok_or_else(|| ProvenanceError::RightsMissing {
            collection: collection.clone(),
        })
}
