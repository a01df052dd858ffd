//! Sequential bulk runner shared by every bulk incident action.
//!
//! Contract:
//!
//! - The bulk slot is claimed before the first remote call; a second
//!   batch is rejected while one is running.
//! - Incidents are processed strictly one at a time, in caller order.
//! - The first failure stops the batch. Later incidents are never
//!   issued, the partial results are dropped, and the caller gets a
//!   [`BulkFailure`] naming the failing incident.
//! - The slot leaves `Running` on every exit path, including the future
//!   being dropped.

use std::future::Future;

use crate::domain::{BulkOperation, DomainStore, IncidentPk};
use crate::error::{ActionError, BulkFailure, ClientError};

/// Runs `step` for each pk in order under one bulk batch.
///
/// `step` performs the remote call and any per-item store transition for
/// one incident. Returns one result per pk, in input order.
///
/// # Errors
///
/// Returns [`ActionError::BulkInProgress`] if another batch holds the
/// slot, or [`ActionError::Bulk`] wrapping the first per-item failure.
pub(crate) async fn run_sequential<T, F, Fut>(
    store: &DomainStore,
    operation: BulkOperation,
    pks: &[IncidentPk],
    mut step: F,
) -> Result<Vec<T>, ActionError>
where
    F: FnMut(IncidentPk) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut guard = store.begin_bulk(operation, pks.len())?;
    let mut results = Vec::with_capacity(pks.len());

    for &pk in pks {
        match step(pk).await {
            Ok(result) => {
                results.push(result);
                guard.record_success();
            }
            Err(source) => {
                let failure = BulkFailure {
                    batch_id: guard.batch_id(),
                    operation,
                    failed_pk: pk,
                    completed: guard.completed(),
                    source,
                };
                tracing::warn!(
                    batch_id = %failure.batch_id,
                    %operation,
                    failed_pk = %pk,
                    completed = failure.completed,
                    err = %failure.source,
                    "bulk batch aborted"
                );
                guard.fail(pk);
                return Err(ActionError::Bulk(Box::new(failure)));
            }
        }
    }

    guard.succeed();
    Ok(results)
}
