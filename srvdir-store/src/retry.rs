//! Optimistic concurrency loop for conditional backend writes.

use tracing::{debug, warn};

use crate::StoreError;

/// Runs `attempt` until it succeeds or fails with something other than a
/// revision conflict.
///
/// Each attempt must re-read the state it depends on, since a conflict
/// means that state changed under it. With `limit` set, a conflict on the
/// attempt after `limit` retries is returned to the caller.
///
/// # Errors
///
/// Returns the first non-conflict error from `attempt`, or the conflict
/// once the retry limit is exhausted.
pub fn retry_on_conflict<T, F>(
    operation: &'static str,
    limit: Option<u32>,
    mut attempt: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Result<T, StoreError>,
{
    let mut retries: u32 = 0;
    loop {
        match attempt() {
            Err(err) if err.is_conflict() => {
                if limit.is_some_and(|max| retries >= max) {
                    warn!(operation, retries, %err, "giving up after repeated conflicts");
                    return Err(err);
                }
                retries += 1;
                debug!(operation, retries, %err, "conflict, retrying");
            }
            result => return result,
        }
    }
}
