//! Shared access to the dispatcher across connection threads.
//!
//! This module encapsulates the `Arc<Mutex<...>>` locking pattern and poisoning
//! handling so connection handlers never touch the lock directly. Holding the
//! lock for the whole message keeps handling strictly one message at a time.

use std::sync::{Arc, Mutex};

use pagecount_inventory::InventoryBackend;
use pagecount_snmp::CounterFetcher;

use super::dispatcher::Dispatcher;
use super::errors::DispatchError;

/// Cloneable handle to a dispatcher guarded by a mutex.
#[derive(Debug)]
pub struct SharedDispatcher<B, F> {
    inner: Arc<Mutex<Dispatcher<B, F>>>,
}

impl<B, F> Clone for SharedDispatcher<B, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B, F> SharedDispatcher<B, F>
where
    B: InventoryBackend,
    F: CounterFetcher,
{
    /// Wraps `dispatcher` for shared use.
    #[must_use]
    pub fn new(dispatcher: Dispatcher<B, F>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(dispatcher)),
        }
    }

    /// Executes a closure with exclusive access to the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Internal` if the dispatcher lock is poisoned.
    pub fn with_dispatcher<R>(
        &self,
        f: impl FnOnce(&mut Dispatcher<B, F>) -> R,
    ) -> Result<R, DispatchError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| DispatchError::internal("dispatcher lock poisoned"))?;
        Ok(f(&mut guard))
    }
}
