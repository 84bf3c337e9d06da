//! Single-writer update queue.
//!
//! Background tasks never touch UI state directly. They submit closures with
//! [`Dispatcher::dispatch`]; the UI loop owns the [`DispatchQueue`] and runs
//! them one at a time, in submission order, between input handling and
//! rendering.

use std::fmt;

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::Result;
use crate::session::ScopeToken;

/// A state mutation executed on the UI thread.
pub type Mutation<S> = Box<dyn FnOnce(&mut S) -> Result<()> + Send + 'static>;

/// Creates a connected dispatcher/queue pair.
pub fn channel<S>() -> (Dispatcher<S>, DispatchQueue<S>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Dispatcher { tx }, DispatchQueue { rx })
}

/// Cloneable submission handle, safe to use from any thread.
pub struct Dispatcher<S> {
    tx: mpsc::UnboundedSender<Mutation<S>>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<S: 'static> Dispatcher<S> {
    /// Enqueues `mutation` without waiting for it to run.
    ///
    /// Returns false if the UI loop has shut down.
    pub fn dispatch<F>(&self, mutation: F) -> bool
    where
        F: FnOnce(&mut S) -> Result<()> + Send + 'static,
    {
        self.tx.send(Box::new(mutation)).is_ok()
    }

    /// Enqueues `mutation` on behalf of a listener running under `scope`.
    ///
    /// Nothing is submitted once the scope is cancelled, and a mutation still
    /// queued when the scope is cancelled is skipped when its turn comes.
    pub fn dispatch_scoped<F>(&self, scope: &ScopeToken, mutation: F) -> bool
    where
        F: FnOnce(&mut S) -> Result<()> + Send + 'static,
    {
        if scope.is_cancelled() {
            return false;
        }
        let scope = scope.clone();
        self.dispatch(move |state| {
            if scope.is_cancelled() {
                trace!("skipping mutation from cancelled scope");
                return Ok(());
            }
            mutation(state)
        })
    }
}

/// UI-side end of the queue.
pub struct DispatchQueue<S> {
    rx: mpsc::UnboundedReceiver<Mutation<S>>,
}

impl<S> DispatchQueue<S> {
    /// Runs every queued mutation against `state`, in order.
    ///
    /// Stops at the first mutation that fails and returns its error.
    pub fn drain(&mut self, state: &mut S) -> Result<usize> {
        let mut ran = 0;
        while let Ok(mutation) = self.rx.try_recv() {
            mutation(state)?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Waits for the next mutation.
    pub async fn recv(&mut self) -> Option<Mutation<S>> {
        self.rx.recv().await
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
