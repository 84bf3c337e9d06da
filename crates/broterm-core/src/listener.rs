//! Background listener loop bound to a screen scope.
//!
//! A listener owns one subscription and waits on two arms: scope cancellation
//! (exit) or the next event (handle it). The scope is re-checked after every
//! wake-up so a cancelled screen never starts another repaint, and the
//! subscription is released on exit whichever arm ended the loop.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::feed::{FeedHub, Subscription, SubscriptionId};
use crate::session::{ScopeToken, SessionScope};

/// What the listener does after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerStep {
    Continue,
    Stop,
}

/// One subscription plus the scope that bounds it.
#[derive(Debug)]
pub struct Listener<T> {
    hub: FeedHub<T>,
    subscription: Subscription<T>,
    scope: ScopeToken,
}

impl<T: Clone + Send + 'static> Listener<T> {
    /// Subscribes to `topic` under `scope`.
    pub fn subscribe(hub: &FeedHub<T>, topic: &str, scope: ScopeToken) -> Self {
        Self {
            hub: hub.clone(),
            subscription: hub.subscribe(topic),
            scope,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.subscription.id()
    }

    /// Runs the loop on the tokio runtime.
    pub fn spawn<F, Fut>(self, on_event: F) -> JoinHandle<()>
    where
        F: FnMut(T, ScopeToken) -> Fut + Send + 'static,
        Fut: Future<Output = ListenerStep> + Send + 'static,
    {
        tokio::spawn(self.run(on_event))
    }

    pub async fn run<F, Fut>(self, mut on_event: F)
    where
        F: FnMut(T, ScopeToken) -> Fut,
        Fut: Future<Output = ListenerStep>,
    {
        let Self {
            hub,
            mut subscription,
            scope,
        } = self;
        let id = subscription.id();
        debug!(%id, topic = subscription.topic(), "listener started");

        loop {
            if scope.is_cancelled() {
                break;
            }
            let event = tokio::select! {
                biased;
                () = scope.cancelled() => break,
                event = subscription.recv() => event,
            };
            let Some(event) = event else {
                break;
            };
            if scope.is_cancelled() {
                break;
            }
            if on_event(event, scope.clone()).await == ListenerStep::Stop {
                break;
            }
        }

        hub.unsubscribe(id);
        debug!(%id, "listener stopped");
    }
}

/// Scope and subscriptions owned by one screen activation.
///
/// Begun in `on_show`, ended in `on_hide`. Ending cancels the scope and
/// unsubscribes synchronously, so no event published afterwards reaches a
/// listener even if its task has not observed the cancellation yet.
#[derive(Debug)]
pub struct Activation<T> {
    scope: ScopeToken,
    hub: FeedHub<T>,
    subscriptions: Vec<SubscriptionId>,
}

impl<T: Clone + Send + 'static> Activation<T> {
    pub fn begin(session: &SessionScope, hub: &FeedHub<T>) -> Self {
        Self {
            scope: session.derive_scope(),
            hub: hub.clone(),
            subscriptions: Vec::new(),
        }
    }

    pub fn scope(&self) -> &ScopeToken {
        &self.scope
    }

    pub fn is_live(&self) -> bool {
        !self.scope.is_cancelled()
    }

    /// Subscribes to `topic` and spawns its listener under this scope.
    pub fn listen<F, Fut>(&mut self, topic: &str, on_event: F) -> JoinHandle<()>
    where
        F: FnMut(T, ScopeToken) -> Fut + Send + 'static,
        Fut: Future<Output = ListenerStep> + Send + 'static,
    {
        let listener = Listener::subscribe(&self.hub, topic, self.scope.clone());
        self.subscriptions.push(listener.id());
        listener.spawn(on_event)
    }

    pub fn end(&mut self) {
        self.scope.cancel();
        for id in self.subscriptions.drain(..) {
            self.hub.unsubscribe(id);
        }
    }
}
