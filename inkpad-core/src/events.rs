//! # Events
//!
//! A minimal typed publish/subscribe channel. Listeners are called synchronously, in subscription order,
//! and stay registered until their [`Subscription`] is handed back.

/// Handle to a registered listener. Pass it to [`EventDispatcher::unsubscribe`] to stop listening.
#[must_use = "dropping a subscription leaves the listener registered forever"]
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

pub struct EventDispatcher<E> {
    next_id: u64,
    listeners: Vec<(u64, Box<dyn FnMut(&E)>)>,
}
impl<E> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }
}
impl<E> EventDispatcher<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        Subscription(id)
    }
    /// Remove the listener. Returns false if it was already removed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != subscription.0);
        before != self.listeners.len()
    }
    pub fn dispatch(&mut self, event: &E) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
impl<E> std::fmt::Debug for EventDispatcher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
