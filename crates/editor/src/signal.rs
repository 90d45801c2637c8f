use std::fmt;

/// Handle returned by [`Signal::add`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u64);

type Subscriber<T> = Box<dyn FnMut(&T) + Send>;

/// Minimal synchronous publish/subscribe list.
///
/// Subscribers run on the dispatching thread, in registration order.
pub struct Signal<T> {
    next_slot: u64,
    subscribers: Vec<(SlotId, Subscriber<T>)>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            next_slot: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn add(&mut self, subscriber: impl FnMut(&T) + Send + 'static) -> SlotId {
        let slot = SlotId(self.next_slot);
        self.next_slot += 1;
        self.subscribers.push((slot, Box::new(subscriber)));
        slot
    }

    /// Unsubscribe. Returns false if the slot was already gone.
    pub fn remove(&mut self, slot: SlotId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != slot);
        self.subscribers.len() != before
    }

    pub fn dispatch(&mut self, value: &T) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(value);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
