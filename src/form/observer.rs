use std::sync::atomic::{AtomicU64, Ordering};

static SUBSCRIPTION_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

/// Handle returned by every `subscribe*` call; unique across all forms.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(SUBSCRIPTION_ID_ALLOCATOR.fetch_add(1, Ordering::Relaxed))
    }
}

pub(super) type ObserverFn<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Subscriber list notified in registration order.
pub(super) struct Observers<T> {
    entries: Vec<(SubscriptionId, ObserverFn<T>)>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Observers<T> {
    pub(super) fn subscribe(
        &mut self,
        observer: impl Fn(&T) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId::next();
        let observer: ObserverFn<T> = Box::new(observer);
        self.entries.push((id, observer));
        id
    }

    pub(super) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(super) fn notify(&self, value: &T) {
        for (_, observer) in &self.entries {
            observer(value);
        }
    }
}
