//! Observable value cell with synchronous subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tokio::sync::watch;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

/// A value that is replaced wholesale and observed by subscribers.
///
/// Readers get an `Arc<T>` of one whole value; a replacement swaps the
/// pointer, so a reader never sees half of an update. In-place edits go
/// through [`modify_silently`](Self::modify_silently), which copies on write
/// if any reader still holds the old value.
///
/// Publications are serialized: each one reads the value, updates the watch
/// channel and runs every callback before the next starts, so subscribers
/// always end on the value `get()` returns.
pub struct Observable<T> {
    value: RwLock<Arc<T>>,
    listeners: Arc<Mutex<Listeners<T>>>,
    tx: watch::Sender<Arc<T>>,
    // Reentrant so a callback may publish on the same cell
    publishing: ReentrantMutex<()>,
    publications: AtomicU64,
}

impl<T: Send + Sync + 'static> Observable<T> {
    /// Create an observable holding `initial`. Nothing is published yet.
    pub fn new(initial: T) -> Self {
        let initial = Arc::new(initial);
        let (tx, _) = watch::channel(initial.clone());
        Self {
            value: RwLock::new(initial),
            listeners: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
            tx,
            publishing: ReentrantMutex::new(()),
            publications: AtomicU64::new(0),
        }
    }

    /// The current value.
    pub fn get(&self) -> Arc<T> {
        self.value.read().clone()
    }

    /// Replace the value and publish it.
    pub fn replace(&self, value: T) {
        self.set_silently(value);
        self.publish();
    }

    /// Replace the value without notifying anyone.
    pub(crate) fn set_silently(&self, value: T) {
        *self.value.write() = Arc::new(value);
    }

    /// Edit the current value without notifying anyone.
    ///
    /// Call [`publish`](Self::publish) once the edits are complete.
    pub fn modify_silently<R>(&self, f: impl FnOnce(&mut T) -> R) -> R
    where
        T: Clone,
    {
        let mut guard = self.value.write();
        f(Arc::make_mut(&mut guard))
    }

    /// Notify every subscriber with the current value.
    ///
    /// Callbacks run synchronously on the calling task, outside the value
    /// and listener locks.
    pub fn publish(&self) {
        let _publishing = self.publishing.lock();
        let current = self.get();
        self.publications.fetch_add(1, Ordering::Relaxed);
        self.tx.send_replace(current.clone());

        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&current);
        }
    }

    /// Register `callback`, invoke it with the current value, and keep
    /// invoking it on every publication until the returned handle is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let callback: Listener<T> = Arc::new(callback);
        let id = {
            let mut listeners = self.listeners.lock();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, callback.clone()));
            id
        };

        callback(&self.get());

        let weak: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.listeners);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    listeners.lock().entries.retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// A receiver that observes each publication, for async consumers.
    ///
    /// The receiver starts at the last published value.
    pub fn watch(&self) -> watch::Receiver<Arc<T>> {
        self.tx.subscribe()
    }

    /// Number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }

    /// Number of publications so far.
    pub fn publications(&self) -> u64 {
        self.publications.load(Ordering::Relaxed)
    }
}

impl<T> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("subscribers", &self.listeners.lock().entries.len())
            .field("publications", &self.publications.load(Ordering::Relaxed))
            .finish()
    }
}

/// Deregistration handle returned by `subscribe`.
///
/// Dropping the handle (or calling [`unsubscribe`](Self::unsubscribe))
/// removes the callback. Use [`forget`](Self::forget) to keep the callback
/// for the lifetime of the store.
#[must_use = "dropping a Subscription removes the callback"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the callback now.
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }

    /// Keep the callback registered for as long as the store lives.
    pub fn forget(mut self) {
        self.remove = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}
