//! EventBus: synchronous topic subscriptions plus a broadcast stream

use crate::graph::Note;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::broadcast;

/// Capacity of the broadcast stream handed to async listeners
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// What happened to a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Content of a known note changed
    Change,
    /// A note entered the registry
    Create,
    /// A note left the registry
    Delete,
    /// Adjacency may have changed; follows every Change, Create and Delete
    TreeChange,
    /// The editor's active note changed
    ActiveChange,
    /// The editor opened a note
    Open,
    /// The editor closed a note
    Close,
}

impl Topic {
    /// Raw registry mutations, the topics that trigger `TreeChange`
    pub fn is_mutation(self) -> bool {
        matches!(self, Self::Change | Self::Create | Self::Delete)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Change => "change",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::TreeChange => "tree_change",
            Self::ActiveChange => "active_change",
            Self::Open => "open",
            Self::Close => "close",
        };
        f.pad(name)
    }
}

/// An event as seen by broadcast listeners
#[derive(Debug, Clone, Serialize)]
pub struct NoteEvent {
    pub topic: Topic,
    pub note: Note,
}

type Handler = Arc<dyn Fn(&Note) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    /// Keyed by subscription id, which increases with subscription order
    handlers: BTreeMap<u64, (Topic, Handler)>,
}

fn lock(subscribers: &Mutex<Subscribers>) -> MutexGuard<'_, Subscribers> {
    subscribers.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publish/subscribe hub for note events
///
/// Cloning yields another handle to the same bus. Handlers run on the
/// thread that fires the event, in subscription order. No lock is held
/// while a handler runs, so handlers may subscribe, cancel or fire.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Subscribers>>,
    stream: broadcast::Sender<NoteEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (stream, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            subscribers: Arc::new(Mutex::new(Subscribers::default())),
            stream,
        }
    }

    /// Call `handler` for every event on `topic` until the returned
    /// subscription is cancelled or dropped.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn(&Note) + Send + Sync + 'static,
    {
        let mut subscribers = lock(&self.subscribers);
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.handlers.insert(id, (topic, Arc::new(handler)));
        Subscription {
            id,
            bus: Arc::downgrade(&self.subscribers),
        }
    }

    pub fn on_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Note) + Send + Sync + 'static,
    {
        self.subscribe(Topic::Change, handler)
    }

    pub fn on_create<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Note) + Send + Sync + 'static,
    {
        self.subscribe(Topic::Create, handler)
    }

    pub fn on_delete<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Note) + Send + Sync + 'static,
    {
        self.subscribe(Topic::Delete, handler)
    }

    pub fn on_tree_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Note) + Send + Sync + 'static,
    {
        self.subscribe(Topic::TreeChange, handler)
    }

    /// Receive every event, as owned values, on an async channel.
    ///
    /// A listener that falls more than [`EVENT_CHANNEL_CAPACITY`] events
    /// behind sees `RecvError::Lagged`.
    pub fn listen(&self) -> broadcast::Receiver<NoteEvent> {
        self.stream.subscribe()
    }

    /// Deliver `note` on `topic`, then on `TreeChange` if `topic` is a
    /// mutation.
    pub fn fire(&self, topic: Topic, note: &Note) {
        self.deliver(topic, note);
        if topic.is_mutation() {
            self.deliver(Topic::TreeChange, note);
        }
    }

    fn deliver(&self, topic: Topic, note: &Note) {
        let handlers: Vec<Handler> = lock(&self.subscribers)
            .handlers
            .values()
            .filter(|(t, _)| *t == topic)
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        tracing::trace!(%topic, note = %note.id, handlers = handlers.len(), "firing event");
        for handler in handlers {
            handler(note);
        }

        // No listeners is fine
        let _ = self.stream.send(NoteEvent {
            topic,
            note: note.clone(),
        });
    }

    /// Number of live subscriptions across all topics
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).handlers.len()
    }
}

/// Handle to a subscription; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    bus: Weak<Mutex<Subscribers>>,
}

impl Subscription {
    /// Stop receiving events
    pub fn cancel(self) {}

    /// Keep the handler registered for the lifetime of the bus
    pub fn detach(mut self) {
        self.bus = Weak::new();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.bus.upgrade() {
            // Release the lock before the handler's captures are dropped
            let removed = lock(&subscribers).handlers.remove(&self.id);
            drop(removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NoteId;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn note(id: &str) -> Note {
        Note::new(NoteId::from(id), Utc::now())
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&Note) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |tag: &str| -> Box<dyn Fn(&Note) + Send + Sync> {
            let sink = Arc::clone(&sink);
            let tag = tag.to_string();
            Box::new(move |n: &Note| sink.lock().unwrap().push(format!("{}:{}", tag, n.id)))
        };
        (log, make)
    }

    #[test]
    fn mutation_is_followed_by_tree_change() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let _a = bus.on_change(make("change"));
        let _b = bus.on_tree_change(make("tree"));

        bus.fire(Topic::Change, &note("1"));
        assert_eq!(*log.lock().unwrap(), vec!["change:1", "tree:1"]);
    }

    #[test]
    fn lifecycle_topics_do_not_trigger_tree_change() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let _t = bus.on_tree_change(make("tree"));
        let _o = bus.subscribe(Topic::Open, make("open"));

        bus.fire(Topic::Open, &note("1"));
        bus.fire(Topic::ActiveChange, &note("1"));
        assert_eq!(*log.lock().unwrap(), vec!["open:1"]);
    }

    #[test]
    fn delivery_follows_subscription_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let _first = bus.on_create(make("first"));
        let _second = bus.on_create(make("second"));
        let _third = bus.on_create(make("third"));

        bus.fire(Topic::Create, &note("n"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:n", "second:n", "third:n"]
        );
    }

    #[test]
    fn cancel_and_drop_unsubscribe() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        let sub = bus.on_delete(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.fire(Topic::Delete, &note("1"));
        sub.cancel();
        bus.fire(Topic::Delete, &note("1"));

        {
            let c = Arc::clone(&count);
            let _scoped = bus.on_delete(move |_| {
                c.fetch_add(10, Ordering::SeqCst);
            });
        }
        bus.fire(Topic::Delete, &note("1"));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn detached_subscription_stays_registered() {
        let bus = EventBus::new();
        bus.on_change(|_| {}).detach();
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn handlers_may_subscribe_during_delivery() {
        let bus = EventBus::new();
        let inner = bus.clone();
        let late: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));
        let keep = Arc::clone(&late);

        let _sub = bus.on_create(move |_| {
            let sub = inner.on_create(|_| {});
            keep.lock().unwrap().push(sub);
        });

        bus.fire(Topic::Create, &note("1"));
        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(late.lock().unwrap().len(), 1);
    }

    #[test]
    fn subscription_outliving_the_bus_is_harmless() {
        let sub = {
            let bus = EventBus::new();
            bus.on_change(|_| {})
        };
        drop(sub);
    }

    #[test]
    fn listeners_receive_owned_events() {
        let bus = EventBus::new();
        let mut rx = bus.listen();
        bus.fire(Topic::Create, &note("7"));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.topic, Topic::Create);
        assert_eq!(first.note.id.as_str(), "7");
        assert_eq!(rx.try_recv().unwrap().topic, Topic::TreeChange);
    }
}
