use std::any::{Any, TypeId};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

/// Session-wide event bus
///
/// Handlers run synchronously inside [`EventBus::publish`], in subscription
/// order, so a dispatch cycle has delivered all of its events by the time it
/// returns.
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Implement [`Event`] for plain data types
#[macro_export]
macro_rules! impl_event {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::events::Event for $t {
                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }
            }
        )*
    }
}

/// Events raised by the control layer
pub mod events {
    use crate::controls::{ControlId, ControlValue};

    /// A control accepted a new value
    #[derive(Debug, Clone)]
    pub struct ControlChanged {
        pub value: ControlValue,
    }

    /// A control rejected a value; the stored value is unchanged
    #[derive(Debug, Clone)]
    pub struct ControlRejected {
        pub control: ControlId,
        pub reason: String,
    }

    impl_event!(ControlChanged, ControlRejected);
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_insert_with(Vec::new).push(handler);
    }

    /// Subscribe a closure that receives the concrete event type
    pub fn subscribe_fn<E, F>(&self, mut f: F)
    where
        E: Event,
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.subscribe::<E>(handler_from_fn(move |event| {
            if let Some(event) = event.as_any().downcast_ref::<E>() {
                f(event);
            }
        }));
    }

    /// Publish an event
    ///
    /// The handler list for `E` is taken out of the map while it runs, so a
    /// handler may publish or subscribe on this bus without deadlocking. A
    /// nested publish of `E` itself reaches only handlers subscribed during
    /// the outer call.
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = TypeId::of::<E>();
        let Some(mut running) = self.handlers.lock().remove(&type_id) else {
            return;
        };

        for handler in running.iter_mut() {
            handler.handle(&event);
        }

        let mut handlers = self.handlers.lock();
        if let Some(added) = handlers.remove(&type_id) {
            running.extend(added);
        }
        handlers.insert(type_id, running);
    }

    /// Number of handlers subscribed to `E`
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.handlers
            .lock()
            .get(&TypeId::of::<E>())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Drop every handler
    pub fn clear(&self) {
        self.handlers.lock().clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}
