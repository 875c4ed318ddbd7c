//! Typed notifications raised while a tick executes.

use log::trace;

/// Signals emitted by the simulation core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// An entity turned infected. Carries the entity's name.
    EntityInfected { name: String },
    /// A one-shot source entity spent its transmission and must leave the population.
    RemoveTransientEntity { id: u32 },
    /// The infected counter reached the outbreak threshold.
    SimulationComplete,
}

type Listener = Box<dyn FnMut(&SimEvent)>;

/// Observer list with a pending queue.
///
/// Events are queued by `emit` while entities are being mutated and handed to the
/// listeners by `drain`, once the population is free to react to them.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    pending: Vec<SimEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener that sees every event from now on.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&SimEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: SimEvent) {
        trace!("Queued event {:?}", event);
        self.pending.push(event);
    }

    /// Dispatches queued events to every listener and returns them.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            for listener in self.listeners.iter_mut() {
                listener(event);
            }
        }
        events
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drops queued events without dispatching them. Listeners stay registered.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_drain_dispatches_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = Rc::clone(&seen);
        bus.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        bus.emit(SimEvent::EntityInfected { name: "Marie".into() });
        bus.emit(SimEvent::SimulationComplete);
        assert!(seen.borrow().is_empty());

        let drained = bus.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(*seen.borrow(), drained);
        assert!(!bus.has_pending());
    }

    #[test]
    fn test_clear_pending_skips_listeners() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let sink = Rc::clone(&count);
        bus.subscribe(move |_| *sink.borrow_mut() += 1);

        bus.emit(SimEvent::RemoveTransientEntity { id: 4 });
        bus.clear_pending();
        assert!(bus.drain().is_empty());
        assert_eq!(*count.borrow(), 0);
    }
}
