// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Unit notifications: the error, finish and close families.
//!
//! Every unit owns an `EventHub`. Listeners subscribe to the hub's broadcast
//! bus and receive events on a later scheduling turn. A hub can also carry
//! forwards to other hubs; a forward re-emits selected events on its target
//! synchronously, inside the same `emit` call, so the relative order of events
//! across a unit and the composite it reports to is preserved.
//!
//! The bus itself keeps nothing for late subscribers, so the hub also records
//! every error and whether it finished or closed. A forward registered after
//! the fact replays that record onto its target.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

use crate::config::consts::EVENT_BUS_CAPACITY;
use crate::errors::UnitError;
use crate::observability::messages::{composition::ErrorRelayed, unit::EventsLagged, StructuredLog};

/// A notification raised by a unit.
///
/// Finish and Close carry no payload; only an error is ever inspected.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitEvent {
    Error(UnitError),
    /// The writable side has consumed all input
    Finish,
    /// The unit released its resources; emitted at most once
    Close,
}

impl UnitEvent {
    pub fn error(&self) -> Option<&UnitError> {
        match self {
            UnitEvent::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// Which event families a forward re-emits on its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Relay {
    pub errors: bool,
    pub terminal: bool,
}

impl Relay {
    pub const ERRORS: Relay = Relay {
        errors: true,
        terminal: false,
    };
    pub const TERMINAL: Relay = Relay {
        errors: false,
        terminal: true,
    };

    fn carries(&self, event: &UnitEvent) -> bool {
        match event {
            UnitEvent::Error(_) => self.errors,
            UnitEvent::Finish | UnitEvent::Close => self.terminal,
        }
    }
}

struct Forward {
    target: Arc<EventHub>,
    relay: Relay,
}

/// Receiving end of a unit's event bus.
pub struct Events {
    unit: Arc<str>,
    rx: broadcast::Receiver<UnitEvent>,
}

impl Events {
    /// Next event, or `None` once the unit and everything feeding it is gone.
    ///
    /// A listener that falls more than the bus capacity behind loses the
    /// oldest events; the loss is logged and delivery continues.
    pub async fn next(&mut self) -> Option<UnitEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    EventsLagged {
                        unit: &self.unit,
                        skipped,
                    }
                    .log();
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next error, skipping finish and close
    pub async fn next_error(&mut self) -> Option<UnitError> {
        while let Some(event) = self.next().await {
            if let UnitEvent::Error(error) = event {
                return Some(error);
            }
        }
        None
    }

    /// Non-waiting poll, used by tests and diagnostics
    pub fn try_next(&mut self) -> Option<UnitEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit
    }
}

/// What a hub has emitted so far, plus where it forwards to
#[derive(Default)]
struct HubState {
    forwards: Vec<Forward>,
    errors: Vec<UnitError>,
    finished: bool,
}

/// Event source shared by a unit handle and the task driving it
pub(crate) struct EventHub {
    name: Arc<str>,
    bus: broadcast::Sender<UnitEvent>,
    state: Mutex<HubState>,
    ended_cleanly: AtomicBool,
    closed: AtomicBool,
}

impl EventHub {
    pub fn new(name: Arc<str>) -> Arc<Self> {
        let (bus, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Arc::new(Self {
            name,
            bus,
            state: Mutex::new(HubState::default()),
            ended_cleanly: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscribe(&self) -> Events {
        Events {
            unit: self.name.clone(),
            rx: self.bus.subscribe(),
        }
    }

    fn state(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-emit this hub's events of the given families on `target`.
    ///
    /// Events emitted before the forward existed are replayed first; an
    /// event is either replayed or relayed, never both.
    pub fn forward_to(&self, target: &Arc<EventHub>, relay: Relay) {
        let replay = {
            let mut state = self.state();
            state.forwards.push(Forward {
                target: target.clone(),
                relay,
            });

            let mut past = Vec::new();
            if relay.errors {
                past.extend(state.errors.iter().cloned().map(UnitEvent::Error));
            }
            if relay.terminal {
                if state.finished {
                    past.push(UnitEvent::Finish);
                }
                if self.is_closed() {
                    past.push(UnitEvent::Close);
                }
            }
            past
        };

        for event in replay {
            self.relay(target, event);
        }
    }

    /// Publish an event; a second Close is dropped
    pub fn emit(&self, event: UnitEvent) {
        let targets: Vec<Arc<EventHub>> = {
            let mut state = self.state();
            match &event {
                UnitEvent::Error(error) => state.errors.push(error.clone()),
                UnitEvent::Finish => state.finished = true,
                UnitEvent::Close => {
                    if self.closed.swap(true, Ordering::SeqCst) {
                        return;
                    }
                }
            }

            // No subscribers is not an error; the event is simply unobserved
            let _ = self.bus.send(event.clone());

            state
                .forwards
                .iter()
                .filter(|forward| forward.relay.carries(&event))
                .map(|forward| forward.target.clone())
                .collect()
        };

        for target in targets {
            self.relay(&target, event.clone());
        }
    }

    fn relay(&self, target: &Arc<EventHub>, event: UnitEvent) {
        if let UnitEvent::Error(error) = &event {
            ErrorRelayed {
                from: &self.name,
                to: target.name(),
                error,
            }
            .log();
        }
        target.emit(event);
    }

    /// The first error this hub ever emitted, subscribed or not
    pub fn first_error(&self) -> Option<UnitError> {
        self.state().errors.first().cloned()
    }

    pub fn error(&self, error: UnitError) {
        self.emit(UnitEvent::Error(error));
    }

    pub fn finish(&self) {
        self.mark_clean();
        self.emit(UnitEvent::Finish);
    }

    pub fn close(&self) {
        self.emit(UnitEvent::Close);
    }

    /// Record that the unit completed its work before closing
    pub fn mark_clean(&self) {
        self.ended_cleanly.store(true, Ordering::SeqCst);
    }

    pub fn ended_cleanly(&self) -> bool {
        self.ended_cleanly.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_is_emitted_once() {
        let hub = EventHub::new("a".into());
        let mut events = hub.subscribe();

        hub.close();
        hub.close();
        hub.error(UnitError::new("late"));

        assert_eq!(events.next().await, Some(UnitEvent::Close));
        assert!(matches!(events.next().await, Some(UnitEvent::Error(_))));
        assert_eq!(events.try_next(), None);
        assert!(hub.is_closed());
    }

    #[tokio::test]
    async fn test_forward_relays_selected_families_in_order() {
        let member = EventHub::new("member".into());
        let composite = EventHub::new("composite".into());
        member.forward_to(&composite, Relay::ERRORS);
        let mut events = composite.subscribe();

        let error = UnitError::new("boom");
        member.error(error.clone());
        member.finish();
        member.close();
        composite.error(UnitError::new("own"));

        let relayed = events.next_error().await.unwrap();
        assert_eq!(relayed, error);
        let own = events.next().await.unwrap();
        assert_ne!(own.error(), Some(&error));
        assert_eq!(events.try_next(), None);
    }

    #[tokio::test]
    async fn test_late_forward_replays_recorded_events() {
        let member = EventHub::new("member".into());
        let first = UnitError::new("first");
        let second = UnitError::new("second");
        member.error(first.clone());
        member.error(second.clone());
        member.close();

        let composite = EventHub::new("composite".into());
        let facade = EventHub::new("facade".into());
        member.forward_to(&composite, Relay::ERRORS);
        member.forward_to(&facade, Relay::TERMINAL);

        assert_eq!(member.first_error(), Some(first.clone()));
        assert_eq!(composite.first_error(), Some(first));
        assert!(!composite.is_closed());
        assert!(facade.is_closed());
        assert_eq!(facade.first_error(), None);

        // Replayed once, then only live events travel
        let mut events = composite.subscribe();
        member.error(UnitError::new("third"));
        assert!(events.next_error().await.is_some_and(|error| error != second));
        assert_eq!(events.try_next(), None);
    }

    #[tokio::test]
    async fn test_terminal_forward_respects_target_close_guard() {
        let tail = EventHub::new("tail".into());
        let facade = EventHub::new("facade".into());
        tail.forward_to(&facade, Relay::TERMINAL);
        let mut events = facade.subscribe();

        tail.finish();
        tail.close();
        facade.close();

        assert_eq!(events.next().await, Some(UnitEvent::Finish));
        assert_eq!(events.next().await, Some(UnitEvent::Close));
        assert_eq!(events.try_next(), None);
        assert!(tail.ended_cleanly());
    }
}
