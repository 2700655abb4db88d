//! Event dispatcher
//!
//! Bridges the engine's notification threads to subscriber handlers.
//! Notifications arrive on threads the engine owns; before any handler
//! runs, delivery re-synchronizes on a dispatch guard so handler state is
//! only ever touched by one notification at a time. The registry itself
//! is snapshotted under its read lock and released before the first
//! handler runs, so add/remove landing mid-pass never corrupts delivery
//! and a slow handler never blocks registry writers.

use std::sync::{Arc, Mutex, PoisonError};

use cec_protocol::models::{AlertKind, MenuState};
use cec_protocol::{CecCommand, CecEvent, LogicalAddress};
use tracing::{debug, trace};

use crate::engine::{EngineConfig, NotificationSink};
use crate::error::DispatchError;
use crate::registry::CallbackRegistry;

/// Delivers events to registry subscribers in registration order
pub struct Dispatcher {
    registry: Arc<CallbackRegistry>,
    // serializes handler invocation across notification threads
    guard: Mutex<()>,
}

impl Dispatcher {
    /// Dispatcher over `registry`
    pub fn new(registry: Arc<CallbackRegistry>) -> Self {
        Dispatcher {
            registry,
            guard: Mutex::new(()),
        }
    }

    /// Deliver one event to every matching subscriber, in registration
    /// order
    ///
    /// A failing handler stops the pass: later subscribers are not
    /// notified and the failure is returned to the notification site.
    pub fn dispatch(&self, event: &CecEvent) -> Result<(), DispatchError> {
        let handlers = self.registry.matching(event.kind());
        if handlers.is_empty() {
            return Ok(());
        }

        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        for handler in &handlers {
            if let Err(err) = handler.invoke(event) {
                debug!(kind = ?event.kind(), %err, "handler stopped event delivery");
                return Err(err);
            }
        }
        Ok(())
    }
}

impl NotificationSink for Dispatcher {
    fn log_message(&self, level: i32, time: i64, message: &[u8]) -> Result<(), DispatchError> {
        // replace invalid sequences instead of failing the notification
        let message = String::from_utf8_lossy(message).into_owned();
        self.dispatch(&CecEvent::Log {
            level,
            time,
            message,
        })
    }

    fn key_press(&self, keycode: u8, duration: u32) -> Result<(), DispatchError> {
        trace!("key press {keycode:#04x} for {duration}ms");
        self.dispatch(&CecEvent::KeyPress { keycode, duration })
    }

    fn command_received(&self, command: &CecCommand) -> Result<(), DispatchError> {
        self.dispatch(&CecEvent::Command(command.clone()))
    }

    fn configuration_changed(&self, _config: &EngineConfig) -> Result<(), DispatchError> {
        // The engine reports these, but no payload shape is defined yet;
        // the event stays undelivered until one is.
        trace!("configuration change notification (not delivered)");
        Ok(())
    }

    fn alert(&self, kind: AlertKind, param: Option<&str>) -> Result<(), DispatchError> {
        self.dispatch(&CecEvent::Alert {
            kind,
            param: param.map(str::to_owned),
        })
    }

    fn menu_state_changed(&self, state: MenuState) -> Result<(), DispatchError> {
        self.dispatch(&CecEvent::MenuChanged { state })
    }

    fn source_activated(
        &self,
        address: LogicalAddress,
        active: bool,
    ) -> Result<(), DispatchError> {
        self.dispatch(&CecEvent::SourceActivated { active, address })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use cec_protocol::EventSet;

    use super::*;
    use crate::error::HandlerError;
    use crate::registry::Handler;

    fn recording_handler(log: &Arc<StdMutex<Vec<&'static str>>>, tag: &'static str) -> Handler {
        let log = Arc::clone(log);
        Handler::from_fn(move |_| {
            log.lock().unwrap().push(tag);
            Ok(())
        })
    }

    fn key_event() -> CecEvent {
        CecEvent::KeyPress {
            keycode: 0x01,
            duration: 0,
        }
    }

    #[test]
    fn dispatch_runs_in_registration_order() {
        let registry = Arc::new(CallbackRegistry::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        let log = Arc::new(StdMutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            registry
                .add(EventSet::KEYPRESS, recording_handler(&log, tag))
                .unwrap();
        }

        dispatcher.dispatch(&key_event()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn failing_handler_stops_later_subscribers() {
        let registry = Arc::new(CallbackRegistry::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        let log = Arc::new(StdMutex::new(Vec::new()));

        registry
            .add(EventSet::KEYPRESS, recording_handler(&log, "a"))
            .unwrap();
        registry
            .add(
                EventSet::KEYPRESS,
                Handler::from_fn(|_| Err(HandlerError::new("refused"))),
            )
            .unwrap();
        registry
            .add(EventSet::KEYPRESS, recording_handler(&log, "c"))
            .unwrap();

        let err = dispatcher.dispatch(&key_event()).unwrap_err();
        assert!(matches!(err, DispatchError::Handler(_)));
        // "a" ran before the failure, "c" was never notified
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn registry_survives_a_failed_dispatch() {
        let registry = Arc::new(CallbackRegistry::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        let log = Arc::new(StdMutex::new(Vec::new()));

        registry
            .add(EventSet::KEYPRESS, Handler::from_fn(|_| panic!("boom")))
            .unwrap();
        registry
            .add(EventSet::KEYPRESS, recording_handler(&log, "later"))
            .unwrap();

        assert!(matches!(
            dispatcher.dispatch(&key_event()),
            Err(DispatchError::HandlerPanicked)
        ));
        assert_eq!(registry.len(), 2);

        // a later event still reaches the survivor once the panicking
        // subscriber is removed
        let survivors = registry.matching(EventSet::KEYPRESS);
        assert_eq!(survivors.len(), 2);
        survivors[1].invoke(&key_event()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["later"]);
    }

    #[test]
    fn handlers_only_see_their_subscribed_kinds() {
        let registry = Arc::new(CallbackRegistry::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        let log = Arc::new(StdMutex::new(Vec::new()));

        registry
            .add(EventSet::COMMAND, recording_handler(&log, "command-only"))
            .unwrap();

        dispatcher.dispatch(&key_event()).unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn log_messages_decode_lossily() {
        let registry = Arc::new(CallbackRegistry::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        let seen = Arc::new(StdMutex::new(String::new()));

        let seen_in = Arc::clone(&seen);
        registry
            .add(
                EventSet::LOG,
                Handler::from_fn(move |event| {
                    if let CecEvent::Log { message, .. } = event {
                        *seen_in.lock().unwrap() = message.clone();
                    }
                    Ok(())
                }),
            )
            .unwrap();

        dispatcher
            .log_message(1, 0, b"bad \xFF byte")
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), "bad \u{FFFD} byte");
    }

    #[test]
    fn configuration_changes_are_not_delivered() {
        let registry = Arc::new(CallbackRegistry::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        let log = Arc::new(StdMutex::new(Vec::new()));

        registry
            .add(EventSet::ALL, recording_handler(&log, "any"))
            .unwrap();

        let config = EngineConfig {
            osd_name: "test".into(),
            device_type: cec_protocol::DeviceType::RecordingDevice,
            language: "eng".into(),
            activate_source: false,
        };
        dispatcher.configuration_changed(&config).unwrap();
        assert!(log.lock().unwrap().is_empty());
    }
}
