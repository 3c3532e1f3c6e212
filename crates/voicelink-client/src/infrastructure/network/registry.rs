//! Subscriber registry: the fan-out table the session delivers events
//! through.
//!
//! Each subscriber is an opaque string key (a window or view label) mapped to
//! an unbounded sender of [`SessionEvent`]s.  The registry lives inside the
//! session actor, so all mutation is already serialized; a subscriber added
//! during a fan-out simply starts with the next event.
//!
//! Unbounded sinks mean a slow consumer can never stall the session's
//! heartbeat or reconnect handling.  A sink whose receiver was dropped is
//! skipped and pruned on the next fan-out.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use super::session::SessionEvent;

/// Table of event sinks keyed by subscriber label.
#[derive(Default)]
pub struct SubscriberRegistry {
    sinks: HashMap<String, mpsc::UnboundedSender<SessionEvent>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the sink registered under `key`.
    ///
    /// Replacing drops the old sink, so its receiver stops getting events.
    pub fn register(&mut self, key: String, sink: mpsc::UnboundedSender<SessionEvent>) {
        if self.sinks.insert(key.clone(), sink).is_some() {
            debug!("subscriber {key:?} replaced");
        } else {
            debug!("subscriber {key:?} registered");
        }
    }

    /// Removes the sink registered under `key`.  Unknown keys are a no-op.
    pub fn unregister(&mut self, key: &str) {
        if self.sinks.remove(key).is_some() {
            debug!("subscriber {key:?} unregistered");
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// `true` when no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Delivers a clone of `event` to every registered subscriber and
    /// returns the number of successful deliveries.
    ///
    /// Sinks whose receiver has been dropped are skipped and removed from
    /// the table.
    pub fn fanout(&mut self, event: &SessionEvent) -> usize {
        let mut delivered = 0;
        let mut dead: Vec<String> = Vec::new();

        for (key, sink) in &self.sinks {
            if sink.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(key.clone());
            }
        }

        for key in dead {
            debug!("subscriber {key:?} gone, pruning");
            self.sinks.remove(&key);
        }
        delivered
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> (
        mpsc::UnboundedSender<SessionEvent>,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_fanout_delivers_to_every_subscriber() {
        // Arrange
        let mut registry = SubscriberRegistry::new();
        let (tx_a, mut rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.register("main".to_string(), tx_a);
        registry.register("settings".to_string(), tx_b);

        // Act
        let delivered = registry.fanout(&SessionEvent::Opened);

        // Assert
        assert_eq!(delivered, 2);
        assert!(matches!(rx_a.try_recv(), Ok(SessionEvent::Opened)));
        assert!(matches!(rx_b.try_recv(), Ok(SessionEvent::Opened)));
    }

    #[test]
    fn test_fanout_preserves_order_per_subscriber() {
        // Arrange
        let mut registry = SubscriberRegistry::new();
        let (tx, mut rx) = sink();
        registry.register("main".to_string(), tx);

        // Act
        registry.fanout(&SessionEvent::Opened);
        registry.fanout(&SessionEvent::Closed {
            code: 1006,
            reason: String::new(),
        });

        // Assert – events arrive in fan-out order
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Opened)));
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::Closed { code: 1006, .. })));
    }

    #[test]
    fn test_register_same_key_replaces_previous_sink() {
        // Arrange
        let mut registry = SubscriberRegistry::new();
        let (tx_old, mut rx_old) = sink();
        let (tx_new, mut rx_new) = sink();
        registry.register("main".to_string(), tx_old);
        registry.register("main".to_string(), tx_new);

        // Act
        let delivered = registry.fanout(&SessionEvent::Opened);

        // Assert – only the replacement receives the event
        assert_eq!(delivered, 1);
        assert_eq!(registry.len(), 1);
        assert!(rx_old.try_recv().is_err());
        assert!(matches!(rx_new.try_recv(), Ok(SessionEvent::Opened)));
    }

    #[test]
    fn test_unregistered_subscriber_receives_nothing() {
        // Arrange
        let mut registry = SubscriberRegistry::new();
        let (tx, mut rx) = sink();
        registry.register("main".to_string(), tx);
        registry.unregister("main");

        // Act
        let delivered = registry.fanout(&SessionEvent::Opened);

        // Assert
        assert_eq!(delivered, 0);
        assert!(rx.try_recv().is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_unknown_key_is_noop() {
        let mut registry = SubscriberRegistry::new();
        registry.unregister("never-registered");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_fanout_skips_and_prunes_dropped_receiver() {
        // Arrange – one live subscriber, one whose receiver is gone
        let mut registry = SubscriberRegistry::new();
        let (tx_live, mut rx_live) = sink();
        let (tx_dead, rx_dead) = sink();
        drop(rx_dead);
        registry.register("live".to_string(), tx_live);
        registry.register("dead".to_string(), tx_dead);

        // Act
        let delivered = registry.fanout(&SessionEvent::Opened);

        // Assert – delivery count excludes the dead sink, which is pruned
        assert_eq!(delivered, 1);
        assert_eq!(registry.len(), 1);
        assert!(matches!(rx_live.try_recv(), Ok(SessionEvent::Opened)));
    }
}
