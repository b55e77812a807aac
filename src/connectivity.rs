//! Connectivity monitor — the single source of truth for the
//! online/offline routing decision.
//!
//! There is no polling loop. Whoever observes the network reports here:
//! the resolver flips the flag on primary-backend transport failures and
//! successes, and tests set it directly. Subscribers see transitions
//! only, via a `tokio::sync::watch` channel. Defaults to online so an
//! absent signal never blocks the primary path.

use tokio::sync::watch;

pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Create a monitor that starts online.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self { tx }
    }

    /// Current status.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Report the observed status. Subscribers are only notified when
    /// this is an actual transition; returns whether one occurred.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!(online, "Connectivity transition");
        }
        changed
    }

    /// Subscribe to transitions. The receiver initially sees the
    /// current value.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_online() {
        assert!(ConnectivityMonitor::new().is_online());
    }

    #[test]
    fn set_online_reports_transitions_only() {
        let monitor = ConnectivityMonitor::new();

        assert!(!monitor.set_online(true), "no transition when already online");
        assert!(monitor.set_online(false));
        assert!(!monitor.is_online());
        assert!(!monitor.set_online(false), "no transition when already offline");
        assert!(monitor.set_online(true));
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let monitor = ConnectivityMonitor::new();
        let mut rx = monitor.subscribe();

        // Initial value is visible but not a change event once consumed
        assert!(*rx.borrow_and_update());
        assert!(!rx.has_changed().unwrap());

        monitor.set_online(false);
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());

        // Redundant report does not wake subscribers
        monitor.set_online(false);
        assert!(!rx.has_changed().unwrap());
    }
}
