//! Connectivity monitor: online/offline state machine.
//!
//! Platform connectivity callbacks feed [`ConnectivityMonitor::report`];
//! the Offline→Online transition is the signal to trigger a sync pass,
//! after a settle delay so the pass is not fired against a connection
//! that is still negotiating.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Outcome of feeding one connectivity event to the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Offline → Online: a sync attempt should follow the settle delay.
    CameOnline,
    /// Online → Offline: route writes to the local store only.
    WentOffline,
    /// Event matched the current state.
    Unchanged,
}

pub struct ConnectivityMonitor {
    online: AtomicBool,
    settle_delay: Duration,
}

impl ConnectivityMonitor {
    #[must_use]
    pub const fn new(initially_online: bool, settle_delay: Duration) -> Self {
        Self {
            online: AtomicBool::new(initially_online),
            settle_delay,
        }
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Pause to apply between a reconnect and the sync pass it triggers.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Feed a platform connectivity event and classify the transition.
    pub fn report(&self, online: bool) -> Transition {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        match (was_online, online) {
            (false, true) => Transition::CameOnline,
            (true, false) => Transition::WentOffline,
            _ => Transition::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn reconnect_is_reported_once() {
        let monitor = ConnectivityMonitor::new(false, Duration::ZERO);
        assert!(!monitor.is_online());

        assert_eq!(monitor.report(true), Transition::CameOnline);
        assert!(monitor.is_online());
        assert_eq!(monitor.report(true), Transition::Unchanged);
    }

    #[test]
    fn disconnect_is_reported_once() {
        let monitor = ConnectivityMonitor::new(true, Duration::ZERO);

        assert_eq!(monitor.report(false), Transition::WentOffline);
        assert!(!monitor.is_online());
        assert_eq!(monitor.report(false), Transition::Unchanged);
    }
}
