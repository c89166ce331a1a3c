//! Notification hub for membership lifecycle events.
//!
//! Observers are fire-and-forget extension points (audit log, welcome
//! email, cache busting). The lifecycle engine dispatches after a
//! successful write and never blocks or fails on subscriber behavior.

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::types::{MembershipId, PlanId, UserId};

/// Payload for every lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipEvent {
    pub membership_id: MembershipId,
    pub user_id: UserId,
    pub plan_id: PlanId,
}

/// Subscriber interface. All methods default to no-ops so observers
/// implement only what they care about.
pub trait MembershipObserver: Send + Sync {
    fn on_granted(&self, _event: &MembershipEvent) {}
    fn on_revoked(&self, _event: &MembershipEvent) {}
    fn on_expired(&self, _event: &MembershipEvent) {}
}

/// Registration point and dispatcher for [`MembershipObserver`]s.
#[derive(Default)]
pub struct NotificationHub {
    observers: RwLock<Vec<Arc<dyn MembershipObserver>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Observers are invoked in registration
    /// order.
    pub fn subscribe(&self, observer: Arc<dyn MembershipObserver>) {
        match self.observers.write() {
            Ok(mut observers) => observers.push(observer),
            Err(e) => warn!(error = %e, "Observer registry lock poisoned — subscriber dropped"),
        }
    }

    pub fn notify_granted(&self, event: MembershipEvent) {
        self.dispatch("granted", &event, |o, e| o.on_granted(e));
    }

    pub fn notify_revoked(&self, event: MembershipEvent) {
        self.dispatch("revoked", &event, |o, e| o.on_revoked(e));
    }

    pub fn notify_expired(&self, event: MembershipEvent) {
        self.dispatch("expired", &event, |o, e| o.on_expired(e));
    }

    fn dispatch<F>(&self, kind: &str, event: &MembershipEvent, f: F)
    where
        F: Fn(&dyn MembershipObserver, &MembershipEvent),
    {
        let observers = match self.observers.read() {
            Ok(observers) => observers,
            Err(e) => {
                warn!(error = %e, kind, "Observer registry lock poisoned — notification dropped");
                return;
            }
        };
        debug!(
            kind,
            membership_id = event.membership_id,
            user_id = event.user_id,
            plan_id = event.plan_id,
            subscribers = observers.len(),
            "Dispatching membership notification"
        );
        for observer in observers.iter() {
            f(observer.as_ref(), event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Counter {
        granted: AtomicU32,
        revoked: AtomicU32,
        expired: AtomicU32,
    }

    impl MembershipObserver for Counter {
        fn on_granted(&self, _event: &MembershipEvent) {
            self.granted.fetch_add(1, Ordering::SeqCst);
        }
        fn on_revoked(&self, _event: &MembershipEvent) {
            self.revoked.fetch_add(1, Ordering::SeqCst);
        }
        fn on_expired(&self, _event: &MembershipEvent) {
            self.expired.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn event() -> MembershipEvent {
        MembershipEvent {
            membership_id: 1,
            user_id: 2,
            plan_id: 3,
        }
    }

    #[test]
    fn test_notifies_all_subscribers() {
        let hub = NotificationHub::new();
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());
        hub.subscribe(a.clone());
        hub.subscribe(b.clone());

        hub.notify_granted(event());
        hub.notify_granted(event());
        hub.notify_expired(event());

        assert_eq!(a.granted.load(Ordering::SeqCst), 2);
        assert_eq!(b.granted.load(Ordering::SeqCst), 2);
        assert_eq!(a.expired.load(Ordering::SeqCst), 1);
        assert_eq!(a.revoked.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_subscribers_is_harmless() {
        let hub = NotificationHub::new();
        hub.notify_revoked(event());
    }
}
