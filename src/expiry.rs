use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

/// Takes ownership of the reclamation decision for holders that lost their
/// last copy.
///
/// A holder calls `mark_empty` when its last copy is removed, and `cancel`
/// when an update resurrects it. Both are called with the holder's lock held
/// and must not block.
pub trait ExpiryQueue<Id> {
    fn mark_empty(&self, id: &Id);
    fn cancel(&self, id: &Id);
}

/// Holders constructed without an expiry queue are never reclaimed.
impl <Id> ExpiryQueue<Id> for () {
    fn mark_empty(&self, _id: &Id) {}
    fn cancel(&self, _id: &Id) {}
}

impl <Id, Q> ExpiryQueue<Id> for Arc<Q> where Q: ExpiryQueue<Id> + ?Sized {
    fn mark_empty(&self, id: &Id) {
        (**self).mark_empty(id)
    }
    fn cancel(&self, id: &Id) {
        (**self).cancel(id)
    }
}

impl <Id, Q> ExpiryQueue<Id> for &Q where Q: ExpiryQueue<Id> + ?Sized {
    fn mark_empty(&self, id: &Id) {
        (**self).mark_empty(id)
    }
    fn cancel(&self, id: &Id) {
        (**self).cancel(id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpiryConfig {
    /// How long an empty holder waits before it may be reclaimed.
    pub grace_period: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> ExpiryConfig {
        ExpiryConfig { grace_period: Duration::from_secs(30) }
    }
}

/// An expiry queue releasing empty holders once their grace period elapses.
///
/// The queue only decides *when* a holder may go. The registry that owns the
/// holders polls [`pop_expired`](GracePeriodQueue::pop_expired) and must still
/// confirm the holder is empty before destroying it, since an update may land
/// between the poll and the reclamation.
#[derive(Debug)]
pub struct GracePeriodQueue<Id> where Id: Eq + Hash {
    config: ExpiryConfig,
    deadlines: Mutex<HashMap<Id, Instant>>,
}

impl <Id> GracePeriodQueue<Id> where Id: Clone + Eq + Hash + Debug {

    /// Create a queue with the provided configuration.
    ///
    /// ##### Example
    ///
    /// ```
    /// use std::time::{Duration, Instant};
    /// use instance_holder::{ExpiryConfig, ExpiryQueue, GracePeriodQueue};
    ///
    /// let queue = GracePeriodQueue::new(ExpiryConfig { grace_period: Duration::from_secs(30) });
    /// queue.mark_empty(&"api-1");
    ///
    /// assert!(queue.pop_expired(Instant::now()).is_empty());
    /// assert_eq!(vec!["api-1"], queue.pop_expired(Instant::now() + Duration::from_secs(31)));
    /// ```
    pub fn new(config: ExpiryConfig) -> GracePeriodQueue<Id> {
        GracePeriodQueue { config, deadlines: Mutex::new(HashMap::new()) }
    }

    pub fn grace_period(&self) -> Duration {
        self.config.grace_period
    }

    /// Returns true if `id` is waiting out its grace period.
    pub fn is_pending(&self, id: &Id) -> bool {
        self.deadlines.lock().contains_key(id)
    }

    /// Returns the number of holders waiting out their grace period.
    pub fn len(&self) -> usize {
        self.deadlines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.lock().is_empty()
    }

    /// Remove and return every id whose deadline is at or before `now`.
    pub fn pop_expired(&self, now: Instant) -> Vec<Id> {
        let mut deadlines = self.deadlines.lock();
        let expired: Vec<Id> = deadlines.iter()
                                        .filter(|&(_, &deadline)| deadline <= now)
                                        .map(|(id, _)| id.clone())
                                        .collect();
        for id in &expired {
            deadlines.remove(id);
            debug!(instance = ?id, "grace period elapsed");
        }
        expired
    }

    fn mark_empty_at(&self, id: &Id, now: Instant) {
        let deadline = now + self.config.grace_period;
        self.deadlines.lock().insert(id.clone(), deadline);
        debug!(instance = ?id, grace_period = ?self.config.grace_period, "holder queued for expiry");
    }
}

impl <Id> ExpiryQueue<Id> for GracePeriodQueue<Id> where Id: Clone + Eq + Hash + Debug {
    fn mark_empty(&self, id: &Id) {
        self.mark_empty_at(id, Instant::now());
    }

    fn cancel(&self, id: &Id) {
        if self.deadlines.lock().remove(id).is_some() {
            debug!(instance = ?id, "holder recovered before expiry");
        }
    }
}

#[cfg(test)]
mod test {

    use std::time::{Duration, Instant};

    use super::{ExpiryConfig, ExpiryQueue, GracePeriodQueue};

    fn queue(grace_secs: u64) -> GracePeriodQueue<&'static str> {
        GracePeriodQueue::new(ExpiryConfig { grace_period: Duration::from_secs(grace_secs) })
    }

    #[test]
    fn check_expires_after_grace_period() {
        let queue = queue(10);
        let start = Instant::now();
        queue.mark_empty_at(&"a", start);
        queue.mark_empty_at(&"b", start + Duration::from_secs(5));

        assert!(queue.pop_expired(start + Duration::from_secs(9)).is_empty());
        assert_eq!(vec!["a"], queue.pop_expired(start + Duration::from_secs(10)));
        assert!(queue.is_pending(&"b"));
        assert_eq!(vec!["b"], queue.pop_expired(start + Duration::from_secs(15)));
        assert!(queue.is_empty());
    }

    #[test]
    fn check_cancel_recovers() {
        let queue = queue(0);
        queue.mark_empty(&"a");
        assert_eq!(1, queue.len());

        queue.cancel(&"a");
        assert!(!queue.is_pending(&"a"));
        assert!(queue.pop_expired(Instant::now()).is_empty());
    }

    #[test]
    fn check_remark_restarts_grace_period() {
        let queue = queue(10);
        let start = Instant::now();
        queue.mark_empty_at(&"a", start);
        queue.mark_empty_at(&"a", start + Duration::from_secs(8));

        assert!(queue.pop_expired(start + Duration::from_secs(12)).is_empty());
        assert_eq!(vec!["a"], queue.pop_expired(start + Duration::from_secs(18)));
    }

    #[test]
    fn check_unit_queue_is_inert() {
        let queue = ();
        ExpiryQueue::<u8>::mark_empty(&queue, &1);
        ExpiryQueue::<u8>::cancel(&queue, &1);
    }
}
