//! A per-instance, multi-source state holder for service registries.
//!
//! A registered service instance may be written by several independent
//! sources at once: the instance's own local heartbeat path and any number of
//! replication peers relaying what they have seen. An [`InstanceHolder`] keeps
//! every source's last written copy, resolves which copy is currently
//! authoritative (the *snapshot*), and publishes a change notification every
//! time the authoritative view changes.
//!
//! ###### Snapshot selection
//!
//! A copy written by [`Source::Local`] always wins. Without a local copy, the
//! most recently written replication copy wins, as ordered by the
//! [`WriteSeq`] the holder stamps on each write.
//!
//! ###### Collaborators
//!
//! Notifications go to a [`NotificationSink`] (usually a shared
//! [`NotificationChannel`]), and holders which lose their last copy are
//! handed to an [`ExpiryQueue`] so the surrounding registry can reclaim them
//! after a grace period.

#[cfg(any(test, feature = "quickcheck_generators"))]
extern crate quickcheck;

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

mod copies;
mod error;
mod expiry;
mod holder;
mod notification;
mod selector;
mod source;

#[cfg(test)]
mod test;

pub use copies::{CopySet, SourcedCopy};
pub use error::HolderError;
pub use expiry::{ExpiryConfig, ExpiryQueue, GracePeriodQueue};
pub use holder::{InstanceHolder, RemoveOutcome, Snapshot, UpdateOutcome};
pub use notification::{ChangeNotification, ChannelConfig, NotificationChannel, NotificationSink};
pub use selector::select;
pub use source::Source;

/// A value which can be registered in an [`InstanceHolder`].
///
/// Beyond its identifier the entity is opaque to the holder; only equality
/// is used, to decide whether a write changed the snapshot.
pub trait Entity: Clone + Eq {

    type Id: Clone + Eq + Hash + Debug;

    /// The identifier of the registered instance this value describes.
    fn id(&self) -> &Self::Id;
}

/// Pairs register under their first element.
///
/// ##### Example
///
/// ```
/// use instance_holder::Entity;
///
/// let instance = ("api-1", "UP");
/// assert_eq!(&"api-1", instance.id());
/// ```
impl <K, V> Entity for (K, V) where K: Clone + Eq + Hash + Debug, V: Clone + Eq {

    type Id = K;

    fn id(&self) -> &K {
        &self.0
    }
}

/// The sequence number stamped on a copy when it is written.
///
/// Sequence numbers only order writes drawn from the same
/// [`WriteSequence`]; they are used to pick the freshest replication copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WriteSeq(u64);

impl WriteSeq {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl From<u64> for WriteSeq {
    fn from(seq: u64) -> WriteSeq {
        WriteSeq(seq)
    }
}

#[cfg(any(test, feature = "quickcheck_generators"))]
impl quickcheck::Arbitrary for WriteSeq {
    fn arbitrary(g: &mut quickcheck::Gen) -> WriteSeq {
        WriteSeq(quickcheck::Arbitrary::arbitrary(g))
    }
    fn shrink(&self) -> Box<dyn Iterator<Item=WriteSeq>> {
        Box::new(quickcheck::Arbitrary::shrink(&self.id()).map(WriteSeq))
    }
}

/// A shared, monotonically increasing source of [`WriteSeq`] values.
///
/// Clones share the same counter, so every holder constructed with a clone
/// of one `WriteSequence` stamps writes from a single total order.
#[derive(Clone, Debug, Default)]
pub struct WriteSequence {
    next: Arc<AtomicU64>,
}

impl WriteSequence {

    /// Create a sequence whose first value is 0.
    pub fn new() -> WriteSequence {
        WriteSequence::starting_at(0)
    }

    /// Create a sequence whose first value is `first`.
    ///
    /// ##### Example
    ///
    /// ```
    /// use instance_holder::{WriteSeq, WriteSequence};
    ///
    /// let sequence = WriteSequence::starting_at(7);
    /// let shared = sequence.clone();
    /// assert_eq!(WriteSeq::from(7), sequence.next());
    /// assert_eq!(WriteSeq::from(8), shared.next());
    /// ```
    pub fn starting_at(first: u64) -> WriteSequence {
        WriteSequence { next: Arc::new(AtomicU64::new(first)) }
    }

    /// Take the next sequence number.
    pub fn next(&self) -> WriteSeq {
        WriteSeq(self.next.fetch_add(1, Ordering::SeqCst))
    }
}
