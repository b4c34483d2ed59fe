use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{
    select, ChangeNotification, CopySet, Entity, ExpiryQueue, HolderError, NotificationSink, Source,
    WriteSequence,
};

/// A read-only view of an instance's authoritative copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot<T> {
    source: Source,
    data: T,
}

impl <T> Snapshot<T> {

    /// The source whose copy is authoritative.
    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

/// The effect of an [`InstanceHolder::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The holder was empty; an `Add` was published.
    AddedFirst,
    /// The snapshot moved or its data changed; a `Modify` was published.
    SnapshotChanged,
    /// The copy was stored without changing the snapshot; nothing was published.
    CopyStored,
}

impl UpdateOutcome {
    pub fn notified(self) -> bool {
        self != UpdateOutcome::CopyStored
    }
}

/// The effect of an [`InstanceHolder::remove`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The source held no copy; nothing changed.
    NotFound,
    /// A non-authoritative copy was removed; nothing was published.
    RemovedFragment,
    /// The authoritative copy was removed and another promoted; a `Modify` was published.
    Promoted,
    /// The last copy was removed; a `Delete` was published and the holder
    /// was handed to the expiry queue.
    RemovedLast,
}

impl RemoveOutcome {
    pub fn notified(self) -> bool {
        matches!(self, RemoveOutcome::Promoted | RemoveOutcome::RemovedLast)
    }
}

#[derive(Debug)]
struct HolderState<T> {
    copies: CopySet<T>,
    snapshot: Option<Source>,
}

impl <T> HolderState<T> {

    fn snapshot_copy(&self) -> Option<&T> {
        self.snapshot.as_ref().and_then(|source| self.copies.get(source)).map(|copy| copy.data())
    }

    fn invariants_hold(&self) -> bool {
        match self.snapshot {
            Some(ref source) => self.copies.contains(source),
            None => self.copies.is_empty(),
        }
    }
}

/// Holds every source's copy of one registered instance.
///
/// All mutations of one holder are serialized: the copy set change, the
/// snapshot re-selection, the published notification and any expiry signal
/// of one call complete before the next call starts. Distinct holders share
/// nothing but their collaborators and write sequence.
///
/// ##### Example
///
/// ```
/// use instance_holder::{
///     ChangeNotification, ChannelConfig, InstanceHolder, NotificationChannel, Source,
///     WriteSequence,
/// };
///
/// let channel = NotificationChannel::new(ChannelConfig::default()).unwrap();
/// let mut notifications = channel.subscribe();
/// let holder = InstanceHolder::new("api-1", &channel, (), WriteSequence::new());
///
/// holder.update(Source::Local, ("api-1", "STARTING")).unwrap();
/// holder.update(Source::replication("foo"), ("api-1", "UP")).unwrap();
/// assert_eq!(2, holder.num_copies());
/// assert_eq!(("api-1", "STARTING"), holder.get_snapshot().unwrap().into_data());
///
/// holder.remove(&Source::Local);
/// assert_eq!(("api-1", "UP"), holder.get_snapshot().unwrap().into_data());
///
/// assert_eq!(ChangeNotification::Add(("api-1", "STARTING")), notifications.try_recv().unwrap());
/// assert_eq!(ChangeNotification::Modify(("api-1", "UP")), notifications.try_recv().unwrap());
/// ```
#[derive(Debug)]
pub struct InstanceHolder<T, N, E> where T: Entity {
    id: T::Id,
    sequence: WriteSequence,
    notifications: N,
    expiry: E,
    state: Mutex<HolderState<T>>,
}

impl <T, N, E> InstanceHolder<T, N, E>
where T: Entity,
      N: NotificationSink<T>,
      E: ExpiryQueue<T::Id> {

    /// Create an empty holder for the instance `id`.
    ///
    /// Writes are stamped from `sequence`, which should be shared by every
    /// holder of a registry.
    pub fn new(id: T::Id, notifications: N, expiry: E, sequence: WriteSequence) -> InstanceHolder<T, N, E> {
        InstanceHolder {
            id,
            sequence,
            notifications,
            expiry,
            state: Mutex::new(HolderState { copies: CopySet::new(), snapshot: None }),
        }
    }

    pub fn id(&self) -> &T::Id {
        &self.id
    }

    /// Store `data` as the copy written by `source`.
    ///
    /// Publishes `Add` if the holder was empty, `Modify` if the snapshot
    /// moved to another source or its data changed, and nothing otherwise.
    /// An update to an empty holder cancels its pending expiry.
    ///
    /// ##### Errors
    ///
    /// Returns [`HolderError::InvalidInput`] without changing the holder if
    /// `data` belongs to another instance or `source` is a replication source
    /// with an empty origin.
    pub fn update(&self, source: Source, data: T) -> Result<UpdateOutcome, HolderError> {
        if data.id() != &self.id {
            return Err(HolderError::InvalidInput {
                reason: format!("entity {:?} written to holder {:?}", data.id(), self.id),
            });
        }
        if source.origin() == Some("") {
            return Err(HolderError::InvalidInput {
                reason: "replication source must name its origin".to_string(),
            });
        }

        let mut state = self.state.lock();
        let previous = state.snapshot.take();
        let replaced = state.copies.insert(source.clone(), data, self.sequence.next());
        state.snapshot = select(&state.copies).cloned();

        let outcome = match previous {
            None => UpdateOutcome::AddedFirst,
            Some(ref previous) if state.snapshot.as_ref() != Some(previous) => UpdateOutcome::SnapshotChanged,
            Some(ref previous) if *previous == source
                && replaced.as_ref().map(|copy| copy.data()) != state.snapshot_copy() => UpdateOutcome::SnapshotChanged,
            Some(_) => UpdateOutcome::CopyStored,
        };
        debug_assert!(state.invariants_hold());

        match (outcome, state.snapshot_copy()) {
            (UpdateOutcome::AddedFirst, Some(data)) => {
                debug!(instance = ?self.id, source = %source, "instance added");
                self.expiry.cancel(&self.id);
                self.notifications.publish(ChangeNotification::Add(data.clone()));
            },
            (UpdateOutcome::SnapshotChanged, Some(data)) => {
                debug!(instance = ?self.id, source = %source, snapshot = ?state.snapshot, "snapshot modified");
                self.notifications.publish(ChangeNotification::Modify(data.clone()));
            },
            _ => trace!(instance = ?self.id, source = %source, "copy stored, snapshot unchanged"),
        }
        Ok(outcome)
    }

    /// Remove the copy written by `source`.
    ///
    /// Removing the authoritative copy promotes another copy and publishes
    /// `Modify`, or, if it was the last copy, publishes `Delete` and hands the
    /// holder to the expiry queue.
    pub fn remove(&self, source: &Source) -> RemoveOutcome {
        let mut state = self.state.lock();
        let removed = match state.copies.remove(source) {
            Some(removed) => removed,
            None => {
                trace!(instance = ?self.id, source = %source, "no copy to remove");
                return RemoveOutcome::NotFound;
            },
        };

        if state.snapshot.as_ref() != Some(source) {
            debug_assert!(state.invariants_hold());
            trace!(instance = ?self.id, source = %source, "copy removed, snapshot unchanged");
            return RemoveOutcome::RemovedFragment;
        }

        state.snapshot = select(&state.copies).cloned();
        debug_assert!(state.invariants_hold());

        match state.snapshot_copy() {
            Some(data) => {
                debug!(instance = ?self.id, source = %source, snapshot = ?state.snapshot, "snapshot promoted");
                self.notifications.publish(ChangeNotification::Modify(data.clone()));
                RemoveOutcome::Promoted
            },
            None => {
                debug!(instance = ?self.id, source = %source, "instance deleted");
                self.notifications.publish(ChangeNotification::Delete(removed.into_data()));
                self.expiry.mark_empty(&self.id);
                RemoveOutcome::RemovedLast
            },
        }
    }
}

impl <T, N, E> InstanceHolder<T, N, E> where T: Entity {

    /// The authoritative copy, or `None` if the holder is empty.
    pub fn get_snapshot(&self) -> Option<Snapshot<T>> {
        let state = self.state.lock();
        let source = state.snapshot.clone()?;
        let data = state.snapshot_copy()?.clone();
        Some(Snapshot { source, data })
    }

    /// The source whose copy is authoritative, or `None` if the holder is empty.
    pub fn snapshot_source(&self) -> Option<Source> {
        self.state.lock().snapshot.clone()
    }

    /// The last value written by `source`, whether or not it is authoritative.
    pub fn get_copy_for_source(&self, source: &Source) -> Option<T> {
        self.state.lock().copies.get(source).map(|copy| copy.data().clone())
    }

    /// Every source holding a copy, the authoritative source first.
    pub fn sources(&self) -> Vec<Source> {
        let state = self.state.lock();
        let mut sources: Vec<Source> = state.copies.iter().map(|copy| copy.source().clone()).collect();
        sources.sort_by_key(|source| Some(source) != state.snapshot.as_ref());
        sources
    }

    /// Returns the number of sources holding a copy.
    pub fn num_copies(&self) -> usize {
        self.state.lock().copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_copies() == 0
    }
}
