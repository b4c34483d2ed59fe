use std::collections::hash_map::{self, HashMap};

use crate::{Source, WriteSeq};

/// One source's last written value for an instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourcedCopy<T> {
    source: Source,
    data: T,
    write_seq: WriteSeq,
}

impl <T> SourcedCopy<T> {

    pub fn new(source: Source, data: T, write_seq: WriteSeq) -> SourcedCopy<T> {
        SourcedCopy { source, data, write_seq }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    /// The sequence number the copy was stamped with when it was written.
    pub fn write_seq(&self) -> WriteSeq {
        self.write_seq
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

/// The per-source copies of a single instance.
///
/// At most one copy is kept per distinct source; writing again from the same
/// source replaces its copy.
#[derive(Clone, Debug)]
pub struct CopySet<T> {
    copies: HashMap<Source, SourcedCopy<T>>,
}

impl <T> Default for CopySet<T> {
    fn default() -> CopySet<T> {
        CopySet { copies: HashMap::new() }
    }
}

impl <T> CopySet<T> {

    /// Create an empty copy set.
    ///
    /// ##### Example
    ///
    /// ```
    /// use instance_holder::CopySet;
    ///
    /// let copies = CopySet::<u32>::new();
    /// assert!(copies.is_empty());
    /// ```
    pub fn new() -> CopySet<T> {
        CopySet::default()
    }

    /// Store `data` as the copy for `source`, returning the copy it replaced.
    ///
    /// ##### Example
    ///
    /// ```
    /// use instance_holder::{CopySet, Source, WriteSeq};
    ///
    /// let mut copies = CopySet::new();
    /// assert!(copies.insert(Source::Local, "starting", WriteSeq::from(0)).is_none());
    ///
    /// let replaced = copies.insert(Source::Local, "up", WriteSeq::from(1));
    /// assert_eq!(Some("starting"), replaced.map(|copy| copy.into_data()));
    /// assert_eq!(1, copies.len());
    /// ```
    pub fn insert(&mut self, source: Source, data: T, write_seq: WriteSeq) -> Option<SourcedCopy<T>> {
        let copy = SourcedCopy::new(source.clone(), data, write_seq);
        self.copies.insert(source, copy)
    }

    /// Remove and return the copy for `source`, if there is one.
    pub fn remove(&mut self, source: &Source) -> Option<SourcedCopy<T>> {
        self.copies.remove(source)
    }

    pub fn get(&self, source: &Source) -> Option<&SourcedCopy<T>> {
        self.copies.get(source)
    }

    pub fn contains(&self, source: &Source) -> bool {
        self.copies.contains_key(source)
    }

    /// Returns the number of sources holding a copy.
    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    /// Iterate over the copies in arbitrary order.
    pub fn iter(&self) -> hash_map::Values<'_, Source, SourcedCopy<T>> {
        self.copies.values()
    }
}
