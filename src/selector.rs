use crate::{CopySet, Source};

/// Select the source whose copy is authoritative.
///
/// A local copy always wins. Otherwise the replication copy with the
/// greatest write sequence number wins. An empty copy set has no snapshot.
///
/// ##### Example
///
/// ```
/// use instance_holder::{select, CopySet, Source, WriteSeq};
///
/// let mut copies = CopySet::new();
/// assert_eq!(None, select(&copies));
///
/// copies.insert(Source::replication("foo"), "foo", WriteSeq::from(1));
/// copies.insert(Source::replication("bar"), "bar", WriteSeq::from(2));
/// assert_eq!(Some(&Source::replication("bar")), select(&copies));
///
/// copies.insert(Source::Local, "local", WriteSeq::from(0));
/// assert_eq!(Some(&Source::Local), select(&copies));
/// ```
pub fn select<T>(copies: &CopySet<T>) -> Option<&Source> {
    if let Some(local) = copies.get(&Source::Local) {
        return Some(local.source());
    }
    // Sequence numbers are unique within one holder; the origin only orders
    // copies stamped by unrelated sequences.
    copies.iter()
          .max_by(|a, b| a.write_seq().cmp(&b.write_seq()).then_with(|| a.source().cmp(b.source())))
          .map(|copy| copy.source())
}

#[cfg(test)]
mod test {

    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    use super::select;
    use crate::{CopySet, Source, WriteSeq};

    fn copy_set(writes: &[(Source, u8)]) -> CopySet<u8> {
        let mut copies = CopySet::new();
        for (seq, &(ref source, value)) in writes.iter().enumerate() {
            copies.insert(source.clone(), value, WriteSeq::from(seq as u64));
        }
        copies
    }

    #[quickcheck]
    fn check_local_priority(writes: Vec<(Source, u8)>) -> TestResult {
        let local = match writes.iter().rev().find(|&&(ref source, _)| source.is_local()) {
            Some(&(_, value)) => value,
            None => return TestResult::discard(),
        };

        let copies = copy_set(&writes);
        let snapshot = select(&copies).and_then(|source| copies.get(source));
        TestResult::from_bool(snapshot.map(|copy| *copy.data()) == Some(local))
    }

    #[quickcheck]
    fn check_replication_freshness(writes: Vec<(Source, u8)>) -> TestResult {
        let writes: Vec<(Source, u8)> = writes.into_iter().filter(|&(ref source, _)| !source.is_local()).collect();
        let freshest = match writes.last() {
            Some(&(ref source, _)) => source.clone(),
            None => return TestResult::discard(),
        };

        let copies = copy_set(&writes);
        TestResult::from_bool(select(&copies) == Some(&freshest))
    }

    #[test]
    fn check_empty_has_no_snapshot() {
        assert_eq!(None, select(&CopySet::<u8>::new()));
    }

    #[test]
    fn check_older_local_beats_newer_replication() {
        let copies = copy_set(&[(Source::Local, 1), (Source::replication("foo"), 2)]);
        assert_eq!(Some(&Source::Local), select(&copies));
    }
}
