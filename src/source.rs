use std::fmt::{self, Display, Formatter};

#[cfg(any(test, feature = "quickcheck_generators"))]
use quickcheck::{Arbitrary, Gen};

/// The writer a copy came from.
///
/// Sources are compared by kind and origin only. They carry no priority of
/// their own; see [`select`](crate::select) for how copies are ranked.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    /// The instance's own registration path.
    Local,
    /// A copy relayed by the named replication peer.
    Replication(String),
}

impl Source {

    /// Create a replication source for the named peer.
    ///
    /// ##### Example
    ///
    /// ```
    /// use instance_holder::Source;
    ///
    /// let foo = Source::replication("foo");
    /// assert_eq!(Some("foo"), foo.origin());
    /// assert_ne!(foo, Source::replication("bar"));
    /// ```
    pub fn replication<S>(origin: S) -> Source where S: Into<String> {
        Source::Replication(origin.into())
    }

    /// The name of the replication peer, or `None` for the local source.
    pub fn origin(&self) -> Option<&str> {
        match *self {
            Source::Local => None,
            Source::Replication(ref origin) => Some(origin),
        }
    }

    pub fn is_local(&self) -> bool {
        *self == Source::Local
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Source::Local => f.write_str("local"),
            Source::Replication(ref origin) => write!(f, "replication:{}", origin),
        }
    }
}

/// Generated origins come from a small pool so that generated sources
/// collide often enough to exercise overwrites.
#[cfg(any(test, feature = "quickcheck_generators"))]
impl Arbitrary for Source {
    fn arbitrary(g: &mut Gen) -> Source {
        const ORIGINS: &[&str] = &["foo", "bar", "baz"];
        match g.choose(&[None, Some(0), Some(1), Some(2)]) {
            Some(&Some(i)) => Source::replication(ORIGINS[i]),
            _ => Source::Local,
        }
    }
    fn shrink(&self) -> Box<dyn Iterator<Item=Source>> {
        match *self {
            Source::Local => quickcheck::empty_shrinker(),
            Source::Replication(_) => quickcheck::single_shrinker(Source::Local),
        }
    }
}
