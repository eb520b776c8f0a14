use std::fmt;

/// Items stored in a [`DedupQueue`](super::DedupQueue)
///
/// Two items with the same key describe the same intent; the later one
/// replaces the earlier.
pub trait DedupItem {
    fn dedup_key(&self) -> &str;
}

/// Result of pushing an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Inserted,
    /// An entry with the same key existed and was overwritten in place
    Replaced,
}

impl PushOutcome {
    pub fn is_replaced(self) -> bool {
        self == Self::Replaced
    }
}

impl fmt::Display for PushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted => write!(f, "inserted"),
            Self::Replaced => write!(f, "replaced"),
        }
    }
}

/// A snapshot copy of one queued item
///
/// `generation` identifies this exact version of the entry. Completion and
/// requeue calls carrying a stale generation are ignored, so an intent that
/// replaced the entry while it was being replayed is never lost.
#[derive(Debug, Clone)]
pub struct QueuedEntry<T> {
    pub key: String,
    pub generation: u64,
    pub item: T,
}
