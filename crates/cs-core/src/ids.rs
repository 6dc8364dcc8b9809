//! Strongly typed identifier wrappers and a per-owner id sequence.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Identity of a task enqueued on a worker pool.  Unique within its pool.
    pub struct TaskId(u64);
}

typed_id! {
    /// Index of a worker thread within its pool.
    pub struct WorkerId(u32);
}

/// Monotonic id source owned by one component (e.g. one worker pool).
///
/// The first id handed out is 1; 0 is never issued.
#[derive(Debug, Default)]
pub struct IdSequence {
    last: AtomicU64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next task id.
    #[inline]
    pub fn next_task(&self) -> TaskId {
        TaskId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}
