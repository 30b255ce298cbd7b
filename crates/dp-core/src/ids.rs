//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct construction in tests and wire code, but callers should prefer the
//! named constructors where they exist.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to the type's MAX.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }
    };
}

typed_id! {
    /// Stable identifier of one partition (one simulation process).
    /// Pids are dense: a run with N partitions uses pids `0..N`.
    pub struct Pid(u16);
}

typed_id! {
    /// Identifier of a pending cross-partition request, allocated by the
    /// *requesting* partition.  Unique per requester, not globally.
    pub struct PromiseId(u64);
}

typed_id! {
    /// Tagged category of an agent (replaces runtime type inspection when an
    /// application tracks heterogeneous agent sets).  Applications define
    /// their own kind constants; the framework only indexes by it.
    pub struct AgentKind(u8);
}

// ── AgentId ───────────────────────────────────────────────────────────────────

/// Process-unique agent identifier: the spawning partition's pid in the high
/// 16 bits, a per-partition serial in the low 48.
///
/// The pid component records where the agent was *created*; ownership moves
/// with the agent as it migrates, so `home_pid` is a provenance fact, not the
/// current owner.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct AgentId(pub u64);

impl AgentId {
    const SERIAL_BITS: u32 = 48;
    const SERIAL_MASK: u64 = (1 << Self::SERIAL_BITS) - 1;

    /// Compose an id from the spawning partition and a partition-local serial.
    #[inline]
    pub fn compose(pid: Pid, serial: u64) -> AgentId {
        debug_assert!(serial <= Self::SERIAL_MASK);
        AgentId(((pid.0 as u64) << Self::SERIAL_BITS) | (serial & Self::SERIAL_MASK))
    }

    /// The partition that created this agent.
    #[inline]
    pub fn home_pid(self) -> Pid {
        Pid((self.0 >> Self::SERIAL_BITS) as u16)
    }

    /// The per-partition creation serial.
    #[inline]
    pub fn serial(self) -> u64 {
        self.0 & Self::SERIAL_MASK
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent({}/{})", self.home_pid().0, self.serial())
    }
}
