//! Process-unique identifiers for documents, nodes, sockets and edges.
//!
//! All id kinds draw from one shared counter, so a raw number never names
//! two live entities at once. Ids read back from a file or clipboard are
//! *observed*: the counter is advanced past them, which keeps freshly
//! minted ids from colliding with restored ones later in the session.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn mint() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

fn observe(raw: u64) {
    NEXT_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $sigil:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Mint a new id that no live entity uses.
            pub fn fresh() -> Self {
                Self(mint())
            }

            /// Rebuild an id from its raw value (e.g. read from a saved file).
            pub fn restore(raw: u64) -> Self {
                observe(raw);
                Self(raw)
            }

            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($sigil, "#{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($sigil, "#{}"), self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u64(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = u64::deserialize(deserializer)?;
                Ok(Self::restore(raw))
            }
        }
    };
}

entity_id!(
    /// Identifies a whole diagram document.
    DocumentId,
    "doc"
);
entity_id!(
    /// Identifies a component node.
    NodeId,
    "node"
);
entity_id!(
    /// Identifies a connection point on a node.
    SocketId,
    "socket"
);
entity_id!(
    /// Identifies an edge between two sockets.
    EdgeId,
    "edge"
);
