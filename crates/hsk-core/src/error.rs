//! Typed failures surfaced by document operations.
//!
//! Structural problems (unparseable files, dangling references) abort the
//! whole operation and reach the caller as a [`DocumentError`]. Membership
//! slips such as removing an entity that is already gone are *not* errors:
//! they are logged with `log::warn!` and treated as no-ops.

use crate::id::{EdgeId, SocketId};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The input is not a structurally valid diagram (bad JSON, missing or
    /// mistyped fields, duplicated ids).
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// An edge names a socket id that no reconstructed node owns.
    #[error("edge {edge} references unknown socket {socket}")]
    DanglingReference { edge: EdgeId, socket: SocketId },

    /// A value assignment fell outside the node's `[min, max]` range.
    #[error("value {value} outside range [{min}, {max}]")]
    OutOfRangeValue { value: f64, min: f64, max: f64 },

    /// Scale factors must be finite and strictly positive.
    #[error("invalid scale factor {0}")]
    InvalidScale(f64),

    /// Edge creation against a socket that is not part of the document.
    #[error("socket {0} is not part of this document")]
    UnknownSocket(SocketId),

    /// An edge may not start and end on the same socket.
    #[error("cannot connect socket {0} to itself")]
    SelfConnection(SocketId),

    /// Raw storage failure while reading or writing a file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A history snapshot could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        DocumentError::InvalidFile(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocumentError>;
