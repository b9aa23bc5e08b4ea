pub mod document;
pub mod error;
pub mod geometry;
pub mod id;
pub mod kind;
pub mod model;
pub mod serializer;

pub use document::{DEFAULT_SCENE_HEIGHT, DEFAULT_SCENE_WIDTH, Document};
pub use error::{DocumentError, Result};
pub use geometry::EdgeStyle;
pub use id::{DocumentId, EdgeId, NodeId, SocketId};
pub use kind::{NodeDescriptor, NodeKind, SocketType};
pub use model::{Edge, Node, Socket};
pub use serializer::{DocumentData, EdgeData, NodeData, SocketData};

// Re-export kurbo types so downstream crates don't need a direct dependency
pub use kurbo::{Point, Vec2};
