pub mod edge;
pub mod element;
pub mod graph;
pub mod node;

pub use edge::{Edge, InteractionKind};
pub use element::{BoundingBox, Element, ElementKind, ReplayDescriptor};
pub use graph::{Graph, GraphMetadata};
pub use node::Node;
