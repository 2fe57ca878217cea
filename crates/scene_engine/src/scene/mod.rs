//! Scene graph
//!
//! [`SceneGraph`] stores [`SceneNode`]s in an arena and drives them frame by
//! frame. Each node pairs a [`NodeKind`] (the kind-specific components as
//! named fields) with a lazily created render core.

pub mod components;
pub mod events;
pub mod graph;
pub mod kinds;
pub mod node;
pub mod transform;

pub use events::{NodeEvent, NodeSubscriber, SceneEvent, SceneObserver};
pub use graph::{FrameStats, SceneGraph};
pub use kinds::{NodeKind, NodeType};
pub use node::{SceneNode, TechniqueOverride};
pub use transform::{TransformComponent, TransformTree};

#[cfg(test)]
mod tests;
