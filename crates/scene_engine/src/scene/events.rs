//! Node change notifications
//!
//! Nodes queue events while they mutate; the scene graph drains every queue
//! once per frame and delivers them in a fixed order: lifecycle, transform,
//! original bounds, transformed bounds, material.

use crate::entity::EntityId;
use crate::foundation::collections::NodeKey;
use crate::foundation::math::Mat4;
use crate::spatial::{BoundingBox, BoundingSphere};

/// Something that changed on a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// Node attached to a render host
    Attached,
    /// Node detached from its render host
    Detached,
    /// Total transform changed
    TransformChanged(Mat4),
    /// Geometry-space box changed
    BoundChanged {
        /// Previous box
        old: BoundingBox,
        /// New box
        new: BoundingBox,
    },
    /// Geometry-space sphere changed
    BoundSphereChanged {
        /// Previous sphere
        old: BoundingSphere,
        /// New sphere
        new: BoundingSphere,
    },
    /// World-space box changed
    TransformBoundChanged {
        /// Previous box
        old: BoundingBox,
        /// New box
        new: BoundingBox,
    },
    /// World-space sphere changed
    TransformBoundSphereChanged {
        /// Previous sphere
        old: BoundingSphere,
        /// New sphere
        new: BoundingSphere,
    },
    /// Material assignment changed
    MaterialChanged,
}

impl NodeEvent {
    /// Delivery rank; lower ranks go first within a frame
    pub fn priority(&self) -> u8 {
        match self {
            Self::Attached | Self::Detached => 0,
            Self::TransformChanged(_) => 1,
            Self::BoundChanged { .. } | Self::BoundSphereChanged { .. } => 2,
            Self::TransformBoundChanged { .. } | Self::TransformBoundSphereChanged { .. } => 3,
            Self::MaterialChanged => 4,
        }
    }

    /// World-space bounds moved
    pub fn is_transformed_bound(&self) -> bool {
        matches!(
            self,
            Self::TransformBoundChanged { .. } | Self::TransformBoundSphereChanged { .. }
        )
    }
}

/// Event tagged with the node that raised it
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEvent {
    /// Graph key of the node
    pub node: NodeKey,
    /// Entity id of the node
    pub id: EntityId,
    /// What changed
    pub event: NodeEvent,
}

/// Per-node observer
pub type NodeSubscriber = Box<dyn FnMut(&NodeEvent)>;

/// Graph-wide observer
pub type SceneObserver = Box<dyn FnMut(&SceneEvent)>;

/// Stable sort into delivery order
pub fn sort_for_delivery(events: &mut [SceneEvent]) {
    events.sort_by_key(|e| e.event.priority());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::SlotMap;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_transform_events_precede_bound_events() {
        let mut keys: SlotMap<NodeKey, ()> = SlotMap::with_key();
        let node = keys.insert(());
        let id = EntityId::next();
        let bound = NodeEvent::TransformBoundChanged {
            old: BoundingBox::zero(),
            new: BoundingBox::new(Vec3::zeros(), Vec3::repeat(1.0)),
        };
        let mut events = vec![
            SceneEvent { node, id, event: NodeEvent::MaterialChanged },
            SceneEvent { node, id, event: bound.clone() },
            SceneEvent { node, id, event: NodeEvent::TransformChanged(Mat4::identity()) },
        ];
        sort_for_delivery(&mut events);
        assert_eq!(events[0].event, NodeEvent::TransformChanged(Mat4::identity()));
        assert_eq!(events[1].event, bound);
        assert_eq!(events[2].event, NodeEvent::MaterialChanged);
    }
}
