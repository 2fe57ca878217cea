//! Arena keys and collection aliases

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Stable handle to a node stored in a scene graph
    pub struct NodeKey;

    /// Stable handle to a transform stored in a transform tree
    pub struct TransformKey;
}
