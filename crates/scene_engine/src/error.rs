//! Scene graph error types
//!
//! Only structural mistakes in graph assembly are errors. Per-frame problems
//! (invalid geometry, missing host) degrade to "not rendered, not hit".

use crate::config::ConfigError;

/// Hard failures raised while assembling or configuring a scene
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// A transform already belongs to a different parent
    #[error("transform is already attached to a different parent")]
    TransformAlreadyParented,

    /// A component needs a render-core capability the core does not provide
    #[error("component `{component}` requires render core capability `{capability}`")]
    MissingCapability {
        /// Component name
        component: &'static str,
        /// Missing capability name
        capability: &'static str,
    },

    /// Parenting would make a transform its own ancestor
    #[error("transform cannot become a child of its own descendant")]
    CyclicParent,

    /// Key does not refer to a live node or transform
    #[error("unknown scene node or transform")]
    UnknownNode,

    /// Post-effect attribute text could not be parsed
    #[error("invalid post effect attributes `{0}`")]
    InvalidEffectAttributes(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias used across the crate
pub type SceneResult<T> = Result<T, SceneError>;
