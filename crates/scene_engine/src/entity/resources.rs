//! Scoped ownership of disposable sub-resources

use std::any::Any;

/// Exclusively owned resources released together, in reverse acquisition order
///
/// Dropping a non-empty scope still releases everything, but logs a warning:
/// the owner was expected to dispose it on detach.
#[derive(Default)]
pub struct ResourceScope {
    resources: Vec<Box<dyn Any>>,
}

impl ResourceScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a resource until the next dispose
    pub fn collect<T: Any>(&mut self, resource: T) {
        self.resources.push(Box::new(resource));
    }

    /// Most recently collected resource of type `T`
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.resources.iter().rev().find_map(|r| r.downcast_ref::<T>())
    }

    /// Remove and return the most recently collected resource of type `T`
    pub fn take<T: Any>(&mut self) -> Option<T> {
        let index = self.resources.iter().rposition(|r| r.is::<T>())?;
        self.resources.remove(index).downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Number of live resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// True when nothing is held
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Release every resource now; returns how many were released
    pub fn dispose_and_clear(&mut self) -> usize {
        let count = self.resources.len();
        while let Some(resource) = self.resources.pop() {
            drop(resource);
        }
        count
    }
}

impl std::fmt::Debug for ResourceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceScope")
            .field("live", &self.resources.len())
            .finish()
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        if !self.resources.is_empty() {
            log::warn!(
                "resource scope dropped with {} live resources; releasing late",
                self.resources.len()
            );
            self.dispose_and_clear();
        }
    }
}
