//! Hierarchical transforms with lazy dirty propagation
//!
//! Transforms live in a [`TransformTree`] arena. Every transform without an
//! explicit parent hangs off a synthetic identity root, so computing a total
//! never branches on a missing parent. The root does not track children.

use crate::error::{SceneError, SceneResult};
use crate::foundation::collections::{SlotMap, TransformKey};
use crate::foundation::math::{utils, Mat4};

/// Local and cached total matrix of one node
#[derive(Debug, Clone)]
pub struct TransformComponent {
    local: Mat4,
    total: Mat4,
    parent: TransformKey,
    children: Vec<TransformKey>,
    dirty: bool,
    changed: bool,
}

impl TransformComponent {
    fn new(local: Mat4, parent: TransformKey) -> Self {
        Self {
            local,
            total: Mat4::identity(),
            parent,
            children: Vec::new(),
            dirty: true,
            changed: false,
        }
    }

    /// Local matrix
    pub fn local(&self) -> &Mat4 {
        &self.local
    }

    /// Cached parent-composed matrix
    pub fn total(&self) -> &Mat4 {
        &self.total
    }

    /// Child transforms
    pub fn children(&self) -> &[TransformKey] {
        &self.children
    }

    /// Needs recomputation
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Total changed since the last notification
    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

/// Arena of transform components
#[derive(Debug)]
pub struct TransformTree {
    nodes: SlotMap<TransformKey, TransformComponent>,
    root: TransformKey,
}

impl Default for TransformTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformTree {
    /// Tree holding only the identity root
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert_with_key(|key| {
            let mut root = TransformComponent::new(Mat4::identity(), key);
            root.dirty = false;
            root
        });
        Self { nodes, root }
    }

    /// The synthetic identity parent
    pub fn default_parent(&self) -> TransformKey {
        self.root
    }

    /// Add a parentless transform
    pub fn insert(&mut self, local: Mat4) -> TransformKey {
        self.nodes.insert(TransformComponent::new(local, self.root))
    }

    /// Remove a transform; its children fall back to the default parent
    pub fn remove(&mut self, key: TransformKey) -> Option<TransformComponent> {
        if key == self.root {
            return None;
        }
        let parent = self.nodes.get(key)?.parent;
        self.remove_child(parent, key);
        let removed = self.nodes.remove(key)?;
        for &child in &removed.children {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = self.root;
                node.dirty = true;
            }
        }
        Some(removed)
    }

    /// Transform by key
    pub fn get(&self, key: TransformKey) -> Option<&TransformComponent> {
        self.nodes.get(key)
    }

    /// Number of transforms, excluding the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether only the root exists
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parent of `key`; `None` when it hangs off the default parent
    pub fn parent(&self, key: TransformKey) -> Option<TransformKey> {
        self.nodes.get(key).map(|n| n.parent).filter(|p| *p != self.root)
    }

    /// Cached total of `key`
    pub fn total(&self, key: TransformKey) -> Option<Mat4> {
        self.nodes.get(key).map(|n| n.total)
    }

    /// Replace the local matrix and mark the transform dirty
    pub fn set_local(&mut self, key: TransformKey, local: Mat4) -> SceneResult<()> {
        let node = self.nodes.get_mut(key).ok_or(SceneError::UnknownNode)?;
        node.local = local;
        node.dirty = true;
        Ok(())
    }

    /// Make `child` a child of `parent`
    ///
    /// Fails when `child` already has a different explicit parent, or when
    /// `child` is an ancestor of `parent`.
    pub fn add_child(&mut self, parent: TransformKey, child: TransformKey) -> SceneResult<()> {
        if !self.nodes.contains_key(parent) || parent == child {
            return Err(SceneError::UnknownNode);
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::CyclicParent);
        }
        let node = self.nodes.get_mut(child).ok_or(SceneError::UnknownNode)?;
        if node.parent == parent {
            return Ok(());
        }
        if node.parent != self.root {
            return Err(SceneError::TransformAlreadyParented);
        }
        node.parent = parent;
        node.dirty = true;
        if parent != self.root {
            if let Some(p) = self.nodes.get_mut(parent) {
                p.children.push(child);
            }
        }
        Ok(())
    }

    /// Whether `ancestor` is on the parent chain of `key`
    pub fn is_ancestor(&self, ancestor: TransformKey, key: TransformKey) -> bool {
        let mut current = self.nodes.get(key).map(|n| n.parent);
        while let Some(parent) = current.filter(|p| *p != self.root) {
            if parent == ancestor {
                return true;
            }
            current = self.nodes.get(parent).map(|n| n.parent);
        }
        false
    }

    /// Detach `child` from `parent`; returns whether it was a child
    pub fn remove_child(&mut self, parent: TransformKey, child: TransformKey) -> bool {
        let Some(p) = self.nodes.get_mut(parent) else {
            return false;
        };
        let Some(index) = p.children.iter().position(|c| *c == child) else {
            return false;
        };
        p.children.remove(index);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = self.root;
            node.dirty = true;
        }
        true
    }

    /// Mark `key` for recomputation
    pub fn mark_dirty(&mut self, key: TransformKey) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.dirty = true;
        }
    }

    /// Whether `key` must be recomputed
    pub fn needs_recompute(&self, key: TransformKey) -> bool {
        self.nodes.get(key).is_some_and(|n| n.dirty)
    }

    /// Recompute `total = parent.total * local`
    ///
    /// When the result differs bitwise from the cache, or `force` is set,
    /// the cache is replaced, direct children are marked dirty and the
    /// changed flag is raised. Returns whether the total was replaced.
    pub fn compute(&mut self, key: TransformKey, force: bool) -> bool {
        if key == self.root {
            return false;
        }
        let Some(parent) = self.nodes.get(key).map(|n| n.parent) else {
            return false;
        };
        let parent_total = self.nodes.get(parent).map_or_else(Mat4::identity, |p| p.total);
        let Some(node) = self.nodes.get_mut(key) else {
            return false;
        };
        let total = parent_total * node.local;
        node.dirty = false;
        if !force && utils::bitwise_eq(&total, &node.total) {
            return false;
        }
        node.total = total;
        node.changed = true;
        let children = node.children.clone();
        for child in children {
            self.mark_dirty(child);
        }
        true
    }

    /// Take the pending change notification of `key`
    ///
    /// Returns the new total and clears the changed flag.
    pub fn raise_transform_changed(&mut self, key: TransformKey) -> Option<Mat4> {
        let node = self.nodes.get_mut(key)?;
        if !node.changed {
            return None;
        }
        node.changed = false;
        Some(node.total)
    }

    /// Keys in depth-first order, parents before children
    pub fn depth_first(&self) -> Vec<TransformKey> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<TransformKey> = self
            .nodes
            .iter()
            .filter(|(key, node)| *key != self.root && node.parent == self.root)
            .map(|(key, _)| key)
            .collect();
        stack.reverse();
        while let Some(key) = stack.pop() {
            order.push(key);
            if let Some(node) = self.nodes.get(key) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Vec3};
    use approx::assert_relative_eq;

    #[test]
    fn test_parent_child_composition() {
        let mut tree = TransformTree::new();
        let parent = tree.insert(Mat4::translation(1.0, 0.0, 0.0));
        let child = tree.insert(Mat4::translation(0.0, 2.0, 0.0));
        tree.add_child(parent, child).unwrap();

        tree.compute(parent, false);
        tree.compute(child, false);

        let total = tree.total(child).unwrap();
        let origin = utils::transform_point(&total, &Vec3::zeros());
        assert_relative_eq!(origin, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_reparenting_rejected() {
        let mut tree = TransformTree::new();
        let a = tree.insert(Mat4::identity());
        let b = tree.insert(Mat4::identity());
        let c = tree.insert(Mat4::identity());
        tree.add_child(a, c).unwrap();
        // Same parent again is fine
        tree.add_child(a, c).unwrap();
        assert!(matches!(tree.add_child(b, c), Err(SceneError::TransformAlreadyParented)));

        assert!(tree.remove_child(a, c));
        assert_eq!(tree.parent(c), None);
        tree.add_child(b, c).unwrap();
        assert_eq!(tree.parent(c), Some(b));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = TransformTree::new();
        let a = tree.insert(Mat4::identity());
        let b = tree.insert(Mat4::identity());
        let c = tree.insert(Mat4::identity());
        tree.add_child(a, b).unwrap();
        tree.add_child(b, c).unwrap();

        assert!(matches!(tree.add_child(b, a), Err(SceneError::CyclicParent)));
        assert!(matches!(tree.add_child(c, a), Err(SceneError::CyclicParent)));
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.depth_first(), vec![a, b, c]);

        tree.set_local(a, Mat4::translation(5.0, 0.0, 0.0)).unwrap();
        for key in tree.depth_first() {
            tree.compute(key, false);
        }
        let origin = utils::transform_point(&tree.total(c).unwrap(), &Vec3::zeros());
        assert_relative_eq!(origin, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_change_marks_children_dirty() {
        let mut tree = TransformTree::new();
        let parent = tree.insert(Mat4::identity());
        let child = tree.insert(Mat4::translation(0.0, 1.0, 0.0));
        tree.add_child(parent, child).unwrap();
        tree.compute(parent, false);
        tree.compute(child, false);
        assert!(!tree.needs_recompute(child));

        // Recomputing an unchanged parent leaves children alone
        tree.mark_dirty(parent);
        assert!(!tree.compute(parent, false));
        assert!(!tree.needs_recompute(child));

        tree.set_local(parent, Mat4::translation(5.0, 0.0, 0.0)).unwrap();
        assert!(tree.compute(parent, false));
        assert!(tree.needs_recompute(child));

        tree.compute(child, false);
        let origin = utils::transform_point(&tree.total(child).unwrap(), &Vec3::zeros());
        assert_relative_eq!(origin, Vec3::new(5.0, 1.0, 0.0));
    }

    #[test]
    fn test_force_raises_change() {
        let mut tree = TransformTree::new();
        let key = tree.insert(Mat4::identity());
        // Identity local against an identity cache: nothing changes
        assert!(!tree.compute(key, false));
        assert_eq!(tree.raise_transform_changed(key), None);

        assert!(tree.compute(key, true));
        assert_eq!(tree.raise_transform_changed(key), Some(Mat4::identity()));
        assert_eq!(tree.raise_transform_changed(key), None);
    }

    #[test]
    fn test_chain_reaches_fixed_point_in_any_order() {
        let mut tree = TransformTree::new();
        let keys: Vec<_> = (0..5)
            .map(|i| tree.insert(Mat4::translation(i as f32, 1.0, 0.0)))
            .collect();
        for pair in keys.windows(2) {
            tree.add_child(pair[0], pair[1]).unwrap();
        }

        // Leaf first: needs several passes to settle
        for _ in 0..keys.len() {
            for &key in keys.iter().rev() {
                if tree.needs_recompute(key) {
                    tree.compute(key, false);
                }
            }
        }

        let mut expected = Mat4::identity();
        for &key in &keys {
            expected = expected * tree.get(key).unwrap().local();
            assert_relative_eq!(tree.total(key).unwrap(), expected);
        }
    }

    #[test]
    fn test_remove_releases_children() {
        let mut tree = TransformTree::new();
        let parent = tree.insert(Mat4::identity());
        let child = tree.insert(Mat4::identity());
        tree.add_child(parent, child).unwrap();
        assert_eq!(tree.depth_first(), vec![parent, child]);

        tree.remove(parent);
        assert_eq!(tree.parent(child), None);
        assert!(tree.needs_recompute(child));
        assert_eq!(tree.len(), 1);
    }
}
