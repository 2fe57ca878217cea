//! Octree spatial partitioning structure
//!
//! Divides a bounded region into hierarchical octants for fast ray and
//! box queries. Each node subdivides into 8 octants when its item
//! count exceeds the configured threshold. Items are any small `Copy`
//! handle: primitive indices for geometry, node keys for the scene index.

use super::{BoundingBox, Ray};
use crate::config::OctreeConfig;
use crate::foundation::math::Vec3;

/// Item stored in the octree with its position and radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeItem<T> {
    /// Caller handle
    pub value: T,
    /// Representative position
    pub position: Vec3,
    /// Extent around the position
    pub radius: f32,
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode<T> {
    /// Bounds of this node
    pub bounds: BoundingBox,

    /// Items contained in this node
    pub items: Vec<OctreeItem<T>>,

    /// Child nodes (8 octants), None if this is a leaf
    pub children: Option<Box<[OctreeNode<T>; 8]>>,

    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl<T: Copy> OctreeNode<T> {
    /// Create a new leaf node
    pub fn new(bounds: BoundingBox, depth: u32) -> Self {
        Self {
            bounds,
            items: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Octant index (0-7) for a position within this node's bounds
    ///
    /// Bit 0 is +X, bit 1 is +Y, bit 2 is +Z.
    fn octant_index(&self, position: Vec3) -> usize {
        let center = self.bounds.center();
        let x_bit = usize::from(position.x >= center.x);
        let y_bit = usize::from(position.y >= center.y);
        let z_bit = usize::from(position.z >= center.z);
        (z_bit << 2) | (y_bit << 1) | x_bit
    }

    /// Subdivide this node into 8 children and push items down
    fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }

        let center = self.bounds.center();
        let quarter_extents = self.bounds.extents() * 0.5;
        let depth = self.depth + 1;

        let mut children: Box<[OctreeNode<T>; 8]> = Box::new(std::array::from_fn(|octant| {
            let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
            let child_center = Vec3::new(
                center.x + quarter_extents.x * sign(1),
                center.y + quarter_extents.y * sign(2),
                center.z + quarter_extents.z * sign(4),
            );
            OctreeNode::new(BoundingBox::from_center_extents(child_center, quarter_extents), depth)
        }));

        for item in std::mem::take(&mut self.items) {
            let octant = self.octant_index(item.position);
            children[octant].items.push(item);
        }
        self.children = Some(children);
    }

    /// Insert an item into this node
    pub fn insert(&mut self, item: OctreeItem<T>, config: &OctreeConfig) -> bool {
        if !self.bounds.contains_point(item.position) {
            return false;
        }

        if self.is_leaf() {
            let should_subdivide = self.items.len() >= config.max_items_per_node
                && self.depth < config.max_depth
                && self.bounds.extents().max() > config.min_node_size;

            if !should_subdivide {
                self.items.push(item);
                return true;
            }
            self.subdivide();
        }

        let octant = self.octant_index(item.position);
        match self.children {
            Some(ref mut children) => children[octant].insert(item, config),
            None => false,
        }
    }

    /// Collect items of every node whose bounds, grown by `expansion`, pass `accept`
    pub fn query_with<F>(&self, expansion: f32, accept: &mut F, results: &mut Vec<OctreeItem<T>>)
    where
        F: FnMut(&BoundingBox) -> bool,
    {
        // Items may extend beyond the node that stores them
        let expanded = if expansion > 0.0 { self.bounds.expand(expansion) } else { self.bounds };
        if !accept(&expanded) {
            return;
        }

        results.extend_from_slice(&self.items);

        if let Some(ref children) = self.children {
            for child in children.iter() {
                child.query_with(expansion, accept, results);
            }
        }
    }

    /// Count items in this node and all children
    pub fn count_items(&self) -> usize {
        self.items.len()
            + self
                .children
                .as_ref()
                .map_or(0, |children| children.iter().map(OctreeNode::count_items).sum())
    }
}

/// Octree over a fixed region
#[derive(Debug, Clone)]
pub struct Octree<T> {
    /// Root node containing the entire region
    pub root: OctreeNode<T>,

    config: OctreeConfig,

    /// Largest item radius seen, used to grow node bounds during queries
    max_item_radius: f32,
}

impl<T: Copy> Octree<T> {
    /// Create an empty octree over `bounds`
    pub fn new(bounds: BoundingBox, config: OctreeConfig) -> Self {
        Self {
            root: OctreeNode::new(bounds, 0),
            config,
            max_item_radius: 0.0,
        }
    }

    /// Build from `(value, position, radius)` triples; items outside `bounds` are skipped
    pub fn build(
        bounds: BoundingBox,
        config: OctreeConfig,
        items: impl IntoIterator<Item = (T, Vec3, f32)>,
    ) -> Self {
        let mut tree = Self::new(bounds, config);
        let mut rejected = 0_usize;
        for (value, position, radius) in items {
            if !tree.insert(value, position, radius) {
                rejected += 1;
            }
        }
        if rejected > 0 {
            log::warn!("octree build rejected {rejected} items outside its bounds");
        }
        tree
    }

    /// Insert an item; false when its position lies outside the root bounds
    pub fn insert(&mut self, value: T, position: Vec3, radius: f32) -> bool {
        let item = OctreeItem { value, position, radius };
        if !self.root.insert(item, &self.config) {
            return false;
        }
        self.max_item_radius = self.max_item_radius.max(radius);
        true
    }

    /// Candidate items in nodes the ray passes through
    ///
    /// Callers still test each candidate exactly.
    pub fn query_ray(&self, ray: &Ray) -> Vec<OctreeItem<T>> {
        self.query_with(|bounds| bounds.intersect_ray(ray).is_some())
    }

    /// Candidate items in nodes whose grown bounds satisfy `accept`
    pub fn query_with<F>(&self, mut accept: F) -> Vec<OctreeItem<T>>
    where
        F: FnMut(&BoundingBox) -> bool,
    {
        let mut results = Vec::new();
        self.root.query_with(self.max_item_radius, &mut accept, &mut results);
        results
    }

    /// Total item count
    pub fn item_count(&self) -> usize {
        self.root.count_items()
    }

}
