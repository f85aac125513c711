//! # Dynamic Octree
//!
//! A sparse octree over integer voxel coordinates, used per chunk to answer
//! "which voxel does this ray hit first" and "is this voxel occupied" without
//! scanning the flat chunk array.
//!
//! ## Structure
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Every node
//! covers an [`Aabc`] and is in exactly one of two states:
//!
//! * **leaf**: a unit cube holding one voxel and its payload, no children
//! * **interior**: no voxel, between one and eight children, each covering a
//!   distinct octant of the parent cube
//!
//! Children are materialised lazily, only for octants that contain voxels,
//! and their order carries no meaning. Each node also stores the index of its
//! parent. The link is purely navigational and is followed only when pruning
//! upwards after a removal.
//!
//! An empty tree has no root at all; there is no sentinel node.
//!
//! ## Growth and shrinkage
//!
//! Inserting a voxel outside the root cube wraps the root in successively
//! doubled cubes until it fits. Removing a voxel detaches its leaf, then
//! every ancestor left without children, and finally collapses the root
//! while it is an interior node with a single child. The root can therefore
//! change on any mutation, so callers must go through [`Octree::root`] rather
//! than caching node ids across mutations.
//!
//! ## Thread Safety
//!
//! The tree has no internal synchronisation. It is owned and mutated by a
//! single thread (the world owner); see `core::OwnedWorker`.

use cgmath::{InnerSpace, Point3, Vector3};

use super::{aabc::Aabc, coordinates::VoxelCoordinate};


/// Index of a node in an [`Octree`]'s arena.
///
/// Ids are only meaningful for the tree that handed them out and only until
/// its next mutation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A voxel stored in a leaf, together with its payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Leaf<T> {
    pub coordinate: VoxelCoordinate,
    pub payload: T,
}

/// One node of the octree.
#[derive(Clone, Debug)]
pub struct OctreeNode<T> {
    aabc: Aabc,
    leaf: Option<Leaf<T>>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl<T> OctreeNode<T> {
    fn new_leaf(aabc: Aabc, coordinate: VoxelCoordinate, payload: T, parent: Option<NodeId>) -> Self {
        OctreeNode {
            aabc,
            leaf: Some(Leaf {
                coordinate,
                payload,
            }),
            children: Vec::new(),
            parent,
        }
    }

    fn new_interior(aabc: Aabc, parent: Option<NodeId>) -> Self {
        OctreeNode {
            aabc,
            leaf: None,
            children: Vec::with_capacity(8),
            parent,
        }
    }

    /// The cube this node covers.
    pub fn aabc(&self) -> &Aabc {
        &self.aabc
    }

    /// The voxel held by this node, if it is a leaf.
    pub fn leaf(&self) -> Option<&Leaf<T>> {
        self.leaf.as_ref()
    }

    /// Materialised children of an interior node, in no particular order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The enclosing node, or `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }
}

/// The voxel a ray enters first, and how far along the ray that happens.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayIntersection {
    pub coordinate: VoxelCoordinate,
    /// Ray parameter at which the voxel's cube is entered, clamped to zero
    /// when the ray starts inside it.
    pub distance: f32,
}

/// Sparse, dynamically resized octree keyed by voxel coordinate.
#[derive(Clone, Debug)]
pub struct Octree<T> {
    nodes: Vec<Option<OctreeNode<T>>>,
    free_slots: Vec<usize>,
    root: Option<NodeId>,
    leaf_count: usize,
}

impl<T> Default for Octree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Octree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Octree {
            nodes: Vec::new(),
            free_slots: Vec::new(),
            root: None,
            leaf_count: 0,
        }
    }

    /// Builds a tree from `(coordinate, payload)` pairs. Later duplicates
    /// overwrite earlier ones.
    pub fn from_voxels<I>(voxels: I) -> Self
    where
        I: IntoIterator<Item = (VoxelCoordinate, T)>,
    {
        let mut tree = Self::new();
        for (coordinate, payload) in voxels {
            tree.insert(coordinate, payload);
        }
        tree
    }

    /// The current root, or `None` when the tree is empty.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The cube covered by the current root.
    pub fn root_aabc(&self) -> Option<Aabc> {
        self.root.map(|root| self.node(root).aabc)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of voxels stored.
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// Number of live nodes, leaves and interior nodes together.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_slots.len()
    }

    /// Looks up a node by id.
    ///
    /// # Panics
    /// Panics if `id` does not name a live node of this tree.
    pub fn node(&self, id: NodeId) -> &OctreeNode<T> {
        match self.nodes.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("octree node {:?} is not live", id),
        }
    }

    /// Number of materialised child links of `id`.
    pub fn count_children(&self, id: NodeId) -> usize {
        self.node(id).children.len()
    }

    /// Iterates over every stored voxel in arena order.
    pub fn leaves(&self) -> impl Iterator<Item = &Leaf<T>> {
        self.nodes
            .iter()
            .flatten()
            .filter_map(|node| node.leaf.as_ref())
    }

    /// Returns the payload stored at `coordinate`.
    pub fn get(&self, coordinate: VoxelCoordinate) -> Option<&T> {
        let leaf = self.find_leaf(coordinate)?;
        self.node(leaf).leaf.as_ref().map(|leaf| &leaf.payload)
    }

    /// Returns `true` if a voxel is stored at `coordinate`.
    pub fn contains(&self, coordinate: VoxelCoordinate) -> bool {
        self.find_leaf(coordinate).is_some()
    }

    /// Inserts a voxel, growing the root as needed.
    ///
    /// Re-inserting an occupied coordinate replaces the payload in place
    /// without changing the shape of the tree.
    ///
    /// # Arguments
    /// * `coordinate` - The voxel to store
    /// * `payload` - Data carried by the voxel's leaf
    ///
    /// # Returns
    /// The payload previously stored at `coordinate`, if any.
    pub fn insert(&mut self, coordinate: VoxelCoordinate, payload: T) -> Option<T> {
        let Some(mut root) = self.root else {
            let leaf = OctreeNode::new_leaf(Aabc::unit(coordinate), coordinate, payload, None);
            self.root = Some(self.allocate(leaf));
            self.leaf_count = 1;
            return None;
        };

        while !self.node(root).aabc.contains(coordinate) {
            let grown = self.node(root).aabc.expand_towards(coordinate);
            let new_root = self.allocate(OctreeNode::new_interior(grown, None));
            self.node_mut(new_root).children.push(root);
            self.node_mut(root).parent = Some(new_root);
            root = new_root;
        }
        self.root = Some(root);

        let previous = self.insert_below(root, coordinate, payload);
        if previous.is_none() {
            self.leaf_count += 1;
        }
        previous
    }

    /// Removes the voxel at `coordinate`, pruning emptied ancestors and
    /// collapsing single-child roots.
    ///
    /// # Returns
    /// The removed payload, or `None` if nothing was stored there.
    pub fn remove(&mut self, coordinate: VoxelCoordinate) -> Option<T> {
        let leaf = self.find_leaf(coordinate)?;
        let payload = self.prune(leaf);
        self.shrink_root();
        self.leaf_count -= 1;

        if self.root.is_none() {
            self.nodes.clear();
            self.free_slots.clear();
        }
        Some(payload)
    }

    /// Finds the voxel whose cube a ray enters first.
    ///
    /// Subtrees whose cube the ray misses are skipped entirely. No distance
    /// cutoff is applied. When two voxels are entered at exactly the same
    /// distance, whichever is visited first wins; the visiting order follows
    /// child order and is not guaranteed.
    ///
    /// # Arguments
    /// * `eye` - Ray origin
    /// * `direction` - Ray direction, normally normalised
    pub fn closest_intersect(
        &self,
        eye: Point3<f32>,
        direction: Vector3<f32>,
    ) -> Option<RayIntersection> {
        self.root
            .and_then(|root| self.closest_intersect_from(root, eye, direction))
    }

    /// Collects, depth first, every voxel whose leaf and ancestors all
    /// satisfy `predicate`. A node failing the predicate hides its whole
    /// subtree.
    pub fn find<P>(&self, mut predicate: P) -> Vec<VoxelCoordinate>
    where
        P: FnMut(&OctreeNode<T>) -> bool,
    {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();

        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if !predicate(node) {
                continue;
            }
            match &node.leaf {
                Some(leaf) => found.push(leaf.coordinate),
                None => stack.extend(node.children.iter().rev()),
            }
        }

        found
    }

    /// The stored voxel whose centre is nearest to `point`.
    pub fn closest_to(&self, point: Point3<f32>) -> Option<VoxelCoordinate> {
        let voxels: Vec<VoxelCoordinate> = self.leaves().map(|leaf| leaf.coordinate).collect();
        closest_voxel(&voxels, point)
    }

    fn closest_intersect_from(
        &self,
        id: NodeId,
        eye: Point3<f32>,
        direction: Vector3<f32>,
    ) -> Option<RayIntersection> {
        let node = self.node(id);
        let entry = node.aabc.intersect_ray(eye, direction)?;

        if let Some(leaf) = &node.leaf {
            return Some(RayIntersection {
                coordinate: leaf.coordinate,
                distance: entry.max(0.0),
            });
        }

        let mut closest: Option<RayIntersection> = None;
        for &child in &node.children {
            if let Some(hit) = self.closest_intersect_from(child, eye, direction) {
                if closest.map_or(true, |best| hit.distance < best.distance) {
                    closest = Some(hit);
                }
            }
        }
        closest
    }

    fn insert_below(&mut self, start: NodeId, coordinate: VoxelCoordinate, payload: T) -> Option<T> {
        let mut current = start;
        loop {
            if let Some(leaf) = self.node_mut(current).leaf.as_mut() {
                assert_eq!(
                    leaf.coordinate, coordinate,
                    "unit leaf {:?} reached while inserting another voxel",
                    current
                );
                return Some(std::mem::replace(&mut leaf.payload, payload));
            }

            let existing = self
                .node(current)
                .children
                .iter()
                .copied()
                .find(|&child| self.node(child).aabc.contains(coordinate));

            if let Some(child) = existing {
                current = child;
                continue;
            }

            let aabc = self.node(current).aabc.child_containing(coordinate);
            if aabc.size == 1 {
                let leaf = self.allocate(OctreeNode::new_leaf(aabc, coordinate, payload, Some(current)));
                self.node_mut(current).children.push(leaf);
                return None;
            }

            let child = self.allocate(OctreeNode::new_interior(aabc, Some(current)));
            self.node_mut(current).children.push(child);
            current = child;
        }
    }

    fn find_leaf(&self, coordinate: VoxelCoordinate) -> Option<NodeId> {
        let mut current = self.root?;
        loop {
            let node = self.node(current);
            if !node.aabc.contains(coordinate) {
                return None;
            }
            if let Some(leaf) = &node.leaf {
                return (leaf.coordinate == coordinate).then_some(current);
            }
            current = node
                .children
                .iter()
                .copied()
                .find(|&child| self.node(child).aabc.contains(coordinate))?;
        }
    }

    /// Detaches `leaf_id`, then every ancestor that is left without children.
    fn prune(&mut self, leaf_id: NodeId) -> T {
        let released = self.release(leaf_id);
        let payload = match released.leaf {
            Some(leaf) => leaf.payload,
            None => panic!("octree node {:?} pruned as a leaf but has no voxel", leaf_id),
        };

        let mut detached = leaf_id;
        let mut parent = released.parent;
        loop {
            let Some(parent_id) = parent else {
                self.root = None;
                break;
            };

            let node = self.node_mut(parent_id);
            node.children.retain(|&child| child != detached);
            if !node.children.is_empty() {
                break;
            }

            parent = self.release(parent_id).parent;
            detached = parent_id;
        }

        payload
    }

    fn shrink_root(&mut self) {
        while let Some(root) = self.root {
            let node = self.node(root);
            if node.leaf.is_some() || node.children.len() != 1 {
                break;
            }
            let only_child = node.children[0];
            self.release(root);
            self.node_mut(only_child).parent = None;
            self.root = Some(only_child);
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut OctreeNode<T> {
        match self.nodes.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("octree node {:?} is not live", id),
        }
    }

    fn allocate(&mut self, node: OctreeNode<T>) -> NodeId {
        match self.free_slots.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> OctreeNode<T> {
        let node = match self.nodes.get_mut(id.0).and_then(Option::take) {
            Some(node) => node,
            None => panic!("octree node {:?} released twice", id),
        };
        self.free_slots.push(id.0);
        node
    }
}

/// Picks the voxel whose centre is nearest to `point` in straight-line
/// distance. Pairs with [`Octree::find`] for the collect-then-pick selection
/// strategy.
pub fn closest_voxel(voxels: &[VoxelCoordinate], point: Point3<f32>) -> Option<VoxelCoordinate> {
    voxels.iter().copied().min_by(|a, b| {
        let da = (Aabc::unit(*a).center_f32() - point).magnitude2();
        let db = (Aabc::unit(*b).center_f32() - point).magnitude2();
        da.total_cmp(&db)
    })
}
