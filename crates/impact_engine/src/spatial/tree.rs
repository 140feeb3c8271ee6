//! Hierarchical spatial index
//!
//! Recursive 2^D-ary subdivision of the world bound (a quadtree in 2D, an
//! octree in 3D), generalizing the flat grid to non-uniform shape
//! densities: crowded regions subdivide further, empty regions stay
//! coarse. The external contract matches [`Grid`](crate::spatial::Grid) —
//! for the same input, both must report the identical set of colliding
//! pairs.

use crate::foundation::math::Point;
use crate::foundation::pair_flags::PairFlags;
use crate::geometry::{intersect, intersect_ray, Aabb, Ray, Shape};
use crate::spatial::{ordered_pair, ShapeId, SpatialError, SpatialIndex};
use log::debug;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Same boundary clamp as the grid, keeping edge points in one node.
const EDGE_TOLERANCE: f32 = 1e-5;

/// Tuning knobs for [`Tree`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Shape count above which a node subdivides
    pub max_shapes_per_node: usize,
    /// Hard ceiling on subdivision depth
    pub max_depth: u32,
    /// Nodes with a smallest side at or below this never subdivide
    pub min_node_extent: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_shapes_per_node: 8,
            max_depth: 8,
            min_node_extent: 1.0,
        }
    }
}

/// Diagnostic view of one tree node
#[derive(Debug, Clone, Copy)]
pub struct TreeNodeInfo<const D: usize> {
    /// World-space bounds of the node
    pub bounds: Aabb<D>,
    /// Depth in the tree (0 = root)
    pub depth: u32,
    /// Number of shapes bucketed at the node
    pub occupancy: usize,
}

#[derive(Debug, Clone)]
struct TreeNode<const D: usize> {
    bounds: Aabb<D>,
    depth: u32,
    /// Slots of shapes bucketed here (leaves only after building)
    slots: Vec<u32>,
    /// 2^D children once subdivided
    children: Option<Vec<TreeNode<D>>>,
}

impl<const D: usize> TreeNode<D> {
    fn new(bounds: Aabb<D>, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            slots: Vec::new(),
            children: None,
        }
    }

    /// Splits into 2^D children and redistributes the slots; a shape whose
    /// bounds straddle a splitting plane lands in every touched child.
    fn subdivide(&mut self, shapes: &[Shape<D>], config: &TreeConfig, depth_limit: u32) {
        let too_small = {
            let extents = self.bounds.extents();
            (0..D).map(|i| extents[i] * 2.0).fold(f32::INFINITY, f32::min)
                <= config.min_node_extent
        };
        if self.slots.len() <= config.max_shapes_per_node
            || self.depth >= depth_limit
            || too_small
        {
            return;
        }

        let center = self.bounds.center();
        let mut children: Vec<TreeNode<D>> = Vec::with_capacity(1 << D);
        for octant in 0..(1usize << D) {
            let min = Point::from_fn(|i, _| {
                if octant >> i & 1 == 1 {
                    center[i]
                } else {
                    self.bounds.min[i]
                }
            });
            let max = Point::from_fn(|i, _| {
                if octant >> i & 1 == 1 {
                    self.bounds.max[i]
                } else {
                    center[i]
                }
            });
            children.push(TreeNode::new(Aabb::new(min, max), self.depth + 1));
        }

        for &slot in &self.slots {
            let bounds = shapes[slot as usize].bounds();
            for child in &mut children {
                if child.bounds.intersects(&bounds) {
                    child.slots.push(slot);
                }
            }
        }
        self.slots.clear();

        for child in &mut children {
            child.subdivide(shapes, config, depth_limit);
        }
        self.children = Some(children);
    }
}

/// Collects references to every leaf under `node`.
fn collect_leaves<'a, const D: usize>(node: &'a TreeNode<D>, out: &mut Vec<&'a TreeNode<D>>) {
    match &node.children {
        None => out.push(node),
        Some(children) => {
            for child in children {
                collect_leaves(child, out);
            }
        }
    }
}

/// Collects leaves whose bounds overlap `region`.
fn collect_leaves_in<'a, const D: usize>(
    node: &'a TreeNode<D>,
    region: &Aabb<D>,
    out: &mut Vec<&'a TreeNode<D>>,
) {
    if !node.bounds.intersects(region) {
        return;
    }
    match &node.children {
        None => out.push(node),
        Some(children) => {
            for child in children {
                collect_leaves_in(child, region, out);
            }
        }
    }
}

/// Descends to the leaf containing `point` (point must be inside the root).
fn find_leaf<'a, const D: usize>(node: &'a TreeNode<D>, point: &Point<D>) -> &'a TreeNode<D> {
    match &node.children {
        None => node,
        Some(children) => {
            for child in children {
                if child.bounds.contains_point(point) {
                    return find_leaf(child, point);
                }
            }
            // Numerically on the outer boundary: fall back to the node.
            node
        }
    }
}

/// Collects leaves along a ray, pruned by node bounds.
fn collect_leaves_on_ray<'a, const D: usize>(
    node: &'a TreeNode<D>,
    ray: &Ray<D>,
    out: &mut Vec<&'a TreeNode<D>>,
) {
    if node.bounds.intersect_ray(ray).is_none() {
        return;
    }
    match &node.children {
        None => out.push(node),
        Some(children) => {
            for child in children {
                collect_leaves_on_ray(child, ray, out);
            }
        }
    }
}

/// Hierarchical spatial index over a fixed world bound
///
/// `I` is the shape handle type (`u16` or `u32`); `D` the coordinate
/// dimension. Like the grid, every `insert` is a full rebuild.
#[derive(Debug, Clone)]
pub struct Tree<I, const D: usize> {
    root: TreeNode<D>,
    config: TreeConfig,
    shapes: Vec<Shape<D>>,
    flags: PairFlags,
    _marker: PhantomData<I>,
}

impl<I: ShapeId, const D: usize> Tree<I, D> {
    /// Creates an empty tree over the given world bound
    pub fn new(root: Aabb<D>) -> Self {
        Self::with_config(root, TreeConfig::default())
    }

    /// Creates an empty tree with explicit configuration
    pub fn with_config(root: Aabb<D>, config: TreeConfig) -> Self {
        Self {
            root: TreeNode::new(root, 0),
            config,
            shapes: Vec::new(),
            flags: PairFlags::default(),
            _marker: PhantomData,
        }
    }

    /// The world bound the tree partitions
    pub fn root_bounds(&self) -> &Aabb<D> {
        &self.root.bounds
    }

    /// Replaces the world bound and drops all indexed shapes
    pub fn resize(&mut self, new_root: Aabb<D>) {
        self.root = TreeNode::new(new_root, 0);
        self.shapes.clear();
        self.flags.reset(0);
    }

    /// Deepest level present in the tree
    pub fn depth(&self) -> u32 {
        let mut leaves = Vec::new();
        collect_leaves(&self.root, &mut leaves);
        leaves.iter().map(|leaf| leaf.depth).max().unwrap_or(0)
    }

    /// Total number of nodes, branches included
    pub fn node_count(&self) -> usize {
        fn count<const D: usize>(node: &TreeNode<D>) -> usize {
            1 + node.children.as_ref().map_or(0, |children| {
                children.iter().map(count).sum()
            })
        }
        count(&self.root)
    }

    /// Diagnostic info for the leaf containing `point`
    pub fn get_node(&self, point: &Point<D>) -> TreeNodeInfo<D> {
        let leaf = find_leaf(&self.root, &self.clamp_point(point));
        TreeNodeInfo {
            bounds: leaf.bounds,
            depth: leaf.depth,
            occupancy: leaf.slots.len(),
        }
    }

    fn clamp_point(&self, point: &Point<D>) -> Point<D> {
        let bounds = &self.root.bounds;
        Point::from_fn(|i, _| {
            let eps = (bounds.max[i] - bounds.min[i]) * EDGE_TOLERANCE;
            point[i].clamp(bounds.min[i] + eps, bounds.max[i] - eps)
        })
    }

    /// Depth needed so leaf occupancy can reach the configured maximum,
    /// bounded by the configured hard ceiling.
    fn depth_limit(&self, count: usize) -> u32 {
        if count <= 1 {
            return 0;
        }
        let branches = (1usize << D) as f32;
        let derived = ((count as f32).ln() / branches.ln()).ceil() as u32 + 1;
        derived.min(self.config.max_depth)
    }

    /// Deduplicated intersecting pairs across the given leaves.
    fn pairs_in_leaves(&mut self, leaves: &[&TreeNode<D>]) -> Vec<(I, I)> {
        let mut out = Vec::new();
        let mut tested = std::mem::take(&mut self.flags);
        tested.clear();
        for leaf in leaves {
            for (i, &sa) in leaf.slots.iter().enumerate() {
                for &sb in &leaf.slots[i + 1..] {
                    let (a, b) = (sa as usize, sb as usize);
                    if tested.test_and_set(a, b) {
                        continue;
                    }
                    if intersect(&self.shapes[a], &self.shapes[b]) {
                        out.push(ordered_pair(I::from_index(a), I::from_index(b)));
                    }
                }
            }
        }
        self.flags = tested;
        out
    }
}

impl<I: ShapeId, const D: usize> SpatialIndex<I, D> for Tree<I, D> {
    fn insert(&mut self, shapes: &[Shape<D>]) -> Result<(), SpatialError> {
        if shapes.len() > I::MAX_COUNT {
            return Err(SpatialError::CapacityExceeded {
                count: shapes.len(),
                max: I::MAX_COUNT,
            });
        }

        self.shapes = shapes.to_vec();
        let bounds = self.root.bounds;
        self.root = TreeNode::new(bounds, 0);
        self.root.slots = (0..shapes.len() as u32).collect();

        let depth_limit = self.depth_limit(shapes.len());
        self.root.subdivide(&self.shapes, &self.config, depth_limit);
        self.flags.reset(shapes.len());

        debug!(
            "tree rebuilt: {} shapes, {} nodes, depth {}",
            shapes.len(),
            self.node_count(),
            self.depth()
        );
        Ok(())
    }

    fn get_collisions(&mut self) -> Vec<(I, I)> {
        let bounds = self.root.bounds;
        let root = std::mem::replace(&mut self.root, TreeNode::new(bounds, 0));
        let mut leaves = Vec::new();
        collect_leaves(&root, &mut leaves);
        let pairs = self.pairs_in_leaves(&leaves);
        drop(leaves);
        self.root = root;
        pairs
    }

    fn get_collisions_at(&mut self, point: &Point<D>) -> Vec<(I, I)> {
        let clamped = self.clamp_point(point);
        let bounds = self.root.bounds;
        let root = std::mem::replace(&mut self.root, TreeNode::new(bounds, 0));
        let leaf = find_leaf(&root, &clamped);
        let pairs = self.pairs_in_leaves(&[leaf]);
        self.root = root;
        pairs
    }

    fn get_collisions_ray(&mut self, ray: &Ray<D>) -> Vec<(I, Point<D>)> {
        let mut leaves = Vec::new();
        collect_leaves_on_ray(&self.root, ray, &mut leaves);

        let mut seen = vec![false; self.shapes.len()];
        let mut hits: Vec<(I, Point<D>, f32)> = Vec::new();
        let dir_sq = ray.direction.norm_squared();
        for leaf in leaves {
            for &slot in &leaf.slots {
                let slot = slot as usize;
                if seen[slot] {
                    continue;
                }
                seen[slot] = true;
                if let Some(point) = intersect_ray(&self.shapes[slot], ray) {
                    let t = if dir_sq > 0.0 {
                        (point - ray.origin).dot(&ray.direction) / dir_sq
                    } else {
                        0.0
                    };
                    hits.push((I::from_index(slot), point, t));
                }
            }
        }
        // Nearest hits first; ids break exact distance ties.
        hits.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0)));
        hits.into_iter().map(|(id, point, _)| (id, point)).collect()
    }

    fn get_overlap(&mut self, region: &Shape<D>) -> Vec<(I, I)> {
        let region_bounds = region.bounds();
        let root_bounds = self.root.bounds;
        let root = std::mem::replace(&mut self.root, TreeNode::new(root_bounds, 0));
        let mut leaves = Vec::new();
        collect_leaves_in(&root, &region_bounds, &mut leaves);
        let pairs = self.pairs_in_leaves(&leaves);
        drop(leaves);
        self.root = root;
        pairs
    }

    fn point_inside(&self, point: &Point<D>) -> Vec<I> {
        let leaf = find_leaf(&self.root, &self.clamp_point(point));
        leaf.slots
            .iter()
            .map(|&slot| I::from_index(slot as usize))
            .collect()
    }

    fn len(&self) -> usize {
        self.shapes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;
    use crate::spatial::Grid;
    use std::collections::HashSet;

    fn world2() -> Aabb<2> {
        Aabb::new(Vec2::new(-10.0, -10.0), Vec2::new(10.0, 10.0))
    }

    fn scattered_shapes(count: usize, seed: u32) -> Vec<Shape<2>> {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1 << 24) as f32
        };
        (0..count)
            .map(|i| {
                let x = next() * 16.0 - 8.0;
                let y = next() * 16.0 - 8.0;
                let r = next() * 1.2 + 0.2;
                if i % 3 == 0 {
                    Shape::aabb(Vec2::new(x - r, y - r), Vec2::new(x + r, y + r))
                } else {
                    Shape::sphere(Vec2::new(x, y), r)
                }
            })
            .collect()
    }

    #[test]
    fn test_subdivides_under_load() {
        let shapes = scattered_shapes(64, 7);
        let mut tree: Tree<u32, 2> = Tree::new(world2());
        tree.insert(&shapes).unwrap();
        assert!(tree.node_count() > 1, "64 shapes must force a subdivision");
        assert!(tree.depth() >= 1);
    }

    #[test]
    fn test_matches_grid_pair_set() {
        for seed in [3u32, 99, 4242] {
            let shapes = scattered_shapes(56, seed);

            let mut tree: Tree<u32, 2> = Tree::new(world2());
            tree.insert(&shapes).unwrap();
            let mut grid: Grid<u32, 2> = Grid::new(world2());
            grid.insert(&shapes).unwrap();

            let from_tree: HashSet<(u32, u32)> = tree.get_collisions().into_iter().collect();
            let from_grid: HashSet<(u32, u32)> = grid.get_collisions().into_iter().collect();
            assert_eq!(from_tree, from_grid, "seed {seed}");
        }
    }

    #[test]
    fn test_no_duplicate_pairs() {
        // One large box overlapping many leaves plus small shapes inside it.
        let mut shapes = vec![Shape::aabb(Vec2::new(-9.0, -9.0), Vec2::new(9.0, 9.0))];
        shapes.extend(scattered_shapes(40, 11));

        let mut tree: Tree<u32, 2> = Tree::new(world2());
        tree.insert(&shapes).unwrap();
        let pairs = tree.get_collisions();
        let unique: HashSet<(u32, u32)> = pairs.iter().copied().collect();
        assert_eq!(unique.len(), pairs.len());
    }

    #[test]
    fn test_collisions_at_point() {
        let shapes = vec![
            Shape::sphere(Vec2::new(-6.0, -6.0), 1.0),
            Shape::sphere(Vec2::new(-5.5, -6.0), 1.0),
            Shape::sphere(Vec2::new(6.0, 6.0), 1.0),
        ];
        let config = TreeConfig {
            max_shapes_per_node: 1,
            ..TreeConfig::default()
        };
        let mut tree: Tree<u32, 2> = Tree::with_config(world2(), config);
        tree.insert(&shapes).unwrap();

        let local = tree.get_collisions_at(&Vec2::new(-6.0, -6.0));
        assert_eq!(local, vec![(0, 1)]);
        assert!(tree.get_collisions_at(&Vec2::new(6.0, 6.0)).is_empty());
    }

    #[test]
    fn test_ray_hits_sorted_by_distance() {
        let shapes = vec![
            Shape::sphere(Vec2::new(6.0, 0.0), 1.0),
            Shape::sphere(Vec2::new(2.0, 0.0), 1.0),
        ];
        let mut tree: Tree<u32, 2> = Tree::new(world2());
        tree.insert(&shapes).unwrap();

        let hits = tree.get_collisions_ray(&Ray::new(Vec2::new(-9.0, 0.0), Vec2::new(1.0, 0.0)));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, 1, "nearer sphere first");
        assert!((hits[0].1.x - 1.0).abs() < 1e-4);
        assert_eq!(hits[1].0, 0);
        assert!((hits[1].1.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_overlap_region_restricts() {
        let shapes = vec![
            Shape::sphere(Vec2::new(-7.0, -7.0), 1.0),
            Shape::sphere(Vec2::new(-6.5, -7.0), 1.0),
            Shape::sphere(Vec2::new(7.0, 7.0), 1.0),
            Shape::sphere(Vec2::new(7.5, 7.0), 1.0),
        ];
        let config = TreeConfig {
            max_shapes_per_node: 1,
            ..TreeConfig::default()
        };
        let mut tree: Tree<u32, 2> = Tree::with_config(world2(), config);
        tree.insert(&shapes).unwrap();

        let region = Shape::aabb(Vec2::new(-10.0, -10.0), Vec2::new(-4.0, -4.0));
        assert_eq!(tree.get_overlap(&region), vec![(0, 1)]);
    }

    #[test]
    fn test_point_inside_and_node_info() {
        let shapes = vec![
            Shape::sphere(Vec2::new(-6.0, -6.0), 1.0),
            Shape::sphere(Vec2::new(6.0, 6.0), 1.0),
        ];
        let config = TreeConfig {
            max_shapes_per_node: 1,
            ..TreeConfig::default()
        };
        let mut tree: Tree<u32, 2> = Tree::with_config(world2(), config);
        tree.insert(&shapes).unwrap();

        assert_eq!(tree.point_inside(&Vec2::new(-6.0, -6.0)), vec![0]);

        let info = tree.get_node(&Vec2::new(-6.0, -6.0));
        assert!(info.depth >= 1);
        assert_eq!(info.occupancy, 1);
        assert!(info.bounds.contains_point(&Vec2::new(-6.0, -6.0)));
    }

    #[test]
    fn test_empty_tree() {
        let mut tree: Tree<u16, 2> = Tree::new(world2());
        tree.insert(&[]).unwrap();
        assert!(tree.is_empty());
        assert!(tree.get_collisions().is_empty());
        assert_eq!(tree.node_count(), 1);
    }
}
