//! Uniform grid spatial index
//!
//! Partitions the world bound into `scale^D` equal cells held in one flat
//! array, so locating a cell is integer arithmetic on the coordinates
//! rather than a tree walk. Shapes are bucketed into every cell their
//! bounds overlap; pair queries enumerate within-cell pairs and suppress
//! duplicates with a pair bitset. The whole structure is rebuilt on every
//! `insert` — there is no incremental update path.

use crate::foundation::math::{utils, Point, Vector};
use crate::foundation::pair_flags::PairFlags;
use crate::foundation::sort::radix_sort_pairs;
use crate::geometry::{intersect, intersect_ray, Aabb, Ray, Shape};
use crate::spatial::{ordered_pair, ShapeId, SpatialError, SpatialIndex};
use log::debug;
use serde::{Deserialize, Serialize};

/// Fraction of the world extent shaved off each side before computing cell
/// coordinates, so points exactly on a cell boundary land deterministically
/// in one cell.
const EDGE_TOLERANCE: f32 = 1e-5;

/// Hard ceiling on the flat cell array, whatever the scale heuristic says.
const MAX_CELLS: usize = 1 << 22;

/// Tuning knobs for [`Grid`]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GridConfig {
    /// Fixed subdivisions per axis; `None` derives them from the data
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scale: Option<u32>,
}

/// Uniform grid over a fixed world bound
///
/// `I` is the shape handle type (`u16` or `u32`) and bounds how many shapes
/// one grid can hold; `D` is the coordinate dimension.
#[derive(Debug, Clone)]
pub struct Grid<I, const D: usize> {
    root: Aabb<D>,
    config: GridConfig,
    scale: u32,
    cell_size: Vector<D>,
    /// Per-cell lists of slots into `shapes`
    cells: Vec<Vec<u32>>,
    /// Shapes reordered by cell key for locality
    shapes: Vec<Shape<D>>,
    /// Slot -> id handed out in results (original insertion index)
    ids: Vec<I>,
    flags: PairFlags,
}

impl<I: ShapeId, const D: usize> Grid<I, D> {
    /// Creates an empty grid over the given world bound
    pub fn new(root: Aabb<D>) -> Self {
        Self::with_config(root, GridConfig::default())
    }

    /// Creates an empty grid with explicit configuration
    pub fn with_config(root: Aabb<D>, config: GridConfig) -> Self {
        Self {
            root,
            config,
            scale: 1,
            cell_size: root.max - root.min,
            cells: vec![Vec::new()],
            shapes: Vec::new(),
            ids: Vec::new(),
            flags: PairFlags::default(),
        }
    }

    /// Subdivisions per axis chosen by the last `insert`
    pub fn get_scale(&self) -> u32 {
        self.scale
    }

    /// The world bound the grid partitions
    pub fn root(&self) -> &Aabb<D> {
        &self.root
    }

    /// Replaces the world bound and drops all indexed shapes
    ///
    /// The next `insert` rebuilds against the new bound.
    pub fn resize(&mut self, new_root: Aabb<D>) {
        self.root = new_root;
        self.scale = 1;
        self.cell_size = new_root.max - new_root.min;
        self.cells = vec![Vec::new()];
        self.shapes.clear();
        self.ids.clear();
        self.flags.reset(0);
    }

    /// Scale heuristic: enough subdivisions that a cell is no smaller than
    /// the largest shape, capped so the cell count stays proportional to
    /// the shape count. Always a power of two, always at least 1.
    fn compute_scale(&self, shapes: &[Shape<D>]) -> u32 {
        let mut scale = if let Some(fixed) = self.config.scale {
            fixed.max(1)
        } else if shapes.is_empty() {
            1
        } else {
            let world_extent = (0..D)
                .map(|i| self.root.max[i] - self.root.min[i])
                .fold(0.0f32, f32::max);
            let max_shape_extent = shapes
                .iter()
                .map(|s| s.bounding_radius() * 2.0)
                .fold(0.0f32, f32::max)
                .max(world_extent * 1e-4);

            let ratio = (world_extent / max_shape_extent).max(1.0);
            let exponent = (ratio.log2().ceil() as u32).min(31);

            // Bound the total cell count by roughly the shape count.
            let cap = (shapes.len() as f32).powf(1.0 / D as f32).ceil() as u32;
            (1u32 << exponent).min(utils::prev_pow2(cap)).max(1)
        };

        while scale > 1
            && (scale as usize)
                .checked_pow(D as u32)
                .map_or(true, |cells| cells > MAX_CELLS)
        {
            scale >>= 1;
        }
        scale
    }

    /// Clamps a point into the world bound shrunk by the edge tolerance.
    fn clamp_point(&self, point: &Point<D>) -> Point<D> {
        Point::from_fn(|i, _| {
            let eps = (self.root.max[i] - self.root.min[i]) * EDGE_TOLERANCE;
            point[i].clamp(self.root.min[i] + eps, self.root.max[i] - eps)
        })
    }

    /// Integer cell coordinates of an already-clamped point.
    fn cell_coords(&self, point: &Point<D>) -> [u32; D] {
        let mut coords = [0u32; D];
        for i in 0..D {
            if self.cell_size[i] > 0.0 {
                let c = ((point[i] - self.root.min[i]) / self.cell_size[i]).floor();
                coords[i] = (c.max(0.0) as u32).min(self.scale - 1);
            }
        }
        coords
    }

    /// Flattens cell coordinates into an index into the cell array.
    fn cell_key(&self, coords: &[u32; D]) -> usize {
        let mut key = 0usize;
        let mut stride = 1usize;
        for i in 0..D {
            key += coords[i] as usize * stride;
            stride *= self.scale as usize;
        }
        key
    }

    /// Keys of every cell in the axis-aligned coordinate range `lo..=hi`.
    fn cell_keys_in_range(&self, lo: &[u32; D], hi: &[u32; D]) -> Vec<usize> {
        let mut keys = Vec::new();
        let mut coords = *lo;
        loop {
            keys.push(self.cell_key(&coords));
            let mut axis = 0;
            loop {
                if axis == D {
                    return keys;
                }
                if coords[axis] < hi[axis] {
                    coords[axis] += 1;
                    break;
                }
                coords[axis] = lo[axis];
                axis += 1;
            }
        }
    }

    /// Keys of every cell overlapped by `bounds` (clamped to the world).
    fn cell_keys_for_bounds(&self, bounds: &Aabb<D>) -> Vec<usize> {
        let lo = self.cell_coords(&self.clamp_point(&bounds.min));
        let hi = self.cell_coords(&self.clamp_point(&bounds.max));
        self.cell_keys_in_range(&lo, &hi)
    }

    /// Deduplicated intersecting pairs across the given cells.
    fn pairs_in_cells(&mut self, keys: &[usize]) -> Vec<(I, I)> {
        self.flags.clear();
        let mut out = Vec::new();
        for &key in keys {
            let cell = &self.cells[key];
            for (i, &sa) in cell.iter().enumerate() {
                for &sb in &cell[i + 1..] {
                    let (a, b) = (sa as usize, sb as usize);
                    if self.flags.test_and_set(a, b) {
                        continue;
                    }
                    if intersect(&self.shapes[a], &self.shapes[b]) {
                        out.push(ordered_pair(self.ids[a], self.ids[b]));
                    }
                }
            }
        }
        out
    }
}

impl<I: ShapeId, const D: usize> SpatialIndex<I, D> for Grid<I, D> {
    fn insert(&mut self, shapes: &[Shape<D>]) -> Result<(), SpatialError> {
        if shapes.len() > I::MAX_COUNT {
            return Err(SpatialError::CapacityExceeded {
                count: shapes.len(),
                max: I::MAX_COUNT,
            });
        }

        self.scale = self.compute_scale(shapes);
        self.cell_size = (self.root.max - self.root.min) / self.scale as f32;

        // Order slots by cell key so shapes sharing a cell sit adjacent in
        // memory. The emitted ids stay the caller's insertion indices.
        let mut keyed: Vec<(u32, u32)> = shapes
            .iter()
            .enumerate()
            .map(|(index, shape)| {
                let coords = self.cell_coords(&self.clamp_point(&shape.center()));
                (self.cell_key(&coords) as u32, index as u32)
            })
            .collect();
        radix_sort_pairs(&mut keyed);

        self.shapes = keyed
            .iter()
            .map(|&(_, index)| shapes[index as usize])
            .collect();
        self.ids = keyed
            .iter()
            .map(|&(_, index)| I::from_index(index as usize))
            .collect();

        let total_cells = (self.scale as usize).pow(D as u32);
        self.cells.clear();
        self.cells.resize(total_cells, Vec::new());
        for (slot, shape) in self.shapes.iter().enumerate() {
            let bounds = shape.bounds();
            let lo = self.cell_coords(&self.clamp_point(&bounds.min));
            let hi = self.cell_coords(&self.clamp_point(&bounds.max));
            let mut coords = lo;
            loop {
                let mut key = 0usize;
                let mut stride = 1usize;
                for i in 0..D {
                    key += coords[i] as usize * stride;
                    stride *= self.scale as usize;
                }
                self.cells[key].push(slot as u32);
                let mut axis = 0;
                loop {
                    if axis == D {
                        break;
                    }
                    if coords[axis] < hi[axis] {
                        coords[axis] += 1;
                        break;
                    }
                    coords[axis] = lo[axis];
                    axis += 1;
                }
                if axis == D {
                    break;
                }
            }
        }

        self.flags.reset(shapes.len());
        debug!(
            "grid rebuilt: {} shapes, scale {}, {} cells",
            shapes.len(),
            self.scale,
            total_cells
        );
        Ok(())
    }

    fn get_collisions(&mut self) -> Vec<(I, I)> {
        let keys: Vec<usize> = (0..self.cells.len()).collect();
        self.pairs_in_cells(&keys)
    }

    fn get_collisions_at(&mut self, point: &Point<D>) -> Vec<(I, I)> {
        let coords = self.cell_coords(&self.clamp_point(point));
        let key = self.cell_key(&coords);
        self.pairs_in_cells(&[key])
    }

    fn get_collisions_ray(&mut self, ray: &Ray<D>) -> Vec<(I, Point<D>)> {
        let mut hits: Vec<(I, Point<D>)> = Vec::new();
        let mut seen = vec![false; self.shapes.len()];

        // Parametric distance at which the ray enters the world bound.
        let Some(t_entry) = self.root.intersect_ray(ray) else {
            return hits;
        };
        let entry = self.clamp_point(&ray.point_at(t_entry));
        let mut coords: [i64; D] = [0; D];
        let start = self.cell_coords(&entry);
        for i in 0..D {
            coords[i] = i64::from(start[i]);
        }

        // Amanatides-Woo stepping: per-axis distance to the next cell
        // boundary and per-axis distance between boundaries.
        let mut t_max = [f32::INFINITY; D];
        let mut t_delta = [f32::INFINITY; D];
        let mut step = [0i64; D];
        for i in 0..D {
            if ray.direction[i] > 0.0 {
                step[i] = 1;
                let boundary = self.root.min[i] + (start[i] + 1) as f32 * self.cell_size[i];
                t_max[i] = (boundary - ray.origin[i]) * ray.inv_direction[i];
                t_delta[i] = self.cell_size[i] * ray.inv_direction[i];
            } else if ray.direction[i] < 0.0 {
                step[i] = -1;
                let boundary = self.root.min[i] + start[i] as f32 * self.cell_size[i];
                t_max[i] = (boundary - ray.origin[i]) * ray.inv_direction[i];
                t_delta[i] = -self.cell_size[i] * ray.inv_direction[i];
            }
        }

        loop {
            let mut cell_coords = [0u32; D];
            for i in 0..D {
                cell_coords[i] = coords[i] as u32;
            }
            let key = self.cell_key(&cell_coords);
            for &slot in &self.cells[key] {
                let slot = slot as usize;
                if seen[slot] {
                    continue;
                }
                seen[slot] = true;
                if let Some(point) = intersect_ray(&self.shapes[slot], ray) {
                    hits.push((self.ids[slot], point));
                }
            }
            if !hits.is_empty() {
                return hits;
            }

            // Step into the nearest neighboring cell along the ray.
            let mut axis = 0;
            for i in 1..D {
                if t_max[i] < t_max[axis] {
                    axis = i;
                }
            }
            if t_max[axis] == f32::INFINITY {
                return hits;
            }
            coords[axis] += step[axis];
            if coords[axis] < 0 || coords[axis] >= i64::from(self.scale) {
                return hits;
            }
            t_max[axis] += t_delta[axis];
        }
    }

    fn get_overlap(&mut self, region: &Shape<D>) -> Vec<(I, I)> {
        let keys = self.cell_keys_for_bounds(&region.bounds());
        self.pairs_in_cells(&keys)
    }

    fn point_inside(&self, point: &Point<D>) -> Vec<I> {
        let coords = self.cell_coords(&self.clamp_point(point));
        let key = self.cell_key(&coords);
        self.cells[key]
            .iter()
            .map(|&slot| self.ids[slot as usize])
            .collect()
    }

    fn len(&self) -> usize {
        self.shapes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec2, Vec3};
    use std::collections::HashSet;

    fn world2() -> Aabb<2> {
        Aabb::new(Vec2::new(-10.0, -10.0), Vec2::new(10.0, 10.0))
    }

    /// Deterministic pseudo-random scatter, no RNG dependency in the lib.
    fn scattered_shapes(count: usize) -> Vec<Shape<2>> {
        let mut seed = 0x1234_5678u32;
        let mut next = move || {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 8) as f32 / (1 << 24) as f32
        };
        (0..count)
            .map(|i| {
                let x = next() * 16.0 - 8.0;
                let y = next() * 16.0 - 8.0;
                let r = next() * 1.5 + 0.25;
                if i % 2 == 0 {
                    Shape::sphere(Vec2::new(x, y), r)
                } else {
                    Shape::aabb(Vec2::new(x - r, y - r), Vec2::new(x + r, y + r))
                }
            })
            .collect()
    }

    fn brute_force_pairs(shapes: &[Shape<2>]) -> HashSet<(u32, u32)> {
        let mut pairs = HashSet::new();
        for i in 0..shapes.len() {
            for j in (i + 1)..shapes.len() {
                if intersect(&shapes[i], &shapes[j]) {
                    pairs.insert((i as u32, j as u32));
                }
            }
        }
        pairs
    }

    #[test]
    fn test_scale_heuristic_deterministic() {
        // World extent 20, three boxes of bounding diameter 5: the raw
        // ratio gives scale 4, the count cap clamps it to 2.
        let world = Aabb::new(Vec3::repeat(-10.0), Vec3::repeat(10.0));
        let h = 2.5 / 3f32.sqrt();
        let shapes: Vec<Shape<3>> = (0..3)
            .map(|i| {
                let c = Vec3::repeat(i as f32 * 3.0 - 3.0);
                Shape::aabb(c - Vec3::repeat(h), c + Vec3::repeat(h))
            })
            .collect();

        let mut grid: Grid<u32, 3> = Grid::new(world);
        grid.insert(&shapes).unwrap();
        let first = grid.get_scale();
        assert_eq!(first, 2);
        grid.insert(&shapes).unwrap();
        assert_eq!(grid.get_scale(), first);
    }

    #[test]
    fn test_collisions_match_brute_force() {
        let shapes = scattered_shapes(48);
        let mut grid: Grid<u32, 2> = Grid::new(world2());
        grid.insert(&shapes).unwrap();

        let pairs = grid.get_collisions();
        let expected = brute_force_pairs(&shapes);

        let got: HashSet<(u32, u32)> = pairs.iter().copied().collect();
        assert_eq!(got, expected, "pair membership must match brute force");
        assert_eq!(got.len(), pairs.len(), "no pair may be emitted twice");
    }

    #[test]
    fn test_empty_insert() {
        let mut grid: Grid<u16, 2> = Grid::new(world2());
        grid.insert(&[]).unwrap();
        assert_eq!(grid.get_scale(), 1);
        assert!(grid.is_empty());
        assert!(grid.get_collisions().is_empty());
    }

    #[test]
    fn test_capacity_exceeded() {
        let shapes: Vec<Shape<2>> = (0..65_537)
            .map(|i| Shape::sphere(Vec2::new(i as f32 * 1e-4, 0.0), 0.01))
            .collect();
        let mut grid: Grid<u16, 2> = Grid::new(world2());
        assert_eq!(
            grid.insert(&shapes),
            Err(SpatialError::CapacityExceeded {
                count: 65_537,
                max: 65_536
            })
        );
    }

    #[test]
    fn test_collisions_at_point() {
        let shapes = vec![
            Shape::sphere(Vec2::new(0.0, 0.0), 1.0),
            Shape::sphere(Vec2::new(0.5, 0.0), 1.0),
            Shape::sphere(Vec2::new(8.0, 8.0), 0.5),
        ];
        let mut grid: Grid<u32, 2> = Grid::with_config(world2(), GridConfig { scale: Some(4) });
        grid.insert(&shapes).unwrap();

        let local = grid.get_collisions_at(&Vec2::new(0.0, 0.0));
        assert_eq!(local, vec![(0, 1)]);

        let far = grid.get_collisions_at(&Vec2::new(-9.9, -9.9));
        assert!(far.is_empty());
    }

    #[test]
    fn test_ray_walk_finds_hit() {
        let shapes = vec![
            Shape::sphere(Vec2::new(5.0, 0.0), 1.0),
            Shape::aabb(Vec2::new(-8.0, 6.0), Vec2::new(-6.0, 8.0)),
        ];
        let mut grid: Grid<u32, 2> = Grid::new(world2());
        grid.insert(&shapes).unwrap();

        let hits = grid.get_collisions_ray(&Ray::new(Vec2::new(-9.0, 0.0), Vec2::new(1.0, 0.0)));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 0);
        let hit = hits[0].1;
        assert!((hit.x - 4.0).abs() < 1e-4, "hit near sphere surface, got {hit:?}");
        assert!(hit.y.abs() < 1e-4);

        let misses = grid.get_collisions_ray(&Ray::new(Vec2::new(-9.0, -9.0), Vec2::new(1.0, 0.0)));
        assert!(misses.is_empty());
    }

    #[test]
    fn test_ray_origin_outside_world() {
        let shapes = vec![Shape::sphere(Vec2::new(0.0, 0.0), 2.0)];
        let mut grid: Grid<u32, 2> = Grid::new(world2());
        grid.insert(&shapes).unwrap();

        let hits = grid.get_collisions_ray(&Ray::new(Vec2::new(-30.0, 0.0), Vec2::new(1.0, 0.0)));
        assert_eq!(hits.len(), 1);
        assert!((hits[0].1.x + 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_overlap_region_restricts() {
        let shapes = vec![
            Shape::sphere(Vec2::new(-7.0, -7.0), 1.0),
            Shape::sphere(Vec2::new(-6.5, -7.0), 1.0),
            Shape::sphere(Vec2::new(7.0, 7.0), 1.0),
            Shape::sphere(Vec2::new(7.5, 7.0), 1.0),
        ];
        let mut grid: Grid<u32, 2> = Grid::with_config(world2(), GridConfig { scale: Some(4) });
        grid.insert(&shapes).unwrap();

        let region = Shape::aabb(Vec2::new(-10.0, -10.0), Vec2::new(-4.0, -4.0));
        let pairs = grid.get_overlap(&region);
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn test_point_inside_occupancy() {
        let shapes = vec![
            Shape::sphere(Vec2::new(-5.0, -5.0), 1.0),
            Shape::sphere(Vec2::new(5.0, 5.0), 1.0),
        ];
        let mut grid: Grid<u32, 2> = Grid::with_config(world2(), GridConfig { scale: Some(2) });
        grid.insert(&shapes).unwrap();

        assert_eq!(grid.point_inside(&Vec2::new(-5.0, -5.0)), vec![0]);
        assert_eq!(grid.point_inside(&Vec2::new(5.0, 5.0)), vec![1]);
    }

    #[test]
    fn test_resize_drops_shapes() {
        let shapes = vec![Shape::sphere(Vec2::zeros(), 1.0)];
        let mut grid: Grid<u32, 2> = Grid::new(world2());
        grid.insert(&shapes).unwrap();
        assert_eq!(grid.len(), 1);

        grid.resize(Aabb::new(Vec2::new(-100.0, -100.0), Vec2::new(100.0, 100.0)));
        assert!(grid.is_empty());
        assert_eq!(grid.root().max.x, 100.0);
    }
}
