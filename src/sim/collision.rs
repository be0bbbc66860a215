//! Tile-based collision detection
//!
//! The static world is a grid of tile indices pointing into a table of
//! `CollisionTile`s. Moving solids add temporary surfaces that live for exactly
//! one frame:
//! - `add_temporary_surface` writes into the pending buffer
//! - `update` swaps pending and active, then clears the new pending buffer
//!
//! Queries only ever read the active buffer, so every system sees the same set
//! of temporary surfaces during a frame regardless of update order.

use glam::Vec2;

use super::geometry::{Aabb, LineSegment};
use super::object::ObjectId;
use super::pool::FixedSizeArray;
use super::tiles::{CollisionDataError, CollisionTile, TileGrid, parse_collision_tiles};

/// A surface hit: where, and which way it pushes back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitPoint {
    pub point: Vec2,
    pub normal: Vec2,
}

/// Closest-so-far bookkeeping for ray casts
struct Candidate {
    hit: HitPoint,
    distance_sq: f32,
}

fn consider(best: &mut Option<Candidate>, start: Vec2, point: Vec2, normal: Vec2) {
    let distance_sq = point.distance_squared(start);
    // Strict comparison: ties keep whichever was found first
    let closer = match best {
        Some(current) => distance_sq < current.distance_sq,
        None => true,
    };
    if closer {
        *best = Some(Candidate {
            hit: HitPoint { point, normal },
            distance_sq,
        });
    }
}

/// Inclusive tile range, optionally walked from the high end
fn span(lo: usize, hi: usize, descending: bool) -> impl Iterator<Item = usize> {
    (0..=hi - lo).map(move |i| if descending { hi - i } else { lo + i })
}

/// The collision world
#[derive(Debug)]
pub struct CollisionSystem {
    world: Option<TileGrid>,
    tile_width: f32,
    tile_height: f32,
    tiles: Vec<CollisionTile>,
    /// Temporary surfaces visible to queries this frame
    active: FixedSizeArray<LineSegment>,
    /// Temporary surfaces submitted this frame, visible next frame
    pending: FixedSizeArray<LineSegment>,
    dropped_surfaces: usize,
}

impl CollisionSystem {
    pub fn new(max_temporary_segments: usize) -> Self {
        Self {
            world: None,
            tile_width: 1.0,
            tile_height: 1.0,
            tiles: Vec::new(),
            active: FixedSizeArray::new(max_temporary_segments),
            pending: FixedSizeArray::new(max_temporary_segments),
            dropped_surfaces: 0,
        }
    }

    /// Bind the static world, replacing any previous one
    pub fn initialize(&mut self, grid: TileGrid, tile_width: f32, tile_height: f32) {
        log::info!(
            "Collision world {}x{} tiles ({}x{} units per tile)",
            grid.width(),
            grid.height(),
            tile_width,
            tile_height
        );
        self.world = Some(grid);
        self.tile_width = tile_width.max(f32::EPSILON);
        self.tile_height = tile_height.max(f32::EPSILON);
    }

    pub fn is_initialized(&self) -> bool {
        self.world.is_some()
    }

    pub fn world(&self) -> Option<&TileGrid> {
        self.world.as_ref()
    }

    #[inline]
    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width, self.tile_height)
    }

    /// Replace the static collision tile table
    pub fn set_collision_tiles(&mut self, tiles: Vec<CollisionTile>) {
        self.tiles = tiles;
    }

    pub fn collision_tiles(&self) -> &[CollisionTile] {
        &self.tiles
    }

    /// Load the static tile table from encoded bytes.
    ///
    /// On failure the table is left empty (queries keep working, nothing static
    /// collides) and the error is returned for the caller to report.
    pub fn load_collision_tiles(&mut self, bytes: &[u8]) -> Result<usize, CollisionDataError> {
        match parse_collision_tiles(bytes) {
            Ok(tiles) => {
                let count = tiles.iter().filter(|t| !t.is_empty()).count();
                log::info!("Loaded {} collision tiles", count);
                self.tiles = tiles;
                Ok(count)
            }
            Err(err) => {
                log::error!("Collision data rejected, running without static collision: {}", err);
                self.tiles.clear();
                Err(err)
            }
        }
    }

    /// Grid column containing world `x`, clamped to the grid
    fn tile_column(&self, world: &TileGrid, x: f32) -> usize {
        let column = (x / self.tile_width).floor() as i64;
        column.clamp(0, world.width() as i64 - 1) as usize
    }

    /// Grid row containing world `y`, clamped. Rows are stored top-down, world Y grows up.
    fn tile_row(&self, world: &TileGrid, y: f32) -> usize {
        let height = world.height() as i64;
        let from_bottom = ((y / self.tile_height).floor() as i64).clamp(-1, height);
        let row = height - 1 - from_bottom;
        row.clamp(0, world.height() as i64 - 1) as usize
    }

    /// World position of a cell's bottom-left corner
    fn tile_origin(&self, world: &TileGrid, column: usize, row: usize) -> Vec2 {
        Vec2::new(
            column as f32 * self.tile_width,
            (world.height() - 1 - row) as f32 * self.tile_height,
        )
    }

    fn tile_at(&self, world: &TileGrid, column: usize, row: usize) -> Option<&CollisionTile> {
        let index = world.tile(column, row);
        if index < 0 {
            return None;
        }
        self.tiles.get(index as usize)
    }

    /// Find the closest surface crossed by the segment `start`→`end`.
    ///
    /// With a non-zero `movement`, only surfaces whose normal opposes it count.
    /// Temporary surfaces owned by `exclude` are skipped.
    pub fn cast_ray(
        &self,
        start: Vec2,
        end: Vec2,
        movement: Option<Vec2>,
        exclude: Option<ObjectId>,
    ) -> Option<HitPoint> {
        let mut best = None;

        if let Some(world) = self.world.as_ref().filter(|w| !w.is_empty()) {
            let start_col = self.tile_column(world, start.x);
            let start_row = self.tile_row(world, start.y);
            let end_col = self.tile_column(world, end.x);
            let end_row = self.tile_row(world, end.y);

            let mut visit = |column: usize, row: usize| {
                self.test_tile_ray(world, column, row, start, end, movement, &mut best);
            };

            if start_col == end_col || start_row == end_row {
                for row in span(start_row.min(end_row), start_row.max(end_row), start_row > end_row) {
                    for column in span(start_col.min(end_col), start_col.max(end_col), start_col > end_col) {
                        visit(column, row);
                    }
                }
            } else {
                walk_tiles(start_col, start_row, end_col, end_row, visit);
            }
        }

        for seg in self.active.iter() {
            if exclude.is_some() && seg.owner == exclude {
                continue;
            }
            if !seg.opposes(movement) {
                continue;
            }
            if let Some(point) = seg.intersect_segment(start, end, Vec2::ZERO) {
                consider(&mut best, start, point, seg.normal);
            }
        }

        best.map(|c| c.hit)
    }

    #[allow(clippy::too_many_arguments)]
    fn test_tile_ray(
        &self,
        world: &TileGrid,
        column: usize,
        row: usize,
        start: Vec2,
        end: Vec2,
        movement: Option<Vec2>,
        best: &mut Option<Candidate>,
    ) {
        let Some(tile) = self.tile_at(world, column, row) else {
            return;
        };
        let origin = self.tile_origin(world, column, row);
        for seg in tile.segments.iter().filter(|s| s.opposes(movement)) {
            if let Some(point) = seg.intersect_segment(start, end, origin) {
                consider(best, start, point, seg.normal);
            }
        }
    }

    /// Sweep a box against every surface it overlaps.
    ///
    /// Tiles are visited starting at the leading edge of `movement`. Hits are
    /// appended to `hits` until it is full; the return value reports whether any
    /// surface intersected, recorded or not. `dynamic_only` skips the tile grid.
    pub fn test_box(
        &self,
        bounds: &Aabb,
        movement: Option<Vec2>,
        hits: &mut FixedSizeArray<HitPoint>,
        exclude: Option<ObjectId>,
        dynamic_only: bool,
    ) -> bool {
        let mut any_hit = false;
        let direction = movement.unwrap_or(Vec2::ZERO);
        let bounds = &Aabb::new(bounds.min, bounds.max);

        let grid = if dynamic_only { None } else { self.world.as_ref() };
        if let Some(world) = grid.filter(|w| !w.is_empty()) {
            let left = self.tile_column(world, bounds.left());
            let right = self.tile_column(world, bounds.right());
            let top = self.tile_row(world, bounds.top());
            let bottom = self.tile_row(world, bounds.bottom());

            // Moving down means the bottom row (highest index) leads
            for row in span(top, bottom, direction.y < 0.0) {
                for column in span(left, right, direction.x > 0.0) {
                    let Some(tile) = self.tile_at(world, column, row) else {
                        continue;
                    };
                    let origin = self.tile_origin(world, column, row);
                    for seg in tile.segments.iter().filter(|s| s.opposes(movement)) {
                        if let Some(point) = seg.intersect_box(bounds, origin) {
                            any_hit = true;
                            let _ = hits.add(HitPoint {
                                point,
                                normal: seg.normal,
                            });
                        }
                    }
                }
            }
        }

        for seg in self.active.iter() {
            if exclude.is_some() && seg.owner == exclude {
                continue;
            }
            if !seg.opposes(movement) {
                continue;
            }
            if let Some(point) = seg.intersect_box(bounds, Vec2::ZERO) {
                any_hit = true;
                let _ = hits.add(HitPoint {
                    point,
                    normal: seg.normal,
                });
            }
        }

        any_hit
    }

    /// Submit a one-frame surface. It becomes visible after the next `update`.
    ///
    /// Returns false (and drops the surface) when the pending buffer is full.
    pub fn add_temporary_surface(
        &mut self,
        start: Vec2,
        end: Vec2,
        normal: Vec2,
        owner: Option<ObjectId>,
    ) -> bool {
        let seg = LineSegment::new(start, end, normal).with_owner(owner);
        if self.pending.add(seg).is_err() {
            self.dropped_surfaces += 1;
            log::warn!(
                "Temporary surface buffer full ({}), dropping surface from {:?}",
                self.pending.capacity(),
                owner
            );
            return false;
        }
        true
    }

    /// End-of-frame rotation of the temporary surface buffers
    pub fn update(&mut self, _dt: f32) {
        std::mem::swap(&mut self.active, &mut self.pending);
        self.pending.clear();
    }

    /// Forget every temporary surface (level teardown)
    pub fn clear_temporary_surfaces(&mut self) {
        self.active.clear();
        self.pending.clear();
    }

    pub fn active_temporary_count(&self) -> usize {
        self.active.len()
    }

    pub fn pending_temporary_count(&self) -> usize {
        self.pending.len()
    }

    /// Surfaces dropped because the pending buffer was full
    pub fn dropped_surface_count(&self) -> usize {
        self.dropped_surfaces
    }
}

/// Bresenham walk over tile cells from (x0, y0) to (x1, y1), inclusive
fn walk_tiles(x0: usize, y0: usize, x1: usize, y1: usize, mut visit: impl FnMut(usize, usize)) {
    let (mut x, mut y) = (x0 as i64, y0 as i64);
    let (x1, y1) = (x1 as i64, y1 as i64);
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let step_x = if x < x1 { 1 } else { -1 };
    let step_y = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        visit(x as usize, y as usize);
        if x == x1 && y == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += step_x;
        }
        if doubled <= dx {
            err += dx;
            y += step_y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TILE: f32 = 32.0;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    /// 10x10 world with tile index 0 placed at grid cell (5, 5)
    fn scenario_a() -> CollisionSystem {
        let mut grid = TileGrid::new(10, 10);
        grid.set_tile(5, 5, 0);
        let mut system = CollisionSystem::new(16);
        system.initialize(grid, TILE, TILE);
        system.set_collision_tiles(vec![CollisionTile::new(vec![LineSegment::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(TILE, 0.0),
            Vec2::Y,
        )])]);
        system
    }

    #[test]
    fn test_scenario_a_ray_down_hits_midpoint() {
        let system = scenario_a();
        // Grid row 5 of 10 sits at world y 4*TILE..5*TILE
        let x = 5.5 * TILE;
        let hit = system
            .cast_ray(Vec2::new(x, 9.5 * TILE), Vec2::new(x, 0.5), Some(Vec2::NEG_Y), None)
            .unwrap();
        assert!(approx(hit.point, Vec2::new(5.5 * TILE, 4.0 * TILE)));
        assert_eq!(hit.normal, Vec2::Y);
    }

    #[test]
    fn test_direction_filter_and_bypass() {
        let system = scenario_a();
        let x = 5.5 * TILE;
        // Moving up into an upward-facing floor: filtered
        let from = Vec2::new(x, 0.5);
        let to = Vec2::new(x, 9.5 * TILE);
        assert!(system.cast_ray(from, to, Some(Vec2::Y), None).is_none());
        // No direction or zero direction: accepted
        assert!(system.cast_ray(from, to, None, None).is_some());
        assert!(system.cast_ray(from, to, Some(Vec2::ZERO), None).is_some());
    }

    #[test]
    fn test_diagonal_ray_uses_bresenham_walk() {
        let system = scenario_a();
        let start = Vec2::new(4.2 * TILE, 6.5 * TILE);
        let end = Vec2::new(6.8 * TILE, 1.5 * TILE);
        let hit = system.cast_ray(start, end, Some(end - start), None).unwrap();
        assert!((hit.point.y - 4.0 * TILE).abs() < 1e-3);
        assert!(hit.point.x > 5.0 * TILE && hit.point.x < 6.0 * TILE);
    }

    #[test]
    fn test_uninitialized_system_reports_no_hit() {
        let system = CollisionSystem::new(4);
        assert!(
            system
                .cast_ray(Vec2::ZERO, Vec2::new(100.0, 100.0), None, None)
                .is_none()
        );
        let mut hits = FixedSizeArray::new(4);
        assert!(!system.test_box(&Aabb::from_edges(0.0, 10.0, 10.0, 0.0), None, &mut hits, None, false));
    }

    #[test]
    fn test_ray_endpoints_outside_world_are_clamped() {
        let system = scenario_a();
        let x = 5.5 * TILE;
        let hit = system.cast_ray(Vec2::new(x, 50.0 * TILE), Vec2::new(x, -50.0 * TILE), Some(Vec2::NEG_Y), None);
        assert!(approx(hit.unwrap().point, Vec2::new(x, 4.0 * TILE)));
    }

    #[test]
    fn test_extreme_ray_endpoints_do_not_overflow() {
        let mut system = CollisionSystem::new(4);
        system.initialize(TileGrid::new(10, 10), TILE, TILE);
        let start = Vec2::new(16.0, 100.0);
        for y in [f32::MIN, f32::MAX, f32::NEG_INFINITY, f32::INFINITY, f32::NAN] {
            assert!(system.cast_ray(start, Vec2::new(16.0, y), Some(Vec2::NEG_Y), None).is_none());
            assert!(system.cast_ray(start, Vec2::new(y, 100.0), None, None).is_none());
        }

        let mut hits = FixedSizeArray::new(4);
        let huge = Aabb::new(Vec2::splat(f32::MIN), Vec2::splat(f32::MAX));
        assert!(!system.test_box(&huge, Some(Vec2::NEG_Y), &mut hits, None, false));
    }

    #[test]
    fn test_closest_hit_wins() {
        let mut grid = TileGrid::new(4, 4);
        grid.set_tile(1, 1, 0);
        grid.set_tile(1, 2, 0);
        let mut system = CollisionSystem::new(4);
        system.initialize(grid, TILE, TILE);
        system.set_collision_tiles(vec![CollisionTile::new(vec![LineSegment::new(
            Vec2::new(0.0, TILE * 0.5),
            Vec2::new(TILE, TILE * 0.5),
            Vec2::Y,
        )])]);

        // Cells (1,1) and (1,2) are at world rows 2 and 1
        let hit = system
            .cast_ray(Vec2::new(1.5 * TILE, 3.9 * TILE), Vec2::new(1.5 * TILE, 0.1), Some(Vec2::NEG_Y), None)
            .unwrap();
        assert!(approx(hit.point, Vec2::new(1.5 * TILE, 2.5 * TILE)));
    }

    #[test]
    fn test_temporary_surface_has_exactly_one_frame_latency() {
        let mut system = scenario_a();
        let surface_y = 8.0 * TILE;
        let from = Vec2::new(2.5 * TILE, 9.5 * TILE);
        let to = Vec2::new(2.5 * TILE, 0.5);

        // Frame N: submitted, not yet visible
        assert!(system.add_temporary_surface(
            Vec2::new(2.0 * TILE, surface_y),
            Vec2::new(3.0 * TILE, surface_y),
            Vec2::Y,
            Some(ObjectId(7)),
        ));
        assert!(system.cast_ray(from, to, Some(Vec2::NEG_Y), None).is_none());
        system.update(1.0 / 60.0);

        // Frame N+1: visible, except to its owner
        let hit = system.cast_ray(from, to, Some(Vec2::NEG_Y), None).unwrap();
        assert!(approx(hit.point, Vec2::new(2.5 * TILE, surface_y)));
        assert!(system.cast_ray(from, to, Some(Vec2::NEG_Y), Some(ObjectId(7))).is_none());
        assert!(system.cast_ray(from, to, Some(Vec2::NEG_Y), Some(ObjectId(8))).is_some());
        system.update(1.0 / 60.0);

        // Frame N+2: not resubmitted, gone
        assert!(system.cast_ray(from, to, Some(Vec2::NEG_Y), None).is_none());
        assert_eq!(system.active_temporary_count(), 0);
    }

    #[test]
    fn test_temporary_buffer_full_drops_surface() {
        let mut system = CollisionSystem::new(1);
        assert!(system.add_temporary_surface(Vec2::ZERO, Vec2::X, Vec2::Y, None));
        assert!(!system.add_temporary_surface(Vec2::ZERO, Vec2::X, Vec2::Y, None));
        assert_eq!(system.dropped_surface_count(), 1);
        assert_eq!(system.pending_temporary_count(), 1);
    }

    /// Two side-by-side cells, each with a wall facing left (toward a mover heading right)
    fn two_walls() -> CollisionSystem {
        let mut grid = TileGrid::new(4, 1);
        grid.set_tile(1, 0, 0);
        grid.set_tile(2, 0, 0);
        let mut system = CollisionSystem::new(4);
        system.initialize(grid, TILE, TILE);
        system.set_collision_tiles(vec![CollisionTile::new(vec![LineSegment::new(
            Vec2::new(TILE * 0.5, 0.0),
            Vec2::new(TILE * 0.5, TILE),
            Vec2::NEG_X,
        )])]);
        system
    }

    #[test]
    fn test_scenario_c_box_output_capped_at_capacity() {
        let system = two_walls();
        let bounds = Aabb::from_edges(1.2 * TILE, 2.8 * TILE, 0.9 * TILE, 0.1 * TILE);

        let mut one = FixedSizeArray::new(1);
        assert!(system.test_box(&bounds, Some(Vec2::X), &mut one, None, false));
        assert_eq!(one.len(), 1);
        // Moving right, the rightmost column leads
        assert!((one[0].point.x - 2.5 * TILE).abs() < 1e-3);

        let mut many = FixedSizeArray::new(8);
        assert!(system.test_box(&bounds, Some(Vec2::X), &mut many, None, false));
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn test_box_leading_edge_follows_direction() {
        let system = two_walls();
        let bounds = Aabb::from_edges(1.2 * TILE, 2.8 * TILE, 0.9 * TILE, 0.1 * TILE);
        // Without a direction columns are walked left to right
        let mut hits = FixedSizeArray::new(1);
        assert!(system.test_box(&bounds, None, &mut hits, None, false));
        assert!((hits[0].point.x - 1.5 * TILE).abs() < 1e-3);
    }

    #[test]
    fn test_box_never_overfills_partially_used_output() {
        let system = two_walls();
        let bounds = Aabb::from_edges(1.2 * TILE, 2.8 * TILE, 0.9 * TILE, 0.1 * TILE);
        let mut hits = FixedSizeArray::new(2);
        hits.add(HitPoint { point: Vec2::ZERO, normal: Vec2::Y }).unwrap();
        assert!(system.test_box(&bounds, Some(Vec2::X), &mut hits, None, false));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_box_accepts_inverted_bounds() {
        let system = two_walls();
        let inverted = Aabb {
            min: Vec2::new(2.8 * TILE, 0.9 * TILE),
            max: Vec2::new(1.2 * TILE, 0.1 * TILE),
        };
        let mut hits = FixedSizeArray::new(4);
        assert!(system.test_box(&inverted, Some(Vec2::X), &mut hits, None, false));
        assert_eq!(hits.len(), 2);

        let mut hits = FixedSizeArray::new(4);
        let far = Aabb {
            min: Vec2::new(100.0, 100.0),
            max: Vec2::new(10.0, 10.0),
        };
        system.test_box(&far, None, &mut hits, None, false);
    }

    #[test]
    fn test_box_dynamic_only_skips_tiles() {
        let mut system = two_walls();
        let bounds = Aabb::from_edges(1.2 * TILE, 2.8 * TILE, 0.9 * TILE, 0.1 * TILE);
        let mut hits = FixedSizeArray::new(4);
        assert!(!system.test_box(&bounds, Some(Vec2::X), &mut hits, None, true));

        system.add_temporary_surface(
            Vec2::new(2.0 * TILE, 0.0),
            Vec2::new(2.0 * TILE, TILE),
            Vec2::NEG_X,
            Some(ObjectId(3)),
        );
        // Submitted this frame: not visible until the next update
        assert!(!system.test_box(&bounds, Some(Vec2::X), &mut hits, None, true));
        assert!(hits.is_empty());
        system.update(0.0);
        assert!(system.test_box(&bounds, Some(Vec2::X), &mut hits, None, true));
        assert_eq!(hits.len(), 1);
        hits.clear();
        assert!(!system.test_box(&bounds, Some(Vec2::X), &mut hits, Some(ObjectId(3)), true));
    }

    #[test]
    fn test_bad_collision_data_leaves_world_empty() {
        let mut system = scenario_a();
        assert!(system.load_collision_tiles(&[7, 0]).is_err());
        assert!(system.collision_tiles().is_empty());
        let x = 5.5 * TILE;
        assert!(
            system
                .cast_ray(Vec2::new(x, 9.5 * TILE), Vec2::new(x, 0.5), Some(Vec2::NEG_Y), None)
                .is_none()
        );
    }

    #[test]
    fn test_load_collision_tiles_from_bytes() {
        let mut system = scenario_a();
        let tiles = system.collision_tiles().to_vec();
        let bytes = crate::sim::tiles::encode_collision_tiles(&tiles).unwrap();
        system.set_collision_tiles(Vec::new());
        assert_eq!(system.load_collision_tiles(&bytes).unwrap(), 1);
        let x = 5.5 * TILE;
        assert!(
            system
                .cast_ray(Vec2::new(x, 9.5 * TILE), Vec2::new(x, 0.5), Some(Vec2::NEG_Y), None)
                .is_some()
        );
    }

    #[test]
    fn test_walk_tiles_visits_endpoints() {
        let mut visited = Vec::new();
        walk_tiles(0, 0, 3, 1, |x, y| visited.push((x, y)));
        assert_eq!(visited.first(), Some(&(0, 0)));
        assert_eq!(visited.last(), Some(&(3, 1)));
        assert_eq!(visited.len(), 4);
    }

    proptest! {
        #[test]
        fn prop_empty_world_never_hits(
            sx in -100.0f32..500.0, sy in -100.0f32..500.0,
            ex in -100.0f32..500.0, ey in -100.0f32..500.0,
            dx in -1.0f32..1.0, dy in -1.0f32..1.0,
        ) {
            let mut system = CollisionSystem::new(4);
            system.initialize(TileGrid::new(10, 10), TILE, TILE);
            system.set_collision_tiles(vec![CollisionTile::default()]);
            let hit = system.cast_ray(Vec2::new(sx, sy), Vec2::new(ex, ey), Some(Vec2::new(dx, dy)), None);
            prop_assert!(hit.is_none());
        }
    }
}
