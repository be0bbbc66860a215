//! Level description and the built-in test level generator
//!
//! Real level loading is out of scope; `generate_level` builds a deterministic
//! level from a seed so the engine has something to run.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::archetype::ObjectType;
use super::geometry::LineSegment;
use super::tiles::{CollisionDataError, CollisionTile, TileGrid, encode_collision_tiles};
use crate::consts::DEFAULT_TILE_SIZE;

/// Full solid block
pub const TILE_SOLID: i32 = 0;
/// Top surface only; can be jumped through from below
pub const TILE_ONE_WAY: i32 = 1;
/// 45 degree slope rising to the right
pub const TILE_SLOPE_UP: i32 = 2;
/// 45 degree slope rising to the left
pub const TILE_SLOPE_DOWN: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub kind: ObjectType,
    /// Bottom-left corner in world units
    pub position: Vec2,
    pub flip: bool,
}

#[derive(Debug, Clone)]
pub struct Level {
    pub seed: u64,
    pub grid: TileGrid,
    pub tile_size: f32,
    /// Encoded collision tile table
    pub collision_data: Vec<u8>,
    pub spawns: Vec<SpawnPoint>,
}

/// Tile table for the `TILE_*` indices at the given tile size
pub fn standard_collision_tiles(size: f32) -> Vec<CollisionTile> {
    let (bl, br) = (Vec2::new(0.0, 0.0), Vec2::new(size, 0.0));
    let (tl, tr) = (Vec2::new(0.0, size), Vec2::new(size, size));
    let diagonal = std::f32::consts::FRAC_1_SQRT_2;

    vec![
        CollisionTile::new(vec![
            LineSegment::new(tl, tr, Vec2::Y),
            LineSegment::new(bl, br, Vec2::NEG_Y),
            LineSegment::new(bl, tl, Vec2::NEG_X),
            LineSegment::new(br, tr, Vec2::X),
        ]),
        CollisionTile::new(vec![LineSegment::new(tl, tr, Vec2::Y)]),
        // Slopes carry no vertical sides so hills can be walked over
        CollisionTile::new(vec![
            LineSegment::new(bl, tr, Vec2::new(-diagonal, diagonal)),
            LineSegment::new(bl, br, Vec2::NEG_Y),
        ]),
        CollisionTile::new(vec![
            LineSegment::new(tl, br, Vec2::new(diagonal, diagonal)),
            LineSegment::new(bl, br, Vec2::NEG_Y),
        ]),
    ]
}

/// Build a walled test level with `DEFAULT_TILE_SIZE` tiles. Same seed, same level.
///
/// Layout: solid border, a clear start area on the left with the player and a
/// moving platform, then random one-way ledges, hills and patrollers.
pub fn generate_level(seed: u64, width: usize, height: usize) -> Result<Level, CollisionDataError> {
    generate_level_with_tile_size(seed, width, height, DEFAULT_TILE_SIZE)
}

/// `generate_level` at a given tile edge length. The layout depends only on
/// the seed; positions and collision data scale with `tile_size`.
pub fn generate_level_with_tile_size(
    seed: u64,
    width: usize,
    height: usize,
    tile_size: f32,
) -> Result<Level, CollisionDataError> {
    let width = width.max(24);
    let height = height.max(10);
    let tile = if tile_size > 0.0 {
        tile_size
    } else {
        log::warn!("Invalid tile size {}, using {}", tile_size, DEFAULT_TILE_SIZE);
        DEFAULT_TILE_SIZE
    };
    let mut rng = Pcg32::seed_from_u64(seed);

    let mut grid = TileGrid::new(width, height);
    let floor_row = height - 1;
    grid.fill(0, 0, width - 1, 0, TILE_SOLID);
    grid.fill(0, floor_row, width - 1, floor_row, TILE_SOLID);
    grid.fill(0, 0, 0, floor_row, TILE_SOLID);
    grid.fill(width - 1, 0, width - 1, floor_row, TILE_SOLID);

    // Grid row `from_bottom` rows above the floor
    let row_above_floor = |from_bottom: usize| floor_row - from_bottom;
    // World position of a tile's bottom-left corner, counted from the floor top
    let on_floor = |column: usize, from_bottom: usize| {
        Vec2::new(column as f32 * tile, (1 + from_bottom) as f32 * tile)
    };

    let first_feature = 10;
    let last_feature = width - 6;

    let ledges = rng.random_range(2..=5);
    for _ in 0..ledges {
        let x = rng.random_range(first_feature..last_feature);
        let length = rng.random_range(3..=6);
        let from_bottom = rng.random_range(3..height - 3);
        let end = (x + length - 1).min(width - 2);
        grid.fill(x, row_above_floor(from_bottom), end, row_above_floor(from_bottom), TILE_ONE_WAY);
    }

    let mut hill_columns = Vec::new();
    let hills = rng.random_range(1..=3);
    for _ in 0..hills {
        let x = rng.random_range(first_feature..last_feature - 1);
        if hill_columns.iter().any(|&c: &usize| c.abs_diff(x) < 3) {
            continue;
        }
        grid.set_tile(x, row_above_floor(1), TILE_SLOPE_UP);
        grid.set_tile(x + 1, row_above_floor(1), TILE_SLOPE_DOWN);
        hill_columns.extend([x, x + 1]);
    }

    let mut spawns = vec![
        SpawnPoint {
            kind: ObjectType::Player,
            position: on_floor(2, 2),
            flip: false,
        },
        SpawnPoint {
            kind: ObjectType::MovingPlatform,
            position: on_floor(rng.random_range(5..8), 4),
            flip: false,
        },
    ];

    let patrollers = rng.random_range(1..=4);
    for _ in 0..patrollers {
        let x = rng.random_range(first_feature..width - 2);
        if hill_columns.contains(&x) {
            continue;
        }
        spawns.push(SpawnPoint {
            kind: ObjectType::Patroller,
            position: on_floor(x, 0),
            flip: rng.random_bool(0.5),
        });
    }

    let collision_data = encode_collision_tiles(&standard_collision_tiles(tile))?;
    log::info!(
        "Generated level {}x{} (seed {}): {} ledges, {} hills, {} spawns",
        width,
        height,
        seed,
        ledges,
        hill_columns.len() / 2,
        spawns.len()
    );

    Ok(Level {
        seed,
        grid,
        tile_size: tile,
        collision_data,
        spawns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::CollisionSystem;
    use crate::sim::tiles::parse_collision_tiles;

    #[test]
    fn test_same_seed_same_level() {
        let a = generate_level(42, 40, 16).unwrap();
        let b = generate_level(42, 40, 16).unwrap();
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.spawns, b.spawns);
        assert_eq!(a.collision_data, b.collision_data);
    }

    #[test]
    fn test_border_and_start_area() {
        let level = generate_level(5, 30, 12).unwrap();
        let grid = &level.grid;
        for x in 0..grid.width() {
            assert_eq!(grid.tile(x, grid.height() - 1), TILE_SOLID);
        }
        for y in 0..grid.height() {
            assert_eq!(grid.tile(0, y), TILE_SOLID);
            assert_eq!(grid.tile(grid.width() - 1, y), TILE_SOLID);
        }
        assert_eq!(level.spawns[0].kind, ObjectType::Player);
    }

    #[test]
    fn test_tile_size_scales_positions_not_layout() {
        let default = generate_level(12, 30, 12).unwrap();
        let small = generate_level_with_tile_size(12, 30, 12, 16.0).unwrap();
        assert_eq!(small.grid, default.grid);
        assert_eq!(small.tile_size, 16.0);
        assert_eq!(small.spawns[0].position, default.spawns[0].position * 0.5);
        let tiles = parse_collision_tiles(&small.collision_data).unwrap();
        assert_eq!(tiles, standard_collision_tiles(16.0));

        let fallback = generate_level_with_tile_size(12, 30, 12, -4.0).unwrap();
        assert_eq!(fallback.tile_size, DEFAULT_TILE_SIZE);
    }

    #[test]
    fn test_small_sizes_are_clamped() {
        let level = generate_level(1, 2, 2).unwrap();
        assert_eq!(level.grid.width(), 24);
        assert_eq!(level.grid.height(), 10);
    }

    #[test]
    fn test_collision_data_decodes_to_standard_tiles() {
        let level = generate_level(9, 30, 12).unwrap();
        let tiles = parse_collision_tiles(&level.collision_data).unwrap();
        assert_eq!(tiles, standard_collision_tiles(level.tile_size));
    }

    #[test]
    fn test_one_way_ledge_only_blocks_from_above() {
        let t = DEFAULT_TILE_SIZE;
        let mut grid = TileGrid::new(3, 3);
        grid.set_tile(1, 1, TILE_ONE_WAY);
        let mut collision = CollisionSystem::new(4);
        collision.initialize(grid, t, t);
        collision.set_collision_tiles(standard_collision_tiles(t));

        let x = 1.5 * t;
        let falling = collision.cast_ray(Vec2::new(x, 2.5 * t), Vec2::new(x, 1.5 * t), Some(Vec2::NEG_Y), None);
        assert_eq!(falling.unwrap().point, Vec2::new(x, 2.0 * t));

        let jumping = collision.cast_ray(Vec2::new(x, 1.5 * t), Vec2::new(x, 2.5 * t), Some(Vec2::Y), None);
        assert!(jumping.is_none());
    }

    #[test]
    fn test_slope_hit_height_tracks_x() {
        let t = DEFAULT_TILE_SIZE;
        let mut grid = TileGrid::new(3, 3);
        grid.set_tile(1, 2, TILE_SLOPE_UP);
        let mut collision = CollisionSystem::new(4);
        collision.initialize(grid, t, t);
        collision.set_collision_tiles(standard_collision_tiles(t));

        let x = t + 8.0;
        let hit = collision
            .cast_ray(Vec2::new(x, t * 1.5), Vec2::new(x, -1.0), Some(Vec2::NEG_Y), None)
            .unwrap();
        assert!((hit.point.y - 8.0).abs() < 1e-3);
        assert!(hit.normal.y > 0.7);
    }
}
