use anyhow::{ensure, Result};
use cgmath::*;

use crate::constants::{SCREEN_HEIGHT, SCREEN_WIDTH, TILE};
use crate::entities::block::ItemKind;
use crate::util::Bounds;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementKind {
    /// A brick with nothing inside; big players can smash it.
    Breakable,
    /// A block holding an item or a coin supply.
    Full(ItemKind),
}

/// One entry of the hard-coded block placement table.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub origin: Point2<f32>,
    pub kind: PlacementKind,
}

/// Static level description: world bounds, physics-authoritative
/// terrain boxes (computed once here, never re-derived from rendering),
/// and the block placement table.
pub struct Level {
    pub bounds: Bounds,
    pub terrain: Vec<Bounds>,
    pub placements: Vec<Placement>,
    pub player_spawn: Point2<f32>,
}

impl Level {
    /// The built-in stage: a strip of 2x2-tile ground segments along
    /// the bottom, one low brick, and a row of blocks at jumping
    /// height - brick, mushroom, fire flower, coins, star.
    pub fn new() -> Result<Self> {
        let (w, h, t) = (SCREEN_WIDTH, SCREEN_HEIGHT, TILE);

        let segment = vec2(t * 2.0, t * 2.0);
        let terrain = (0..6)
            .map(|i| Bounds::new(point2(i as f32 * segment.x, h - segment.y), segment))
            .collect();

        let row_y = h - t * 5.0;
        let placements = vec![
            Placement {
                origin: point2(t, h - t * 3.0),
                kind: PlacementKind::Breakable,
            },
            Placement {
                origin: point2(w / 2.0 - t * 2.0, row_y),
                kind: PlacementKind::Breakable,
            },
            Placement {
                origin: point2(w / 2.0 - t, row_y),
                kind: PlacementKind::Full(ItemKind::Mushroom),
            },
            Placement {
                origin: point2(w / 2.0, row_y),
                kind: PlacementKind::Full(ItemKind::FireFlower),
            },
            Placement {
                origin: point2(w / 2.0 + t, row_y),
                kind: PlacementKind::Full(ItemKind::Coins),
            },
            Placement {
                origin: point2(w / 2.0 + t * 2.0, row_y),
                kind: PlacementKind::Full(ItemKind::Star),
            },
        ];

        Self::build(
            Bounds::new(point2(0.0, 0.0), vec2(w, h)),
            terrain,
            placements,
            point2(w / 2.0 - t, h - t * 3.0),
        )
    }

    /// Assembles a level from parts, validating the tile-alignment
    /// invariant every block and terrain box must satisfy.
    pub fn build(
        bounds: Bounds,
        terrain: Vec<Bounds>,
        placements: Vec<Placement>,
        player_spawn: Point2<f32>,
    ) -> Result<Self> {
        for rect in &terrain {
            ensure!(
                tile_aligned(rect.origin.x)
                    && tile_aligned(rect.origin.y)
                    && tile_aligned(rect.extent.x)
                    && tile_aligned(rect.extent.y),
                "terrain box must be tile-aligned: {:?}",
                rect
            );
        }
        for placement in &placements {
            ensure!(
                tile_aligned(placement.origin.x) && tile_aligned(placement.origin.y),
                "block placement must be tile-aligned: {:?}",
                placement
            );
        }

        Ok(Self {
            bounds,
            terrain,
            placements,
            player_spawn,
        })
    }

    /// Grid cells covered by the terrain boxes, for building static
    /// colliders.
    pub fn terrain_cells(&self) -> Vec<Point2<i32>> {
        let mut cells = Vec::new();
        for rect in &self.terrain {
            let x0 = (rect.left() / TILE) as i32;
            let y0 = (rect.top() / TILE) as i32;
            let cols = (rect.width() / TILE) as i32;
            let rows = (rect.height() / TILE) as i32;
            for row in 0..rows {
                for col in 0..cols {
                    cells.push(point2(x0 + col, y0 + row));
                }
            }
        }
        cells
    }
}

fn tile_aligned(v: f32) -> bool {
    (v / TILE).fract() == 0.0
}
