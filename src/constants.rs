// Tuning constants for the simulation. Units are screen pixels, with
// velocities expressed in pixels-per-frame at TARGET_FPS; motion code
// scales by TARGET_FPS * dt so behavior is frame-rate independent.
// The y axis grows downward, as on screen.

/// Base grid unit; every block and terrain box is a multiple of this.
pub const TILE: f32 = 64.0;

// World dimensions are whole tiles so every block and terrain box can
// sit on the collision grid.
pub const SCREEN_WIDTH: f32 = TILE * 10.0;
pub const SCREEN_HEIGHT: f32 = TILE * 7.0;

pub const TARGET_FPS: f32 = 60.0;

/// Frame deltas above this are clamped before integration to keep the
/// simulation stable across frame stalls.
pub const MAX_FRAME_DT: f32 = 1.0 / TARGET_FPS;

// Player motion
pub const GRAVITY: f32 = 0.8;
pub const MAX_FALL_SPEED: f32 = 20.0;
pub const WALK_ACCEL: f32 = 0.2;
pub const MAX_WALK_SPEED: f32 = 7.0;
pub const FRICTION: f32 = 0.85;
pub const JUMP_IMPULSE: f32 = 2.5;
pub const MAX_JUMP_SPEED: f32 = -15.0;

// Blocks, items, coins
pub const BLOCK_BOUNCE_SPEED: f32 = 1.5;
pub const COIN_POP_SPEED: f32 = BLOCK_BOUNCE_SPEED * 3.0;
pub const BLOCK_BOUNCE_HEIGHT: f32 = TILE / 4.0;
pub const ITEM_EJECT_HEIGHT: f32 = TILE;
pub const COIN_POP_HEIGHT: f32 = TILE * 3.0;

// Fireballs
pub const FIREBALL_SPEED: f32 = MAX_WALK_SPEED;
pub const FIREBALL_SIZE: f32 = TILE / 2.0;

// Fixed capacities; exceeding any of these is a silent no-op.
pub const MAX_BLOCKS: usize = 20;
pub const COINS_PER_BLOCK: usize = 10;
pub const FIREBALL_LIMIT: usize = 4;
pub const DEBRIS_BITS: usize = 4;

// Timed effect windows, in seconds of simulated time.
pub const TRANSFORM_DURATION: f32 = 2.0;
pub const STAR_DURATION: f32 = 20.0;
pub const FIRING_DURATION: f32 = 0.2;

pub mod collision_masks {
    pub const TERRAIN: u32 = 1 << 0;
    pub const BLOCK: u32 = 1 << 1;
    pub const ITEM: u32 = 1 << 2;

    /// Everything the player and fireballs resolve against.
    pub const SOLID: u32 = TERRAIN | BLOCK;
}

/// Accumulates gravity into a vertical velocity, clamped at terminal
/// fall speed. Integration continues at the cap.
pub fn apply_gravity(vertical_velocity: f32, dt: f32) -> f32 {
    (vertical_velocity + GRAVITY * TARGET_FPS * dt).min(MAX_FALL_SPEED)
}

#[cfg(test)]
mod constants_tests {
    use super::*;

    #[test]
    fn gravity_accumulates_monotonically_to_cap() {
        let dt = 1.0 / TARGET_FPS;
        let mut dy = 0.0;
        let mut last = dy;
        for _ in 0..120 {
            dy = apply_gravity(dy, dt);
            assert!(dy >= last);
            assert!(dy <= MAX_FALL_SPEED);
            last = dy;
        }
        assert!((dy - MAX_FALL_SPEED).abs() < f32::EPSILON);

        // once at the cap, it stays clamped
        assert_eq!(apply_gravity(dy, dt), MAX_FALL_SPEED);
    }
}
