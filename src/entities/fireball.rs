use cgmath::*;
use log::debug;

use crate::{
    collision,
    constants::{collision_masks, FIREBALL_LIMIT, FIREBALL_SIZE, FIREBALL_SPEED, TARGET_FPS},
    entities::HorizontalDir,
    util::Bounds,
};

#[derive(Debug, Clone, Copy)]
pub struct Fireball {
    pub origin: Point2<f32>,
    pub velocity: Vector2<f32>,
    pub active: bool,
}

impl Fireball {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.origin, vec2(FIREBALL_SIZE, FIREBALL_SIZE))
    }
}

/// Fixed pool of fireball slots. Slots are index-addressed and reused;
/// nothing is allocated when shooting.
pub struct FireballPool {
    slots: [Fireball; FIREBALL_LIMIT],
}

impl Default for FireballPool {
    fn default() -> Self {
        Self {
            slots: [Fireball {
                origin: point2(0.0, 0.0),
                velocity: vec2(0.0, 0.0),
                active: false,
            }; FIREBALL_LIMIT],
        }
    }
}

impl FireballPool {
    /// Launches a fireball from the first free slot, moving laterally
    /// in `direction` with a constant downward bias. Returns false
    /// without side effects when every slot is occupied.
    pub fn spawn(&mut self, origin: Point2<f32>, direction: HorizontalDir) -> bool {
        match self.slots.iter_mut().find(|slot| !slot.active) {
            Some(slot) => {
                let dx = match direction {
                    HorizontalDir::East => FIREBALL_SPEED,
                    HorizontalDir::West => -FIREBALL_SPEED,
                };
                *slot = Fireball {
                    origin,
                    velocity: vec2(dx, FIREBALL_SPEED),
                    active: true,
                };
                true
            }
            None => {
                debug!("fireball pool exhausted, spawn rejected");
                false
            }
        }
    }

    /// Integrates and resolves each axis independently; solid contacts
    /// reflect the struck axis component instead of arresting motion.
    /// Balls leaving the screen despawn.
    pub fn update(&mut self, dt: f32, collision_space: &collision::Space, viewport: &Bounds) {
        let extent = vec2(FIREBALL_SIZE, FIREBALL_SIZE);

        for ball in self.slots.iter_mut().filter(|b| b.active) {
            if !ball.bounds().overlaps(viewport) {
                ball.active = false;
                continue;
            }

            ball.origin.x += ball.velocity.x * TARGET_FPS * dt;
            let contacts = collision_space.resolve_rect(
                &mut ball.origin,
                extent,
                ball.velocity.x,
                0.0,
                collision_masks::SOLID,
                viewport,
            );
            if !contacts.is_empty() {
                ball.velocity.x = -ball.velocity.x;
            }

            ball.origin.y += ball.velocity.y * TARGET_FPS * dt;
            let contacts = collision_space.resolve_rect(
                &mut ball.origin,
                extent,
                0.0,
                ball.velocity.y,
                collision_masks::SOLID,
                viewport,
            );
            if !contacts.is_empty() {
                ball.velocity.y = -ball.velocity.y;
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|b| b.active).count()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Fireball> {
        self.slots.iter().filter(|b| b.active)
    }
}

// ---------------------------------------------------------------------------------------------------------------------
