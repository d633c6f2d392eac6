use std::time::Duration;

use anyhow::Result;
use log::{debug, info, warn};

use crate::{
    collision,
    constants::{collision_masks, MAX_BLOCKS, MAX_FRAME_DT},
    entities::{block::Block, fireball::FireballPool, player::Player},
    entity::{Entity, IdVendor},
    events::{Dispatcher, Event, Message},
    input::{InputState, Intent},
    level::{Level, PlacementKind},
};

use super::scene::{self, Scene};

// Message chains are short (hit -> block -> power-up -> player); this
// caps routing per frame in case something ever loops.
const MAX_DISPATCH_ROUNDS: u32 = 4;

/// The single aggregate owning all simulation state: the level, the
/// collision space, the player, and the fixed-capacity block and
/// fireball stores. One instance is stepped once per frame by the
/// embedding loop.
pub struct GameState {
    level: Level,
    collision_space: collision::Space,
    input_state: InputState,
    message_dispatcher: Dispatcher,
    player: Player,
    blocks: Vec<Block>,
    fireballs: FireballPool,
    time: f32,
}

impl GameState {
    pub fn new() -> Result<Self> {
        Ok(Self::with_level(Level::new()?))
    }

    pub fn with_level(level: Level) -> Self {
        let mut collision_space = collision::Space::new();
        for cell in level.terrain_cells() {
            collision_space
                .add_collider(collision::Collider::new_static(cell, collision_masks::TERRAIN));
        }

        let mut id_vendor = IdVendor::default();
        let player = Player::new(id_vendor.next_id(), level.player_spawn);

        let mut blocks = Vec::new();
        for placement in &level.placements {
            if blocks.len() >= MAX_BLOCKS {
                warn!(
                    "block capacity ({}) reached, ignoring placement at {:?}",
                    MAX_BLOCKS, placement.origin
                );
                continue;
            }
            let entity_id = id_vendor.next_id();
            let block = match placement.kind {
                PlacementKind::Breakable => {
                    Block::breakable(entity_id, placement.origin, &mut collision_space)
                }
                PlacementKind::Full(kind) => {
                    Block::with_item(entity_id, placement.origin, kind, &mut collision_space)
                }
            };
            blocks.push(block);
        }

        info!(
            "level ready: {} blocks, {} terrain boxes",
            blocks.len(),
            level.terrain.len()
        );

        Self {
            level,
            collision_space,
            input_state: InputState::new(),
            message_dispatcher: Dispatcher::default(),
            player,
            blocks,
            fireballs: FireballPool::default(),
            time: 0.0,
        }
    }

    /// Advances the simulation by one frame: fold the input intent into
    /// edge state, step the player, fireballs and blocks, then route
    /// queued messages. The frame delta is clamped so a stalled frame
    /// cannot destabilize integration.
    pub fn update(&mut self, dt: Duration, intent: &Intent) {
        let mut dt = dt.as_secs_f32();
        if dt > MAX_FRAME_DT {
            debug!("clamping frame delta {:.4}s to {:.4}s", dt, MAX_FRAME_DT);
            dt = MAX_FRAME_DT;
        }
        self.time += dt;

        self.input_state.apply(intent);

        // the world holds still while the player transforms
        if self.player.is_transforming() {
            self.player.update_transform(dt);
            return;
        }

        let viewport = self.level.bounds;
        self.player.update(
            dt,
            &self.input_state,
            &mut self.collision_space,
            &mut self.message_dispatcher,
            &viewport,
        );
        self.fireballs.update(dt, &self.collision_space, &viewport);
        for block in &mut self.blocks {
            block.update(dt, &mut self.collision_space);
        }

        // route queued messages, including replies produced while routing
        let mut rounds = 0;
        while !self.message_dispatcher.is_empty() && rounds < MAX_DISPATCH_ROUNDS {
            let messages = self.message_dispatcher.drain();
            for message in &messages {
                self.route_message(message);
            }
            rounds += 1;
        }
    }

    fn route_message(&mut self, message: &Message) {
        if let Some(recipient) = message.recipient_entity_id {
            //
            //  Addressed messages go straight to their entity.
            //

            if let Some(entity) = entity_mut(&mut self.player, &mut self.blocks, recipient) {
                entity.handle_message(
                    message,
                    &mut self.collision_space,
                    &mut self.message_dispatcher,
                );
            }
        } else {
            match message.event {
                Event::TryShootFireball { origin, direction } => {
                    // a full pool silently swallows the request
                    if self.fireballs.spawn(origin, direction) {
                        self.message_dispatcher
                            .global_to_entity(self.player.entity_id(), Event::DidShootFireball);
                    }
                }
                Event::PowerUpCollected { .. } => {
                    // blocks report collection globally; forward to the player
                    self.message_dispatcher
                        .global_to_entity(self.player.entity_id(), message.event);
                }
                _ => {}
            }
        }
    }

    pub fn scene(&self) -> Scene {
        scene::capture(self)
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn fireballs(&self) -> &FireballPool {
        &self.fireballs
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

fn entity_mut<'a>(
    player: &'a mut Player,
    blocks: &'a mut [Block],
    entity_id: u32,
) -> Option<&'a mut dyn Entity> {
    if player.entity_id() == entity_id {
        return Some(player);
    }
    blocks
        .iter_mut()
        .find(|b| b.entity_id() == entity_id)
        .map(|b| b as &mut dyn Entity)
}
