use cgmath::*;
use log::debug;

use crate::{
    collision,
    constants::{
        apply_gravity, collision_masks, BLOCK_BOUNCE_HEIGHT, BLOCK_BOUNCE_SPEED, COINS_PER_BLOCK,
        COIN_POP_HEIGHT, COIN_POP_SPEED, DEBRIS_BITS, ITEM_EJECT_HEIGHT, SCREEN_HEIGHT, TARGET_FPS,
        TILE,
    },
    entity::Entity,
    events::{Dispatcher, Event, Message},
    util::Bounds,
};

// ---------------------------------------------------------------------------------------------------------------------

// Initial kick applied to debris bits when a breakable block shatters,
// in px-per-frame at the target frame rate.
const DEBRIS_KICK_X: f32 = 3.0;
const DEBRIS_KICK_Y: f32 = -6.0;

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Coins,
    Mushroom,
    FireFlower,
    Star,
}

/// Block lifecycle. Transitions are monotonic: Breakable may only
/// shatter to Destroyed, Full may only spend itself to Empty, and
/// Empty/Destroyed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Brick with nothing inside; shatters when hit from below by a
    /// big player, otherwise just bounces.
    Breakable,
    /// Solid and holding an undelivered item or a coin supply.
    Full,
    /// Solid, spent, inert.
    Empty,
    /// Shattered; no longer collides, renders only debris.
    Destroyed,
}

/// Which sheet sprite a block renders with; None once destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSprite {
    Brick,
    Question,
    Spent,
}

#[derive(Debug, Clone, Copy)]
pub struct Item {
    pub kind: ItemKind,
    pub origin: Point2<f32>,
    pub free: bool,
    pub visible: bool,
}

impl Item {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.origin, vec2(TILE, TILE))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Coin {
    pub origin: Point2<f32>,
    pub airborne: bool,
    falling: bool,
}

impl Coin {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.origin, vec2(TILE / 2.0, TILE))
    }
}

struct CoinStack {
    coins: Vec<Coin>,
    remaining: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct DebrisBit {
    pub origin: Point2<f32>,
    pub velocity: Vector2<f32>,
}

impl DebrisBit {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.origin, vec2(TILE / 2.0, TILE / 2.0))
    }
}

// ---------------------------------------------------------------------------------------------------------------------

pub struct Block {
    entity_id: u32,
    collider_id: u32,
    item_collider_id: Option<u32>,
    origin: Point2<f32>,
    init_y: f32,
    state: BlockState,
    bouncing: bool,
    item: Option<Item>,
    coins: Option<CoinStack>,
    debris: Vec<DebrisBit>,
}

impl Block {
    /// A breakable brick with nothing inside.
    pub fn breakable(
        entity_id: u32,
        origin: Point2<f32>,
        collision_space: &mut collision::Space,
    ) -> Self {
        Self::build(entity_id, origin, BlockState::Breakable, None, collision_space)
    }

    /// A full block dispensing `kind` when hit from below.
    pub fn with_item(
        entity_id: u32,
        origin: Point2<f32>,
        kind: ItemKind,
        collision_space: &mut collision::Space,
    ) -> Self {
        Self::build(entity_id, origin, BlockState::Full, Some(kind), collision_space)
    }

    fn build(
        entity_id: u32,
        origin: Point2<f32>,
        state: BlockState,
        kind: Option<ItemKind>,
        collision_space: &mut collision::Space,
    ) -> Self {
        let collider_id = collision_space.add_collider(collision::Collider::new_dynamic(
            Bounds::new(origin, vec2(TILE, TILE)),
            entity_id,
            collision_masks::BLOCK,
        ));

        let mut block = Self {
            entity_id,
            collider_id,
            item_collider_id: None,
            origin,
            init_y: origin.y,
            state,
            bouncing: false,
            item: None,
            coins: None,
            debris: Vec::new(),
        };

        match kind {
            Some(ItemKind::Coins) => {
                let coin = Coin {
                    // coins are half a tile wide and pop from the block's center
                    origin: point2(origin.x + TILE / 4.0, origin.y),
                    airborne: false,
                    falling: false,
                };
                block.coins = Some(CoinStack {
                    coins: vec![coin; COINS_PER_BLOCK],
                    remaining: COINS_PER_BLOCK as u32,
                });
            }
            Some(kind) => {
                block.item = Some(Item {
                    kind,
                    origin,
                    free: false,
                    visible: true,
                });
                // dormant until the item is freed
                let item_collider_id = collision_space.add_collider(
                    collision::Collider::new_dynamic(
                        Bounds::new(origin, vec2(TILE, TILE)),
                        entity_id,
                        collision_masks::ITEM,
                    ),
                );
                collision_space.deactivate_collider(item_collider_id);
                block.item_collider_id = Some(item_collider_id);
            }
            None => {}
        }

        block
    }

    pub fn update(&mut self, dt: f32, collision_space: &mut collision::Space) {
        let step = BLOCK_BOUNCE_SPEED * TARGET_FPS * dt;

        //
        //  Bounce spring: rise a quarter tile above rest, then relax
        //  back down at the same speed. Settled means y == init_y.
        //

        if self.bouncing {
            let apex = self.init_y - BLOCK_BOUNCE_HEIGHT;
            self.origin.y = (self.origin.y - step).max(apex);
            if self.origin.y <= apex {
                self.bouncing = false;
            }
        } else if self.origin.y < self.init_y {
            self.origin.y = (self.origin.y + step).min(self.init_y);
        }

        if self.state != BlockState::Destroyed {
            collision_space.update_collider_position(self.collider_id, self.origin);
        }

        //
        //  A freed item rises one full tile out of the block; the block
        //  is spent only once delivery completes.
        //

        if self.state == BlockState::Full {
            if let Some(item) = &mut self.item {
                if item.free {
                    let apex = self.init_y - ITEM_EJECT_HEIGHT;
                    item.origin.y = (item.origin.y - step).max(apex);
                    if let Some(id) = self.item_collider_id {
                        collision_space.update_collider_position(id, item.origin);
                    }
                    if item.origin.y <= apex {
                        self.state = BlockState::Empty;
                        debug!(
                            "Block[{}] item {:?} delivered, block spent",
                            self.entity_id, item.kind
                        );
                    }
                }
            }
        }

        //
        //  Coins arc up three tiles and fall back to rest; each coin
        //  animates independently so several can be airborne at once.
        //

        if let Some(stack) = &mut self.coins {
            let pop = COIN_POP_SPEED * TARGET_FPS * dt;
            for coin in stack.coins.iter_mut().filter(|c| c.airborne) {
                if !coin.falling {
                    let apex = self.init_y - COIN_POP_HEIGHT;
                    coin.origin.y = (coin.origin.y - pop).max(apex);
                    if coin.origin.y <= apex {
                        coin.falling = true;
                    }
                } else {
                    coin.origin.y = (coin.origin.y + pop).min(self.init_y);
                    if coin.origin.y >= self.init_y {
                        coin.airborne = false;
                        coin.falling = false;
                    }
                }
            }
        }

        //
        //  Debris flies until it leaves the bottom of the screen.
        //

        if self.state == BlockState::Destroyed && !self.debris.is_empty() {
            for bit in &mut self.debris {
                bit.velocity.y = apply_gravity(bit.velocity.y, dt);
                bit.origin = bit.origin + bit.velocity * TARGET_FPS * dt;
            }
            self.debris.retain(|bit| bit.origin.y < SCREEN_HEIGHT + TILE);
        }
    }

    fn receive_hit(&mut self, big_player: bool, collision_space: &mut collision::Space) {
        match self.state {
            BlockState::Empty | BlockState::Destroyed => {}

            BlockState::Breakable => {
                if big_player {
                    self.shatter(collision_space);
                } else {
                    self.bouncing = true;
                }
            }

            BlockState::Full => {
                self.bouncing = true;

                if let Some(stack) = &mut self.coins {
                    if stack.remaining > 0 {
                        stack.remaining -= 1;
                        if let Some(coin) = stack.coins.iter_mut().find(|c| !c.airborne) {
                            coin.airborne = true;
                            coin.falling = false;
                        }
                        if stack.remaining == 0 {
                            self.state = BlockState::Empty;
                            debug!("Block[{}] coin supply exhausted", self.entity_id);
                        }
                    }
                } else if let Some(item) = &mut self.item {
                    if !item.free {
                        item.free = true;
                        if let Some(id) = self.item_collider_id {
                            collision_space.activate_collider(id);
                        }
                        debug!("Block[{}] freed item {:?}", self.entity_id, item.kind);
                    }
                }
            }
        }
    }

    fn shatter(&mut self, collision_space: &mut collision::Space) {
        self.state = BlockState::Destroyed;
        self.bouncing = false;
        collision_space.deactivate_collider(self.collider_id);

        let half = TILE / 2.0;
        self.debris = (0..DEBRIS_BITS)
            .map(|i| {
                let left = i % 2 == 0;
                let top = i < 2;
                DebrisBit {
                    origin: point2(
                        self.origin.x + if left { 0.0 } else { half },
                        self.origin.y + if top { 0.0 } else { half },
                    ),
                    velocity: vec2(
                        if left { -DEBRIS_KICK_X } else { DEBRIS_KICK_X },
                        if top { DEBRIS_KICK_Y } else { DEBRIS_KICK_Y * 0.75 },
                    ),
                }
            })
            .collect();

        debug!("Block[{}] destroyed", self.entity_id);
    }

    fn collect_item(&mut self, collision_space: &mut collision::Space, dispatcher: &mut Dispatcher) {
        if let Some(item) = &mut self.item {
            if item.free && item.visible {
                item.visible = false;
                if let Some(id) = self.item_collider_id {
                    collision_space.deactivate_collider(id);
                }
                dispatcher
                    .entity_to_global(self.entity_id, Event::PowerUpCollected { kind: item.kind });
                debug!("Block[{}] item {:?} collected", self.entity_id, item.kind);
            }
        }
    }

    // ------------------------------------------------------------------------------------------------------------------

    pub fn state(&self) -> BlockState {
        self.state
    }

    pub fn init_y(&self) -> f32 {
        self.init_y
    }

    pub fn is_bouncing(&self) -> bool {
        self.bouncing
    }

    pub fn sprite(&self) -> Option<BlockSprite> {
        match self.state {
            BlockState::Destroyed => None,
            BlockState::Empty => Some(BlockSprite::Spent),
            BlockState::Breakable => Some(BlockSprite::Brick),
            BlockState::Full => match &self.coins {
                Some(_) => Some(BlockSprite::Brick),
                None => Some(BlockSprite::Question),
            },
        }
    }

    pub fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    pub fn coin_count(&self) -> Option<u32> {
        self.coins.as_ref().map(|stack| stack.remaining)
    }

    pub fn airborne_coins(&self) -> impl Iterator<Item = &Coin> {
        self.coins
            .iter()
            .flat_map(|stack| stack.coins.iter().filter(|c| c.airborne))
    }

    pub fn debris(&self) -> &[DebrisBit] {
        &self.debris
    }
}

impl Entity for Block {
    fn entity_id(&self) -> u32 {
        self.entity_id
    }

    fn bounds(&self) -> Bounds {
        Bounds::new(self.origin, vec2(TILE, TILE))
    }

    fn handle_message(
        &mut self,
        message: &Message,
        collision_space: &mut collision::Space,
        message_dispatcher: &mut Dispatcher,
    ) {
        match message.event {
            Event::BlockHitFromBelow { big_player } => {
                self.receive_hit(big_player, collision_space);
            }
            Event::ItemTouched => {
                self.collect_item(collision_space, message_dispatcher);
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------------------------------------------------
