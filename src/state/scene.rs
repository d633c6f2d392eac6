//! The renderable snapshot handed to whatever draws frames. Pure data:
//! boxes, facing, and sprite frame indices; no references back into the
//! simulation.

use crate::{
    animation,
    entities::{
        block::{BlockSprite, ItemKind},
        HorizontalDir,
    },
    util::Bounds,
};

use super::game_state::GameState;

#[derive(Debug, Clone)]
pub struct PlayerView {
    pub bounds: Bounds,
    pub facing_right: bool,
    pub frame: u16,
    pub invincible: bool,
    pub squatting: bool,
}

#[derive(Debug, Clone)]
pub struct BlockView {
    pub bounds: Bounds,
    /// None once the block has been destroyed; only debris remains.
    pub sprite: Option<BlockSprite>,
    pub debris: Vec<(Bounds, u16)>,
}

#[derive(Debug, Clone)]
pub struct ItemView {
    pub kind: ItemKind,
    pub bounds: Bounds,
    pub frame: u16,
}

#[derive(Debug, Clone)]
pub struct CoinView {
    pub bounds: Bounds,
    pub frame: u16,
}

#[derive(Debug, Clone)]
pub struct FireballView {
    pub bounds: Bounds,
    pub frame: u16,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub player: PlayerView,
    pub blocks: Vec<BlockView>,
    pub items: Vec<ItemView>,
    pub coins: Vec<CoinView>,
    pub fireballs: Vec<FireballView>,
    pub terrain: Vec<Bounds>,
}

pub fn capture(state: &GameState) -> Scene {
    use crate::entity::Entity;

    let time = state.time();
    let player = state.player();

    let mut blocks = Vec::with_capacity(state.blocks().len());
    let mut items = Vec::new();
    let mut coins = Vec::new();

    for block in state.blocks() {
        blocks.push(BlockView {
            bounds: block.bounds(),
            sprite: block.sprite(),
            debris: block
                .debris()
                .iter()
                .enumerate()
                .map(|(i, bit)| (bit.bounds(), animation::debris_frame(i)))
                .collect(),
        });

        if let Some(item) = block.item() {
            if item.visible {
                items.push(ItemView {
                    kind: item.kind,
                    bounds: item.bounds(),
                    frame: animation::item_frame(item.kind, item.free, time),
                });
            }
        }

        for coin in block.airborne_coins() {
            coins.push(CoinView {
                bounds: coin.bounds(),
                frame: animation::item_frame(ItemKind::Coins, true, time),
            });
        }
    }

    let fireballs = state
        .fireballs()
        .iter_active()
        .map(|ball| FireballView {
            bounds: ball.bounds(),
            frame: animation::fireball_frame(time),
        })
        .collect();

    Scene {
        player: PlayerView {
            bounds: player.bounds(),
            facing_right: player.facing() == HorizontalDir::East,
            frame: player.frame(),
            invincible: player.is_invincible(),
            squatting: player.is_squatting(),
        },
        blocks,
        items,
        coins,
        fireballs,
        terrain: state.level().terrain.clone(),
    }
}
