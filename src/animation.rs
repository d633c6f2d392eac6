//! Pure mappings from entity state + elapsed simulation time to sprite
//! frame indices. Frame numbers address a fixed sheet layout; the
//! renderer (not part of this crate) owns the actual source rects.

use crate::entities::block::ItemKind;
use crate::entities::player::PowerState;

// Player sheet layout
const STILL: u16 = 0;
const WALK: u16 = 1;
const JUMP: u16 = 5;
const TALL_STILL: u16 = 28;
const TALL_WALK: u16 = 29;
const TALL_JUMP: u16 = 33;
const TALL_SQUATTING: u16 = 34;
const FIRE_STILL: u16 = 56;
const FIRE_WALK: u16 = 57;
const FIRE_JUMP: u16 = 61;
const FIRE_SQUATTING: u16 = 62;
const FIRE_FIRING: u16 = 63;
const SMALL_TO_TALL: u16 = 75;
const SMALL_TO_FIRE: u16 = 78;

// Item sheet layout
const FLOWER_FRAME: u16 = 2;
const STAR_FRAME: u16 = 6;
const COIN_FRAME: u16 = 10;

// Effects sheet layout; frames 0-3 are debris bits
const FIREBALL_FRAME: u16 = 4;

const WALK_CYCLE_MS: u32 = 180;
const TRANSFORM_CYCLE_MS: u32 = 180;
const STAR_FLICKER_MS: u32 = 90;
const COIN_CYCLE_MS: u32 = 100;
const ITEM_CYCLE_MS: u32 = 180;

/// Everything the player frame selection depends on; a plain snapshot
/// so selection stays a pure function.
#[derive(Debug, Clone, Copy)]
pub struct PlayerFrameState {
    pub power: PowerState,
    /// Mid-transformation target, with seconds elapsed in the window.
    pub transforming_to: Option<PowerState>,
    pub transform_elapsed: f32,
    pub walking: bool,
    pub jumping: bool,
    pub squatting: bool,
    pub firing: bool,
    pub invincible: bool,
    /// Magnitude of horizontal velocity; faster walk animates faster.
    pub speed: f32,
}

fn ticks(time: f32) -> u32 {
    (time.max(0.0) * 1000.0) as u32
}

pub fn player_frame(state: &PlayerFrameState, time: f32) -> u16 {
    if let Some(target) = state.transforming_to {
        let cycle = (ticks(state.transform_elapsed) / TRANSFORM_CYCLE_MS % 3) as u16;
        let base = match target {
            PowerState::Fire => SMALL_TO_FIRE,
            _ => SMALL_TO_TALL,
        };
        return base + cycle;
    }

    let anim_speed = ((state.speed * 0.3) as u32).max(1);
    let walk_frame = (ticks(time) * anim_speed / WALK_CYCLE_MS % 3) as u16;
    let jumping = state.jumping && !state.squatting;
    let walking = state.walking && !state.squatting && !state.jumping;

    let mut frame = match state.power {
        PowerState::Small => {
            if jumping {
                JUMP
            } else if !walking {
                STILL
            } else {
                WALK + walk_frame
            }
        }
        PowerState::Tall => {
            if state.squatting {
                TALL_SQUATTING
            } else if jumping {
                TALL_JUMP
            } else if !walking {
                TALL_STILL
            } else {
                TALL_WALK + walk_frame
            }
        }
        PowerState::Fire => {
            let mut frame = if state.squatting {
                FIRE_SQUATTING
            } else if jumping {
                FIRE_JUMP
            } else if !walking {
                FIRE_STILL
            } else {
                FIRE_WALK + walk_frame
            };
            if state.firing {
                frame = if jumping {
                    FIRE_FIRING + 1
                } else if walking {
                    FIRE_FIRING + walk_frame
                } else {
                    FIRE_FIRING
                };
            }
            frame
        }
    };

    if state.invincible {
        let star_frame = (ticks(time) / STAR_FLICKER_MS % 4) as u16;
        match state.power {
            // small/tall rows repeat every 7 frames per palette
            PowerState::Small | PowerState::Tall => frame += star_frame * 7,
            PowerState::Fire => {
                if state.firing {
                    frame += star_frame * 3;
                } else {
                    let offsets = [0, 21, 14, 7];
                    frame -= offsets[star_frame as usize];
                }
            }
        }
    }

    frame
}

/// Items are static until freed from their block, then cycle; coins
/// spin faster than flowers and stars. Mushrooms have a single frame.
pub fn item_frame(kind: ItemKind, free: bool, time: f32) -> u16 {
    let period = match kind {
        ItemKind::Coins => COIN_CYCLE_MS,
        _ => ITEM_CYCLE_MS,
    };
    let cycle = if free {
        (ticks(time) / period % 4) as u16
    } else {
        0
    };

    match kind {
        ItemKind::Mushroom => 0,
        ItemKind::FireFlower => FLOWER_FRAME + cycle,
        ItemKind::Star => STAR_FRAME + cycle,
        ItemKind::Coins => COIN_FRAME + cycle,
    }
}

pub fn fireball_frame(time: f32) -> u16 {
    FIREBALL_FRAME + (ticks(time) / WALK_CYCLE_MS % 4) as u16
}

/// Debris bits use one fixed effects frame per fragment.
pub fn debris_frame(bit: usize) -> u16 {
    (bit % 4) as u16
}

#[cfg(test)]
mod animation_tests {
    use super::*;

    fn still_small() -> PlayerFrameState {
        PlayerFrameState {
            power: PowerState::Small,
            transforming_to: None,
            transform_elapsed: 0.0,
            walking: false,
            jumping: false,
            squatting: false,
            firing: false,
            invincible: false,
            speed: 0.0,
        }
    }

    #[test]
    fn idle_small_player_uses_still_frame() {
        assert_eq!(player_frame(&still_small(), 0.0), STILL);
        assert_eq!(player_frame(&still_small(), 3.7), STILL);
    }

    #[test]
    fn walk_cycle_stays_within_three_frames() {
        let mut state = still_small();
        state.walking = true;
        state.speed = 7.0;
        for step in 0..240 {
            let frame = player_frame(&state, step as f32 / 60.0);
            assert!((WALK..WALK + 3).contains(&frame));
        }
    }

    #[test]
    fn jump_overrides_walk() {
        let mut state = still_small();
        state.walking = true;
        state.jumping = true;
        assert_eq!(player_frame(&state, 0.5), JUMP);
    }

    #[test]
    fn squatting_fire_player_ignores_jump_frames() {
        let mut state = still_small();
        state.power = PowerState::Fire;
        state.squatting = true;
        state.jumping = true;
        assert_eq!(player_frame(&state, 0.2), FIRE_SQUATTING);
    }

    #[test]
    fn transformation_cycles_through_three_frames() {
        let mut state = still_small();
        state.transforming_to = Some(PowerState::Tall);
        for step in 0..120 {
            state.transform_elapsed = step as f32 / 60.0;
            let frame = player_frame(&state, state.transform_elapsed);
            assert!((SMALL_TO_TALL..SMALL_TO_TALL + 3).contains(&frame));
        }

        state.transforming_to = Some(PowerState::Fire);
        assert!(player_frame(&state, 0.0) >= SMALL_TO_FIRE);
    }

    #[test]
    fn dormant_items_do_not_animate() {
        assert_eq!(item_frame(ItemKind::Star, false, 5.0), STAR_FRAME);
        assert_eq!(item_frame(ItemKind::Mushroom, true, 5.0), 0);
        let free = item_frame(ItemKind::Coins, true, 0.25);
        assert!((COIN_FRAME..COIN_FRAME + 4).contains(&free));
    }

    #[test]
    fn fireball_frames_cycle_in_effects_sheet() {
        for step in 0..60 {
            let frame = fireball_frame(step as f32 / 60.0);
            assert!((FIREBALL_FRAME..FIREBALL_FRAME + 4).contains(&frame));
        }
    }
}
