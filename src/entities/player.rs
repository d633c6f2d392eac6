use cgmath::*;
use log::debug;

use crate::{
    animation::{self, PlayerFrameState},
    collision::{self, ContactKind},
    constants::{
        apply_gravity, collision_masks, FIRING_DURATION, FRICTION, JUMP_IMPULSE, MAX_JUMP_SPEED,
        MAX_WALK_SPEED, SCREEN_HEIGHT, SCREEN_WIDTH, STAR_DURATION, TARGET_FPS, TILE,
        TRANSFORM_DURATION, WALK_ACCEL,
    },
    entities::{block::ItemKind, HorizontalDir},
    entity::Entity,
    events::{Dispatcher, Event, Message},
    input::{input_accumulator, ButtonState, InputState},
    util::Bounds,
};

// ---------------------------------------------------------------------------------------------------------------------

/// Power progression is monotonic upward within a life; Fire implies
/// tall-sized, so the illegal "fire but small" combination cannot be
/// represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Small,
    Tall,
    Fire,
}

impl PowerState {
    pub fn is_big(&self) -> bool {
        !matches!(self, PowerState::Small)
    }
}

// ---------------------------------------------------------------------------------------------------------------------

pub struct Player {
    entity_id: u32,
    origin: Point2<f32>,
    velocity: Vector2<f32>,

    power: PowerState,
    /// Mid-transformation target; input and kinematics are suspended
    /// while this is set.
    pending_power: Option<PowerState>,
    transform_countdown: f32,
    star_countdown: f32,
    firing_countdown: f32,

    facing: HorizontalDir,
    walking: bool,
    squatting: bool,
    on_surface: bool,
    holding_jump: bool,
    on_jump: bool,
    gaining_height: bool,

    time: f32,
    frame: u16,
}

impl Player {
    pub fn new(entity_id: u32, origin: Point2<f32>) -> Self {
        Self {
            entity_id,
            origin,
            velocity: vec2(0.0, 0.0),
            power: PowerState::Small,
            pending_power: None,
            transform_countdown: 0.0,
            star_countdown: 0.0,
            firing_countdown: 0.0,
            facing: HorizontalDir::East,
            walking: false,
            squatting: false,
            on_surface: false,
            holding_jump: false,
            on_jump: false,
            gaining_height: false,
            time: 0.0,
            frame: 0,
        }
    }

    pub fn update(
        &mut self,
        dt: f32,
        input: &InputState,
        collision_space: &mut collision::Space,
        message_dispatcher: &mut Dispatcher,
        viewport: &Bounds,
    ) {
        self.time += dt;

        //
        //  Timed effect windows, measured in simulated time so they are
        //  independent of frame cadence.
        //

        self.star_countdown = (self.star_countdown - dt).max(0.0);
        self.firing_countdown = (self.firing_countdown - dt).max(0.0);

        // on_surface carries over from last frame's vertical resolution
        if self.on_surface {
            self.gaining_height = false;
            self.on_jump = false;
        }

        //
        //  Firing is edge triggered, needs fire power, and is blocked
        //  while squatting. The pool replies with DidShootFireball if a
        //  slot was actually free.
        //

        if input.fire() == ButtonState::Pressed
            && self.power == PowerState::Fire
            && !self.squatting
        {
            let origin = match self.facing {
                HorizontalDir::East => point2(self.origin.x + self.extent().x, self.origin.y),
                HorizontalDir::West => point2(self.origin.x, self.origin.y),
            };
            message_dispatcher.entity_to_global(
                self.entity_id,
                Event::TryShootFireball {
                    origin,
                    direction: self.facing,
                },
            );
        }

        //
        //  Releasing jump mid-rise damps the ascent immediately.
        //

        if input.jump() == ButtonState::Released {
            if self.velocity.y < 0.0 {
                self.velocity.y *= FRICTION;
            }
            self.holding_jump = false;
            self.gaining_height = false;
        }

        if input.squat() == ButtonState::Released && self.squatting {
            self.origin.y -= TILE;
            self.squatting = false;
        }

        //
        //  Lateral acceleration with friction braking; squatting pins
        //  the player in place.
        //

        let walk_input = if self.squatting {
            0
        } else {
            input_accumulator(input.move_left(), input.move_right())
        };

        if walk_input < 0 {
            self.facing = HorizontalDir::West;
            self.walking = true;
            if self.velocity.x > 0.0 {
                self.velocity.x *= FRICTION;
            }
            if self.velocity.x > -MAX_WALK_SPEED {
                self.velocity.x -= WALK_ACCEL;
            }
        } else if walk_input > 0 {
            self.facing = HorizontalDir::East;
            self.walking = true;
            if self.velocity.x < 0.0 {
                self.velocity.x *= FRICTION;
            }
            if self.velocity.x < MAX_WALK_SPEED {
                self.velocity.x += WALK_ACCEL;
            }
        } else if self.velocity.x != 0.0 {
            self.velocity.x *= FRICTION;
            if self.velocity.x.abs() < 0.1 {
                self.velocity.x = 0.0;
            }
        } else {
            self.walking = false;
        }

        //
        //  Squatting requires being tall-sized and grounded; the hitbox
        //  shrinks to the lower tile.
        //

        if self.on_surface
            && walk_input == 0
            && self.power.is_big()
            && input.squat().is_active()
            && !self.squatting
        {
            self.origin.y += TILE;
            self.squatting = true;
        }

        //
        //  Variable-height jump: impulse accumulates while the button
        //  is held, until the rise speed cap cuts it off.
        //

        if ((!self.holding_jump && self.on_surface)
            || (!self.on_surface && self.gaining_height))
            && input.jump().is_active()
        {
            self.velocity.y -= JUMP_IMPULSE;
            self.gaining_height = self.velocity.y >= MAX_JUMP_SPEED;
            self.holding_jump = true;
            self.on_jump = true;
        }

        // the world has a hard ceiling and left wall at its origin
        if self.origin.y < 0.0 {
            self.origin.y = 0.0;
        }
        if self.origin.x < 0.0 {
            self.origin.x = 0.0;
        }

        //
        //  Axis-separated integration: advance and resolve X, then
        //  apply gravity and advance and resolve Y. Vertical contacts
        //  from below are the trigger edge for block transitions.
        //

        let extent = self.extent();

        self.origin.x += self.velocity.x * TARGET_FPS * dt;
        let contacts = collision_space.resolve_rect(
            &mut self.origin,
            extent,
            self.velocity.x,
            0.0,
            collision_masks::SOLID,
            viewport,
        );
        if !contacts.is_empty() {
            self.velocity.x = 0.0;
        }

        self.velocity.y = apply_gravity(self.velocity.y, dt);
        self.origin.y += self.velocity.y * TARGET_FPS * dt;
        let contacts = collision_space.resolve_rect(
            &mut self.origin,
            extent,
            0.0,
            self.velocity.y,
            collision_masks::SOLID,
            viewport,
        );

        self.on_surface = false;
        for contact in &contacts {
            match contact.kind {
                ContactKind::Landing => self.on_surface = true,
                ContactKind::Ceiling => {
                    if let Some(block_id) = contact.entity_id {
                        message_dispatcher.entity_to_entity(
                            self.entity_id,
                            block_id,
                            Event::BlockHitFromBelow {
                                big_player: self.power.is_big(),
                            },
                        );
                    }
                }
                ContactKind::Wall => {}
            }
        }
        if !contacts.is_empty() {
            self.velocity.y = 0.0;
            self.gaining_height = false;
        }

        //
        //  Freed items are collected on plain overlap, independent of
        //  the axis resolution above.
        //

        let mut touched = Vec::new();
        collision_space.test_rect(&self.origin, &extent, collision_masks::ITEM, |c| {
            if let Some(block_id) = c.entity_id() {
                touched.push(block_id);
            }
            collision::Sentinel::Continue
        });
        for block_id in touched {
            message_dispatcher.entity_to_entity(self.entity_id, block_id, Event::ItemTouched);
        }

        // fell out of the world: drop back in from the top
        if self.origin.y - extent.y > SCREEN_HEIGHT {
            self.origin = point2(SCREEN_WIDTH / 2.0 - extent.x, -extent.y);
        }

        self.frame = animation::player_frame(&self.frame_state(), self.time);
    }

    /// Steps the transformation window. While transforming, normal
    /// input handling and kinematics are suspended; only the animation
    /// timer runs, and the pending power state commits when the window
    /// closes.
    pub fn update_transform(&mut self, dt: f32) {
        self.time += dt;
        self.transform_countdown = (self.transform_countdown - dt).max(0.0);

        if self.transform_countdown <= 0.0 {
            if let Some(power) = self.pending_power.take() {
                self.power = power;
                debug!("Player[{}] transformed to {:?}", self.entity_id, power);
            }
        }

        self.frame = animation::player_frame(&self.frame_state(), self.time);
    }

    pub fn receive_power_up(&mut self, kind: ItemKind) {
        match kind {
            ItemKind::Mushroom => {
                if self.power == PowerState::Small && !self.is_transforming() {
                    self.begin_transform(PowerState::Tall);
                }
            }
            ItemKind::FireFlower => match self.power {
                PowerState::Small => {
                    if !self.is_transforming() {
                        self.begin_transform(PowerState::Fire);
                    }
                }
                PowerState::Tall => {
                    self.power = PowerState::Fire;
                    debug!("Player[{}] gained fire power", self.entity_id);
                }
                PowerState::Fire => {}
            },
            ItemKind::Star => {
                self.star_countdown = STAR_DURATION;
                debug!("Player[{}] invincible", self.entity_id);
            }
            ItemKind::Coins => {}
        }
    }

    fn begin_transform(&mut self, target: PowerState) {
        self.pending_power = Some(target);
        self.transform_countdown = TRANSFORM_DURATION;
        // grow upward so feet stay planted
        self.origin.y -= TILE;
        debug!("Player[{}] transforming to {:?}", self.entity_id, target);
    }

    fn frame_state(&self) -> PlayerFrameState {
        PlayerFrameState {
            power: self.power,
            transforming_to: self.pending_power,
            transform_elapsed: TRANSFORM_DURATION - self.transform_countdown,
            walking: self.walking,
            jumping: self.on_jump,
            squatting: self.squatting,
            firing: self.is_firing(),
            invincible: self.is_invincible(),
            speed: self.velocity.x.abs(),
        }
    }

    // ------------------------------------------------------------------------------------------------------------------

    pub fn extent(&self) -> Vector2<f32> {
        let big_sized = self.power.is_big() || self.is_transforming();
        if big_sized && !self.squatting {
            vec2(TILE, TILE * 2.0)
        } else {
            vec2(TILE, TILE)
        }
    }

    pub fn position(&self) -> Point2<f32> {
        self.origin
    }

    pub fn velocity(&self) -> Vector2<f32> {
        self.velocity
    }

    pub fn power(&self) -> PowerState {
        self.power
    }

    pub fn facing(&self) -> HorizontalDir {
        self.facing
    }

    pub fn frame(&self) -> u16 {
        self.frame
    }

    pub fn is_transforming(&self) -> bool {
        self.pending_power.is_some()
    }

    pub fn is_invincible(&self) -> bool {
        self.star_countdown > 0.0
    }

    pub fn is_firing(&self) -> bool {
        self.firing_countdown > 0.0
    }

    pub fn is_squatting(&self) -> bool {
        self.squatting
    }

    pub fn on_surface(&self) -> bool {
        self.on_surface
    }
}

impl Entity for Player {
    fn entity_id(&self) -> u32 {
        self.entity_id
    }

    fn bounds(&self) -> Bounds {
        Bounds::new(self.origin, self.extent())
    }

    fn handle_message(
        &mut self,
        message: &Message,
        _collision_space: &mut collision::Space,
        _message_dispatcher: &mut Dispatcher,
    ) {
        match message.event {
            Event::DidShootFireball => {
                self.firing_countdown = FIRING_DURATION;
            }
            Event::PowerUpCollected { kind } => {
                self.receive_power_up(kind);
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod player_tests {
    use super::*;
    use crate::constants::{collision_masks::TERRAIN, MAX_FALL_SPEED, MAX_FRAME_DT};
    use crate::input::Intent;

    const DT: f32 = MAX_FRAME_DT;

    struct Harness {
        player: Player,
        space: collision::Space,
        input: InputState,
        dispatcher: Dispatcher,
        viewport: Bounds,
    }

    impl Harness {
        /// A small player standing over a 10-tile-wide floor whose top
        /// surface is at y = 384.
        fn grounded() -> Self {
            let mut space = collision::Space::new();
            for x in 0..10 {
                space.add_collider(collision::Collider::new_static(point2(x, 6), TERRAIN));
            }
            Self {
                player: Player::new(1, point2(128.0, 320.0)),
                space,
                input: InputState::new(),
                dispatcher: Dispatcher::default(),
                viewport: Bounds::new(point2(0.0, 0.0), vec2(SCREEN_WIDTH, SCREEN_HEIGHT)),
            }
        }

        fn airborne() -> Self {
            let mut harness = Self::grounded();
            harness.player.origin.y = 64.0;
            harness
        }

        fn step(&mut self, intent: Intent) {
            self.step_dt(intent, DT);
        }

        fn step_dt(&mut self, intent: Intent, dt: f32) {
            self.input.apply(&intent);
            self.player.update(
                dt,
                &self.input,
                &mut self.space,
                &mut self.dispatcher,
                &self.viewport,
            );
        }
    }

    #[test]
    fn free_fall_speed_rises_monotonically_to_cap() {
        let mut harness = Harness::airborne();

        let mut last = harness.player.velocity().y;
        for _ in 0..60 {
            harness.step(Intent::default());
            if harness.player.on_surface() {
                break;
            }
            let dy = harness.player.velocity().y;
            assert!(dy >= last);
            assert!(dy <= MAX_FALL_SPEED);
            last = dy;
        }
    }

    #[test]
    fn landing_zeroes_fall_speed_and_sets_on_surface() {
        let mut harness = Harness::airborne();

        for _ in 0..600 {
            harness.step(Intent::default());
            if harness.player.on_surface() {
                break;
            }
        }

        assert!(harness.player.on_surface());
        assert_eq!(harness.player.velocity().y, 0.0);
        assert_eq!(harness.player.bounds().bottom(), 384.0);
    }

    #[test]
    fn releasing_jump_damps_ascent_immediately() {
        let mut harness = Harness::grounded();
        let jump = Intent {
            jump: true,
            ..Intent::default()
        };

        // settle onto the floor, then hold jump for two frames
        harness.step(Intent::default());
        harness.step(jump);
        harness.step(jump);
        let rising = harness.player.velocity().y;
        assert!(rising < 0.0);

        harness.step(Intent::default());
        let expected = rising * FRICTION + crate::constants::GRAVITY;
        assert!((harness.player.velocity().y - expected).abs() < 1e-3);
    }

    #[test]
    fn star_window_tracks_simulated_time_across_irregular_deltas() {
        let mut harness = Harness::grounded();
        harness.player.receive_power_up(ItemKind::Star);
        assert!(harness.player.is_invincible());

        // step just shy of the 20s window with a lumpy frame cadence
        let deltas = [1.0 / 60.0, 1.0 / 144.0, 1.0 / 90.0, 1.0 / 240.0];
        let mut elapsed = 0.0;
        let mut i = 0;
        while elapsed + deltas[i % deltas.len()] < STAR_DURATION - 0.001 {
            let dt = deltas[i % deltas.len()];
            harness.step_dt(Intent::default(), dt);
            elapsed += dt;
            i += 1;
            assert!(harness.player.is_invincible());
        }

        // one final step past the end of the window
        harness.step_dt(Intent::default(), STAR_DURATION - elapsed + 0.01);
        assert!(!harness.player.is_invincible());
    }

    #[test]
    fn mushroom_transforms_small_player_over_the_full_window() {
        let mut harness = Harness::grounded();
        let feet = harness.player.bounds().bottom();

        harness.player.receive_power_up(ItemKind::Mushroom);
        assert!(harness.player.is_transforming());
        assert_eq!(harness.player.extent(), vec2(TILE, TILE * 2.0));
        assert_eq!(harness.player.bounds().bottom(), feet);
        assert_eq!(harness.player.power(), PowerState::Small);

        for _ in 0..119 {
            harness.player.update_transform(DT);
            assert_eq!(harness.player.power(), PowerState::Small);
        }
        harness.player.update_transform(DT);
        assert!(!harness.player.is_transforming());
        assert_eq!(harness.player.power(), PowerState::Tall);
    }

    #[test]
    fn fire_flower_upgrades_tall_player_instantly() {
        let mut harness = Harness::grounded();
        harness.player.receive_power_up(ItemKind::Mushroom);
        for _ in 0..120 {
            harness.player.update_transform(DT);
        }
        assert_eq!(harness.player.power(), PowerState::Tall);

        harness.player.receive_power_up(ItemKind::FireFlower);
        assert_eq!(harness.player.power(), PowerState::Fire);
        assert!(!harness.player.is_transforming());
    }

    #[test]
    fn duplicate_mushroom_is_ignored() {
        let mut harness = Harness::grounded();
        harness.player.receive_power_up(ItemKind::Mushroom);
        for _ in 0..120 {
            harness.player.update_transform(DT);
        }

        let origin = harness.player.position();
        harness.player.receive_power_up(ItemKind::Mushroom);
        assert!(!harness.player.is_transforming());
        assert_eq!(harness.player.position(), origin);
    }

    #[test]
    fn squatting_requires_big_power_and_shrinks_hitbox() {
        let mut harness = Harness::grounded();
        let squat = Intent {
            squat: true,
            ..Intent::default()
        };

        // small players can't squat
        harness.step(Intent::default());
        harness.step(squat);
        assert!(!harness.player.is_squatting());

        harness.player.receive_power_up(ItemKind::Mushroom);
        for _ in 0..120 {
            harness.player.update_transform(DT);
        }

        // grow settles the hitbox, then squat on the ground
        harness.step(Intent::default());
        harness.step(squat);
        assert!(harness.player.is_squatting());
        assert_eq!(harness.player.extent(), vec2(TILE, TILE));

        // standing back up restores the full height
        harness.step(Intent::default());
        assert!(!harness.player.is_squatting());
        assert_eq!(harness.player.extent(), vec2(TILE, TILE * 2.0));
    }

    #[test]
    fn fire_intent_only_spawns_requests_with_fire_power() {
        let mut harness = Harness::grounded();
        let fire = Intent {
            fire: true,
            ..Intent::default()
        };

        harness.step(fire);
        assert!(harness.dispatcher.is_empty());

        harness.player.receive_power_up(ItemKind::FireFlower);
        for _ in 0..120 {
            harness.player.update_transform(DT);
        }
        assert_eq!(harness.player.power(), PowerState::Fire);

        // release, then press again for a fresh edge
        harness.step(Intent::default());
        harness.step(fire);

        let messages = harness.dispatcher.drain();
        assert!(messages
            .iter()
            .any(|m| matches!(m.event, Event::TryShootFireball { .. })));
    }

    #[test]
    fn firing_window_expires_after_cooldown() {
        let mut harness = Harness::grounded();
        let message = Message {
            sender_entity_id: None,
            recipient_entity_id: Some(1),
            event: Event::DidShootFireball,
        };
        let mut dispatcher = Dispatcher::default();
        harness
            .player
            .handle_message(&message, &mut harness.space, &mut dispatcher);
        assert!(harness.player.is_firing());

        for _ in 0..13 {
            harness.step(Intent::default());
        }
        assert!(!harness.player.is_firing());
    }

    #[test]
    fn falling_out_of_the_world_respawns_at_the_top() {
        let mut harness = Harness::grounded();
        harness.player.origin = point2(400.0, SCREEN_HEIGHT + TILE * 2.0);

        harness.step(Intent::default());
        assert!(harness.player.position().y <= 0.0);
    }
}
