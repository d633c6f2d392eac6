use cgmath::*;

use crate::entities::block::ItemKind;
use crate::entities::HorizontalDir;

/// An Event payload for Message.
#[derive(Debug, Clone, Copy)]
pub enum Event {
    /// Routed to a block when the player's head strikes its underside
    /// during upward motion. This is the only trigger for block state
    /// transitions.
    BlockHitFromBelow {
        /// True when the player is tall-sized; breakable blocks only
        /// shatter for big players.
        big_player: bool,
    },

    /// Routed to a block when the player's box overlaps its freed,
    /// visible item.
    ItemTouched,

    /// Sent by a block to the game state after its item is collected;
    /// forwarded to the player to apply the power-up.
    PowerUpCollected { kind: ItemKind },

    /// Sent by the player to the game state to request a fireball
    /// spawn. If a pool slot is free the state replies with
    /// DidShootFireball; a full pool drops the request silently.
    TryShootFireball {
        origin: Point2<f32>,
        direction: HorizontalDir,
    },

    /// Reply to the player when a fireball was actually launched.
    DidShootFireball,
}

// ---------------------------------------------------------------------------------------------------------------------

/// A Message to be routed to an entity, or to the game state when
/// `recipient_entity_id` is None.
#[derive(Debug, Clone)]
pub struct Message {
    /// The entity that sent this message; None when the game state
    /// sent it.
    pub sender_entity_id: Option<u32>,

    /// The entity to route this message to; None routes to the game
    /// state.
    pub recipient_entity_id: Option<u32>,

    pub event: Event,
}

impl Message {
    fn new(sender: Option<u32>, recipient: Option<u32>, event: Event) -> Self {
        Message {
            sender_entity_id: sender,
            recipient_entity_id: recipient,
            event,
        }
    }
}

#[derive(Default)]
pub struct Dispatcher {
    messages: Vec<Message>,
}

impl Dispatcher {
    pub fn entity_to_global(&mut self, sender: u32, event: Event) {
        self.messages.push(Message::new(Some(sender), None, event));
    }

    pub fn entity_to_entity(&mut self, sender: u32, recipient: u32, event: Event) {
        self.messages
            .push(Message::new(Some(sender), Some(recipient), event));
    }

    pub fn global_to_entity(&mut self, recipient: u32, event: Event) {
        self.messages
            .push(Message::new(None, Some(recipient), event));
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the current message buffer, and clears it.
    pub fn drain(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }
}
