use crate::{
    collision,
    events::{Dispatcher, Message},
    util::Bounds,
};

// ---------------------------------------------------------------------------------------------------------------------

/// IdVendor vends a new unique id, starting from 1000, for each entity.
pub struct IdVendor {
    current_id: u32,
}

impl Default for IdVendor {
    fn default() -> Self {
        IdVendor {
            current_id: 1000u32,
        }
    }
}

impl IdVendor {
    pub fn next_id(&mut self) -> u32 {
        let r = self.current_id;
        self.current_id += 1;
        r
    }
}

// ---------------------------------------------------------------------------------------------------------------------

/// The message-routing seam shared by everything with an id in the
/// simulation. Update signatures differ per entity kind (the player
/// consumes input, blocks don't), so stepping is not part of the trait.
pub trait Entity {
    /// The unique id for this Entity, a value from [0,u32::MAX]
    fn entity_id(&self) -> u32;

    /// The entity's current collision box, expressed as (origin, extent).
    fn bounds(&self) -> Bounds;

    /// Handle receipt of a routed message. Handlers may mutate the
    /// collision space (e.g. a destroyed block deactivates its
    /// collider) and queue replies on the dispatcher.
    fn handle_message(
        &mut self,
        _message: &Message,
        _collision_space: &mut collision::Space,
        _message_dispatcher: &mut Dispatcher,
    ) {
    }

    /// An entity should return true here so long as it needs updating
    /// and drawing.
    fn is_alive(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod id_vendor_tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut vendor = IdVendor::default();
        let a = vendor.next_id();
        let b = vendor.next_id();
        assert!(b > a);
    }
}
