use cgmath::*;
use std::collections::{HashMap, HashSet};

use crate::constants::TILE;
use crate::util::Bounds;

/// A collider is either a static tile cell (terrain, addressed on the
/// tile grid and spanning exactly one tile) or a dynamic rect owned by
/// an entity (blocks, freed items). Dynamics may move and resize at
/// runtime; statics never do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Static { cell: Point2<i32> },
    Dynamic { bounds: Bounds, entity_id: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub mode: Mode,
    pub mask: u32,
}

impl Collider {
    pub fn new_static(cell: Point2<i32>, mask: u32) -> Self {
        Self {
            mode: Mode::Static { cell },
            mask,
        }
    }

    pub fn new_dynamic(bounds: Bounds, entity_id: u32, mask: u32) -> Self {
        Self {
            mode: Mode::Dynamic { bounds, entity_id },
            mask,
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self.mode {
            Mode::Static { cell } => Bounds::new(
                point2(cell.x as f32 * TILE, cell.y as f32 * TILE),
                vec2(TILE, TILE),
            ),
            Mode::Dynamic { bounds, .. } => bounds,
        }
    }

    pub fn entity_id(&self) -> Option<u32> {
        match self.mode {
            Mode::Static { .. } => None,
            Mode::Dynamic { entity_id, .. } => Some(entity_id),
        }
    }
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sentinel {
    Continue,
    Stop,
}

/// How a moving rect struck a collider during an axis resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Horizontal motion arrested; the rect was snapped flush against
    /// the collider's facing edge.
    Wall,
    /// Downward motion arrested; the rect now rests on the collider.
    Landing,
    /// Upward motion arrested; the rect's top struck the collider's
    /// underside. This is the trigger edge for block state transitions.
    Ceiling,
}

#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub kind: ContactKind,
    pub entity_id: Option<u32>,
}

// ---------------------------------------------------------------------------------------------------------------------

/// Shared collision space. Static tile colliders are indexed on the tile
/// grid; dynamic colliders are iterated in insertion order, which keeps
/// resolution deterministic. When several candidates overlap a moving
/// rect the last one visited wins - acceptable here because level
/// geometry never overlaps, and documented as an assumption rather than
/// a guaranteed tie-break.
pub struct Space {
    colliders: Vec<Collider>,
    static_cells: HashMap<Point2<i32>, u32>,
    dynamic_ids: Vec<u32>,
    active: HashSet<u32>,
}

impl Space {
    pub fn new() -> Self {
        Self {
            colliders: Vec::new(),
            static_cells: HashMap::new(),
            dynamic_ids: Vec::new(),
            active: HashSet::new(),
        }
    }

    pub fn add_collider(&mut self, collider: Collider) -> u32 {
        let id = self.colliders.len() as u32;
        self.colliders.push(collider);
        self.active.insert(id);

        match collider.mode {
            Mode::Static { cell } => {
                self.static_cells.insert(cell, id);
            }
            Mode::Dynamic { .. } => {
                self.dynamic_ids.push(id);
            }
        }

        id
    }

    pub fn get_collider(&self, collider_id: u32) -> Option<&Collider> {
        self.colliders.get(collider_id as usize)
    }

    pub fn deactivate_collider(&mut self, collider_id: u32) {
        self.active.remove(&collider_id);
    }

    pub fn activate_collider(&mut self, collider_id: u32) {
        if (collider_id as usize) < self.colliders.len() {
            self.active.insert(collider_id);
        }
    }

    pub fn is_collider_activated(&self, collider_id: u32) -> bool {
        self.active.contains(&collider_id)
    }

    /// Moves a dynamic collider; statics never move.
    pub fn update_collider_position(&mut self, collider_id: u32, new_origin: Point2<f32>) {
        if let Some(c) = self.colliders.get_mut(collider_id as usize) {
            match &mut c.mode {
                Mode::Static { .. } => panic!("Can't move a static collider"),
                Mode::Dynamic { bounds, .. } => bounds.origin = new_origin,
            }
        }
    }

    pub fn update_collider_extent(&mut self, collider_id: u32, new_extent: Vector2<f32>) {
        if let Some(c) = self.colliders.get_mut(collider_id as usize) {
            match &mut c.mode {
                Mode::Static { .. } => panic!("Can't resize a static collider"),
                Mode::Dynamic { bounds, .. } => bounds.extent = new_extent,
            }
        }
    }

    fn get_static_at(&self, cell: Point2<i32>, mask: u32) -> Option<&Collider> {
        self.static_cells
            .get(&cell)
            .filter(|id| self.active.contains(*id))
            .map(|id| &self.colliders[*id as usize])
            .filter(|c| c.mask & mask != 0)
    }

    /// Tests a rect against active colliders matching `mask`, invoking
    /// the callback per overlap until it returns Sentinel::Stop.
    /// Dynamics are visited before statics.
    pub fn test_rect<C>(&self, origin: &Point2<f32>, extent: &Vector2<f32>, mask: u32, mut callback: C)
    where
        C: FnMut(&Collider) -> Sentinel,
    {
        let rect = Bounds::new(*origin, *extent);

        for id in self.dynamic_ids.iter() {
            if !self.active.contains(id) {
                continue;
            }
            let c = &self.colliders[*id as usize];
            if c.mask & mask != 0
                && c.bounds().overlaps(&rect)
                && matches!(callback(c), Sentinel::Stop)
            {
                return;
            }
        }

        for cell in cells_covering(&rect) {
            if let Some(c) = self.get_static_at(cell, mask) {
                if c.bounds().overlaps(&rect) && matches!(callback(c), Sentinel::Stop) {
                    return;
                }
            }
        }
    }

    /// Axis-separated resolution: call once per frame with only the X
    /// component of motion and once with only the Y component, never
    /// both. Overlapping colliders snap the rect flush against their
    /// facing edge (direction chosen by the sign of the axis velocity)
    /// and report a Contact. The caller is responsible for zeroing or
    /// reflecting its velocity when contacts come back.
    ///
    /// Colliders entirely outside `viewport` are skipped.
    pub fn resolve_rect(
        &self,
        origin: &mut Point2<f32>,
        extent: Vector2<f32>,
        dx: f32,
        dy: f32,
        mask: u32,
        viewport: &Bounds,
    ) -> Vec<Contact> {
        debug_assert!(dx == 0.0 || dy == 0.0);

        let mut contacts = Vec::new();

        for id in self.dynamic_ids.iter() {
            if !self.active.contains(id) {
                continue;
            }
            let c = self.colliders[*id as usize];
            if c.mask & mask != 0 {
                self.resolve_against(&c, origin, extent, dx, dy, viewport, &mut contacts);
            }
        }

        // cells are gathered once from the rect's current position; any
        // snap from the dynamic pass has already been applied
        let rect = Bounds::new(*origin, extent);
        for cell in cells_covering(&rect) {
            if let Some(c) = self.get_static_at(cell, mask) {
                let c = *c;
                self.resolve_against(&c, origin, extent, dx, dy, viewport, &mut contacts);
            }
        }

        contacts
    }

    fn resolve_against(
        &self,
        collider: &Collider,
        origin: &mut Point2<f32>,
        extent: Vector2<f32>,
        dx: f32,
        dy: f32,
        viewport: &Bounds,
        contacts: &mut Vec<Contact>,
    ) {
        let target = collider.bounds();
        if !target.overlaps(viewport) {
            return;
        }

        let rect = Bounds::new(*origin, extent);
        if !rect.overlaps(&target) {
            return;
        }

        let kind = if dx > 0.0 {
            origin.x = target.left() - extent.x;
            ContactKind::Wall
        } else if dx < 0.0 {
            origin.x = target.right();
            ContactKind::Wall
        } else if dy > 0.0 {
            origin.y = target.top() - extent.y;
            ContactKind::Landing
        } else if dy < 0.0 {
            origin.y = target.bottom();
            ContactKind::Ceiling
        } else {
            return;
        };

        contacts.push(Contact {
            kind,
            entity_id: collider.entity_id(),
        });
    }
}

/// Tile cells covered by a rect, row-major. A rect touching a cell edge
/// from outside yields the cell, but the strict overlap test rejects it.
fn cells_covering(rect: &Bounds) -> Vec<Point2<i32>> {
    let x0 = (rect.left() / TILE).floor() as i32;
    let x1 = (rect.right() / TILE).floor() as i32;
    let y0 = (rect.top() / TILE).floor() as i32;
    let y1 = (rect.bottom() / TILE).floor() as i32;

    let mut cells = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)) as usize);
    for y in y0..=y1 {
        for x in x0..=x1 {
            cells.push(point2(x, y));
        }
    }
    cells
}

#[cfg(test)]
mod space_tests {
    use super::*;
    use crate::constants::collision_masks::*;

    fn viewport() -> Bounds {
        Bounds::new(point2(0.0, 0.0), vec2(640.0, 448.0))
    }

    fn space_with_static(cell: Point2<i32>) -> Space {
        let mut space = Space::new();
        space.add_collider(Collider::new_static(cell, TERRAIN));
        space
    }

    #[test]
    fn rightward_overlap_snaps_flush_left_of_target() {
        let space = space_with_static(point2(2, 1));

        // moving right, penetrating the tile at x = 128
        let mut origin = point2(70.0, 64.0);
        let contacts = space.resolve_rect(&mut origin, vec2(64.0, 64.0), 7.0, 0.0, SOLID, &viewport());

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].kind, ContactKind::Wall);
        assert_eq!(origin.x, 128.0 - 64.0);
    }

    #[test]
    fn leftward_overlap_snaps_flush_right_of_target() {
        let space = space_with_static(point2(2, 1));

        let mut origin = point2(180.0, 64.0);
        let contacts = space.resolve_rect(&mut origin, vec2(64.0, 64.0), -7.0, 0.0, SOLID, &viewport());

        assert_eq!(contacts.len(), 1);
        assert_eq!(origin.x, 192.0);
    }

    #[test]
    fn downward_overlap_lands_on_target_top() {
        let space = space_with_static(point2(1, 4));

        let mut origin = point2(64.0, 200.0);
        let contacts = space.resolve_rect(&mut origin, vec2(64.0, 64.0), 0.0, 5.0, SOLID, &viewport());

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].kind, ContactKind::Landing);
        assert_eq!(origin.y, 4.0 * 64.0 - 64.0);
    }

    #[test]
    fn upward_overlap_snaps_below_target_and_reports_ceiling() {
        let mut space = Space::new();
        let block_bounds = Bounds::new(point2(64.0, 128.0), vec2(64.0, 64.0));
        space.add_collider(Collider::new_dynamic(block_bounds, 42, BLOCK));

        let mut origin = point2(64.0, 180.0);
        let contacts = space.resolve_rect(&mut origin, vec2(64.0, 64.0), 0.0, -9.0, SOLID, &viewport());

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].kind, ContactKind::Ceiling);
        assert_eq!(contacts[0].entity_id, Some(42));
        assert_eq!(origin.y, 192.0);
    }

    #[test]
    fn resolution_filters_by_mask() {
        let mut space = Space::new();
        space.add_collider(Collider::new_dynamic(
            Bounds::new(point2(64.0, 64.0), vec2(32.0, 64.0)),
            7,
            ITEM,
        ));

        let mut origin = point2(40.0, 64.0);
        let contacts = space.resolve_rect(&mut origin, vec2(64.0, 64.0), 7.0, 0.0, SOLID, &viewport());
        assert!(contacts.is_empty());
        assert_eq!(origin.x, 40.0);
    }

    #[test]
    fn deactivated_colliders_are_skipped() {
        let mut space = Space::new();
        let id = space.add_collider(Collider::new_dynamic(
            Bounds::new(point2(64.0, 64.0), vec2(64.0, 64.0)),
            9,
            BLOCK,
        ));
        space.deactivate_collider(id);

        let mut origin = point2(40.0, 64.0);
        let contacts = space.resolve_rect(&mut origin, vec2(64.0, 64.0), 7.0, 0.0, SOLID, &viewport());
        assert!(contacts.is_empty());

        space.activate_collider(id);
        let contacts = space.resolve_rect(&mut origin, vec2(64.0, 64.0), 7.0, 0.0, SOLID, &viewport());
        assert_eq!(contacts.len(), 1);
    }

    #[test]
    fn test_rect_visits_dynamics_before_statics() {
        let mut space = Space::new();
        space.add_collider(Collider::new_static(point2(1, 1), TERRAIN));
        space.add_collider(Collider::new_dynamic(
            Bounds::new(point2(64.0, 64.0), vec2(64.0, 64.0)),
            3,
            BLOCK,
        ));

        let mut visited = Vec::new();
        space.test_rect(&point2(60.0, 60.0), &vec2(64.0, 64.0), SOLID, |c| {
            visited.push(c.entity_id());
            Sentinel::Continue
        });

        assert_eq!(visited, vec![Some(3), None]);
    }

    #[test]
    fn off_viewport_colliders_do_not_resolve() {
        let space = space_with_static(point2(-3, 1));

        let mut origin = point2(-180.0, 64.0);
        let contacts = space.resolve_rect(&mut origin, vec2(64.0, 64.0), -7.0, 0.0, SOLID, &viewport());
        assert!(contacts.is_empty());
    }
}
