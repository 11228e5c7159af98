//! Rotation and mirroring of whole plans.
//!
//! Positions must already lie inside the plan's size; the compiler checks
//! bounds before calling in here.

use crate::orientation::{Mirror, Rotation, Transform};
use crate::plan::{Block, BlockState, EntityRef, Jigsaw, Plan, Pos, Size, StateRef};

pub fn rotate_size(size: Size, rotation: Rotation) -> Size {
    if rotation.swaps_horizontal() {
        Size::new(size.l, size.h, size.w)
    } else {
        size
    }
}

/// Clockwise around the vertical axis; `size` is the size before rotating.
pub fn rotate_pos(pos: Pos, size: Size, rotation: Rotation) -> Pos {
    let Pos { x, y, z } = pos;
    match rotation {
        Rotation::None => pos,
        Rotation::Clockwise90 => Pos::new(size.l - 1 - z, y, x),
        Rotation::Clockwise180 => Pos::new(size.w - 1 - x, y, size.l - 1 - z),
        Rotation::Clockwise270 => Pos::new(z, y, size.w - 1 - x),
    }
}

pub fn mirror_pos(pos: Pos, size: Size, mirror: Mirror) -> Pos {
    let Pos { x, y, z } = pos;
    match mirror {
        Mirror::None => pos,
        Mirror::LeftRight => Pos::new(x, y, size.l - 1 - z),
        Mirror::FrontBack => Pos::new(size.w - 1 - x, y, z),
    }
}

/// The accumulated transform of an entity point, kept relative to the
/// authored footprint. Every transform reduces to an optional x flip followed
/// by a clockwise rotation, so [`Placement::apply`] reads each placed
/// coordinate off the authored point with at most one subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    width: i32,
    length: i32,
    flip_x: bool,
    rotation: Rotation,
}

impl Placement {
    pub fn identity(size: Size) -> Self {
        Placement {
            width: size.w,
            length: size.l,
            flip_x: false,
            rotation: Rotation::None,
        }
    }

    pub fn then_rotate(self, rotation: Rotation) -> Self {
        Placement {
            rotation: self.rotation.then(rotation),
            ..self
        }
    }

    pub fn then_mirror(self, mirror: Mirror) -> Self {
        // A mirror commutes with a rotation by inverting it; flipping z is
        // flipping x followed by a half turn.
        let rotation = match mirror {
            Mirror::None => return self,
            Mirror::FrontBack => self.rotation.inverse(),
            Mirror::LeftRight => self.rotation.inverse().then(Rotation::Clockwise180),
        };
        Placement {
            flip_x: !self.flip_x,
            rotation,
            ..self
        }
    }

    /// Continuous counterpart of [`rotate_pos`] and [`mirror_pos`].
    pub fn apply(&self, point: [f64; 3]) -> [f64; 3] {
        let [x, y, z] = point;
        let (w, l) = (f64::from(self.width), f64::from(self.length));
        match (self.flip_x, self.rotation) {
            (false, Rotation::None) => [x, y, z],
            (false, Rotation::Clockwise90) => [l - z, y, x],
            (false, Rotation::Clockwise180) => [w - x, y, l - z],
            (false, Rotation::Clockwise270) => [z, y, w - x],
            (true, Rotation::None) => [w - x, y, z],
            (true, Rotation::Clockwise90) => [l - z, y, w - x],
            (true, Rotation::Clockwise180) => [x, y, l - z],
            (true, Rotation::Clockwise270) => [z, y, x],
        }
    }
}

fn transform_state(state: &BlockState, step: Transform) -> BlockState {
    BlockState {
        block_id: state.block_id.clone(),
        properties: step.properties(&state.properties),
    }
}

/// Applies one step to every positioned element of a plan.
fn map_plan(
    plan: &Plan,
    size: Size,
    step: Transform,
    pos: impl Fn(Pos) -> Pos,
    placement: impl Fn(Placement) -> Placement,
) -> Plan {
    let blocks = plan
        .blocks
        .iter()
        .map(|block| Block {
            pos: pos(block.pos),
            state: match &block.state {
                StateRef::Direct(state) => StateRef::Direct(transform_state(state, step)),
                StateRef::Material(key) => StateRef::Material(key.clone()),
            },
            block_entity_ref: block.block_entity_ref.clone(),
        })
        .collect();

    let jigsaws = plan
        .jigsaws
        .iter()
        .map(|jigsaw| Jigsaw {
            pos: pos(jigsaw.pos),
            orientation: step.jigsaw_orientation(&jigsaw.orientation),
            final_state: transform_state(&jigsaw.final_state, step),
            ..jigsaw.clone()
        })
        .collect();

    let entities = plan
        .entities
        .iter()
        .map(|entity| EntityRef {
            authored_pos: entity.authored_pos,
            placement: placement(entity.placement),
            block_pos: pos(entity.block_pos),
            entity_ref: entity.entity_ref.clone(),
        })
        .collect();

    Plan {
        size,
        blocks,
        jigsaws,
        entities,
        ..plan.clone()
    }
}

pub fn rotate(plan: &Plan, rotation: Rotation) -> Plan {
    if rotation == Rotation::None {
        return plan.clone();
    }
    let size = plan.size;
    map_plan(
        plan,
        rotate_size(size, rotation),
        Transform::Rotate(rotation),
        |p| rotate_pos(p, size, rotation),
        |p| p.then_rotate(rotation),
    )
}

pub fn mirror(plan: &Plan, mirror: Mirror) -> Plan {
    if mirror == Mirror::None {
        return plan.clone();
    }
    let size = plan.size;
    map_plan(
        plan,
        size,
        Transform::Mirror(mirror),
        |p| mirror_pos(p, size, mirror),
        |p| p.then_mirror(mirror),
    )
}

/// Rotation first, then mirroring.
pub fn transform(plan: &Plan, rotation: Rotation, mirror_axis: Mirror) -> Plan {
    mirror(&rotate(plan, rotation), mirror_axis)
}
