use stream_siege_core::{Bounds, Vec2};

/// Rectangles allied units cannot enter.
#[derive(Clone, Debug, Default)]
pub(crate) struct Terrain {
    blocked: Vec<Bounds>,
}

impl Terrain {
    pub(crate) fn new(blocked: Vec<Bounds>) -> Self {
        Self { blocked }
    }

    pub(crate) fn is_walkable(&self, point: Vec2) -> bool {
        !self.blocked.iter().any(|bounds| bounds.contains(point))
    }

    pub(crate) fn blocked(&self) -> &[Bounds] {
        &self.blocked
    }
}
