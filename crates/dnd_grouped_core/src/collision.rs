use crate::geometry::{Rect, collides, distance_to_top};
use crate::model::{RowKey, RowKind};

pub const DEFAULT_COLLISION_PADDING: f32 = 10.0;

/// A currently mounted row that may receive the dragged entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub key: RowKey,
    /// Bounds in the same coordinate space as the dragged rect.
    pub rect: Rect,
    /// Mount order; used to break distance ties deterministically.
    pub index: usize,
}

impl Candidate {
    pub fn new(key: RowKey, rect: Rect, index: usize) -> Self {
        Self { key, rect, index }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CollisionDetector {
    padding: f32,
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self {
            padding: DEFAULT_COLLISION_PADDING,
        }
    }
}

impl CollisionDetector {
    pub fn new(padding: f32) -> Self {
        let padding = if padding.is_finite() { padding } else { 0.0 };
        Self { padding }
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    /// Pick the drop target for `dragged` among `candidates`.
    ///
    /// Group drags only consider group rows. Among colliding candidates the one whose top edge is
    /// closest to the dragged rect's vertical center wins; equal distances fall back to mount
    /// order. `None` means there is no valid drop target right now.
    pub fn detect(
        &self,
        dragged: Rect,
        dragged_kind: RowKind,
        candidates: &[Candidate],
    ) -> Option<RowKey> {
        let dragged_top = dragged.top();
        let dragged_height = dragged.height();
        if !dragged_top.is_finite() {
            return None;
        }
        let center_y = dragged.center_y();

        let mut colliding = candidates
            .iter()
            .filter(|candidate| match dragged_kind {
                RowKind::Group => candidate.key.kind() == RowKind::Group,
                RowKind::Item => true,
            })
            .filter(|candidate| {
                collides(dragged_top, dragged_height, &candidate.rect, self.padding)
            })
            .map(|candidate| (distance_to_top(center_y, &candidate.rect), candidate))
            .collect::<Vec<_>>();

        // `sort_by` is stable, and the explicit index comparison keeps the result independent of
        // the order candidates were passed in.
        colliding.sort_by(|(a_dist, a), (b_dist, b)| {
            a_dist
                .total_cmp(b_dist)
                .then_with(|| a.index.cmp(&b.index))
        });

        colliding.first().map(|(_, candidate)| candidate.key)
    }
}
