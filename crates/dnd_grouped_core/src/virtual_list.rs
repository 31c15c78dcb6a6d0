use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::collision::Candidate;
use crate::geometry::{Point, Rect};
use crate::model::{Collection, RowKey};

const MIN_ROW_HEIGHT: f32 = 1.0;

/// Fixed row geometry used to estimate row heights without laying rows out.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowMetrics {
    /// Height of a single item row, also used for the group header row.
    pub row_height: f32,
    /// Vertical padding above and below a group's bordered box.
    pub group_padding_y: f32,
    pub group_border: f32,
}

impl Default for RowMetrics {
    fn default() -> Self {
        Self {
            row_height: 46.0,
            group_padding_y: 8.0,
            group_border: 1.0,
        }
    }
}

impl RowMetrics {
    /// Height a group row adds on top of its header and item rows.
    pub fn group_chrome(&self) -> f32 {
        (self.group_padding_y + self.group_border) * 2.0
    }

    pub fn group_height(&self, item_count: usize) -> f32 {
        sanitize_height((item_count as f32 + 1.0) * self.row_height + self.group_chrome())
    }

    pub fn item_height(&self) -> f32 {
        sanitize_height(self.row_height)
    }

    /// Offset of the group header from the top of its group row.
    pub fn header_offset(&self) -> f32 {
        self.group_padding_y + self.group_border
    }

    /// Offset of item `item_ix` from the top of its group row.
    pub fn item_offset(&self, item_ix: usize) -> f32 {
        self.header_offset() + (item_ix as f32 + 1.0) * self.row_height
    }
}

/// A row the view should mount, with its absolute offset from the top of the list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleRow {
    pub index: usize,
    pub key: RowKey,
    pub top: f32,
    pub height: f32,
}

/// Prefix-sum layout over estimated row heights.
///
/// Rebuilding is linear in the number of rows; visibility queries are a binary search over the
/// cached origins and never touch rows outside the requested window.
#[derive(Clone, Debug, Default)]
pub struct VirtualLayout {
    keys: Vec<RowKey>,
    heights: Vec<f32>,
    origins: Vec<f32>,
    positions: HashMap<RowKey, usize>,
}

impl VirtualLayout {
    pub fn from_rows(rows: impl IntoIterator<Item = (RowKey, f32)>) -> Self {
        let mut layout = Self::default();
        layout.origins.push(0.0);
        for (key, height) in rows {
            let height = sanitize_height(height);
            let last = layout.origins.last().copied().unwrap_or(0.0);
            layout.positions.insert(key, layout.keys.len());
            layout.keys.push(key);
            layout.heights.push(height);
            layout.origins.push(last + height);
        }
        layout
    }

    /// One row per group, sized by its item count.
    pub fn for_groups(collection: &Collection, metrics: &RowMetrics) -> Self {
        Self::from_rows(collection.groups().iter().map(|group| {
            (
                RowKey::Group(group.id),
                metrics.group_height(group.items.len()),
            )
        }))
    }

    /// One fixed-height row per item, ignoring group boundaries.
    pub fn for_items(collection: &Collection, metrics: &RowMetrics) -> Self {
        let height = metrics.item_height();
        Self::from_rows(
            collection
                .flatten_items()
                .into_iter()
                .map(|(_, item)| (RowKey::Item(item.id), height)),
        )
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key(&self, ix: usize) -> Option<RowKey> {
        self.keys.get(ix).copied()
    }

    pub fn index_of(&self, key: RowKey) -> Option<usize> {
        self.positions.get(&key).copied()
    }

    pub fn total_height(&self) -> f32 {
        self.origins.last().copied().unwrap_or(0.0)
    }

    pub fn row_origin(&self, ix: usize) -> f32 {
        let clamped = ix.min(self.keys.len());
        self.origins.get(clamped).copied().unwrap_or(0.0)
    }

    pub fn row_height(&self, ix: usize) -> f32 {
        self.heights.get(ix).copied().unwrap_or(0.0)
    }

    pub fn max_scroll_top(&self, viewport_height: f32) -> f32 {
        let viewport_height = if viewport_height.is_finite() {
            viewport_height.max(0.0)
        } else {
            0.0
        };
        (self.total_height() - viewport_height).max(0.0)
    }

    /// Index of the row containing `y` (content coordinates), or `len()` past the end.
    pub fn index_for_offset(&self, y: f32) -> usize {
        let item_count = self.keys.len();
        if item_count == 0 || !y.is_finite() {
            return 0;
        }

        let y = y.max(0.0);
        let content_end = self.total_height();
        if y >= content_end {
            return item_count;
        }

        // Origins are strictly increasing (heights are clamped to >= 1px).
        let mut lo = 0usize;
        let mut hi = item_count;
        while lo < hi {
            let mid = (lo + hi) / 2;
            let end_y = self.origins.get(mid + 1).copied().unwrap_or(content_end);
            if end_y <= y {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Rows intersecting `[scroll_top, scroll_top + viewport_height]`, extended by `overscan`
    /// rows on each side. `pinned` is always included so an actively dragged row stays mounted
    /// even after it scrolls out of view.
    pub fn visible_rows(
        &self,
        scroll_top: f32,
        viewport_height: f32,
        overscan: usize,
        pinned: Option<RowKey>,
    ) -> Vec<VisibleRow> {
        if self.keys.is_empty() {
            return Vec::new();
        }

        let last_ix = self.keys.len() - 1;
        let scroll_top = if scroll_top.is_finite() {
            scroll_top.max(0.0)
        } else {
            0.0
        };
        let viewport_height = if viewport_height.is_finite() {
            viewport_height.max(0.0)
        } else {
            0.0
        };

        let start = self
            .index_for_offset(scroll_top)
            .min(last_ix)
            .saturating_sub(overscan);
        let end = self
            .index_for_offset(scroll_top + viewport_height)
            .min(last_ix)
            .saturating_add(overscan)
            .min(last_ix);

        let mut rows = (start..=end).map(|ix| self.visible_row(ix)).collect::<Vec<_>>();

        if let Some(pinned_ix) = pinned.and_then(|key| self.index_of(key))
            && !(start..=end).contains(&pinned_ix)
        {
            let row = self.visible_row(pinned_ix);
            if pinned_ix < start {
                rows.insert(0, row);
            } else {
                rows.push(row);
            }
        }

        rows
    }

    fn visible_row(&self, ix: usize) -> VisibleRow {
        VisibleRow {
            index: ix,
            key: self.keys[ix],
            top: self.row_origin(ix),
            height: self.row_height(ix),
        }
    }

    /// Collision candidates for the mounted group rows and the item rows they contain.
    ///
    /// `origin` is the position of the list's content top-left corner in the coordinate space
    /// the candidates should be reported in (usually window coordinates, already accounting for
    /// the scroll offset).
    pub fn candidates(
        &self,
        collection: &Collection,
        metrics: &RowMetrics,
        rows: &[VisibleRow],
        origin: Point,
        width: f32,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for row in rows {
            let row_rect = Rect::new(origin.x, origin.y + row.top, width, row.height);
            candidates.push(Candidate::new(row.key, row_rect, candidates.len()));

            let RowKey::Group(group_id) = row.key else {
                continue;
            };
            let group = match collection.groups().get(row.index) {
                Some(group) if group.id == group_id => Some(group),
                _ => collection.group(group_id),
            };
            let Some(group) = group else {
                continue;
            };

            for (item_ix, item) in group.items.iter().enumerate() {
                let item_rect = Rect::new(
                    origin.x,
                    origin.y + row.top + metrics.item_offset(item_ix),
                    width,
                    metrics.item_height(),
                );
                candidates.push(Candidate::new(
                    RowKey::Item(item.id),
                    item_rect,
                    candidates.len(),
                ));
            }
        }
        candidates
    }
}

fn sanitize_height(height: f32) -> f32 {
    if !height.is_finite() || height <= 0.0 {
        MIN_ROW_HEIGHT
    } else {
        height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, GroupId, Item, ItemId};

    fn collection(sizes: &[usize]) -> Collection {
        let mut next_item = 100;
        Collection::new(
            sizes
                .iter()
                .enumerate()
                .map(|(ix, &count)| {
                    let items = (0..count).map(|_| {
                        next_item += 1;
                        Item::new(ItemId(next_item), "t", "u")
                    });
                    Group::new(GroupId(ix as u64 + 1)).items(items.collect::<Vec<_>>())
                })
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn group_height_grows_with_item_count() {
        let metrics = RowMetrics {
            row_height: 40.,
            group_padding_y: 8.,
            group_border: 1.,
        };
        assert_eq!(metrics.group_height(0), 58.);
        assert_eq!(metrics.group_height(3), 178.);
        assert_eq!(metrics.item_offset(0), 49.);
    }

    #[test]
    fn flat_item_rows_share_one_height_across_groups() {
        let metrics = RowMetrics::default();
        let layout = VirtualLayout::for_items(&collection(&[2, 0, 1]), &metrics);

        assert_eq!(layout.len(), 3);
        assert_eq!(layout.key(2), Some(RowKey::Item(ItemId(103))));
        assert_eq!(layout.row_height(1), metrics.item_height());
        assert_eq!(layout.row_origin(2), 2. * metrics.item_height());
        assert_eq!(layout.total_height(), 3. * metrics.item_height());
    }

    #[test]
    fn heights_are_clamped_to_one_pixel() {
        let layout = VirtualLayout::from_rows([
            (RowKey::Group(GroupId(1)), 0.),
            (RowKey::Group(GroupId(2)), f32::NAN),
            (RowKey::Group(GroupId(3)), -4.),
        ]);
        assert_eq!(layout.total_height(), 3.);
    }

    #[test]
    fn index_for_offset_uses_row_bounds() {
        let layout = VirtualLayout::from_rows([
            (RowKey::Group(GroupId(1)), 10.),
            (RowKey::Group(GroupId(2)), 20.),
            (RowKey::Group(GroupId(3)), 30.),
        ]);
        assert_eq!(layout.index_for_offset(-5.), 0);
        assert_eq!(layout.index_for_offset(9.9), 0);
        assert_eq!(layout.index_for_offset(10.), 1);
        assert_eq!(layout.index_for_offset(59.), 2);
        assert_eq!(layout.index_for_offset(60.), 3);
    }

    #[test]
    fn visible_rows_window_with_overscan_and_pinning() {
        let layout = VirtualLayout::from_rows(
            (1..=20).map(|id| (RowKey::Group(GroupId(id)), 50.)),
        );

        let rows = layout.visible_rows(500., 100., 1, None);
        let indices = rows.iter().map(|row| row.index).collect::<Vec<_>>();
        assert_eq!(indices, vec![9, 10, 11, 12, 13]);
        assert_eq!(rows[1].top, 500.);
        assert_eq!(rows[1].key, RowKey::Group(GroupId(11)));

        let rows = layout.visible_rows(500., 100., 0, Some(RowKey::Group(GroupId(1))));
        let indices = rows.iter().map(|row| row.index).collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 10, 11, 12]);

        let rows = layout.visible_rows(0., 100., 0, Some(RowKey::Group(GroupId(20))));
        let indices = rows.iter().map(|row| row.index).collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 1, 2, 19]);
    }

    #[test]
    fn rows_are_keyed_by_id_after_reorder() {
        let metrics = RowMetrics::default();
        let mut groups = collection(&[1, 2, 3]);
        let before = VirtualLayout::for_groups(&groups, &metrics);
        assert_eq!(before.index_of(RowKey::Group(GroupId(3))), Some(2));

        groups.groups_mut().swap(0, 2);
        let after = VirtualLayout::for_groups(&groups, &metrics);
        assert_eq!(after.index_of(RowKey::Group(GroupId(3))), Some(0));
        assert_eq!(after.row_height(0), metrics.group_height(3));
        assert_eq!(after.total_height(), before.total_height());
    }

    #[test]
    fn candidates_include_nested_item_rows() {
        let metrics = RowMetrics {
            row_height: 40.,
            group_padding_y: 8.,
            group_border: 1.,
        };
        let groups = collection(&[2, 0]);
        let layout = VirtualLayout::for_groups(&groups, &metrics);
        let rows = layout.visible_rows(0., 1000., 0, None);
        let candidates = layout.candidates(&groups, &metrics, &rows, Point::new(5., 100.), 300.);

        let keys = candidates.iter().map(|c| c.key).collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                RowKey::Group(GroupId(1)),
                RowKey::Item(ItemId(101)),
                RowKey::Item(ItemId(102)),
                RowKey::Group(GroupId(2)),
            ]
        );
        assert_eq!(candidates[0].rect, Rect::new(5., 100., 300., 138.));
        assert_eq!(candidates[2].rect, Rect::new(5., 189., 300., 40.));
        assert_eq!(candidates[3].rect.top(), 238.);
        assert_eq!(
            candidates.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }
}
