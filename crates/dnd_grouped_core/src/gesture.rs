use crate::autoscroll::{AutoScrollTransition, AutoScroller, TimerToken};
use crate::collision::{Candidate, CollisionDetector};
use crate::geometry::{Point, Rect, Size};
use crate::model::RowKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

/// A pointer press over a draggable row. Positions are in window coordinates.
#[derive(Clone, Copy, Debug)]
pub struct PointerDown {
    pub key: RowKey,
    pub button: PointerButton,
    pub position: Point,
    /// Bounds of the pressed row.
    pub row_rect: Rect,
    /// Top-left of the list content; moves when the list scrolls.
    pub container_origin: Point,
    /// The press landed on a nested button or link inside the row.
    pub on_interactive_control: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveDrag {
    pub dragged: RowKey,
    /// Pointer position relative to the dragged row's origin, in container space.
    pub drag_offset: Point,
    pub last_pointer: Point,
    pub row_size: Size,
    pub container_origin_start: Point,
    pub container_origin: Point,
    /// Overlay origin in container space.
    pub overlay: Point,
    /// Last target reported through a drag-enter, or the dragged row itself.
    pub reported: Option<RowKey>,
}

impl ActiveDrag {
    /// The dragged rect at its overlay position, in window coordinates.
    pub fn rect(&self) -> Rect {
        Rect {
            origin: self.overlay + self.container_origin,
            size: self.row_size,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragEvent {
    Started {
        dragged: RowKey,
    },
    Entered {
        dragged: RowKey,
        target: Option<RowKey>,
    },
    Ended {
        dragged: RowKey,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerMoveOutcome {
    pub entered: Option<DragEvent>,
    pub autoscroll: AutoScrollTransition,
}

impl Default for PointerMoveOutcome {
    fn default() -> Self {
        Self {
            entered: None,
            autoscroll: AutoScrollTransition::Idle,
        }
    }
}

/// Pointer-capture drag state machine.
///
/// The controller owns all pointer tracking for a drag: the host forwards raw presses, moves and
/// releases, and gets back the higher-level [`DragEvent`]s plus autoscroll transitions to act on.
#[derive(Debug, Default)]
pub struct DragGestureController {
    state: DragState,
    detector: CollisionDetector,
    autoscroller: AutoScroller,
}

impl DragGestureController {
    pub fn new(detector: CollisionDetector, autoscroller: AutoScroller) -> Self {
        Self {
            state: DragState::Idle,
            detector,
            autoscroller,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn autoscroller(&self) -> &AutoScroller {
        &self.autoscroller
    }

    /// True exactly while dragging. Hosts keep their window-level move/up listeners registered
    /// only while this holds.
    pub fn is_listening(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn dragged(&self) -> Option<RowKey> {
        self.active().map(|drag| drag.dragged)
    }

    pub fn is_dragged(&self, key: RowKey) -> bool {
        self.dragged() == Some(key)
    }

    pub fn overlay_origin(&self) -> Option<Point> {
        self.active().map(|drag| drag.overlay)
    }

    pub fn dragged_rect(&self) -> Option<Rect> {
        self.active().map(ActiveDrag::rect)
    }

    pub fn last_pointer(&self) -> Option<Point> {
        self.active().map(|drag| drag.last_pointer)
    }

    fn active(&self) -> Option<&ActiveDrag> {
        match &self.state {
            DragState::Dragging(drag) => Some(drag),
            DragState::Idle => None,
        }
    }

    /// Start a drag. Returns `Started`, followed by an `Entered` when the pressed position already
    /// overlaps another row. Ignored while a drag is active, for non-primary buttons, and for
    /// presses on nested interactive controls.
    pub fn pointer_down(&mut self, down: PointerDown, candidates: &[Candidate]) -> Vec<DragEvent> {
        if self.is_listening() {
            return Vec::new();
        }
        if down.button != PointerButton::Primary || down.on_interactive_control {
            tracing::trace!(key = ?down.key, button = ?down.button, "press does not start a drag");
            return Vec::new();
        }

        let row_local = down.row_rect.origin - down.container_origin;
        let mut drag = ActiveDrag {
            dragged: down.key,
            drag_offset: down.position - row_local,
            last_pointer: down.position,
            row_size: down.row_rect.size,
            container_origin_start: down.container_origin,
            container_origin: down.container_origin,
            overlay: row_local,
            reported: None,
        };
        tracing::debug!(dragged = ?down.key, "drag started");

        let mut events = vec![DragEvent::Started { dragged: down.key }];
        events.extend(self.detect_enter(&mut drag, candidates));
        self.state = DragState::Dragging(drag);
        events
    }

    /// Track the pointer while dragging. `container_origin` is the list content's current origin,
    /// `viewport` the visible bounds of the scroll container.
    pub fn pointer_move(
        &mut self,
        position: Point,
        container_origin: Point,
        viewport: Rect,
        candidates: &[Candidate],
    ) -> PointerMoveOutcome {
        let DragState::Dragging(mut drag) = self.state else {
            return PointerMoveOutcome::default();
        };

        drag.last_pointer = position;
        drag.container_origin = container_origin;
        drag.overlay =
            position - drag.drag_offset + (drag.container_origin_start - container_origin);

        let entered = self.detect_enter(&mut drag, candidates);
        self.state = DragState::Dragging(drag);

        PointerMoveOutcome {
            entered,
            autoscroll: self.autoscroller.on_pointer_move(position.y, viewport),
        }
    }

    fn detect_enter(&self, drag: &mut ActiveDrag, candidates: &[Candidate]) -> Option<DragEvent> {
        let target = self
            .detector
            .detect(drag.rect(), drag.dragged.kind(), candidates);
        if target == drag.reported {
            return None;
        }
        drag.reported = target;
        // Hovering the dragged row's own slot never moves anything.
        if target == Some(drag.dragged) {
            return None;
        }
        tracing::trace!(dragged = ?drag.dragged, ?target, "drag entered");
        Some(DragEvent::Entered {
            dragged: drag.dragged,
            target,
        })
    }

    pub fn pointer_up(&mut self) -> Option<DragEvent> {
        self.finish("pointer released")
    }

    /// End the drag without a release, e.g. when the window loses the pointer.
    pub fn cancel(&mut self) -> Option<DragEvent> {
        self.finish("drag cancelled")
    }

    /// A row left the mounted set. Losing the dragged row ends the drag.
    pub fn row_unmounted(&mut self, key: RowKey) -> Option<DragEvent> {
        if self.is_dragged(key) {
            self.finish("dragged row unmounted")
        } else {
            None
        }
    }

    fn finish(&mut self, reason: &'static str) -> Option<DragEvent> {
        let DragState::Dragging(drag) = std::mem::take(&mut self.state) else {
            return None;
        };
        self.autoscroller.cancel();
        tracing::debug!(dragged = ?drag.dragged, reason, "drag ended");
        Some(DragEvent::Ended {
            dragged: drag.dragged,
        })
    }

    /// Scroll delta for one autoscroll tick, or `None` once the timer for `token` is stale.
    pub fn autoscroll_step(&self, token: TimerToken) -> Option<f32> {
        if !self.is_listening() {
            return None;
        }
        self.autoscroller.step(token)
    }
}
