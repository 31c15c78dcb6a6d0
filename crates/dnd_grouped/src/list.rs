use std::rc::Rc;

use gpui::{
    AnyElement, App, Bounds, Context, Div, ElementId, Entity, FocusHandle, InteractiveElement as _,
    IntoElement, MouseButton, MouseDownEvent, ParentElement as _, Pixels, Render, RenderOnce,
    ScrollHandle, StatefulInteractiveElement as _, StyleRefinement, Styled, Timer, Window, div,
    point, prelude::FluentBuilder as _, px,
};
use gpui_component::{ActiveTheme as _, StyledExt as _};
use gpui_component::list::ListItem;
use gpui_component::scroll::{Scrollbar, ScrollbarState};
use gpui_dnd_grouped_core::{
    AutoScrollTransition, Candidate, Collection, DragEvent, DragGestureController, Group, GroupId,
    GroupedDndConfig, Item, MoveCommand, MoveSeq, MoveSink, NullSink, OrderingEngine, PointerButton,
    PointerDown, RowKey, SequencedSnapshot, TimerToken, VirtualLayout, VisibleRow,
};

use crate::tracker::DragTrackerElement;

const CONTEXT: &str = "GroupedDnd";
const DRAGGED_OPACITY: f32 = 0.4;

/// Create a [`GroupedDnd`].
pub fn grouped_dnd<H, I>(
    state: &Entity<GroupedDndState>,
    render_header: H,
    render_item: I,
) -> GroupedDnd
where
    H: Fn(&Group, GroupedDndRowState, &mut Window, &mut App) -> ListItem + 'static,
    I: Fn(GroupId, &Item, GroupedDndRowState, &mut Window, &mut App) -> ListItem + 'static,
{
    GroupedDnd::new(state, render_header, render_item)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GroupedDndRowState {
    /// The row (or the group holding it) is being dragged.
    pub dragging: bool,
    /// The row is being rendered inside the floating drag overlay.
    pub overlay: bool,
}

type RenderHeader = Rc<dyn Fn(&Group, GroupedDndRowState, &mut Window, &mut App) -> ListItem>;
type RenderItem =
    Rc<dyn Fn(GroupId, &Item, GroupedDndRowState, &mut Window, &mut App) -> ListItem>;

#[derive(Default)]
struct GroupedDndCallbacks {
    on_move: Option<Rc<dyn Fn(&MoveCommand, &Collection)>>,
}

/// View model for a grouped, drag-reorderable list.
///
/// Owns the ordered collection. Drags mutate it optimistically, and the single resulting move is
/// handed to the configured [`MoveSink`] when the drag ends.
pub struct GroupedDndState {
    focus_handle: FocusHandle,
    groups: Collection,
    config: GroupedDndConfig,
    layout: VirtualLayout,
    controller: DragGestureController,
    engine: OrderingEngine,
    sink: Rc<dyn MoveSink>,
    scroll_handle: ScrollHandle,
    scrollbar_state: ScrollbarState,
    pub(crate) viewport_bounds: Bounds<Pixels>,
    pending_snapshot: Option<SequencedSnapshot>,
    last_committed: Option<MoveCommand>,
    callbacks: GroupedDndCallbacks,
    render_header: RenderHeader,
    render_item: RenderItem,
}

impl GroupedDndState {
    pub fn new(cx: &mut App) -> Self {
        let config = GroupedDndConfig::default();
        Self {
            focus_handle: cx.focus_handle(),
            groups: Collection::default(),
            layout: VirtualLayout::default(),
            controller: config.gesture_controller(),
            config,
            engine: OrderingEngine::new(),
            sink: Rc::new(NullSink),
            scroll_handle: ScrollHandle::new(),
            scrollbar_state: ScrollbarState::default(),
            viewport_bounds: Bounds::default(),
            pending_snapshot: None,
            last_committed: None,
            callbacks: GroupedDndCallbacks::default(),
            render_header: Rc::new(|group, _, _, _| {
                ListItem::new(ElementId::NamedInteger("grouped-dnd-header".into(), group.id.0))
            }),
            render_item: Rc::new(|_, item, _, _, _| {
                ListItem::new(ElementId::NamedInteger("grouped-dnd-item".into(), item.id.0))
            }),
        }
    }

    pub fn groups(mut self, groups: Collection) -> Self {
        self.groups = groups;
        self.rebuild_layout();
        self
    }

    pub fn config(mut self, config: GroupedDndConfig) -> Self {
        self.controller = config.gesture_controller();
        self.config = config;
        self.rebuild_layout();
        self
    }

    /// Where completed moves are sent. Defaults to [`NullSink`].
    pub fn set_sink(&mut self, sink: Rc<dyn MoveSink>) {
        self.sink = sink;
    }

    /// Provide a callback invoked with each committed move and the order it produced.
    pub fn on_move(mut self, on_move: impl Fn(&MoveCommand, &Collection) + 'static) -> Self {
        self.callbacks.on_move = Some(Rc::new(on_move));
        self
    }

    pub fn groups_ref(&self) -> &Collection {
        &self.groups
    }

    pub fn dragged(&self) -> Option<RowKey> {
        self.controller.dragged()
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_listening()
    }

    pub fn last_committed(&self) -> Option<&MoveCommand> {
        self.last_committed.as_ref()
    }

    /// Replace the collection. An active drag whose row disappeared ends immediately.
    pub fn set_groups(&mut self, groups: Collection, cx: &mut Context<Self>) {
        self.groups = groups;
        self.rebuild_layout();

        if let Some(dragged) = self.controller.dragged()
            && !self.groups.contains(dragged)
            && let Some(event) = self.controller.row_unmounted(dragged)
        {
            self.handle_drag_event(event, cx);
        }
        cx.notify();
    }

    /// The sequence number of the last move this list committed. A snapshot tagged with it (or
    /// later) reflects every local move.
    pub fn committed_seq(&self) -> MoveSeq {
        self.engine.committed_seq()
    }

    /// Take a fresh snapshot from the cache layer.
    ///
    /// Snapshots read before the latest committed move reached the authority are dropped. While a
    /// drag is running the snapshot is held back and re-checked once the drag ends.
    pub fn apply_snapshot(&mut self, snapshot: SequencedSnapshot, cx: &mut Context<Self>) {
        if !self.engine.accepts(snapshot.seq) {
            tracing::debug!(
                seq = snapshot.seq.0,
                committed = self.engine.committed_seq().0,
                "dropping stale snapshot"
            );
            return;
        }
        if self.is_dragging() {
            tracing::debug!("deferring snapshot until the drag ends");
            self.pending_snapshot = Some(snapshot);
            return;
        }
        self.set_groups(snapshot.groups, cx);
    }

    fn rebuild_layout(&mut self) {
        self.layout = VirtualLayout::for_groups(&self.groups, &self.config.metrics);
    }

    fn scroll_top(&self) -> f32 {
        let offset: f32 = self.scroll_handle.offset().y.into();
        (-offset).max(0.)
    }

    fn viewport_rect(&self) -> gpui_dnd_grouped_core::Rect {
        let bounds = self.viewport_bounds;
        gpui_dnd_grouped_core::Rect::new(
            bounds.origin.x.into(),
            bounds.origin.y.into(),
            bounds.size.width.into(),
            bounds.size.height.into(),
        )
    }

    /// Top-left of the list content in window coordinates. Moves as the list scrolls.
    fn content_origin(&self) -> gpui_dnd_grouped_core::Point {
        let offset = self.scroll_handle.offset();
        to_dnd_point(self.viewport_bounds.origin + offset)
    }

    /// The group row that must stay mounted for the current drag.
    fn pinned_row(&self) -> Option<RowKey> {
        match self.controller.dragged()? {
            RowKey::Group(id) => Some(RowKey::Group(id)),
            RowKey::Item(id) => self.groups.group_of(id).map(RowKey::Group),
        }
    }

    fn visible_rows(&self) -> Vec<VisibleRow> {
        self.layout.visible_rows(
            self.scroll_top(),
            self.viewport_rect().height(),
            self.config.overscan,
            self.pinned_row(),
        )
    }

    fn candidates(&self) -> Vec<Candidate> {
        let rows = self.visible_rows();
        let viewport = self.viewport_rect();
        self.layout.candidates(
            &self.groups,
            &self.config.metrics,
            &rows,
            self.content_origin(),
            viewport.size.width,
        )
    }

    fn on_row_mouse_down(
        &mut self,
        key: RowKey,
        event: &MouseDownEvent,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let candidates = self.candidates();
        let Some(row_rect) = candidates
            .iter()
            .find(|candidate| candidate.key == key)
            .map(|candidate| candidate.rect)
        else {
            return;
        };

        let events = self.controller.pointer_down(
            PointerDown {
                key,
                button: pointer_button(event.button),
                position: to_dnd_point(event.position),
                row_rect,
                container_origin: self.content_origin(),
                on_interactive_control: false,
            },
            &candidates,
        );
        if events.is_empty() {
            return;
        }

        cx.stop_propagation();
        for event in events {
            self.handle_drag_event(event, cx);
        }
        cx.notify();
    }

    pub(crate) fn track_pointer(&mut self, position: gpui::Point<Pixels>, cx: &mut Context<Self>) {
        self.update_pointer(to_dnd_point(position), cx);
    }

    fn update_pointer(&mut self, position: gpui_dnd_grouped_core::Point, cx: &mut Context<Self>) {
        let candidates = self.candidates();
        let outcome = self.controller.pointer_move(
            position,
            self.content_origin(),
            self.viewport_rect(),
            &candidates,
        );

        if let Some(event) = outcome.entered {
            self.handle_drag_event(event, cx);
        }
        if let AutoScrollTransition::Start(token) = outcome.autoscroll {
            self.start_autoscroll(token, cx);
        }
        cx.notify();
    }

    pub(crate) fn end_drag(&mut self, cx: &mut Context<Self>) {
        if let Some(event) = self.controller.pointer_up() {
            self.handle_drag_event(event, cx);
        }
    }

    fn handle_drag_event(&mut self, event: DragEvent, cx: &mut Context<Self>) {
        match event {
            DragEvent::Started { .. } => self.engine.begin_gesture(),
            DragEvent::Entered { dragged, target } => {
                if self
                    .engine
                    .apply_optimistic_move(&mut self.groups, dragged, target)
                    .is_some()
                {
                    self.rebuild_layout();
                }
            }
            DragEvent::Ended { .. } => self.finish_drag(cx),
        }
    }

    fn finish_drag(&mut self, cx: &mut Context<Self>) {
        if let Some(command) = self.engine.commit_move(self.sink.as_ref()) {
            if let Some(on_move) = self.callbacks.on_move.as_ref() {
                on_move(&command, &self.groups);
            }
            self.last_committed = Some(command);
        }

        // A commit above makes the held snapshot stale; otherwise it is still current.
        if let Some(snapshot) = self.pending_snapshot.take()
            && self.engine.accepts(snapshot.seq)
        {
            self.groups = snapshot.groups;
            self.rebuild_layout();
        }
        cx.notify();
    }

    fn start_autoscroll(&mut self, token: TimerToken, cx: &mut Context<Self>) {
        let tick = self.config.autoscroll.tick();
        cx.spawn(async move |this, cx| {
            loop {
                Timer::after(tick).await;
                let running = this
                    .update(cx, |this, cx| this.autoscroll_tick(token, cx))
                    .unwrap_or(false);
                if !running {
                    break;
                }
            }
        })
        .detach();
    }

    /// One autoscroll step. Returns `false` once `token` is stale and the loop should exit.
    fn autoscroll_tick(&mut self, token: TimerToken, cx: &mut Context<Self>) -> bool {
        let Some(delta) = self.controller.autoscroll_step(token) else {
            return false;
        };

        let max_scroll_top = self
            .layout
            .max_scroll_top(self.viewport_rect().height());
        let scroll_top = self.scroll_top();
        let next = (scroll_top + delta).clamp(0., max_scroll_top);
        if next != scroll_top {
            let offset = self.scroll_handle.offset();
            self.scroll_handle.set_offset(point(offset.x, px(-next)));
            self.recheck_pointer(cx);
        }
        true
    }

    /// The content moved under a still pointer; re-run collision against the new layout.
    fn recheck_pointer(&mut self, cx: &mut Context<Self>) {
        if let Some(pointer) = self.controller.last_pointer() {
            self.update_pointer(pointer, cx);
        }
    }

    fn render_group(
        &self,
        group: &Group,
        row_state: GroupedDndRowState,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Div {
        let metrics = self.config.metrics;
        let theme = cx.theme();
        let border = theme.border;
        let background = theme.background;
        let dragged = self.controller.dragged();
        let interactive = !row_state.overlay;

        let header_key = RowKey::Group(group.id);
        let header = (self.render_header)(group, row_state, window, cx);
        let header = div()
            .id(ElementId::NamedInteger("grouped-dnd-header".into(), group.id.0))
            .absolute()
            .top(px(metrics.header_offset()))
            .left(px(metrics.group_border))
            .right(px(metrics.group_border))
            .h(px(metrics.item_height()))
            .child(header.h_full())
            .when(interactive, |this| {
                this.on_any_mouse_down(cx.listener(move |this, event, window, cx| {
                    this.on_row_mouse_down(header_key, event, window, cx);
                }))
            });

        let items = group
            .items
            .iter()
            .enumerate()
            .map(|(ix, item)| {
                let key = RowKey::Item(item.id);
                let item_state = GroupedDndRowState {
                    dragging: row_state.dragging || dragged == Some(key),
                    overlay: row_state.overlay,
                };
                let row = (self.render_item)(group.id, item, item_state, window, cx);
                div()
                    .id(ElementId::NamedInteger("grouped-dnd-item".into(), item.id.0))
                    .absolute()
                    .top(px(metrics.item_offset(ix)))
                    .left(px(metrics.group_border))
                    .right(px(metrics.group_border))
                    .h(px(metrics.item_height()))
                    .when(item_state.dragging && !row_state.dragging, |this| {
                        this.opacity(DRAGGED_OPACITY)
                    })
                    .child(row.h_full())
                    .when(interactive, |this| {
                        this.on_any_mouse_down(cx.listener(move |this, event, window, cx| {
                            this.on_row_mouse_down(key, event, window, cx);
                        }))
                    })
                    .into_any_element()
            })
            .collect::<Vec<AnyElement>>();

        div()
            .relative()
            .size_full()
            .child(
                div()
                    .absolute()
                    .top(px(metrics.group_padding_y))
                    .bottom(px(metrics.group_padding_y))
                    .left_0()
                    .right_0()
                    .rounded(px(8.))
                    .border_1()
                    .border_color(border)
                    .bg(background),
            )
            .child(header)
            .children(items)
    }

    fn render_overlay(&self, window: &mut Window, cx: &mut Context<Self>) -> Option<AnyElement> {
        let rect = self.controller.dragged_rect()?;
        let dragged = self.controller.dragged()?;
        let viewport = self.viewport_rect();
        let left = rect.origin.x - viewport.origin.x;
        let top = rect.origin.y - viewport.origin.y;
        let overlay_state = GroupedDndRowState {
            dragging: false,
            overlay: true,
        };

        let content = match dragged {
            RowKey::Group(id) => {
                let group = self.groups.group(id)?;
                self.render_group(group, overlay_state, window, cx)
                    .into_any_element()
            }
            RowKey::Item(id) => {
                let group_id = self.groups.group_of(id)?;
                let item = self.groups.item(id)?;
                (self.render_item)(group_id, item, overlay_state, window, cx)
                    .h_full()
                    .into_any_element()
            }
        };

        let theme = cx.theme();
        Some(
            div()
                .absolute()
                .left(px(left))
                .top(px(top))
                .w(px(rect.size.width))
                .h(px(rect.size.height))
                .rounded(px(8.))
                .bg(theme.popover)
                .shadow_md()
                .child(content)
                .into_any_element(),
        )
    }
}

impl Render for GroupedDndState {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let rows = self.visible_rows();
        let dragged = self.controller.dragged();
        let total_height = self.layout.total_height();

        let mut children = Vec::with_capacity(rows.len());
        for row in &rows {
            let RowKey::Group(group_id) = row.key else {
                continue;
            };
            let Some(group) = self.groups.group(group_id) else {
                continue;
            };
            let row_state = GroupedDndRowState {
                dragging: dragged == Some(row.key),
                overlay: false,
            };
            children.push(
                div()
                    .id(ElementId::NamedInteger("grouped-dnd-group".into(), group_id.0))
                    .absolute()
                    .top(px(row.top))
                    .left_0()
                    .right_0()
                    .h(px(row.height))
                    .when(row_state.dragging, |this| this.opacity(DRAGGED_OPACITY))
                    .child(self.render_group(group, row_state, window, cx)),
            );
        }

        let overlay = self.render_overlay(window, cx);

        div()
            .id("grouped-dnd-state")
            .size_full()
            .relative()
            .child(
                div()
                    .id("grouped-dnd-scroll")
                    .size_full()
                    .overflow_y_scroll()
                    .track_scroll(&self.scroll_handle)
                    .on_scroll_wheel(cx.listener(|this, _, window, cx| {
                        // The offset is applied by the scroll container itself; look again once
                        // it has moved.
                        if this.is_dragging() {
                            cx.on_next_frame(window, |this, _, cx| this.recheck_pointer(cx));
                        }
                        cx.notify();
                    }))
                    .child(
                        div()
                            .relative()
                            .w_full()
                            .h(px(total_height))
                            .children(children),
                    ),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .right_0()
                    .bottom_0()
                    .w(px(12.))
                    .child(Scrollbar::uniform_scroll(
                        &self.scrollbar_state,
                        &self.scroll_handle,
                    )),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .left_0()
                    .size_full()
                    .child(DragTrackerElement::new(cx.entity())),
            )
            .when_some(overlay, |this, overlay| this.child(overlay))
    }
}

/// A grouped list element with drag-and-drop reordering of groups and of items across groups.
#[derive(IntoElement)]
pub struct GroupedDnd {
    id: ElementId,
    state: Entity<GroupedDndState>,
    style: StyleRefinement,
    render_header: RenderHeader,
    render_item: RenderItem,
}

impl GroupedDnd {
    pub fn new<H, I>(state: &Entity<GroupedDndState>, render_header: H, render_item: I) -> Self
    where
        H: Fn(&Group, GroupedDndRowState, &mut Window, &mut App) -> ListItem + 'static,
        I: Fn(GroupId, &Item, GroupedDndRowState, &mut Window, &mut App) -> ListItem + 'static,
    {
        Self {
            id: ElementId::Name(format!("grouped-dnd-{}", state.entity_id()).into()),
            state: state.clone(),
            style: StyleRefinement::default(),
            render_header: Rc::new(render_header),
            render_item: Rc::new(render_item),
        }
    }
}

impl Styled for GroupedDnd {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl RenderOnce for GroupedDnd {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let focus_handle = self.state.read(cx).focus_handle.clone();
        self.state.update(cx, |state, _| {
            state.render_header = self.render_header;
            state.render_item = self.render_item;
        });

        div()
            .id(self.id)
            .key_context(CONTEXT)
            .track_focus(&focus_handle)
            .size_full()
            .child(self.state)
            .refine_style(&self.style)
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        _ => PointerButton::Auxiliary,
    }
}

fn to_dnd_point(position: gpui::Point<Pixels>) -> gpui_dnd_grouped_core::Point {
    gpui_dnd_grouped_core::Point::new(position.x.into(), position.y.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_left_button_maps_to_primary() {
        assert_eq!(pointer_button(MouseButton::Left), PointerButton::Primary);
        assert_eq!(pointer_button(MouseButton::Right), PointerButton::Secondary);
        assert_eq!(pointer_button(MouseButton::Middle), PointerButton::Auxiliary);
    }

    #[test]
    fn window_points_convert_to_engine_points() {
        let p = to_dnd_point(point(px(12.5), px(-3.)));
        assert_eq!(p, gpui_dnd_grouped_core::Point::new(12.5, -3.));
    }
}
