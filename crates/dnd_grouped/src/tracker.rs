use gpui::{
    App, Bounds, Element, ElementId, Entity, GlobalElementId, InspectorElementId, IntoElement,
    LayoutId, MouseButton, MouseMoveEvent, MouseUpEvent, Pixels, Window,
};

use crate::list::GroupedDndState;

/// Invisible full-size element that records the list viewport and, while a drag is active,
/// listens for pointer moves and releases anywhere in the window.
///
/// Listeners registered in `paint` only live for one frame, so they exist exactly as long as the
/// state keeps reporting an active drag.
pub(crate) struct DragTrackerElement {
    state: Entity<GroupedDndState>,
}

impl DragTrackerElement {
    pub(crate) fn new(state: Entity<GroupedDndState>) -> Self {
        Self { state }
    }
}

impl IntoElement for DragTrackerElement {
    type Element = Self;

    fn into_element(self) -> Self::Element {
        self
    }
}

impl Element for DragTrackerElement {
    type RequestLayoutState = ();
    type PrepaintState = ();

    fn id(&self) -> Option<ElementId> {
        None
    }

    fn source_location(&self) -> Option<&'static std::panic::Location<'static>> {
        None
    }

    fn request_layout(
        &mut self,
        _global_id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        window: &mut Window,
        cx: &mut App,
    ) -> (LayoutId, Self::RequestLayoutState) {
        let mut style = gpui::Style::default();
        style.size.width = gpui::relative(1.).into();
        style.size.height = gpui::relative(1.).into();
        (window.request_layout(style, [], cx), ())
    }

    fn prepaint(
        &mut self,
        _global_id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        bounds: Bounds<Pixels>,
        _request_layout: &mut Self::RequestLayoutState,
        _window: &mut Window,
        cx: &mut App,
    ) -> Self::PrepaintState {
        self.state.update(cx, |state, cx| {
            if state.viewport_bounds != bounds {
                state.viewport_bounds = bounds;
                cx.notify();
            }
        });
    }

    fn paint(
        &mut self,
        _global_id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        _bounds: Bounds<Pixels>,
        _request_layout: &mut Self::RequestLayoutState,
        _prepaint: &mut Self::PrepaintState,
        window: &mut Window,
        cx: &mut App,
    ) {
        if !self.state.read(cx).is_dragging() {
            return;
        }

        window.on_mouse_event({
            let state = self.state.clone();
            move |event: &MouseMoveEvent, phase, _window, cx| {
                if !phase.bubble() {
                    return;
                }
                state.update(cx, |this, cx| {
                    if event.pressed_button == Some(MouseButton::Left) {
                        this.track_pointer(event.position, cx);
                    } else {
                        // The release happened outside the window.
                        this.end_drag(cx);
                    }
                });
            }
        });

        window.on_mouse_event({
            let state = self.state.clone();
            move |event: &MouseUpEvent, phase, _window, cx| {
                if !phase.bubble() || event.button != MouseButton::Left {
                    return;
                }
                state.update(cx, |this, cx| this.end_drag(cx));
            }
        });
    }
}
