use std::rc::Rc;
use std::sync::Arc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::button::{Button, ButtonVariants as _};
use gpui_component::list::ListItem;
use gpui_component::{ActiveTheme as _, Sizable as _, Theme, ThemeMode, h_flex, v_flex};
use gpui_dnd_grouped::{GpuiMoveSink, GroupedDndRowState, GroupedDndState, grouped_dnd};
use gpui_dnd_grouped_core::{
    CacheKey, Collection, Group, GroupId, GroupedDndConfig, Item, ItemId, MemoryStore,
    SnapshotCache as _, StoreCache, StoreError, SyncClient,
};

pub struct GroupedLinksExample {
    store: Arc<MemoryStore>,
    sink: Rc<GpuiMoveSink>,
    list: Entity<GroupedDndState>,
    _subscriptions: Vec<Subscription>,
}

impl GroupedLinksExample {
    pub fn view(config: GroupedDndConfig, _window: &mut Window, cx: &mut App) -> Entity<Self> {
        let store = Arc::new(demo_store());
        let cache = Arc::new(StoreCache::new(store.clone()));
        let client = SyncClient::new(store.clone(), cache);

        let list = cx.new(|cx| {
            GroupedDndState::new(cx)
                .config(config)
                .groups(client.snapshot())
                .on_move(|command, groups| {
                    tracing::info!(?command, groups = groups.len(), "link order changed");
                })
        });
        let sink = Rc::new(GpuiMoveSink::new(client, list.downgrade(), cx));
        list.update(cx, |list, _| list.set_sink(sink.clone()));

        cx.new(|cx| {
            let subscriptions = vec![cx.observe(&list, |_, _, cx| cx.notify())];
            Self {
                store,
                sink,
                list,
                _subscriptions: subscriptions,
            }
        })
    }

    /// Queue a structural edit behind any pending moves; the list refreshes once it has run.
    fn edit(
        &mut self,
        edit: impl FnOnce(&MemoryStore) -> Result<(), StoreError> + Send + 'static,
    ) {
        let store = self.store.clone();
        self.sink.edit(move |client: &SyncClient| {
            if let Err(err) = edit(&store) {
                tracing::warn!(%err, "link edit failed");
            }
            client.cache().invalidate(&CacheKey::ALL);
        });
    }

    fn add_group(&mut self) {
        self.edit(|store| store.add_group().map(|_| ()));
    }

    fn remove_empty_groups(&mut self) {
        self.edit(|store| store.remove_empty_groups().map(|_| ()));
    }

    fn remove_group(&mut self, id: GroupId) {
        self.edit(move |store| store.remove_group(id).map(|_| ()));
    }

    fn remove_item(&mut self, id: ItemId) {
        self.edit(move |store| store.remove_item(id).map(|_| ()));
    }
}

impl Render for GroupedLinksExample {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let list = self.list.read(cx);
        let dump = render_order(list.groups_ref());
        let last_move = list
            .last_committed()
            .and_then(|command| serde_json::to_string(command).ok())
            .unwrap_or_else(|| "<none>".to_string());
        let dragging = list
            .dragged()
            .map(|key| format!("{key:?}"))
            .unwrap_or_else(|| "<none>".to_string());
        let is_dark = theme.mode.is_dark();
        let view = cx.weak_entity();

        v_flex()
            .size_full()
            .p(px(16.))
            .gap_y_3()
            .child(
                h_flex()
                    .items_center()
                    .justify_between()
                    .child(
                        div()
                            .text_xl()
                            .font_weight(FontWeight::BOLD)
                            .child("Grouped Links"),
                    )
                    .child(
                        h_flex()
                            .gap_x_2()
                            .child(
                                Button::new("remove-empty-groups")
                                    .small()
                                    .label("Remove Empty Groups")
                                    .on_click(cx.listener(|this, _, _window, _cx| {
                                        this.remove_empty_groups();
                                    })),
                            )
                            .child(
                                Button::new("add-group")
                                    .small()
                                    .primary()
                                    .label("Add Group")
                                    .on_click(cx.listener(|this, _, _window, _cx| {
                                        this.add_group();
                                    })),
                            )
                            .child(
                                Button::new("toggle-theme")
                                    .small()
                                    .ghost()
                                    .label(if is_dark { "Light" } else { "Dark" })
                                    .on_click(move |_, window, cx| {
                                        let mode = if is_dark {
                                            ThemeMode::Light
                                        } else {
                                            ThemeMode::Dark
                                        };
                                        Theme::change(mode, Some(window), cx);
                                        cx.refresh_windows();
                                    }),
                            ),
                    ),
            )
            .child(
                h_flex()
                    .flex_1()
                    .min_h(px(0.))
                    .gap_x_3()
                    .child(
                        div()
                            .w(px(520.))
                            .min_w(px(0.))
                            .h_full()
                            .rounded(px(12.))
                            .border_1()
                            .border_color(theme.border)
                            .bg(theme.secondary)
                            .p(px(8.))
                            .child(grouped_dnd(
                                &self.list,
                                {
                                    let view = view.clone();
                                    move |group, row_state, _window, cx| {
                                        render_group_header(view.clone(), group, row_state, cx)
                                    }
                                },
                                move |_group_id, item, row_state, _window, cx| {
                                    render_link_row(view.clone(), item, row_state, cx)
                                },
                            )),
                    )
                    .child(
                        v_flex()
                            .flex_1()
                            .min_w(px(0.))
                            .h_full()
                            .gap_y_2()
                            .child(
                                div()
                                    .text_sm()
                                    .font_weight(FontWeight::MEDIUM)
                                    .child("Debug"),
                            )
                            .child(
                                v_flex()
                                    .flex_1()
                                    .min_h(px(0.))
                                    .gap_y_1()
                                    .rounded(px(12.))
                                    .border_1()
                                    .border_color(theme.border)
                                    .bg(theme.background)
                                    .p(px(12.))
                                    .text_sm()
                                    .child(format!("dragging: {dragging}"))
                                    .child(format!("last move: {last_move}"))
                                    .children(dump.into_iter().map(|line| div().child(line))),
                            ),
                    ),
            )
    }
}

/// Stops a row's gesture from starting when the press lands on a nested control.
fn control(child: impl IntoElement) -> Div {
    div()
        .on_mouse_down(MouseButton::Left, |_, _window, cx| cx.stop_propagation())
        .child(child)
}

fn render_group_header(
    view: WeakEntity<GroupedLinksExample>,
    group: &Group,
    row_state: GroupedDndRowState,
    cx: &mut App,
) -> ListItem {
    let theme = cx.theme();
    let group_id = group.id;

    ListItem::new(ElementId::NamedInteger("link-group".into(), group_id.0))
        .child(
            h_flex()
                .w_full()
                .items_center()
                .justify_between()
                .child(
                    div()
                        .text_sm()
                        .font_weight(FontWeight::MEDIUM)
                        .text_color(theme.muted_foreground)
                        .child(format!("Group {group_id} ({})", group.items.len())),
                )
                .when(!row_state.overlay, |this| {
                    this.child(control(
                        Button::new(ElementId::NamedInteger("del-group".into(), group_id.0))
                            .ghost()
                            .small()
                            .label("Del")
                            .on_click(move |_, _window, cx| {
                                view.update(cx, |this, _| this.remove_group(group_id))
                                    .ok();
                            }),
                    ))
                }),
        )
}

fn render_link_row(
    view: WeakEntity<GroupedLinksExample>,
    item: &Item,
    row_state: GroupedDndRowState,
    cx: &mut App,
) -> ListItem {
    let theme = cx.theme();
    let item_id = item.id;

    ListItem::new(ElementId::NamedInteger("link".into(), item_id.0))
        .child(
            h_flex()
                .w_full()
                .items_center()
                .justify_between()
                .gap_x_2()
                .child(
                    v_flex()
                        .min_w(px(0.))
                        .child(div().text_sm().truncate().child(item.title.clone()))
                        .child(
                            div()
                                .text_xs()
                                .truncate()
                                .text_color(theme.muted_foreground)
                                .child(item.uri.clone()),
                        ),
                )
                .when(!row_state.overlay, |this| {
                    this.child(control(
                        Button::new(ElementId::NamedInteger("del-link".into(), item_id.0))
                            .ghost()
                            .small()
                            .label("Del")
                            .on_click(move |_, _window, cx| {
                                view.update(cx, |this, _| this.remove_item(item_id))
                                    .ok();
                            }),
                    ))
                }),
        )
}

fn render_order(groups: &Collection) -> Vec<String> {
    groups
        .groups()
        .iter()
        .map(|group| {
            let items = group
                .items
                .iter()
                .map(|item| item.id.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: [{items}]", group.id)
        })
        .collect()
}

fn demo_store() -> MemoryStore {
    let links = [
        ("Rust Book", "https://doc.rust-lang.org/book/"),
        ("GPUI", "https://www.gpui.rs/"),
        ("crates.io", "https://crates.io/"),
        ("docs.rs", "https://docs.rs/"),
        ("This Week in Rust", "https://this-week-in-rust.org/"),
        ("Rustonomicon", "https://doc.rust-lang.org/nomicon/"),
        ("Tokio", "https://tokio.rs/"),
        ("Serde", "https://serde.rs/"),
        ("Tracing", "https://docs.rs/tracing/"),
        ("Clippy lints", "https://rust-lang.github.io/rust-clippy/"),
        ("Rust by Example", "https://doc.rust-lang.org/rust-by-example/"),
        ("Cargo Book", "https://doc.rust-lang.org/cargo/"),
    ];
    let sizes = [3, 1, 0, 4, 2, 2];

    let store = MemoryStore::new();
    let mut links = links.iter().cycle();
    for size in sizes.iter().rev() {
        let Ok(group_id) = store.add_group() else {
            continue;
        };
        for _ in 0..*size {
            if let Some((title, uri)) = links.next() {
                store.add_item(group_id, *uri, *title).ok();
            }
        }
    }
    store
}
