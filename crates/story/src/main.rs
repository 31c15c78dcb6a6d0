mod grouped_links;

use gpui::*;
use gpui_component::{Root, TitleBar};
use gpui_dnd_grouped_core::GroupedDndConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::grouped_links::GroupedLinksExample;

fn load_config() -> GroupedDndConfig {
    match GroupedDndConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(%err, "ignoring {}; using defaults", GroupedDndConfig::ENV_VAR);
            GroupedDndConfig::default()
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config();
    let app = Application::new();

    app.run(move |cx| {
        gpui_component::init(cx);
        cx.activate(true);

        cx.spawn(async move |cx| {
            cx.open_window(
                WindowOptions {
                    titlebar: Some(TitleBar::title_bar_options()),
                    ..Default::default()
                },
                |window, cx| {
                    window.set_window_title("Grouped Links");
                    let view = GroupedLinksExample::view(config, window, cx);
                    cx.new(|cx| Root::new(view, window, cx))
                },
            )?;

            Ok::<_, anyhow::Error>(())
        })
        .detach();
    });
}
