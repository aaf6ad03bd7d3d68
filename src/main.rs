mod app;
mod application;
mod domain;
mod logbook;
mod playback;
mod ui;
mod utils;
mod ytdlp;

use iced::window;
use tracing_subscriber::EnvFilter;

fn main() -> iced::Result {
    init_tracing();

    let icon_data = include_bytes!("../assets/icon.png");

    let icon = match image::load_from_memory(icon_data) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            window::icon::from_rgba(rgba.into_raw(), width, height).ok()
        }
        Err(_) => None,
    };

    iced::application(app::boot, app::update, app::view)
        .title("TuneGrab")
        .subscription(app::subscription)
        .theme(app::theme)
        .window(window::Settings {
            size: iced::Size::new(560.0, 520.0),
            resizable: false,
            icon,
            ..Default::default()
        })
        .run()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "tunegrab=info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
