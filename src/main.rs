use hello_window::{config::AppConfig, frame_loop, window::GlWindow};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = AppConfig::default();

    frame_loop::launch(
        || {
            let window = GlWindow::new(&config.window)?;
            let renderer = window.create_gl_renderer(&config)?;
            Ok((window, renderer))
        },
        config.clear_color,
        std::io::stdout(),
    )?;

    Ok(())
}
