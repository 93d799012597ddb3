//! mini3d viewer: window, key mapping and presentation
//!
//! Keys: Up/Down move the camera, Left/Right spin the cube, Space cycles the
//! render mode, F1 toggles back-face culling, F2 toggles 2x2 supersampling,
//! Escape quits. An optional first argument names a RON config file.

use anyhow::Context;
use macroquad::prelude::*;

use mini3d::app::{AppState, Command, InputState};
use mini3d::config::{load_config, RenderConfig};
use mini3d::logging::init_logging;
use mini3d::rasterizer::{Color as PixelColor, Device};
use mini3d::texture_file::TextureImage;
use mini3d::VERSION;

const KEY_BINDINGS: [(KeyCode, Command); 5] = [
    (KeyCode::Up, Command::MoveNear),
    (KeyCode::Down, Command::MoveFar),
    (KeyCode::Left, Command::RotateLeft),
    (KeyCode::Right, Command::RotateRight),
    (KeyCode::Space, Command::ChangeMode),
];

fn startup_config() -> anyhow::Result<RenderConfig> {
    match std::env::args().nth(1) {
        Some(path) => load_config(&path).with_context(|| format!("loading config {}", path)),
        None => Ok(RenderConfig::default()),
    }
}

fn window_conf() -> Conf {
    // Errors are reported again from main once logging is up
    let config = startup_config().unwrap_or_default();
    Conf {
        window_title: format!("mini3d v{}", VERSION),
        window_width: config.width as i32,
        window_height: config.height as i32,
        window_resizable: true,
        ..Default::default()
    }
}

fn poll_input(input: &mut InputState) {
    for (key, command) in KEY_BINDINGS {
        input.set(command, is_key_down(key));
    }
    if is_key_pressed(KeyCode::Escape) {
        input.request_quit();
    }
}

/// Convert the presented buffer to RGBA bytes for upload
fn present(device: &Device, rgba: &mut [u8]) {
    let format = device.format();
    for (pixel, out) in device.primary().color().iter().zip(rgba.chunks_exact_mut(4)) {
        out.copy_from_slice(&PixelColor::unpack(*pixel, format).to_bytes());
    }
}

async fn run() -> anyhow::Result<()> {
    let config = startup_config()?;
    init_logging(&config);

    let (width, height) = (config.width, config.height);
    let mut device = Device::new(width, height, None, config.pixel_format);
    let mut app = AppState::new(&mut device, &config).context("creating scene")?;
    if let Some(path) = &config.texture_path {
        match TextureImage::from_file(path, device.format()) {
            Ok(image) => app.set_diffuse(&mut device, &image)?,
            Err(e) => log::warn!("{}, keeping checkerboard", e),
        }
    }
    let mut input = InputState::default();
    let mut rgba = vec![0u8; width * height * 4];

    loop {
        poll_input(&mut input);
        if input.quit_requested() {
            break;
        }

        if is_key_pressed(KeyCode::F1) {
            app.toggle_cull(&mut device)?;
        }
        if is_key_pressed(KeyCode::F2) {
            if let Err(e) = app.toggle_anti_alias(&mut device) {
                log::warn!("{}", e);
            }
        }

        app.frame(&mut device, &input)?;
        device.resolve_supersample();
        present(&device, &mut rgba);

        let texture = Texture2D::from_rgba8(width as u16, height as u16, &rgba);
        texture.set_filter(FilterMode::Nearest);

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );
        draw_text(&app.title(), 10.0, 20.0, 20.0, WHITE);

        next_frame().await;
    }

    log::info!("quit requested");
    Ok(())
}

#[macroquad::main(window_conf)]
async fn main() {
    if let Err(e) = run().await {
        log::error!("{:#}", e);
        eprintln!("mini3d: {:#}", e);
        std::process::exit(1);
    }
}
