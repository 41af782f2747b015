use log::{error, info};
use std::fs;
use std::time::Instant;

mod core;
mod fractal;
mod geometry;
mod io;
mod scene;
mod ui;
mod utils;

use crate::core::renderer::Renderer;
use crate::io::render_settings::RenderSettings;
use crate::io::simple_cli::SimpleCli;
use crate::scene::scene::Scene;
use crate::utils::save_utils::save_render_with_settings;

/// 构建场景，细分 `initial_steps` 次后输出一帧
fn render_headless(settings: &RenderSettings) -> Result<(), String> {
    let start_time = Instant::now();

    fs::create_dir_all(&settings.output_dir).map_err(|e| {
        format!(
            "Failed to create output directory '{}': {}",
            settings.output_dir, e
        )
    })?;

    let mut scene = Scene::from_settings(settings)?;
    for _ in 0..settings.initial_steps {
        scene.fractalize_all();
    }

    let renderer = Renderer::new(settings.width, settings.height);
    let stats = renderer.render_scene(&scene, settings);
    info!(
        "渲染了 {} 个物体（{} 个三角形，绘制 {} 个），耗时 {:?}",
        stats.objects, stats.triangles, stats.faces_drawn, stats.elapsed
    );

    save_render_with_settings(&renderer, settings, None)?;
    info!("完成，总耗时 {:?}", start_time.elapsed());
    Ok(())
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (settings, should_start_gui) = SimpleCli::process()?;

    if should_start_gui {
        info!("启动 GUI");
        ui::start_gui(settings).map_err(|e| format!("GUI failed: {}", e))
    } else {
        settings.validate()?;
        render_headless(&settings).inspect_err(|e| error!("{}", e))
    }
}
