use crate::io::render_settings::RenderSettings;
use crate::scene::scene::{InputAction, Scene};
use crate::ui::app::FractalApp;
use crate::utils::save_utils::save_render_with_settings;
use egui::{Color32, Context};
use log::{debug, error, info};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 场景生命周期、逐帧渲染和状态记录
pub trait CoreMethods {
    /// 根据当前设置重建场景
    fn rebuild_scene(&mut self);

    /// 将用户操作应用到场景
    fn apply_action(&mut self, action: InputAction);

    /// 将场景绘制到帧缓冲区并上传
    fn render_frame(&mut self, ctx: &Context);

    /// 将帧缓冲区复制到视图纹理
    fn display_render_result(&mut self, ctx: &Context);

    /// 从设置中同步相机参数
    fn sync_camera_settings(&mut self);

    /// 以带时间戳的文件名保存当前帧
    fn take_screenshot(&mut self) -> Result<String, String>;

    fn set_error(&mut self, message: String);

    /// 恢复默认设置，保留输出位置
    fn reset_to_defaults(&mut self);

    fn update_fps_stats(&mut self, frame_time: Duration);

    fn get_fps_display(&self) -> (String, Color32);
}

impl CoreMethods for FractalApp {
    fn rebuild_scene(&mut self) {
        let mut scene = match Scene::from_settings(&self.settings) {
            Ok(scene) => scene,
            Err(e) => {
                self.set_error(format!("Failed to build scene: {}", e));
                return;
            }
        };

        for _ in 0..self.settings.initial_steps {
            scene.fractalize_all();
        }

        self.renderer
            .resize(self.settings.width, self.settings.height);
        self.status_message = format!(
            "{} objects at depth {}/{}",
            scene.objects().len(),
            scene.depth(),
            scene.max_depth()
        );
        self.scene = Some(scene);
        self.scene_settings_dirty = false;
    }

    fn apply_action(&mut self, action: InputAction) {
        let Some(scene) = &mut self.scene else {
            return;
        };

        scene.apply(action);

        self.status_message = match action {
            InputAction::Fractalize => format!(
                "Depth {}/{}: {} primitives, {} triangles",
                scene.depth(),
                scene.max_depth(),
                scene.primitive_count(),
                scene.triangle_count()
            ),
            InputAction::Reset => "Shapes reset".to_string(),
            InputAction::SelectPalette(index) => format!("Palette {}", index + 1),
            InputAction::ToggleWireframe | InputAction::ToggleFaces => {
                let object = &scene.objects()[0];
                format!(
                    "Faces {}, wireframe {}",
                    if object.render_faces { "on" } else { "off" },
                    if object.render_wireframe { "on" } else { "off" }
                )
            }
            InputAction::ToggleTranslation => format!(
                "Translation {}",
                if scene.animation.translate { "on" } else { "off" }
            ),
            InputAction::ToggleRotation => format!(
                "Rotation {}",
                if scene.animation.rotate { "on" } else { "off" }
            ),
            InputAction::CycleCameraView => {
                format!("Camera view: {}", scene.camera_view().as_str())
            }
            InputAction::ToggleProjection => {
                self.settings.projection = scene.projection().as_str().to_string();
                format!("Projection: {}", scene.projection().as_str())
            }
        };
    }

    fn render_frame(&mut self, ctx: &Context) {
        self.sync_camera_settings();
        if let Some(scene) = &self.scene {
            self.last_stats = self.renderer.render_scene(scene, &self.settings);
            self.display_render_result(ctx);
        }
    }

    fn display_render_result(&mut self, ctx: &Context) {
        let color_data = self.renderer.frame_buffer.get_color_buffer_bytes();
        let size = [self.renderer.width(), self.renderer.height()];
        let image = egui::ColorImage::from_rgb(size, &color_data);

        match &mut self.rendered_image {
            Some(texture) => texture.set(image, egui::TextureOptions::default()),
            None => {
                self.rendered_image =
                    Some(ctx.load_texture("rendered_image", image, egui::TextureOptions::default()));
            }
        }
    }

    fn sync_camera_settings(&mut self) {
        if let Some(scene) = &mut self.scene {
            let camera = &mut scene.camera;
            camera.fov_y_degrees = self.settings.camera_fov;
            camera.speed = self.settings.camera_speed;
            camera.sensitivity = self.settings.mouse_sensitivity;
        }
    }

    fn take_screenshot(&mut self) -> Result<String, String> {
        if self.scene.is_none() {
            return Err("Nothing has been rendered yet".to_string());
        }

        fs::create_dir_all(&self.settings.output_dir)
            .map_err(|e| format!("Failed to create output directory: {}", e))?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let snapshot_name = format!("{}_snapshot_{}", self.settings.output, timestamp);

        save_render_with_settings(&self.renderer, &self.settings, Some(&snapshot_name))?;

        let color_path =
            Path::new(&self.settings.output_dir).join(format!("{}_color.png", snapshot_name));
        info!("截图已保存到 {}", color_path.display());
        Ok(color_path.to_string_lossy().to_string())
    }

    fn set_error(&mut self, message: String) {
        error!("{}", message);
        self.status_message = format!("Error: {}", message);
    }

    fn reset_to_defaults(&mut self) {
        self.settings = RenderSettings {
            output_dir: self.settings.output_dir.clone(),
            output: self.settings.output.clone(),
            ..Default::default()
        };
        self.rendered_image = None;
        self.fps_history.clear();
        self.avg_fps = 0.0;
        self.current_fps = 0.0;
        self.rebuild_scene();
        debug!("设置已恢复为默认值");
        self.status_message = "Settings restored to defaults".to_string();
    }

    fn update_fps_stats(&mut self, frame_time: Duration) {
        const FPS_HISTORY_SIZE: usize = 30;
        let current_fps = 1.0 / frame_time.as_secs_f32();
        self.current_fps = current_fps;

        self.fps_history.push(current_fps);
        if self.fps_history.len() > FPS_HISTORY_SIZE {
            self.fps_history.remove(0);
        }

        let sum: f32 = self.fps_history.iter().sum();
        self.avg_fps = sum / self.fps_history.len() as f32;
    }

    fn get_fps_display(&self) -> (String, Color32) {
        let fps_color = if self.avg_fps >= 30.0 {
            Color32::from_rgb(50, 220, 50)
        } else if self.avg_fps >= 15.0 {
            Color32::from_rgb(220, 180, 50)
        } else {
            Color32::from_rgb(220, 50, 50)
        };

        (format!("FPS: {:.1}", self.avg_fps), fps_color)
    }
}
