use crate::fractal::FractalKind;
use crate::fractal::palette::{ColorStyle, PALETTES};
use crate::io::config_loader::TomlConfigLoader;
use crate::io::render_settings::{MAX_SEED, parse_vec3};
use crate::scene::scene::InputAction;
use egui::{Color32, Context, RichText};
use native_dialog::FileDialogBuilder;

use super::app::FractalApp;
use super::core::CoreMethods;

/// 侧边栏、对话框和工具提示
pub trait WidgetMethods {
    fn draw_side_panel(&mut self, ctx: &Context, ui: &mut egui::Ui);

    fn show_error_dialog_ui(&mut self, ctx: &Context);

    fn add_tooltip(response: egui::Response, ctx: &Context, text: &str) -> egui::Response;

    /// 选择 TOML 文件并用其内容替换当前设置
    fn load_config_dialog(&mut self);

    /// 选择保存位置并将设置写为 TOML
    fn save_config_dialog(&mut self);
}

/// 绑定到 "r,g,b" 设置字符串的颜色选择器
fn color_setting(ui: &mut egui::Ui, label: &str, value: &mut String, fallback: [f32; 3]) {
    ui.horizontal(|ui| {
        ui.label(label);
        let mut rgb = parse_vec3(value)
            .map(|v| [v.x, v.y, v.z])
            .unwrap_or(fallback);
        if ui.color_edit_button_rgb(&mut rgb).changed() {
            *value = format!("{},{},{}", rgb[0], rgb[1], rgb[2]);
        }
    });
}

impl WidgetMethods for FractalApp {
    fn show_error_dialog_ui(&mut self, ctx: &Context) {
        if self.show_error_dialog {
            egui::Window::new("Error")
                .fixed_size([400.0, 150.0])
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(10.0);
                        ui.label(
                            RichText::new(&self.error_message)
                                .color(Color32::from_rgb(230, 50, 50))
                                .size(16.0),
                        );
                        ui.add_space(20.0);
                        if ui.button(RichText::new("OK").size(16.0)).clicked() {
                            self.show_error_dialog = false;
                        }
                    });
                });
        }
    }

    fn add_tooltip(response: egui::Response, _ctx: &Context, text: &str) -> egui::Response {
        response.on_hover_ui(|ui| {
            ui.add(egui::Label::new(
                RichText::new(text).size(14.0).color(Color32::LIGHT_YELLOW),
            ));
        })
    }

    fn load_config_dialog(&mut self) {
        let result = FileDialogBuilder::default()
            .set_title("Load config")
            .add_filter("TOML config", ["toml"])
            .open_single_file()
            .show();

        match result {
            Ok(Some(path)) => match TomlConfigLoader::load_from_file(&path) {
                Ok(settings) => {
                    self.settings = settings;
                    self.rebuild_scene();
                    self.status_message = format!("Loaded config {}", path.display());
                }
                Err(e) => self.set_error(e),
            },
            Ok(None) => {}
            Err(e) => self.set_error(format!("File dialog error: {}", e)),
        }
    }

    fn save_config_dialog(&mut self) {
        let result = FileDialogBuilder::default()
            .set_title("Save config")
            .add_filter("TOML config", ["toml"])
            .save_single_file()
            .show();

        match result {
            Ok(Some(path)) => match TomlConfigLoader::save_to_file(&self.settings, &path) {
                Ok(()) => self.status_message = format!("Saved config {}", path.display()),
                Err(e) => self.set_error(e),
            },
            Ok(None) => {}
            Err(e) => self.set_error(format!("File dialog error: {}", e)),
        }
    }

    fn draw_side_panel(&mut self, ctx: &Context, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            // ===== 操作 =====
            ui.horizontal(|ui| {
                let resp = ui.button("Fractalize");
                if Self::add_tooltip(resp, ctx, "Subdivide every object (left click)").clicked() {
                    self.apply_action(InputAction::Fractalize);
                }
                let resp = ui.button("Reset");
                if Self::add_tooltip(resp, ctx, "New random shapes (right click)").clicked() {
                    self.apply_action(InputAction::Reset);
                }
                if ui.button("Screenshot").clicked() {
                    match self.take_screenshot() {
                        Ok(path) => self.status_message = format!("Screenshot saved to {}", path),
                        Err(e) => self.set_error(e),
                    }
                }
            });

            if let Some(scene) = &self.scene {
                ui.label(format!(
                    "Depth {}/{}  primitives {}  triangles {}",
                    scene.depth(),
                    scene.max_depth(),
                    scene.primitive_count(),
                    scene.triangle_count()
                ));
                if let (Some(kind), Some(object)) = (scene.kind(), scene.objects().first()) {
                    ui.label(format!(
                        "{}: x{} per pass, displacement {:.4}",
                        kind.as_str(),
                        kind.branching(),
                        object.fractal().displacement_magnitude()
                    ));
                }
                ui.label(format!(
                    "Drawn: {} faces, {} wireframe  ({:.1?})",
                    self.last_stats.faces_drawn,
                    self.last_stats.edges_drawn,
                    self.last_stats.elapsed
                ));
            }
            ui.separator();

            // ===== 分形（重建后生效） =====
            ui.collapsing("Fractal", |ui| {
                let before = self.settings.clone();

                egui::ComboBox::from_label("Kind")
                    .selected_text(self.settings.fractal_kind.clone())
                    .show_ui(ui, |ui| {
                        for kind in FractalKind::ALL {
                            ui.selectable_value(
                                &mut self.settings.fractal_kind,
                                kind.as_str().to_string(),
                                kind.as_str(),
                            );
                        }
                    });

                let depth_limit = self
                    .settings
                    .get_fractal_kind()
                    .map_or(4, |k| k.depth_limit());
                let resp = ui.add(
                    egui::Slider::new(&mut self.settings.max_depth, 0..=depth_limit)
                        .text("Max depth"),
                );
                Self::add_tooltip(resp, ctx, "Fractalize stops changing the shape at this depth");
                ui.add(
                    egui::Slider::new(
                        &mut self.settings.initial_steps,
                        0..=self.settings.max_depth,
                    )
                    .text("Initial steps"),
                );
                ui.add(egui::Slider::new(&mut self.settings.grid_size, 1..=4).text("Grid size"));
                ui.add(
                    egui::Slider::new(&mut self.settings.spacing, 0.1..=4.0).text("Spacing"),
                );
                ui.add(
                    egui::Slider::new(&mut self.settings.object_scale, 0.05..=4.0).text("Scale"),
                );
                ui.horizontal(|ui| {
                    ui.label("Seed");
                    ui.add(egui::DragValue::new(&mut self.settings.seed).range(0..=MAX_SEED));
                });
                ui.add(
                    egui::Slider::new(&mut self.settings.start_displacement, 0.0..=3.0)
                        .text("Displacement"),
                );
                let resp = ui.add(
                    egui::Slider::new(&mut self.settings.roughness, 0.0..=1.0).text("Roughness"),
                );
                Self::add_tooltip(resp, ctx, "Displacement decay per level (mesh)");
                ui.add(
                    egui::Slider::new(&mut self.settings.pyramid_displacement, 0.0..=0.5)
                        .text("Pyramid jitter"),
                );

                ui.separator();
                ui.horizontal(|ui| {
                    ui.label("Colours");
                    for style in [ColorStyle::Palette, ColorStyle::Height, ColorStyle::Rainbow] {
                        ui.radio_value(
                            &mut self.settings.color_style,
                            style.as_str().to_string(),
                            style.as_str(),
                        );
                    }
                });
                ui.checkbox(&mut self.settings.random_colors, "Random colours");
                let resp = ui.checkbox(&mut self.settings.alternate_styles, "Alternate across grid");
                Self::add_tooltip(resp, ctx, "Odd columns cycle hues, odd rows randomise");

                if self.settings != before {
                    self.scene_settings_dirty = true;
                }
                let label = if self.scene_settings_dirty {
                    RichText::new("Rebuild scene *").color(Color32::from_rgb(220, 180, 50))
                } else {
                    RichText::new("Rebuild scene")
                };
                if ui.button(label).clicked() {
                    self.rebuild_scene();
                }
            });

            // ===== 实时渲染设置 =====
            ui.collapsing("Render", |ui| {
                ui.horizontal(|ui| {
                    ui.label("Palette");
                    for (index, palette) in PALETTES.iter().enumerate() {
                        if ui
                            .selectable_label(self.settings.palette == index, palette.name)
                            .clicked()
                        {
                            self.settings.palette = index;
                            self.apply_action(InputAction::SelectPalette(index));
                        }
                    }
                });
                ui.horizontal(|ui| {
                    if ui.button("Faces (E)").clicked() {
                        self.apply_action(InputAction::ToggleFaces);
                    }
                    if ui.button("Wireframe (Q)").clicked() {
                        self.apply_action(InputAction::ToggleWireframe);
                    }
                    if ui.button("Projection (P)").clicked() {
                        self.apply_action(InputAction::ToggleProjection);
                    }
                });
                ui.checkbox(&mut self.settings.use_zbuffer, "Depth test");
                ui.checkbox(&mut self.settings.use_gamma, "Gamma correction");
                ui.checkbox(&mut self.settings.backface_culling, "Backface culling");
                ui.checkbox(&mut self.settings.use_multithreading, "Multithreading");
                ui.add(
                    egui::Slider::new(&mut self.settings.line_width, 0.5..=4.0).text("Line width"),
                );
                color_setting(ui, "Background", &mut self.settings.background_color, [0.05, 0.05, 0.08]);
                color_setting(ui, "Wireframe", &mut self.settings.wireframe_color, [1.0, 1.0, 1.0]);
            });

            // ===== 相机 =====
            ui.collapsing("Camera", |ui| {
                ui.add(egui::Slider::new(&mut self.settings.camera_fov, 10.0..=120.0).text("FOV"));
                ui.add(
                    egui::Slider::new(&mut self.settings.camera_speed, 0.1..=5.0).text("Speed"),
                );
                ui.add(
                    egui::Slider::new(&mut self.settings.mouse_sensitivity, 0.001..=0.02)
                        .text("Mouse sensitivity"),
                );
                if let Some(scene) = &mut self.scene {
                    let camera = &scene.camera;
                    let center = scene.center();
                    ui.label(format!(
                        "Position ({:.2}, {:.2}, {:.2})  view {}",
                        camera.position.x,
                        camera.position.y,
                        camera.position.z,
                        camera.view().as_str()
                    ));
                    ui.label(format!(
                        "Grid centre ({:.2}, {:.2}, {:.2}), distance {:.2}",
                        center.x,
                        center.y,
                        center.z,
                        (camera.position - center).norm()
                    ));
                    ui.horizontal(|ui| {
                        if ui.button("Next view (C)").clicked() {
                            scene.apply(InputAction::CycleCameraView);
                        }
                        if ui.button("Home").clicked() {
                            scene.camera.reset_pose();
                        }
                    });
                }
                ui.small("WASD move, Space/Shift up/down, drag to look");
            });

            // ===== 动画 =====
            ui.collapsing("Animation", |ui| {
                if let Some(scene) = &mut self.scene {
                    ui.checkbox(&mut scene.animation.translate, "Translate (T)");
                    ui.checkbox(&mut scene.animation.rotate, "Orbit (R)");
                    ui.add(
                        egui::Slider::new(&mut scene.animation.rotation_speed, 0.0..=3.0)
                            .text("Orbit speed"),
                    );
                    self.settings.translate = scene.animation.translate;
                    self.settings.rotate = scene.animation.rotate;
                    self.settings.rotation_speed = scene.animation.rotation_speed;
                }
            });

            // ===== 文件 =====
            ui.collapsing("Files", |ui| {
                ui.horizontal(|ui| {
                    ui.label("Output dir");
                    ui.text_edit_singleline(&mut self.settings.output_dir);
                });
                ui.horizontal(|ui| {
                    ui.label("Output name");
                    ui.text_edit_singleline(&mut self.settings.output);
                });
                ui.checkbox(&mut self.settings.save_depth, "Save depth image");
                ui.horizontal(|ui| {
                    ui.label("Size");
                    ui.add(egui::DragValue::new(&mut self.settings.width).range(16..=4096));
                    ui.label("x");
                    ui.add(egui::DragValue::new(&mut self.settings.height).range(16..=4096));
                });
                if self.settings.width != self.renderer.width()
                    || self.settings.height != self.renderer.height()
                {
                    self.scene_settings_dirty = true;
                }
                ui.horizontal(|ui| {
                    if ui.button("Load config").clicked() {
                        self.load_config_dialog();
                    }
                    if ui.button("Save config").clicked() {
                        self.save_config_dialog();
                    }
                    if ui.button("Defaults").clicked() {
                        self.reset_to_defaults();
                    }
                });
            });
        });
    }
}
