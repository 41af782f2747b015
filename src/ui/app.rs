use crate::core::renderer::{RenderStats, Renderer};
use crate::geometry::camera::MovementInput;
use crate::io::render_settings::RenderSettings;
use crate::scene::scene::{InputAction, Scene};
use egui::{Color32, Key, RichText, Vec2};
use std::time::{Duration, Instant};

use super::core::CoreMethods;
use super::widgets::WidgetMethods;

/// GUI 状态：可编辑的设置、当前场景和帧循环
pub struct FractalApp {
    // ===== 可配置项 =====
    /// 所有可与 TOML 互相转换的设置
    pub settings: RenderSettings,

    // ===== 运行时状态 =====
    pub renderer: Renderer,
    /// 设置生成有效场景之前为 `None`
    pub scene: Option<Scene>,
    pub last_stats: RenderStats,

    // ===== 界面状态 =====
    pub rendered_image: Option<egui::TextureHandle>,
    pub status_message: String,
    pub show_error_dialog: bool,
    pub error_message: String,
    /// 面板中修改、需要重建场景才生效的设置
    pub scene_settings_dirty: bool,

    // ===== 帧计时 =====
    pub current_fps: f32,
    pub fps_history: Vec<f32>,
    pub avg_fps: f32,
    pub last_frame_time: Option<Instant>,
}

/// 将按键映射为场景操作
pub fn key_action(key: Key) -> Option<InputAction> {
    match key {
        Key::Num1 => Some(InputAction::SelectPalette(0)),
        Key::Num2 => Some(InputAction::SelectPalette(1)),
        Key::Num3 => Some(InputAction::SelectPalette(2)),
        Key::Num4 => Some(InputAction::SelectPalette(3)),
        Key::Q => Some(InputAction::ToggleWireframe),
        Key::E => Some(InputAction::ToggleFaces),
        Key::T => Some(InputAction::ToggleTranslation),
        Key::R => Some(InputAction::ToggleRotation),
        Key::C => Some(InputAction::CycleCameraView),
        Key::P => Some(InputAction::ToggleProjection),
        _ => None,
    }
}

const ACTION_KEYS: [Key; 10] = [
    Key::Num1,
    Key::Num2,
    Key::Num3,
    Key::Num4,
    Key::Q,
    Key::E,
    Key::T,
    Key::R,
    Key::C,
    Key::P,
];

/// 按住的移动键：W/S 前后，D/A 左右，Space/Shift 上下
fn movement_input(input: &egui::InputState) -> MovementInput {
    let axis = |positive: bool, negative: bool| match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    };
    MovementInput {
        forward: axis(input.key_down(Key::W), input.key_down(Key::S)),
        right: axis(input.key_down(Key::D), input.key_down(Key::A)),
        up: axis(input.key_down(Key::Space), input.modifiers.shift),
    }
}

impl FractalApp {
    pub fn new(settings: RenderSettings, _cc: &eframe::CreationContext<'_>) -> Self {
        let renderer = Renderer::new(settings.width, settings.height);

        let mut app = Self {
            settings,
            renderer,
            scene: None,
            last_stats: RenderStats::default(),
            rendered_image: None,
            status_message: String::new(),
            show_error_dialog: false,
            error_message: String::new(),
            scene_settings_dirty: false,
            current_fps: 0.0,
            fps_history: Vec::new(),
            avg_fps: 0.0,
            last_frame_time: None,
        };
        app.rebuild_scene();
        app
    }

    /// 设置状态栏并打开错误对话框
    pub fn set_error(&mut self, message: String) {
        CoreMethods::set_error(self, message.clone());
        self.error_message = message;
        self.show_error_dialog = true;
    }

    /// 键盘快捷键和相机移动，文本框获得焦点时跳过
    fn handle_keyboard(&mut self, ctx: &egui::Context, dt: f32) {
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }
        if ctx.wants_keyboard_input() {
            return;
        }

        let (actions, movement) = ctx.input(|i| {
            let actions: Vec<InputAction> = ACTION_KEYS
                .iter()
                .filter(|key| i.key_pressed(**key))
                .filter_map(|key| key_action(*key))
                .collect();
            (actions, movement_input(i))
        });

        for action in actions {
            self.apply_action(action);
        }

        if let Some(scene) = &mut self.scene {
            if !movement.is_idle() {
                scene.move_camera(&movement, dt);
            }
        }
    }

    /// 左键细分，右键重置，拖动环视
    fn handle_view_interaction(&mut self, response: &egui::Response) {
        if response.clicked() {
            self.apply_action(InputAction::Fractalize);
        } else if response.secondary_clicked() {
            self.apply_action(InputAction::Reset);
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            if let Some(scene) = &mut self.scene {
                scene.look(delta.x, delta.y);
            }
        }
    }

    fn draw_view(&mut self, ui: &mut egui::Ui) {
        let Some(texture) = &self.rendered_image else {
            ui.vertical_centered(|ui| {
                ui.add_space(100.0);
                ui.label(RichText::new("No scene").size(24.0).color(Color32::GRAY));
                ui.label(
                    RichText::new("Fix the settings and press \"Rebuild scene\"")
                        .color(Color32::GRAY),
                );
            });
            return;
        };

        let available = ui.available_size();
        let image_aspect = self.renderer.width() as f32 / self.renderer.height() as f32;
        let (width, height) = if available.x / available.y > image_aspect {
            (available.y * image_aspect, available.y)
        } else {
            (available.x, available.x / image_aspect)
        };

        let response = ui
            .vertical_centered(|ui| {
                ui.add(
                    egui::Image::new(texture)
                        .fit_to_exact_size(Vec2::new(width, height))
                        .sense(egui::Sense::click_and_drag()),
                )
            })
            .inner;

        self.handle_view_interaction(&response);
    }
}

impl eframe::App for FractalApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show_error_dialog_ui(ctx);

        let now = Instant::now();
        let dt = self
            .last_frame_time
            .map_or(Duration::ZERO, |last| now - last);
        self.last_frame_time = Some(now);
        if !dt.is_zero() {
            self.update_fps_stats(dt);
        }
        let dt = dt.as_secs_f32().min(0.1);

        self.handle_keyboard(ctx, dt);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Fractalizer");
                ui.separator();
                ui.label(&self.status_message);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let (fps_text, fps_color) = self.get_fps_display();
                    ui.label(RichText::new(&fps_text).color(fps_color));
                    ui.separator();
                    ui.label("Click: fractalize  Right click: reset  Esc: quit");
                });
            });
        });

        egui::SidePanel::left("left_panel")
            .min_width(320.0)
            .resizable(false)
            .show(ctx, |ui| {
                self.draw_side_panel(ctx, ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_view(ui);
        });

        if let Some(scene) = &mut self.scene {
            scene.update(dt);
        }
        self.render_frame(ctx);

        ctx.request_repaint();
    }
}

/// 打开窗口并运行帧循环，直到窗口关闭
pub fn start_gui(settings: RenderSettings) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Fractalizer",
        options,
        Box::new(|cc| Ok(Box::new(FractalApp::new(settings, cc)))),
    )
}
