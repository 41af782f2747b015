use crate::fractal::palette::ColorStyle;
use crate::fractal::{Fractal, FractalKind};
use crate::geometry::camera::{Camera, CameraView, MovementInput, ProjectionType};
use crate::io::render_settings::RenderSettings;
use crate::scene::scene_object::SceneObject;
use log::{info, warn};
use nalgebra::{Point3, Vector3};

/// 相邻两次重置之间的种子间隔
const RESET_SEED_STRIDE: u64 = 1_000_003;

/// 用户可通过键盘或鼠标触发的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Fractalize,
    Reset,
    SelectPalette(usize),
    ToggleWireframe,
    ToggleFaces,
    ToggleTranslation,
    ToggleRotation,
    CycleCameraView,
    ToggleProjection,
}

/// 逐帧物体动画
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    pub translate: bool,
    pub rotate: bool,
    /// 每秒单位数
    pub translation_velocity: Vector3<f32>,
    pub rotation_axis: Vector3<f32>,
    /// 每秒弧度
    pub rotation_speed: f32,
    pub current_rotation: f32,
}

/// 应用状态：物体网格、相机和动画开关
#[derive(Debug, Clone)]
pub struct Scene {
    objects: Vec<SceneObject>,
    pub camera: Camera,
    pub animation: AnimationState,
    base_seed: u64,
    reset_generation: u64,
    center: Point3<f32>,
    view_distance: f32,
    time: f32,
}

impl Scene {
    /// 按 `settings` 构建 `grid_size`^3 的物体网格
    pub fn from_settings(settings: &RenderSettings) -> Result<Self, String> {
        settings.validate()?;

        let params = settings.get_fractal_params()?;
        let default_style = settings.get_color_style()?;
        let n = settings.grid_size;
        let spacing = settings.spacing;
        let rotation = settings.get_object_rotation_rad()?;

        let mut objects = Vec::with_capacity(n * n * n);
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    let seed_offset = (i + 10 * j + 100 * k) as u64;
                    let (style, random_colors) = if settings.alternate_styles {
                        let style = if i % 2 == 0 {
                            ColorStyle::Palette
                        } else {
                            ColorStyle::Rainbow
                        };
                        (style, j % 2 == 1)
                    } else {
                        (default_style, settings.random_colors)
                    };

                    let fractal = Fractal::new(&params, settings.seed.wrapping_add(seed_offset));
                    let position =
                        Vector3::new(i as f32, j as f32, k as f32) * spacing;
                    let object = SceneObject::new(
                        format!("{}[{},{},{}]", params.kind.as_str(), i, j, k),
                        fractal,
                    )
                    .with_position(position)
                    .with_rotation(rotation)
                    .with_scale(settings.object_scale)
                    .with_seed_offset(seed_offset)
                    .with_render_modes(settings.render_faces, settings.render_wireframe)
                    .with_colors(settings.palette, style, random_colors);
                    objects.push(object);
                }
            }
        }

        let half_extent = spacing * (n.saturating_sub(1)) as f32 * 0.5;
        let center = Point3::new(half_extent, half_extent, half_extent);
        let view_distance = (half_extent + settings.object_scale) * 2.0 + 1.0;

        let mut camera = Camera::new(
            settings.get_camera_position()?,
            settings.camera_yaw.to_radians(),
            settings.camera_pitch.to_radians(),
            settings.camera_fov,
            settings.width as f32 / settings.height as f32,
            settings.camera_near,
            settings.camera_far,
            settings.camera_speed,
            settings.mouse_sensitivity,
        );
        camera.projection = settings.get_projection_type()?;

        let animation = AnimationState {
            translate: settings.translate,
            rotate: settings.rotate,
            translation_velocity: settings.get_translation_velocity()?,
            rotation_axis: settings.get_rotation_axis(),
            rotation_speed: settings.rotation_speed,
            current_rotation: 0.0,
        };

        info!(
            "场景就绪: {} 个 {}，种子 {}，最大深度 {}",
            objects.len(),
            params.kind.as_str(),
            settings.seed,
            params.max_depth
        );

        Ok(Self {
            objects,
            camera,
            animation,
            base_seed: settings.seed,
            reset_generation: 0,
            center,
            view_distance,
            time: 0.0,
        })
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn kind(&self) -> Option<FractalKind> {
        self.objects.first().map(|o| o.fractal().kind())
    }

    /// 第一个物体的深度，所有物体同步细分
    pub fn depth(&self) -> usize {
        self.objects.first().map_or(0, |o| o.fractal().depth())
    }

    pub fn max_depth(&self) -> usize {
        self.objects.first().map_or(0, |o| o.fractal().max_depth())
    }

    pub fn primitive_count(&self) -> usize {
        self.objects.iter().map(|o| o.fractal().primitive_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.objects.iter().map(|o| o.buffers().triangle_count()).sum()
    }

    pub fn center(&self) -> Point3<f32> {
        self.center
    }

    /// 应用一个输入操作
    pub fn apply(&mut self, action: InputAction) {
        match action {
            InputAction::Fractalize => {
                self.fractalize_all();
            }
            InputAction::Reset => self.reset_all(),
            InputAction::SelectPalette(index) => {
                for object in &mut self.objects {
                    object.set_palette(index);
                }
                info!("已选择调色板 {}", index);
            }
            InputAction::ToggleWireframe => {
                for object in &mut self.objects {
                    object.toggle_wireframe();
                }
            }
            InputAction::ToggleFaces => {
                for object in &mut self.objects {
                    object.toggle_faces();
                }
            }
            InputAction::ToggleTranslation => {
                self.animation.translate = !self.animation.translate;
                info!("平移动画: {}", on_off(self.animation.translate));
            }
            InputAction::ToggleRotation => {
                self.animation.rotate = !self.animation.rotate;
                info!("环绕动画: {}", on_off(self.animation.rotate));
            }
            InputAction::CycleCameraView => {
                let view = self.camera.cycle_view(&self.center, self.view_distance);
                info!("相机视角: {}", view.as_str());
            }
            InputAction::ToggleProjection => {
                let projection = self.camera.toggle_projection();
                info!("投影方式: {}", projection.as_str());
            }
        }
    }

    /// 细分所有物体，返回发生变化的数量
    pub fn fractalize_all(&mut self) -> usize {
        let changed = self
            .objects
            .iter_mut()
            .map(|o| o.fractalize())
            .filter(|&c| c)
            .count();
        if changed == 0 {
            warn!("所有物体都已达到最大深度 {}", self.max_depth());
        } else {
            info!(
                "细分到深度 {}: {} 个图元，{} 个三角形",
                self.depth(),
                self.primitive_count(),
                self.triangle_count()
            );
        }
        changed
    }

    /// 重置所有物体，每次重置生成新形状
    /// 使用的种子会写入日志，可通过配置复现
    pub fn reset_all(&mut self) {
        self.reset_generation += 1;
        let generation_seed = self
            .base_seed
            .wrapping_add(self.reset_generation.wrapping_mul(RESET_SEED_STRIDE));
        for object in &mut self.objects {
            object.reset(generation_seed.wrapping_add(object.seed_offset));
        }
        info!(
            "已重置 {} 个物体，种子 {}（第 {} 代）",
            self.objects.len(),
            generation_seed,
            self.reset_generation
        );
    }

    /// 将动画和随时间变化的颜色推进 `dt` 秒
    pub fn update(&mut self, dt: f32) {
        self.time += dt;

        if self.animation.rotate {
            self.animation.current_rotation += self.animation.rotation_speed * dt;
        } else {
            self.animation.current_rotation = 0.0;
        }

        let step = self.animation.translation_velocity * dt;
        for object in &mut self.objects {
            if self.animation.translate {
                object.translate(&step);
            } else {
                object.reset_position();
            }
            object.set_orbit(self.animation.current_rotation, &self.animation.rotation_axis);
            object.update_colors(self.time);
        }
    }

    pub fn move_camera(&mut self, input: &MovementInput, dt: f32) {
        self.camera.move_by(input, dt);
    }

    pub fn look(&mut self, delta_x: f32, delta_y: f32) {
        self.camera.look(delta_x, delta_y);
    }

    pub fn camera_view(&self) -> CameraView {
        self.camera.view()
    }

    pub fn projection(&self) -> ProjectionType {
        self.camera.projection
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config_loader::TomlConfigLoader;

    fn settings() -> RenderSettings {
        RenderSettings {
            max_depth: 3,
            ..RenderSettings::default()
        }
    }

    #[test]
    fn test_default_grid_matches_two_cubed() {
        let scene = Scene::from_settings(&settings()).unwrap();
        assert_eq!(scene.objects().len(), 8);
        assert_eq!(scene.primitive_count(), 8);
        assert_eq!(scene.center(), Point3::new(0.5, 0.5, 0.5));

        let last = &scene.objects()[7];
        assert_eq!(last.default_position, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(last.seed_offset, 111);
        assert_eq!(last.color_style, ColorStyle::Rainbow);
        assert!(last.random_colors);
    }

    #[test]
    fn test_sponge_config_builds_with_default_depth() {
        let loaded =
            TomlConfigLoader::load_from_content("[fractal]\nkind = \"sponge\"\n").unwrap();
        let mut scene = Scene::from_settings(&loaded).unwrap();
        assert_eq!(scene.kind(), Some(FractalKind::Sponge));
        assert_eq!(scene.max_depth(), FractalKind::Sponge.depth_limit());

        assert_eq!(scene.fractalize_all(), 8);
        assert_eq!(scene.primitive_count(), 8 * 20);
    }

    #[test]
    fn test_fractalize_until_max_depth() {
        let mut scene = Scene::from_settings(&settings()).unwrap();
        for _ in 0..3 {
            scene.apply(InputAction::Fractalize);
        }
        assert_eq!(scene.primitive_count(), 8 * 64);
        assert_eq!(scene.fractalize_all(), 0);
        assert_eq!(scene.depth(), 3);
    }

    #[test]
    fn test_reset_draws_new_shapes() {
        let mut scene = Scene::from_settings(&settings()).unwrap();
        let before = scene.objects()[0].buffers().positions.clone();
        scene.apply(InputAction::Fractalize);
        scene.apply(InputAction::Reset);

        assert_eq!(scene.primitive_count(), 8);
        assert_eq!(scene.depth(), 0);
        assert_ne!(scene.objects()[0].buffers().positions, before);
    }

    #[test]
    fn test_same_settings_same_scene() {
        let a = Scene::from_settings(&settings()).unwrap();
        let b = Scene::from_settings(&settings()).unwrap();
        for (x, y) in a.objects().iter().zip(b.objects()) {
            assert_eq!(x.buffers().positions, y.buffers().positions);
        }
    }

    #[test]
    fn test_translation_moves_and_returns() {
        let mut scene = Scene::from_settings(&settings()).unwrap();
        scene.apply(InputAction::ToggleTranslation);
        scene.update(0.5);
        let moved = scene.objects()[0].position;
        assert!((moved - Vector3::new(0.3, 0.0, 0.0)).norm() < 1e-6);

        scene.apply(InputAction::ToggleTranslation);
        scene.update(0.5);
        assert_eq!(scene.objects()[0].position, Vector3::zeros());
    }

    #[test]
    fn test_rotation_accumulates_and_resets() {
        let mut scene = Scene::from_settings(&settings()).unwrap();
        scene.apply(InputAction::ToggleRotation);
        scene.update(1.0);
        scene.update(1.0);
        let expected = 2.0 * scene.animation.rotation_speed;
        assert!((scene.animation.current_rotation - expected).abs() < 1e-6);

        scene.apply(InputAction::ToggleRotation);
        scene.update(1.0);
        assert_eq!(scene.animation.current_rotation, 0.0);
        assert_eq!(
            scene.objects()[0].orbit,
            nalgebra::Matrix4::identity()
        );
    }

    #[test]
    fn test_render_mode_and_palette_actions() {
        let mut scene = Scene::from_settings(&settings()).unwrap();
        scene.apply(InputAction::ToggleWireframe);
        scene.apply(InputAction::ToggleFaces);
        scene.apply(InputAction::SelectPalette(2));
        for object in scene.objects() {
            assert!(object.render_wireframe);
            assert!(!object.render_faces);
            assert_eq!(object.palette_index, 2);
        }
    }

    #[test]
    fn test_camera_actions() {
        let mut scene = Scene::from_settings(&settings()).unwrap();
        scene.apply(InputAction::CycleCameraView);
        assert_eq!(scene.camera_view(), CameraView::Front);
        scene.apply(InputAction::ToggleProjection);
        assert_eq!(scene.projection(), ProjectionType::Orthographic);
    }
}
