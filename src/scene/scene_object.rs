use crate::fractal::palette::{ColorStyle, vertex_colors};
use crate::fractal::{Fractal, TriangleBuffers};
use crate::geometry::transform::TransformFactory;
use log::debug;
use nalgebra::{Matrix4, Vector3};

/// 场景中的一个分形物体，带有自己的变换、绘制开关和颜色
///
/// 形状或颜色变化时重建展平缓冲区，单纯的变换不会触发重建
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    fractal: Fractal,
    buffers: TriangleBuffers,

    /// 平移停止时物体回到的位置
    pub default_position: Vector3<f32>,
    pub position: Vector3<f32>,
    /// 欧拉角（弧度）
    pub rotation: Vector3<f32>,
    pub scale: f32,
    /// 绕世界原点的旋转，最后应用
    pub orbit: Matrix4<f32>,

    pub render_faces: bool,
    pub render_wireframe: bool,

    pub palette_index: usize,
    pub color_style: ColorStyle,
    pub random_colors: bool,
    /// 每次重置时加到场景种子上
    pub seed_offset: u64,
    color_time: f32,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, fractal: Fractal) -> Self {
        let mut object = Self {
            name: name.into(),
            fractal,
            buffers: TriangleBuffers::default(),
            default_position: Vector3::zeros(),
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: 1.0,
            orbit: Matrix4::identity(),
            render_faces: true,
            render_wireframe: false,
            palette_index: 0,
            color_style: ColorStyle::Palette,
            random_colors: false,
            seed_offset: 0,
            color_time: 0.0,
        };
        object.rebuild_buffers();
        object
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.default_position = position;
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, euler_angles_rad: Vector3<f32>) -> Self {
        self.rotation = euler_angles_rad;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_colors(mut self, palette_index: usize, style: ColorStyle, random: bool) -> Self {
        self.palette_index = palette_index;
        self.color_style = style;
        self.random_colors = random;
        self.refresh_colors();
        self
    }

    pub fn with_render_modes(mut self, faces: bool, wireframe: bool) -> Self {
        self.render_faces = faces;
        self.render_wireframe = wireframe;
        self
    }

    pub fn with_seed_offset(mut self, seed_offset: u64) -> Self {
        self.seed_offset = seed_offset;
        self
    }

    pub fn fractal(&self) -> &Fractal {
        &self.fractal
    }

    pub fn buffers(&self) -> &TriangleBuffers {
        &self.buffers
    }

    /// `orbit * translation * rotation * scale`
    pub fn model_matrix(&self) -> Matrix4<f32> {
        TransformFactory::model(
            &self.orbit,
            &self.position,
            &TransformFactory::rotation_euler(&self.rotation),
            self.scale,
        )
    }

    pub fn fractalize(&mut self) -> bool {
        let changed = self.fractal.fractalize();
        if changed {
            self.rebuild_buffers();
        }
        changed
    }

    pub fn reset(&mut self, seed: u64) {
        self.fractal.reset(seed);
        self.rebuild_buffers();
    }

    pub fn set_palette(&mut self, palette_index: usize) {
        if self.palette_index != palette_index {
            self.palette_index = palette_index;
            self.refresh_colors();
        }
    }

    pub fn toggle_wireframe(&mut self) {
        self.render_wireframe = !self.render_wireframe;
    }

    pub fn toggle_faces(&mut self) {
        self.render_faces = !self.render_faces;
    }

    pub fn translate(&mut self, delta: &Vector3<f32>) {
        self.position += delta;
    }

    pub fn reset_position(&mut self) {
        self.position = self.default_position;
    }

    pub fn set_orbit(&mut self, angle_rad: f32, axis: &Vector3<f32>) {
        self.orbit = if angle_rad == 0.0 {
            Matrix4::identity()
        } else {
            TransformFactory::rotation(axis, angle_rad)
        };
    }

    /// 推进随时间变化的颜色
    pub fn update_colors(&mut self, time: f32) {
        if self.color_style.is_animated() {
            self.color_time = time;
            self.refresh_colors();
        }
    }

    fn color_seed(&self) -> u64 {
        self.fractal.seed().wrapping_add(self.seed_offset)
    }

    fn refresh_colors(&mut self) {
        self.buffers.colors = vertex_colors(
            &self.buffers.positions,
            self.palette_index,
            self.color_style,
            self.random_colors,
            self.color_seed(),
            self.color_time,
        );
    }

    /// 重新展平分形，相当于重新上传 GPU 缓冲区
    pub fn rebuild_buffers(&mut self) {
        let colors = vertex_colors(
            self.fractal.vertices(),
            self.palette_index,
            self.color_style,
            self.random_colors,
            self.color_seed(),
            self.color_time,
        );
        self.buffers = self.fractal.build_buffers(colors);
        debug!(
            "{}: 重建缓冲区，{} 个顶点，{} 个三角形",
            self.name,
            self.buffers.positions.len(),
            self.buffers.triangle_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractal::{FractalKind, FractalParams};
    use nalgebra::Point3;
    use std::f32::consts::PI;

    fn object(kind: FractalKind) -> SceneObject {
        let params = FractalParams {
            kind,
            ..FractalParams::default()
        };
        SceneObject::new("test", Fractal::new(&params, 4))
    }

    #[test]
    fn test_buffers_follow_fractalize_and_reset() {
        let mut object = object(FractalKind::Mesh);
        assert_eq!(object.buffers().triangle_count(), 1);

        assert!(object.fractalize());
        assert_eq!(object.buffers().triangle_count(), 4);
        assert_eq!(object.buffers().positions.len(), 6);
        assert_eq!(object.buffers().colors.len(), 6);

        object.reset(4);
        assert_eq!(object.buffers().triangle_count(), 1);
        assert_eq!(object.buffers().colors.len(), 3);
    }

    #[test]
    fn test_model_matrix_order() {
        let mut object = object(FractalKind::Sponge)
            .with_position(Vector3::new(1.0, 0.0, 0.0))
            .with_scale(0.5);
        object.set_orbit(PI, &Vector3::y());

        // 顶点 6 为 (0.5, 0.5, 0.5)：缩放后平移到 x = 1.25，再绕原点旋转半圈
        let p = object
            .model_matrix()
            .transform_point(&object.buffers().positions[6]);
        assert!((p - Point3::new(-1.25, 0.25, -0.25)).norm() < 1e-5);
    }

    #[test]
    fn test_translation_and_reset_position() {
        let mut object = object(FractalKind::Pyramid).with_position(Vector3::new(0.0, 1.0, 0.0));
        object.translate(&Vector3::new(0.5, 0.0, 0.0));
        assert_eq!(object.position, Vector3::new(0.5, 1.0, 0.0));
        object.reset_position();
        assert_eq!(object.position, Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_palette_switch_recolors_without_touching_geometry() {
        let mut object = object(FractalKind::Mesh).with_colors(0, ColorStyle::Palette, false);
        object.fractalize();
        let positions = object.buffers().positions.clone();
        let before = object.buffers().colors[0];

        object.set_palette(3);
        assert_eq!(object.buffers().positions, positions);
        assert_ne!(object.buffers().colors[0], before);
        assert_eq!(object.buffers().colors[0], Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_toggles() {
        let mut object = object(FractalKind::Mesh);
        object.toggle_wireframe();
        object.toggle_faces();
        assert!(object.render_wireframe);
        assert!(!object.render_faces);
    }
}
