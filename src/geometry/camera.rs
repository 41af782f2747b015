use crate::geometry::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};
use std::f32::consts::FRAC_PI_2;

/// 俯仰角与正上方或正下方保持的最小距离
const PITCH_MARGIN: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionType {
    #[default]
    Perspective,
    Orthographic,
}

impl ProjectionType {
    pub fn from_str_name(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "perspective" => Ok(ProjectionType::Perspective),
            "orthographic" => Ok(ProjectionType::Orthographic),
            other => Err(format!(
                "Unknown projection '{}', expected perspective or orthographic",
                other
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionType::Perspective => "perspective",
            ProjectionType::Orthographic => "orthographic",
        }
    }
}

/// 可通过键盘切换的相机预设视角
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraView {
    #[default]
    Free,
    Front,
    Top,
    Side,
}

impl CameraView {
    pub fn next(self) -> Self {
        match self {
            CameraView::Free => CameraView::Front,
            CameraView::Front => CameraView::Top,
            CameraView::Top => CameraView::Side,
            CameraView::Side => CameraView::Free,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraView::Free => "Free",
            CameraView::Front => "Front",
            CameraView::Top => "Top",
            CameraView::Side => "Side",
        }
    }
}

/// 单帧内按住的移动键，每个轴取值 [-1, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementInput {
    /// W = +1, S = -1
    pub forward: f32,
    /// D = +1, A = -1
    pub right: f32,
    /// Space = +1, Shift = -1
    pub up: f32,
}

impl MovementInput {
    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.right == 0.0 && self.up == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pose {
    position: Point3<f32>,
    yaw: f32,
    pitch: f32,
}

/// 第一人称相机
///
/// 视线方向由两个角度决定：绕世界 y 轴的 `yaw`（0 时看向 +z）和地平线以上的 `pitch`
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    /// 水平角（弧度）
    pub yaw: f32,
    /// 垂直角（弧度）
    pub pitch: f32,
    /// 每秒单位数
    pub speed: f32,
    /// 鼠标拖动每像素对应的弧度
    pub sensitivity: f32,
    pub fov_y_degrees: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    pub projection: ProjectionType,
    /// 正交视景体的可见高度
    pub ortho_height: f32,
    view: CameraView,
    home: Pose,
    free_pose: Option<Pose>,
}

impl Camera {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position: Point3<f32>,
        yaw: f32,
        pitch: f32,
        fov_y_degrees: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
        speed: f32,
        sensitivity: f32,
    ) -> Self {
        let pitch = Self::clamp_pitch(pitch);
        Camera {
            position,
            yaw,
            pitch,
            speed,
            sensitivity,
            fov_y_degrees,
            aspect_ratio,
            near,
            far,
            projection: ProjectionType::Perspective,
            ortho_height: 4.0,
            view: CameraView::Free,
            home: Pose {
                position,
                yaw,
                pitch,
            },
            free_pose: None,
        }
    }

    fn clamp_pitch(pitch: f32) -> f32 {
        pitch.clamp(-FRAC_PI_2 + PITCH_MARGIN, FRAC_PI_2 - PITCH_MARGIN)
    }

    pub fn direction(&self) -> Vector3<f32> {
        Vector3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        )
    }

    /// 水平向右向量，与俯仰角无关
    pub fn right(&self) -> Vector3<f32> {
        let angle = self.yaw - FRAC_PI_2;
        Vector3::new(angle.sin(), 0.0, angle.cos())
    }

    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(&self.direction())
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let target = self.position + self.direction();
        TransformFactory::view(&self.position, &target, &self.up())
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.projection {
            ProjectionType::Perspective => TransformFactory::perspective(
                self.aspect_ratio,
                self.fov_y_degrees.to_radians(),
                self.near,
                self.far,
            ),
            ProjectionType::Orthographic => {
                let half_height = self.ortho_height * 0.5;
                let half_width = half_height * self.aspect_ratio;
                TransformFactory::orthographic(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    pub fn is_perspective(&self) -> bool {
        self.projection == ProjectionType::Perspective
    }

    pub fn view(&self) -> CameraView {
        self.view
    }

    /// 鼠标环视：向右拖动向右转，向上拖动抬头
    pub fn look(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw -= delta_x * self.sensitivity;
        self.pitch = Self::clamp_pitch(self.pitch - delta_y * self.sensitivity);
        self.view = CameraView::Free;
    }

    /// 按住的每个轴沿 direction/right/up 移动 `speed * dt`
    pub fn move_by(&mut self, input: &MovementInput, dt: f32) {
        if input.is_idle() {
            return;
        }
        let step = self.speed * dt;
        self.position += self.direction() * (input.forward * step)
            + self.right() * (input.right * step)
            + self.up() * (input.up * step);
        self.view = CameraView::Free;
    }

    /// 依次切换 Free、Front、Top、Side 视角，预设视角从 `distance` 处看向 `target`
    /// 回到 Free 时恢复用户离开时的位姿
    pub fn cycle_view(&mut self, target: &Point3<f32>, distance: f32) -> CameraView {
        let next = self.view.next();
        if self.view == CameraView::Free {
            self.free_pose = Some(self.pose());
        }

        let pose = match next {
            CameraView::Free => self.free_pose.take().unwrap_or(self.home),
            CameraView::Front => Pose {
                position: target - Vector3::z() * distance,
                yaw: 0.0,
                pitch: 0.0,
            },
            CameraView::Top => Pose {
                position: target + Vector3::y() * distance,
                yaw: 0.0,
                pitch: -FRAC_PI_2,
            },
            CameraView::Side => Pose {
                position: target + Vector3::x() * distance,
                yaw: -FRAC_PI_2,
                pitch: 0.0,
            },
        };
        self.set_pose(pose);
        self.view = next;
        next
    }

    pub fn toggle_projection(&mut self) -> ProjectionType {
        self.projection = match self.projection {
            ProjectionType::Perspective => ProjectionType::Orthographic,
            ProjectionType::Orthographic => ProjectionType::Perspective,
        };
        self.projection
    }

    /// 恢复相机创建时的位姿
    pub fn reset_pose(&mut self) {
        self.set_pose(self.home);
        self.free_pose = None;
        self.view = CameraView::Free;
    }

    fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }

    fn set_pose(&mut self, pose: Pose) {
        self.position = pose.position;
        self.yaw = pose.yaw;
        self.pitch = Self::clamp_pitch(pose.pitch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(
            Point3::new(0.0, 0.0, -1.0),
            0.0,
            0.0,
            55.0,
            1.0,
            0.01,
            100.0,
            1.0,
            0.005,
        )
    }

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn test_basis_at_zero_angles() {
        let camera = camera();
        assert!(close(camera.direction(), Vector3::new(0.0, 0.0, 1.0)));
        assert!(close(camera.right(), Vector3::new(-1.0, 0.0, 0.0)));
        assert!(close(camera.up(), Vector3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_origin_is_in_front_of_camera() {
        let camera = camera();
        let p = camera.view_matrix().transform_point(&Point3::origin());
        assert!((p - Point3::new(0.0, 0.0, -1.0)).norm() < 1e-5);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = camera();
        camera.look(0.0, -1.0e6);
        assert!(camera.pitch < FRAC_PI_2);
        assert!(camera.direction().y > 0.99);
        assert!(camera.up().norm() > 0.0);
    }

    #[test]
    fn test_drag_right_turns_right() {
        let mut camera = camera();
        let right = camera.right();
        camera.look(100.0, 0.0);
        assert!(camera.direction().dot(&right) > 0.0);
    }

    #[test]
    fn test_movement_scales_with_speed_and_dt() {
        let mut camera = camera();
        camera.speed = 2.0;
        let input = MovementInput {
            forward: 1.0,
            right: 0.0,
            up: 1.0,
        };
        camera.move_by(&input, 0.5);
        assert!((camera.position - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_cycle_views_and_restore_free_pose() {
        let mut camera = camera();
        camera.look(30.0, 10.0);
        let (yaw, pitch) = (camera.yaw, camera.pitch);
        let target = Point3::origin();

        assert_eq!(camera.cycle_view(&target, 3.0), CameraView::Front);
        assert!((camera.position - Point3::new(0.0, 0.0, -3.0)).norm() < 1e-5);

        assert_eq!(camera.cycle_view(&target, 3.0), CameraView::Top);
        assert!(camera.direction().y < -0.99);

        assert_eq!(camera.cycle_view(&target, 3.0), CameraView::Side);
        assert!(close(camera.direction(), Vector3::new(-1.0, 0.0, 0.0)));

        assert_eq!(camera.cycle_view(&target, 3.0), CameraView::Free);
        assert_eq!((camera.yaw, camera.pitch), (yaw, pitch));
        assert_eq!(camera.position, Point3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_toggle_projection() {
        let mut camera = camera();
        assert_eq!(camera.toggle_projection(), ProjectionType::Orthographic);
        assert!(!camera.is_perspective());
        let view_projection = camera.projection_matrix() * camera.view_matrix();
        let p = view_projection.transform_point(&Point3::new(0.0, 2.0, 1.0));
        assert!((p.y - 1.0).abs() < 1e-5);
        assert_eq!(camera.toggle_projection(), ProjectionType::Perspective);
    }
}
