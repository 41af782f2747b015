use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3, Vector4};

/// 变换矩阵工厂，提供相机和场景物体使用的变换矩阵
pub struct TransformFactory;
impl TransformFactory {
    /// 创建绕任意轴旋转的变换矩阵
    pub fn rotation(axis: &Vector3<f32>, angle_rad: f32) -> Matrix4<f32> {
        let axis_unit = Unit::new_normalize(*axis);
        Matrix4::from(Rotation3::from_axis_angle(&axis_unit, angle_rad))
    }

    /// 由欧拉角（弧度）创建旋转矩阵，依次绕 x、y、z 轴
    pub fn rotation_euler(angles_rad: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::from_euler_angles(angles_rad.x, angles_rad.y, angles_rad.z)
    }

    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(translation)
    }

    pub fn scaling(scale: f32) -> Matrix4<f32> {
        Matrix4::new_scaling(scale)
    }

    /// 创建视图矩阵 (lookAt)
    pub fn view(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::look_at_rh(eye, target, &Unit::new_normalize(*up))
    }

    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(aspect_ratio, fov_y_rad, near, far)
    }

    pub fn orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Matrix4<f32> {
        Matrix4::new_orthographic(left, right, bottom, top, near, far)
    }

    /// 物体到世界的矩阵：`orbit * translation * rotation * scale`
    ///
    /// 环绕旋转最后应用，平移后的物体绕世界原点转动
    pub fn model(
        orbit: &Matrix4<f32>,
        translation: &Vector3<f32>,
        rotation: &Matrix4<f32>,
        scale: f32,
    ) -> Matrix4<f32> {
        orbit * Self::translation(translation) * rotation * Self::scaling(scale)
    }
}

/// 用仿射矩阵变换点（模型或视图空间）
pub fn transform_points(points: &[Point3<f32>], matrix: &Matrix4<f32>) -> Vec<Point3<f32>> {
    points.iter().map(|p| matrix.transform_point(p)).collect()
}

/// 将点转换为裁剪空间齐次坐标
pub fn to_clip(points: &[Point3<f32>], matrix: &Matrix4<f32>) -> Vec<Vector4<f32>> {
    points.iter().map(|p| matrix * p.to_homogeneous()).collect()
}

/// 透视除法
pub fn clip_to_ndc(clip_coords: &[Vector4<f32>]) -> Vec<Point3<f32>> {
    clip_coords
        .iter()
        .map(|clip| {
            let w = clip.w;
            if w.abs() > 1e-8 {
                Point3::new(clip.x / w, clip.y / w, clip.z / w)
            } else {
                Point3::origin()
            }
        })
        .collect()
}

/// 将 NDC 坐标转换为屏幕像素坐标
pub fn ndc_to_pixel(ndc_coords: &[Point3<f32>], width: f32, height: f32) -> Vec<Point3<f32>> {
    ndc_coords
        .iter()
        .map(|ndc| {
            let screen_x = (ndc.x + 1.0) * 0.5 * width;
            let screen_y = (1.0 - (ndc.y + 1.0) * 0.5) * height;
            Point3::new(screen_x, screen_y, ndc.z)
        })
        .collect()
}

/// 将视图空间的点直接转换为像素坐标
pub fn view_to_pixel(
    view_points: &[Point3<f32>],
    projection_matrix: &Matrix4<f32>,
    width: f32,
    height: f32,
) -> Vec<Point3<f32>> {
    let clip = to_clip(view_points, projection_matrix);
    ndc_to_pixel(&clip_to_ndc(&clip), width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_model_applies_scale_rotation_translation_then_orbit() {
        let orbit = TransformFactory::rotation(&Vector3::y(), FRAC_PI_2);
        let rotation = Matrix4::identity();
        let model = TransformFactory::model(&orbit, &Vector3::new(1.0, 0.0, 0.0), &rotation, 0.5);

        // (2,0,0) 缩放为 (1,0,0)，平移到 (2,0,0)，环绕后到 (0,0,-2)
        let p = model.transform_point(&Point3::new(2.0, 0.0, 0.0));
        assert!((p - Point3::new(0.0, 0.0, -2.0)).norm() < 1e-5);
    }

    #[test]
    fn test_ndc_to_pixel_flips_y() {
        let pixels = ndc_to_pixel(
            &[Point3::new(-1.0, 1.0, 0.0), Point3::new(1.0, -1.0, 0.0)],
            200.0,
            100.0,
        );
        assert_eq!(pixels[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(pixels[1], Point3::new(200.0, 100.0, 0.0));
    }

    #[test]
    fn test_view_to_pixel_centres_the_axis() {
        let projection = TransformFactory::perspective(1.0, FRAC_PI_2, 0.1, 10.0);
        let pixels = view_to_pixel(&[Point3::new(0.0, 0.0, -2.0)], &projection, 64.0, 64.0);
        assert!((pixels[0].x - 32.0).abs() < 1e-4);
        assert!((pixels[0].y - 32.0).abs() < 1e-4);
    }
}
