use nalgebra::{Point2, Vector3};

const EPSILON: f32 = 1e-5;

/// 计算 `p` 在二维三角形 (v1, v2, v3) 中的重心坐标 (alpha, beta, gamma)
/// 退化三角形返回 None
pub fn barycentric_coordinates(
    p: Point2<f32>,
    v1: Point2<f32>,
    v2: Point2<f32>,
    v3: Point2<f32>,
) -> Option<Vector3<f32>> {
    let e1 = v2 - v1;
    let e2 = v3 - v1;
    let p_v1 = p - v1;

    let total_area_x2 = e1.x * e2.y - e1.y * e2.x;
    if total_area_x2.abs() < EPSILON {
        return None;
    }
    let inv_total_area_x2 = 1.0 / total_area_x2;

    let beta = (p_v1.x * e2.y - p_v1.y * e2.x) * inv_total_area_x2;
    let gamma = (e1.x * p_v1.y - e1.y * p_v1.x) * inv_total_area_x2;
    let alpha = 1.0 - beta - gamma;

    Some(Vector3::new(alpha, beta, gamma))
}

#[inline(always)]
pub fn is_inside_triangle(bary: Vector3<f32>) -> bool {
    bary.x >= -EPSILON && bary.y >= -EPSILON && bary.z >= -EPSILON
}

/// 视图空间深度的倒数，深度过于接近 0 时为 0
fn inverse_depths(z1_view: f32, z2_view: f32, z3_view: f32) -> Vector3<f32> {
    Vector3::new(z1_view, z2_view, z3_view).map(|z| if z.abs() > EPSILON { 1.0 / z } else { 0.0 })
}

/// 插值得到深度缓冲区使用的深度
///
/// 输入视图空间 z 值（相机前方为负），返回正的距离，越小越近
/// 透视投影对 1/z 插值，相机后方的点返回 `f32::INFINITY`
pub fn interpolate_depth(
    bary: Vector3<f32>,
    z1_view: f32,
    z2_view: f32,
    z3_view: f32,
    is_perspective: bool,
) -> f32 {
    if !is_inside_triangle(bary) {
        return f32::INFINITY;
    }

    let linear = bary.x * z1_view + bary.y * z2_view + bary.z * z3_view;
    let interpolated_z = if is_perspective {
        let interpolated_inv_z = bary.dot(&inverse_depths(z1_view, z2_view, z3_view));
        if interpolated_inv_z.abs() > EPSILON {
            1.0 / interpolated_inv_z
        } else {
            linear
        }
    } else {
        linear
    };

    if interpolated_z > -EPSILON {
        f32::INFINITY
    } else {
        -interpolated_z
    }
}

/// 顶点颜色的透视校正插值
pub fn interpolate_color(
    bary: Vector3<f32>,
    colors: [&Vector3<f32>; 3],
    z_views: [f32; 3],
    is_perspective: bool,
) -> Vector3<f32> {
    let linear = colors[0] * bary.x + colors[1] * bary.y + colors[2] * bary.z;
    if !is_perspective {
        return linear;
    }

    let inv_z = inverse_depths(z_views[0], z_views[1], z_views[2]);
    let weights = bary.component_mul(&inv_z);
    let weight_sum = weights.x + weights.y + weights.z;
    if weight_sum.abs() > EPSILON {
        (colors[0] * weights.x + colors[1] * weights.y + colors[2] * weights.z) / weight_sum
    } else {
        linear
    }
}

/// `p` 到线段 `a`-`b` 的距离
pub fn distance_to_segment(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let ab = b - a;
    let length_sq = ab.norm_squared();
    if length_sq < EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / length_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// `p` 是否位于三角形某条边 `line_width / 2` 像素范围内
pub fn is_on_triangle_edge(
    p: Point2<f32>,
    v0: Point2<f32>,
    v1: Point2<f32>,
    v2: Point2<f32>,
    line_width: f32,
) -> bool {
    let half_width = line_width * 0.5;
    distance_to_segment(p, v0, v1) <= half_width
        || distance_to_segment(p, v1, v2) <= half_width
        || distance_to_segment(p, v2, v0) <= half_width
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (Point2<f32>, Point2<f32>, Point2<f32>) {
        (
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        )
    }

    #[test]
    fn test_barycentric_at_corners_and_outside() {
        let (a, b, c) = triangle();
        let at_b = barycentric_coordinates(b, a, b, c).unwrap();
        assert!((at_b - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-6);

        let outside = barycentric_coordinates(Point2::new(8.0, 8.0), a, b, c).unwrap();
        assert!(!is_inside_triangle(outside));

        assert!(barycentric_coordinates(a, a, a, c).is_none());
    }

    #[test]
    fn test_depth_is_positive_and_perspective_correct() {
        let bary = Vector3::new(0.5, 0.5, 0.0);
        let linear = interpolate_depth(bary, -1.0, -3.0, -3.0, false);
        assert!((linear - 2.0).abs() < 1e-6);

        // 1 和 3 的调和平均
        let perspective = interpolate_depth(bary, -1.0, -3.0, -3.0, true);
        assert!((perspective - 1.5).abs() < 1e-6);

        assert_eq!(interpolate_depth(bary, 1.0, 1.0, 1.0, true), f32::INFINITY);
    }

    #[test]
    fn test_color_interpolation_weights_near_vertex() {
        let red = Vector3::new(1.0, 0.0, 0.0);
        let blue = Vector3::new(0.0, 0.0, 1.0);
        let bary = Vector3::new(0.5, 0.5, 0.0);

        let flat = interpolate_color(bary, [&red, &blue, &blue], [-1.0, -3.0, -3.0], false);
        assert!((flat.x - 0.5).abs() < 1e-6);

        let corrected = interpolate_color(bary, [&red, &blue, &blue], [-1.0, -3.0, -3.0], true);
        assert!((corrected.x - 0.75).abs() < 1e-6);
        assert!((corrected.z - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_edge_detection() {
        let (a, b, c) = triangle();
        assert!(is_on_triangle_edge(Point2::new(5.0, 0.3), a, b, c, 1.0));
        assert!(is_on_triangle_edge(Point2::new(5.0, 5.0), a, b, c, 1.0));
        assert!(!is_on_triangle_edge(Point2::new(2.0, 2.0), a, b, c, 1.0));
    }
}
