use nalgebra::Vector3;

/// 表示 RGB 颜色，分量范围 [0.0, 1.0]
pub type Color = Vector3<f32>;

/// 应用 gamma 校正，将线性 RGB 转换到 sRGB 空间
pub fn apply_gamma_correction(linear_color: &Color) -> Color {
    let inv_gamma = 1.0 / 2.2;
    Color::new(
        linear_color.x.max(0.0).powf(inv_gamma),
        linear_color.y.max(0.0).powf(inv_gamma),
        linear_color.z.max(0.0).powf(inv_gamma),
    )
}

/// 将线性颜色转换为可显示的字节，可选 gamma 校正
pub fn linear_rgb_to_u8(linear_color: &Color, apply_gamma: bool) -> [u8; 3] {
    let display_color = if apply_gamma {
        apply_gamma_correction(linear_color)
    } else {
        *linear_color
    };

    [
        (display_color.x * 255.0).clamp(0.0, 255.0) as u8,
        (display_color.y * 255.0).clamp(0.0, 255.0) as u8,
        (display_color.z * 255.0).clamp(0.0, 255.0) as u8,
    ]
}

/// 将 HSV 转换为 RGB，`hue` 在 [0, 1) 内回绕
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Color {
    let h = hue.rem_euclid(1.0) * 6.0;
    let sector = h.floor() as i32;
    let f = h - h.floor();
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * f);
    let t = value * (1.0 - saturation * (1.0 - f));

    match sector {
        0 => Color::new(value, t, p),
        1 => Color::new(q, value, p),
        2 => Color::new(p, value, t),
        3 => Color::new(p, q, value),
        4 => Color::new(t, p, value),
        _ => Color::new(value, p, q),
    }
}

/// 将归一化深度图（0.0-1.0）转换为 JET 伪彩色 RGB 图像
///
/// 无效深度值（NaN、无穷大）输出黑色像素
pub fn apply_colormap_jet(normalized_depth: &[f32], width: usize, height: usize) -> Vec<u8> {
    let num_pixels = width * height;
    let mut result = vec![0u8; num_pixels * 3];

    for (index, &depth) in normalized_depth.iter().take(num_pixels).enumerate() {
        if !depth.is_finite() {
            continue;
        }
        let value = depth.clamp(0.0, 1.0);

        let mut r = 0.0;
        let g;
        let mut b = 0.0;

        if value <= 0.25 {
            // 蓝到青
            b = 1.0;
            g = value * 4.0;
        } else if value <= 0.5 {
            // 青到绿
            g = 1.0;
            b = 1.0 - (value - 0.25) * 4.0;
        } else if value <= 0.75 {
            // 绿到黄
            g = 1.0;
            r = (value - 0.5) * 4.0;
        } else {
            // 黄到红
            r = 1.0;
            g = 1.0 - (value - 0.75) * 4.0;
        }

        let rgb = linear_rgb_to_u8(&Color::new(r, g, b), false);
        result[index * 3..index * 3 + 3].copy_from_slice(&rgb);
    }

    result
}
