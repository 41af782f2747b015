use crate::core::renderer::Renderer;
use crate::io::render_settings::RenderSettings;
use crate::utils::color_utils::apply_colormap_jet;
use image::ColorType;
use log::{debug, info, warn};
use std::path::Path;

/// 将 RGB 字节写入 PNG 文件
pub fn save_image(path: &Path, data: &[u8], width: u32, height: u32) -> Result<(), String> {
    image::save_buffer(path, data, width, height, ColorType::Rgb8)
        .map_err(|e| format!("Failed to save image to {}: {}", path.display(), e))?;
    info!("图像已保存到 {}", path.display());
    Ok(())
}

/// 按给定百分位将有限深度映射到 [0, 1]
/// 非有限深度（空像素）映射为 1
pub fn normalize_depth(depth_buffer: &[f32], min_percentile: f32, max_percentile: f32) -> Vec<f32> {
    let mut finite_depths: Vec<f32> = depth_buffer
        .iter()
        .filter(|d| d.is_finite())
        .copied()
        .collect();

    let (min_clip, max_clip) = if finite_depths.len() >= 2 {
        finite_depths.sort_unstable_by(f32::total_cmp);
        let last = finite_depths.len() - 1;
        let index = |percentile: f32| {
            ((percentile / 100.0 * last as f32).round() as usize).min(last)
        };

        let mut min_clip = finite_depths[index(min_percentile)];
        let mut max_clip = finite_depths[index(max_percentile)];

        if (max_clip - min_clip).abs() < 1e-6 {
            min_clip = finite_depths[0];
            max_clip = finite_depths[last];
            if (max_clip - min_clip).abs() < 1e-6 {
                max_clip = min_clip + 1.0;
            }
        }
        debug!(
            "深度归一化区间 [{:.1}%, {:.1}%] -> [{:.3}, {:.3}]",
            min_percentile, max_percentile, min_clip, max_clip
        );
        (min_clip, max_clip)
    } else {
        warn!("有效深度值过少，使用范围 [0.1, 10.0]");
        (0.1, 10.0)
    };

    let inv_range = 1.0 / (max_clip - min_clip);

    depth_buffer
        .iter()
        .map(|&depth| {
            if depth.is_finite() {
                ((depth.clamp(min_clip, max_clip) - min_clip) * inv_range).clamp(0.0, 1.0)
            } else {
                1.0
            }
        })
        .collect()
}

/// 写出 `<output_dir>/<output_name>_color.png`，提供深度数据时
/// 同时写出 JET 伪彩色的 `<output_name>_depth.png`（近处为暖色）
pub fn save_render_result(
    color_data: &[u8],
    depth_data: Option<&[f32]>,
    width: usize,
    height: usize,
    output_dir: &str,
    output_name: &str,
) -> Result<(), String> {
    let color_path = Path::new(output_dir).join(format!("{}_color.png", output_name));
    save_image(&color_path, color_data, width as u32, height as u32)?;

    if let Some(depth_data) = depth_data {
        let inverted: Vec<f32> = normalize_depth(depth_data, 1.0, 99.0)
            .iter()
            .map(|&d| 1.0 - d)
            .collect();
        let depth_colored = apply_colormap_jet(&inverted, width, height);

        let depth_path = Path::new(output_dir).join(format!("{}_depth.png", output_name));
        save_image(&depth_path, &depth_colored, width as u32, height as u32)?;
    }

    Ok(())
}

/// 保存渲染器当前帧，`output_name` 覆盖 `settings.output`
pub fn save_render_with_settings(
    renderer: &Renderer,
    settings: &RenderSettings,
    output_name: Option<&str>,
) -> Result<(), String> {
    let color_data = renderer.frame_buffer.get_color_buffer_bytes();
    let depth_data = if settings.save_depth && settings.use_zbuffer {
        Some(renderer.frame_buffer.get_depth_buffer_f32())
    } else {
        None
    };

    save_render_result(
        &color_data,
        depth_data.as_deref(),
        renderer.width(),
        renderer.height(),
        &settings.output_dir,
        output_name.unwrap_or(&settings.output),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_depth_maps_empty_pixels_far() {
        let depth = [1.0, 2.0, 3.0, f32::INFINITY];
        let normalized = normalize_depth(&depth, 0.0, 100.0);
        assert_eq!(normalized, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_normalize_depth_constant_and_empty() {
        let normalized = normalize_depth(&[2.0, 2.0], 1.0, 99.0);
        assert_eq!(normalized, vec![0.0, 0.0]);

        let normalized = normalize_depth(&[f32::INFINITY], 1.0, 99.0);
        assert_eq!(normalized, vec![1.0]);
    }

    #[test]
    fn test_save_render_result_writes_files() {
        let dir = std::env::temp_dir().join(format!("fractalizer_save_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let dir_str = dir.to_str().unwrap();

        let color = vec![128u8; 2 * 2 * 3];
        let depth = [1.0, 2.0, f32::INFINITY, 1.5];
        save_render_result(&color, Some(&depth), 2, 2, dir_str, "frame").unwrap();

        assert!(dir.join("frame_color.png").exists());
        assert!(dir.join("frame_depth.png").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
