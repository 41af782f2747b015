use crate::utils::color_utils::{Color, hsv_to_rgb};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 调色板颜色为 `base + t * range`，`t` 取值 [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub name: &'static str,
    pub base: [f32; 3],
    pub range: [f32; 3],
}

pub const PALETTES: [Palette; 4] = [
    Palette {
        name: "Blue",
        base: [0.15, 0.15, 0.3647],
        range: [0.59, 0.60, 0.4153],
    },
    Palette {
        name: "Purple",
        base: [0.3215, 0.2470, 0.4941],
        range: [0.1216, 0.2393, 0.2627],
    },
    Palette {
        name: "Green",
        base: [0.4, 0.7, 0.3],
        range: [0.2745, 0.0431, 0.5804],
    },
    Palette {
        name: "Pure green",
        base: [0.0, 0.0, 0.0],
        range: [0.0, 1.0, 0.0],
    },
];

impl Palette {
    /// 按索引取调色板，越界索引回绕
    pub fn get(index: usize) -> &'static Palette {
        &PALETTES[index % PALETTES.len()]
    }

    pub fn sample(&self, t: f32) -> Color {
        Color::new(
            self.base[0] + t * self.range[0],
            self.base[1] + t * self.range[1],
            self.base[2] + t * self.range[2],
        )
    }
}

/// 顶点颜色的生成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorStyle {
    /// 调色板颜色，可逐顶点随机
    #[default]
    Palette,
    /// 仅按顶点高度混合调色板
    Height,
    /// 色相随高度和时间循环
    Rainbow,
}

impl ColorStyle {
    pub fn from_str_name(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "palette" => Ok(ColorStyle::Palette),
            "height" => Ok(ColorStyle::Height),
            "rainbow" => Ok(ColorStyle::Rainbow),
            other => Err(format!(
                "Unknown color style '{}', expected palette, height or rainbow",
                other
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorStyle::Palette => "palette",
            ColorStyle::Height => "height",
            ColorStyle::Rainbow => "rainbow",
        }
    }

    /// 颜色是否逐帧变化
    pub fn is_animated(&self) -> bool {
        matches!(self, ColorStyle::Rainbow)
    }
}

/// 将高度 `y` 从 [-1, 1] 映射到 [0, 1]
fn height_factor(y: f32) -> f32 {
    ((y + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// 为每个顶点生成颜色
///
/// `ColorStyle::Palette` 且开启 `random_colors` 时，每个顶点为
/// `base + r * s * range`，`r` 来自以 `seed` 为种子的随机数，`s` 为高度系数
/// 未开启 `random_colors` 时每个顶点为 `base + range`
/// 相同输入总是得到相同颜色
pub fn vertex_colors(
    vertices: &[Point3<f32>],
    palette_index: usize,
    style: ColorStyle,
    random_colors: bool,
    seed: u64,
    time: f32,
) -> Vec<Color> {
    let palette = Palette::get(palette_index);
    match style {
        ColorStyle::Palette => {
            let mut rng = StdRng::seed_from_u64(seed);
            vertices
                .iter()
                .map(|v| {
                    if random_colors {
                        let r: f32 = rng.random();
                        palette.sample(r * height_factor(v.y))
                    } else {
                        palette.sample(1.0)
                    }
                })
                .collect()
        }
        ColorStyle::Height => vertices
            .iter()
            .map(|v| palette.sample(height_factor(v.y)))
            .collect(),
        ColorStyle::Rainbow => vertices
            .iter()
            .map(|v| rainbow(v.y, time))
            .collect(),
    }
}

pub fn rainbow(y: f32, time: f32) -> Color {
    hsv_to_rgb(time * 0.1 + height_factor(y) * 0.5, 0.8, 0.95)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<Point3<f32>> {
        vec![
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_fixed_colors_are_base_plus_range() {
        let colors = vertex_colors(&points(), 0, ColorStyle::Palette, false, 1, 0.0);
        let expected = Color::new(0.74, 0.75, 0.78);
        for c in colors {
            assert!((c - expected).norm() < 1e-4);
        }
    }

    #[test]
    fn test_random_colors_are_stable_and_bounded() {
        let a = vertex_colors(&points(), 2, ColorStyle::Palette, true, 5, 0.0);
        let b = vertex_colors(&points(), 2, ColorStyle::Palette, true, 5, 3.0);
        assert_eq!(a, b);

        let palette = Palette::get(2);
        // 最低顶点的高度系数为 0
        assert!((a[0] - palette.sample(0.0)).norm() < 1e-6);
        for c in &a {
            for i in 0..3 {
                let lo = palette.base[i];
                let hi = palette.base[i] + palette.range[i];
                assert!(c[i] >= lo - 1e-6 && c[i] <= hi + 1e-6);
            }
        }
    }

    #[test]
    fn test_height_style_blends_by_y() {
        let colors = vertex_colors(&points(), 3, ColorStyle::Height, false, 0, 0.0);
        assert_eq!(colors[0], Color::new(0.0, 0.0, 0.0));
        assert_eq!(colors[1], Color::new(0.0, 0.5, 0.0));
        assert_eq!(colors[2], Color::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_palette_index_wraps() {
        assert_eq!(Palette::get(5), Palette::get(1));
    }

    #[test]
    fn test_color_style_names() {
        for style in [ColorStyle::Palette, ColorStyle::Height, ColorStyle::Rainbow] {
            assert_eq!(ColorStyle::from_str_name(style.as_str()), Ok(style));
        }
        assert!(ColorStyle::from_str_name("sepia").is_err());
    }
}
