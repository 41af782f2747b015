use crate::fractal::palette::{ColorStyle, PALETTES};
use crate::fractal::{FractalKind, FractalParams};
use crate::geometry::camera::ProjectionType;
use crate::utils::color_utils::Color;
use log::warn;
use nalgebra::{Point3, Vector3};

/// 可通过 TOML 配置或 GUI 设置的所有参数
///
/// 向量和颜色以 "x,y,z" 字符串保存，便于与 TOML 互相转换，
/// 由 `get_*` 方法按需解析
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    // ===== 文件设置 =====
    /// 输出图像的基础文件名
    pub output: String,
    /// 输出图像目录
    pub output_dir: String,

    // ===== 渲染设置 =====
    pub width: usize,
    pub height: usize,
    /// "perspective" 或 "orthographic"
    pub projection: String,
    pub use_zbuffer: bool,
    pub use_gamma: bool,
    pub backface_culling: bool,
    pub use_multithreading: bool,
    /// 无头模式下同时输出伪彩色深度图
    pub save_depth: bool,
    /// "r,g,b"，范围 [0, 1]
    pub background_color: String,
    /// "r,g,b"，范围 [0, 1]
    pub wireframe_color: String,
    /// 线框宽度（像素）
    pub line_width: f32,

    // ===== 相机设置 =====
    /// "x,y,z"
    pub camera_position: String,
    /// 角度，0 时看向 +z
    pub camera_yaw: f32,
    /// 角度，正值向上看
    pub camera_pitch: f32,
    /// 垂直视场角（角度）
    pub camera_fov: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    /// 每秒单位数
    pub camera_speed: f32,
    /// 鼠标拖动每像素对应的弧度
    pub mouse_sensitivity: f32,

    // ===== 分形设置 =====
    /// "mesh"、"pyramid" 或 "sponge"
    pub fractal_kind: String,
    /// 网格每个轴上的物体数
    pub grid_size: usize,
    /// 相邻网格物体之间的距离
    pub spacing: f32,
    pub object_scale: f32,
    /// 欧拉角（角度），"x,y,z"
    pub object_rotation: String,
    pub seed: u64,
    pub max_depth: usize,
    /// 第一帧之前执行的细分次数
    pub initial_steps: usize,
    pub start_displacement: f32,
    pub roughness: f32,
    pub pyramid_displacement: f32,
    /// 调色板索引
    pub palette: usize,
    /// "palette"、"height" 或 "rainbow"
    pub color_style: String,
    pub random_colors: bool,
    /// 在网格中交替使用颜色风格和随机性
    pub alternate_styles: bool,
    pub render_faces: bool,
    pub render_wireframe: bool,

    // ===== 动画设置 =====
    pub translate: bool,
    pub rotate: bool,
    /// 每秒单位数，"x,y,z"
    pub translation_speed: String,
    /// "x,y,z"
    pub rotation_axis: String,
    /// 每秒弧度
    pub rotation_speed: f32,
}

/// TOML 整数能表示的最大种子
pub const MAX_SEED: u64 = i64::MAX as u64;

/// 解析 "x,y,z"
pub fn parse_vec3(s: &str) -> Result<Vector3<f32>, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err("Expected 3 comma-separated values".to_string());
    }
    let x = parts[0]
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("Invalid number '{}': {}", parts[0], e))?;
    let y = parts[1]
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("Invalid number '{}': {}", parts[1], e))?;
    let z = parts[2]
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("Invalid number '{}': {}", parts[2], e))?;
    Ok(Vector3::new(x, y, z))
}

pub fn parse_point3(s: &str) -> Result<Point3<f32>, String> {
    parse_vec3(s).map(Point3::from)
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            // ===== 文件设置 =====
            output: "fractal".to_string(),
            output_dir: "output_rust".to_string(),

            // ===== 渲染设置 =====
            width: 1024,
            height: 768,
            projection: "perspective".to_string(),
            use_zbuffer: true,
            use_gamma: true,
            backface_culling: false,
            use_multithreading: true,
            save_depth: true,
            background_color: "0.05,0.05,0.08".to_string(),
            wireframe_color: "1,1,1".to_string(),
            line_width: 1.0,

            // ===== 相机设置 =====
            camera_position: "0,0,-1".to_string(),
            camera_yaw: 0.0,
            camera_pitch: 0.0,
            camera_fov: 55.0,
            camera_near: 0.01,
            camera_far: 100.0,
            camera_speed: 0.6,
            mouse_sensitivity: 0.005,

            // ===== 分形设置 =====
            fractal_kind: "mesh".to_string(),
            grid_size: 2,
            spacing: 1.0,
            object_scale: 0.5,
            object_rotation: "0,0,0".to_string(),
            seed: 0,
            max_depth: 6,
            initial_steps: 0,
            start_displacement: 1.2,
            roughness: 0.5,
            pyramid_displacement: 0.0,
            palette: 0,
            color_style: "palette".to_string(),
            random_colors: false,
            alternate_styles: true,
            render_faces: true,
            render_wireframe: false,

            // ===== 动画设置 =====
            translate: false,
            rotate: false,
            translation_speed: "0.6,0,0".to_string(),
            rotation_axis: "0,1,0".to_string(),
            rotation_speed: 0.4,
        }
    }
}

impl RenderSettings {
    pub fn get_background_color_vec(&self) -> Color {
        parse_vec3(&self.background_color).unwrap_or_else(|_| Vector3::new(0.05, 0.05, 0.08))
    }

    pub fn get_wireframe_color_vec(&self) -> Color {
        parse_vec3(&self.wireframe_color).unwrap_or_else(|_| Vector3::new(1.0, 1.0, 1.0))
    }

    pub fn get_fractal_kind(&self) -> Result<FractalKind, String> {
        FractalKind::from_str_name(&self.fractal_kind)
    }

    pub fn get_color_style(&self) -> Result<ColorStyle, String> {
        ColorStyle::from_str_name(&self.color_style)
    }

    pub fn get_projection_type(&self) -> Result<ProjectionType, String> {
        ProjectionType::from_str_name(&self.projection)
    }

    /// 按 `kind` 的内存上限截断后的 `max_depth`
    pub fn get_max_depth(&self, kind: FractalKind) -> usize {
        let limit = kind.depth_limit();
        if self.max_depth > limit {
            warn!(
                "max_depth {} 超过 {} 的上限 {}，使用 {}",
                self.max_depth,
                kind.as_str(),
                limit,
                limit
            );
            limit
        } else {
            self.max_depth
        }
    }

    pub fn get_fractal_params(&self) -> Result<FractalParams, String> {
        let kind = self.get_fractal_kind()?;
        Ok(FractalParams {
            kind,
            start_displacement: self.start_displacement,
            roughness: self.roughness,
            pyramid_displacement: self.pyramid_displacement,
            max_depth: self.get_max_depth(kind),
        })
    }

    pub fn get_camera_position(&self) -> Result<Point3<f32>, String> {
        parse_point3(&self.camera_position)
            .map_err(|e| format!("Invalid camera position '{}': {}", self.camera_position, e))
    }

    /// 转换为弧度的物体旋转
    pub fn get_object_rotation_rad(&self) -> Result<Vector3<f32>, String> {
        let degrees = parse_vec3(&self.object_rotation)
            .map_err(|e| format!("Invalid object rotation '{}': {}", self.object_rotation, e))?;
        Ok(degrees.map(f32::to_radians))
    }

    pub fn get_translation_velocity(&self) -> Result<Vector3<f32>, String> {
        parse_vec3(&self.translation_speed).map_err(|e| {
            format!(
                "Invalid translation speed '{}': {}",
                self.translation_speed, e
            )
        })
    }

    /// 归一化的环绕轴，输入无效时使用 +y
    pub fn get_rotation_axis(&self) -> Vector3<f32> {
        match parse_vec3(&self.rotation_axis) {
            Ok(axis) if axis.norm() > 1e-6 => axis.normalize(),
            _ => {
                warn!(
                    "无效的旋转轴 '{}'，使用 Y 轴",
                    self.rotation_axis
                );
                Vector3::y()
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err("Error: image width and height must be greater than 0".to_string());
        }

        if self.output_dir.trim().is_empty() {
            return Err("Error: output directory must not be empty".to_string());
        }

        if self.output.trim().is_empty() {
            return Err("Error: output name must not be empty".to_string());
        }

        self.get_projection_type()?;
        self.get_color_style()?;
        self.get_fractal_kind()?;

        if self.grid_size == 0 {
            return Err("Error: grid_size must be at least 1".to_string());
        }

        if self.seed > MAX_SEED {
            return Err(format!("Error: seed must be at most {}", MAX_SEED));
        }

        if self.initial_steps > self.max_depth {
            return Err(format!(
                "Error: initial_steps {} exceeds max_depth {}",
                self.initial_steps, self.max_depth
            ));
        }

        if self.palette >= PALETTES.len() {
            return Err(format!(
                "Error: palette must be between 0 and {}",
                PALETTES.len() - 1
            ));
        }

        if !(self.camera_fov > 0.0 && self.camera_fov < 180.0) {
            return Err("Error: camera_fov must be between 0 and 180 degrees".to_string());
        }

        if self.camera_near <= 0.0 || self.camera_far <= self.camera_near {
            return Err("Error: camera clip planes require 0 < near < far".to_string());
        }

        if self.object_scale <= 0.0 {
            return Err("Error: object_scale must be positive".to_string());
        }

        if self.line_width <= 0.0 {
            return Err("Error: line_width must be positive".to_string());
        }

        if self.roughness < 0.0 {
            return Err("Error: roughness must not be negative".to_string());
        }

        self.get_camera_position()?;
        self.get_object_rotation_rad()?;
        self.get_translation_velocity()?;

        if parse_vec3(&self.background_color).is_err() {
            return Err("Error: background_color must be r,g,b".to_string());
        }

        if parse_vec3(&self.wireframe_color).is_err() {
            return Err("Error: wireframe_color must be r,g,b".to_string());
        }

        Ok(())
    }
}
