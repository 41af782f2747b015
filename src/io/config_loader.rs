use crate::io::render_settings::{MAX_SEED, RenderSettings};
use log::warn;
use std::path::Path;
use toml::Value;

/// 以 TOML 格式读写 `RenderSettings`
pub struct TomlConfigLoader;

/// 手写配置中浮点数可能写成整数
fn get_f32(table: &toml::Table, key: &str) -> Option<f32> {
    match table.get(key)? {
        Value::Float(f) => Some(*f as f32),
        Value::Integer(i) => Some(*i as f32),
        _ => None,
    }
}

fn get_usize(table: &toml::Table, key: &str) -> Result<Option<usize>, String> {
    match table.get(key).and_then(|v| v.as_integer()) {
        Some(i) if i < 0 => Err(format!("'{}' must not be negative, got {}", key, i)),
        Some(i) => Ok(Some(i as usize)),
        None => Ok(None),
    }
}

fn get_u64(table: &toml::Table, key: &str) -> Result<Option<u64>, String> {
    match table.get(key).and_then(|v| v.as_integer()) {
        Some(i) if i < 0 => Err(format!("'{}' must not be negative, got {}", key, i)),
        Some(i) => Ok(Some(i as u64)),
        None => Ok(None),
    }
}

fn get_string(table: &toml::Table, key: &str) -> Option<String> {
    table.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn get_bool(table: &toml::Table, key: &str) -> Option<bool> {
    table.get(key).and_then(|v| v.as_bool())
}

impl TomlConfigLoader {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<RenderSettings, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::load_from_content(&content)
    }

    pub fn load_from_content(content: &str) -> Result<RenderSettings, String> {
        let toml_value: Value =
            toml::from_str(content).map_err(|e| format!("Failed to parse TOML: {}", e))?;

        Self::parse_toml_to_settings(toml_value)
    }

    pub fn save_to_file<P: AsRef<Path>>(settings: &RenderSettings, path: P) -> Result<(), String> {
        let toml_content = Self::settings_to_toml(settings);
        std::fs::write(path, toml_content)
            .map_err(|e| format!("Failed to write config file: {}", e))
    }

    /// 写出默认设置作为示例配置
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), String> {
        let settings = RenderSettings {
            initial_steps: 4,
            ..Default::default()
        };

        Self::save_to_file(&settings, path)
            .map_err(|e| format!("Failed to create example config: {}", e))
    }

    // ===== TOML -> RenderSettings =====

    fn parse_toml_to_settings(toml: Value) -> Result<RenderSettings, String> {
        let mut settings = RenderSettings::default();

        if let Some(files) = toml.get("files").and_then(|v| v.as_table()) {
            Self::parse_files_section(&mut settings, files);
        }

        if let Some(render) = toml.get("render").and_then(|v| v.as_table()) {
            Self::parse_render_section(&mut settings, render)?;
        }

        if let Some(camera) = toml.get("camera").and_then(|v| v.as_table()) {
            Self::parse_camera_section(&mut settings, camera);
        }

        if let Some(fractal) = toml.get("fractal").and_then(|v| v.as_table()) {
            Self::parse_fractal_section(&mut settings, fractal)?;
        }

        if let Some(animation) = toml.get("animation").and_then(|v| v.as_table()) {
            Self::parse_animation_section(&mut settings, animation);
        }

        Ok(settings)
    }

    fn parse_files_section(settings: &mut RenderSettings, files: &toml::Table) {
        if let Some(output) = get_string(files, "output") {
            settings.output = output;
        }
        if let Some(output_dir) = get_string(files, "output_dir") {
            settings.output_dir = output_dir;
        }
    }

    fn parse_render_section(
        settings: &mut RenderSettings,
        render: &toml::Table,
    ) -> Result<(), String> {
        if let Some(width) = get_usize(render, "width")? {
            settings.width = width;
        }
        if let Some(height) = get_usize(render, "height")? {
            settings.height = height;
        }
        if let Some(projection) = get_string(render, "projection") {
            settings.projection = projection;
        }
        if let Some(use_zbuffer) = get_bool(render, "use_zbuffer") {
            settings.use_zbuffer = use_zbuffer;
        }
        if let Some(use_gamma) = get_bool(render, "use_gamma") {
            settings.use_gamma = use_gamma;
        }
        if let Some(backface_culling) = get_bool(render, "backface_culling") {
            settings.backface_culling = backface_culling;
        }
        if let Some(use_multithreading) = get_bool(render, "use_multithreading") {
            settings.use_multithreading = use_multithreading;
        }
        if let Some(save_depth) = get_bool(render, "save_depth") {
            settings.save_depth = save_depth;
        }
        if let Some(background_color) = get_string(render, "background_color") {
            settings.background_color = background_color;
        }
        if let Some(wireframe_color) = get_string(render, "wireframe_color") {
            settings.wireframe_color = wireframe_color;
        }
        if let Some(line_width) = get_f32(render, "line_width") {
            if line_width > 0.0 {
                settings.line_width = line_width;
            } else {
                warn!("无效的 line_width {}，保持 {}", line_width, settings.line_width);
            }
        }
        Ok(())
    }

    fn parse_camera_section(settings: &mut RenderSettings, camera: &toml::Table) {
        if let Some(position) = get_string(camera, "position") {
            settings.camera_position = position;
        }
        if let Some(yaw) = get_f32(camera, "yaw") {
            settings.camera_yaw = yaw;
        }
        if let Some(pitch) = get_f32(camera, "pitch") {
            settings.camera_pitch = pitch;
        }
        if let Some(fov) = get_f32(camera, "fov") {
            settings.camera_fov = fov;
        }
        if let Some(near) = get_f32(camera, "near") {
            settings.camera_near = near;
        }
        if let Some(far) = get_f32(camera, "far") {
            settings.camera_far = far;
        }
        if let Some(speed) = get_f32(camera, "speed") {
            settings.camera_speed = speed;
        }
        if let Some(sensitivity) = get_f32(camera, "mouse_sensitivity") {
            settings.mouse_sensitivity = sensitivity;
        }
    }

    fn parse_fractal_section(
        settings: &mut RenderSettings,
        fractal: &toml::Table,
    ) -> Result<(), String> {
        if let Some(kind) = get_string(fractal, "kind") {
            settings.fractal_kind = kind;
        }
        if let Some(grid_size) = get_usize(fractal, "grid_size")? {
            settings.grid_size = grid_size;
        }
        if let Some(spacing) = get_f32(fractal, "spacing") {
            settings.spacing = spacing;
        }
        if let Some(scale) = get_f32(fractal, "scale") {
            settings.object_scale = scale;
        }
        if let Some(rotation) = get_string(fractal, "rotation") {
            settings.object_rotation = rotation;
        }
        if let Some(seed) = get_u64(fractal, "seed")? {
            settings.seed = seed;
        }
        if let Some(max_depth) = get_usize(fractal, "max_depth")? {
            settings.max_depth = max_depth;
        }
        if let Some(initial_steps) = get_usize(fractal, "initial_steps")? {
            settings.initial_steps = initial_steps;
        }
        if let Some(start_displacement) = get_f32(fractal, "start_displacement") {
            settings.start_displacement = start_displacement;
        }
        if let Some(roughness) = get_f32(fractal, "roughness") {
            settings.roughness = roughness;
        }
        if let Some(pyramid_displacement) = get_f32(fractal, "pyramid_displacement") {
            settings.pyramid_displacement = pyramid_displacement;
        }
        if let Some(palette) = get_usize(fractal, "palette")? {
            settings.palette = palette;
        }
        if let Some(color_style) = get_string(fractal, "color_style") {
            settings.color_style = color_style;
        }
        if let Some(random_colors) = get_bool(fractal, "random_colors") {
            settings.random_colors = random_colors;
        }
        if let Some(alternate_styles) = get_bool(fractal, "alternate_styles") {
            settings.alternate_styles = alternate_styles;
        }
        if let Some(render_faces) = get_bool(fractal, "render_faces") {
            settings.render_faces = render_faces;
        }
        if let Some(render_wireframe) = get_bool(fractal, "render_wireframe") {
            settings.render_wireframe = render_wireframe;
        }
        Ok(())
    }

    fn parse_animation_section(settings: &mut RenderSettings, animation: &toml::Table) {
        if let Some(translate) = get_bool(animation, "translate") {
            settings.translate = translate;
        }
        if let Some(rotate) = get_bool(animation, "rotate") {
            settings.rotate = rotate;
        }
        if let Some(translation_speed) = get_string(animation, "translation_speed") {
            settings.translation_speed = translation_speed;
        }
        if let Some(rotation_axis) = get_string(animation, "rotation_axis") {
            settings.rotation_axis = rotation_axis;
        }
        if let Some(rotation_speed) = get_f32(animation, "rotation_speed") {
            settings.rotation_speed = rotation_speed;
        }
    }

    // ===== RenderSettings -> TOML =====

    pub fn settings_to_toml(settings: &RenderSettings) -> String {
        let mut content = String::new();

        content.push_str("# Fractal renderer configuration\n");
        content.push_str("# Vectors and colours are \"x,y,z\" strings\n\n");

        content.push_str("[files]\n");
        content.push_str(&format!("output = \"{}\"\n", settings.output));
        content.push_str(&format!("output_dir = \"{}\"\n", settings.output_dir));
        content.push('\n');

        content.push_str("[render]\n");
        content.push_str(&format!("width = {}\n", settings.width));
        content.push_str(&format!("height = {}\n", settings.height));
        content.push_str(&format!("projection = \"{}\"\n", settings.projection));
        content.push_str(&format!("use_zbuffer = {}\n", settings.use_zbuffer));
        content.push_str(&format!("use_gamma = {}\n", settings.use_gamma));
        content.push_str(&format!(
            "backface_culling = {}\n",
            settings.backface_culling
        ));
        content.push_str(&format!(
            "use_multithreading = {}\n",
            settings.use_multithreading
        ));
        content.push_str(&format!("save_depth = {}\n", settings.save_depth));
        content.push_str(&format!(
            "background_color = \"{}\"\n",
            settings.background_color
        ));
        content.push_str(&format!(
            "wireframe_color = \"{}\"\n",
            settings.wireframe_color
        ));
        content.push_str(&format!("line_width = {:?}\n", settings.line_width));
        content.push('\n');

        content.push_str("[camera]\n");
        content.push_str(&format!("position = \"{}\"\n", settings.camera_position));
        content.push_str(&format!("yaw = {:?}\n", settings.camera_yaw));
        content.push_str(&format!("pitch = {:?}\n", settings.camera_pitch));
        content.push_str(&format!("fov = {:?}\n", settings.camera_fov));
        content.push_str(&format!("near = {:?}\n", settings.camera_near));
        content.push_str(&format!("far = {:?}\n", settings.camera_far));
        content.push_str(&format!("speed = {:?}\n", settings.camera_speed));
        content.push_str(&format!(
            "mouse_sensitivity = {:?}\n",
            settings.mouse_sensitivity
        ));
        content.push('\n');

        content.push_str("[fractal]\n");
        content.push_str("# kind: mesh | pyramid | sponge\n");
        content.push_str(&format!("kind = \"{}\"\n", settings.fractal_kind));
        content.push_str(&format!("grid_size = {}\n", settings.grid_size));
        content.push_str(&format!("spacing = {:?}\n", settings.spacing));
        content.push_str(&format!("scale = {:?}\n", settings.object_scale));
        content.push_str(&format!("rotation = \"{}\"\n", settings.object_rotation));
        content.push_str(&format!("seed = {}\n", settings.seed.min(MAX_SEED)));
        content.push_str(&format!("max_depth = {}\n", settings.max_depth));
        content.push_str(&format!("initial_steps = {}\n", settings.initial_steps));
        content.push_str(&format!(
            "start_displacement = {:?}\n",
            settings.start_displacement
        ));
        content.push_str(&format!("roughness = {:?}\n", settings.roughness));
        content.push_str(&format!(
            "pyramid_displacement = {:?}\n",
            settings.pyramid_displacement
        ));
        content.push_str("# palette: 0 blue, 1 purple, 2 green, 3 pure green\n");
        content.push_str(&format!("palette = {}\n", settings.palette));
        content.push_str("# color_style: palette | height | rainbow\n");
        content.push_str(&format!("color_style = \"{}\"\n", settings.color_style));
        content.push_str(&format!("random_colors = {}\n", settings.random_colors));
        content.push_str(&format!(
            "alternate_styles = {}\n",
            settings.alternate_styles
        ));
        content.push_str(&format!("render_faces = {}\n", settings.render_faces));
        content.push_str(&format!(
            "render_wireframe = {}\n",
            settings.render_wireframe
        ));
        content.push('\n');

        content.push_str("[animation]\n");
        content.push_str(&format!("translate = {}\n", settings.translate));
        content.push_str(&format!("rotate = {}\n", settings.rotate));
        content.push_str(&format!(
            "translation_speed = \"{}\"\n",
            settings.translation_speed
        ));
        content.push_str(&format!("rotation_axis = \"{}\"\n", settings.rotation_axis));
        content.push_str(&format!("rotation_speed = {:?}\n", settings.rotation_speed));

        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let settings = RenderSettings {
            fractal_kind: "pyramid".to_string(),
            grid_size: 3,
            seed: 42,
            max_depth: 5,
            camera_position: "1,2,-4".to_string(),
            camera_yaw: 30.0,
            line_width: 2.5,
            render_wireframe: true,
            rotate: true,
            ..RenderSettings::default()
        };

        let text = TomlConfigLoader::settings_to_toml(&settings);
        let loaded = TomlConfigLoader::load_from_content(&text).unwrap();

        assert_eq!(loaded.fractal_kind, "pyramid");
        assert_eq!(loaded.grid_size, 3);
        assert_eq!(loaded.seed, 42);
        assert_eq!(loaded.max_depth, 5);
        assert_eq!(loaded.camera_position, "1,2,-4");
        assert_eq!(loaded.camera_yaw, 30.0);
        assert_eq!(loaded.camera_near, settings.camera_near);
        assert_eq!(loaded.mouse_sensitivity, settings.mouse_sensitivity);
        assert_eq!(loaded.line_width, 2.5);
        assert_eq!(loaded.roughness, settings.roughness);
        assert!(loaded.render_wireframe);
        assert!(loaded.rotate);
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_large_seed_round_trip() {
        let settings = RenderSettings {
            seed: MAX_SEED,
            ..RenderSettings::default()
        };
        let text = TomlConfigLoader::settings_to_toml(&settings);
        let loaded = TomlConfigLoader::load_from_content(&text).unwrap();
        assert_eq!(loaded.seed, MAX_SEED);

        // 超出范围的种子在保存时被截断，保证文件可以加载
        let settings = RenderSettings {
            seed: u64::MAX - 1,
            ..settings
        };
        let text = TomlConfigLoader::settings_to_toml(&settings);
        let loaded = TomlConfigLoader::load_from_content(&text).unwrap();
        assert_eq!(loaded.seed, MAX_SEED);
    }

    #[test]
    fn test_negative_seed_rejected() {
        let result = TomlConfigLoader::load_from_content("[fractal]\nseed = -1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let loaded = TomlConfigLoader::load_from_content(
            "[fractal]\nkind = \"sponge\"\nmax_depth = 2\nscale = 1\n",
        )
        .unwrap();
        let defaults = RenderSettings::default();

        assert_eq!(loaded.fractal_kind, "sponge");
        assert_eq!(loaded.max_depth, 2);
        assert_eq!(loaded.object_scale, 1.0);
        assert_eq!(loaded.width, defaults.width);
        assert_eq!(loaded.camera_fov, defaults.camera_fov);
    }

    #[test]
    fn test_invalid_toml_and_negative_values() {
        assert!(TomlConfigLoader::load_from_content("[render\nwidth = 1").is_err());
        assert!(TomlConfigLoader::load_from_content("[render]\nwidth = -5").is_err());
    }
}
