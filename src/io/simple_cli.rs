use crate::io::config_loader::TomlConfigLoader;
use crate::io::render_settings::RenderSettings;
use clap::Parser;
use log::info;

/// 命令行：TOML 配置文件，GUI 或无头模式
#[derive(Parser, Debug)]
#[command(name = "fractalizer")]
#[command(about = "Fractal meshes, Sierpinski pyramids and Menger sponges in a software rasterizer")]
pub struct SimpleCli {
    /// 配置文件路径 (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// 渲染一帧到 PNG，不打开窗口
    #[arg(long)]
    pub headless: bool,

    /// 写出示例配置文件并加载
    #[arg(long)]
    pub use_example_config: bool,
}

impl SimpleCli {
    /// 解析命令行，返回设置以及是否启动 GUI
    pub fn process() -> Result<(RenderSettings, bool), String> {
        Self::parse().into_settings()
    }

    fn into_settings(self) -> Result<(RenderSettings, bool), String> {
        let should_start_gui = !self.headless;

        if self.use_example_config {
            let example_path = "example_config.toml";

            TomlConfigLoader::create_example_config(example_path)?;
            info!("示例配置已写入 {}", example_path);

            let settings = TomlConfigLoader::load_from_file(example_path)
                .map_err(|e| format!("Failed to load example config: {}", e))?;
            return Ok((settings, should_start_gui));
        }

        let settings = if let Some(config_path) = &self.config {
            info!("加载配置文件: {}", config_path);
            TomlConfigLoader::load_from_file(config_path)
                .map_err(|e| format!("Failed to load config file: {}", e))?
        } else {
            info!("使用默认设置");
            RenderSettings::default()
        };

        Ok((settings, should_start_gui))
    }
}
