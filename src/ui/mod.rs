pub mod app;
pub mod core;
pub mod widgets;

pub use app::start_gui;
