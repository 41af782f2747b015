pub mod color_utils;
pub mod save_utils;
