#[allow(clippy::module_inception)]
pub mod scene;
pub mod scene_object;
