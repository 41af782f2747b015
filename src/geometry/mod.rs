// 相机、变换和逐像素插值
pub mod camera;
pub mod interpolation;
pub mod transform;
