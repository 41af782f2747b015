use crate::utils::color_utils::{Color, linear_rgb_to_u8};
use atomic_float::AtomicF32;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU8, Ordering};

/// 帧缓冲区实现，由光栅化线程共享
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    /// 每像素的正深度值，越小越近
    pub depth_buffer: Vec<AtomicF32>,
    /// RGB 颜色值，每像素三个字节
    pub color_buffer: Vec<AtomicU8>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let num_pixels = width * height;

        let depth_buffer = (0..num_pixels)
            .map(|_| AtomicF32::new(f32::INFINITY))
            .collect();
        let color_buffer = (0..num_pixels * 3).map(|_| AtomicU8::new(0)).collect();

        FrameBuffer {
            width,
            height,
            depth_buffer,
            color_buffer,
        }
    }

    /// 将深度重置为无穷大，并用 `background` 填充颜色缓冲区
    pub fn clear(&self, background: &Color, use_gamma: bool) {
        self.depth_buffer.par_iter().for_each(|atomic_depth| {
            atomic_depth.store(f32::INFINITY, Ordering::Relaxed);
        });

        let rgb = linear_rgb_to_u8(background, use_gamma);
        self.color_buffer.par_chunks(3).for_each(|pixel| {
            pixel[0].store(rgb[0], Ordering::Relaxed);
            pixel[1].store(rgb[1], Ordering::Relaxed);
            pixel[2].store(rgb[2], Ordering::Relaxed);
        });
    }

    /// 保留较小的深度，`depth` 胜出时返回 true
    #[inline]
    pub fn depth_test(&self, pixel_index: usize, depth: f32) -> bool {
        let old_depth = self.depth_buffer[pixel_index].fetch_min(depth, Ordering::Relaxed);
        old_depth > depth
    }

    #[inline]
    pub fn write_pixel(&self, pixel_index: usize, color: &Color, use_gamma: bool) {
        let start = pixel_index * 3;
        if start + 2 < self.color_buffer.len() {
            let [r, g, b] = linear_rgb_to_u8(color, use_gamma);
            self.color_buffer[start].store(r, Ordering::Relaxed);
            self.color_buffer[start + 1].store(g, Ordering::Relaxed);
            self.color_buffer[start + 2].store(b, Ordering::Relaxed);
        }
    }

    pub fn get_color_buffer_bytes(&self) -> Vec<u8> {
        self.color_buffer
            .iter()
            .map(|atomic_color| atomic_color.load(Ordering::Relaxed))
            .collect()
    }

    pub fn get_depth_buffer_f32(&self) -> Vec<f32> {
        self.depth_buffer
            .iter()
            .map(|atomic_depth| atomic_depth.load(Ordering::Relaxed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_fills_background() {
        let fb = FrameBuffer::new(2, 2);
        fb.depth_test(0, 1.0);
        fb.clear(&Color::new(1.0, 0.0, 0.0), false);
        assert_eq!(&fb.get_color_buffer_bytes()[..6], &[255, 0, 0, 255, 0, 0]);
        assert!(fb.get_depth_buffer_f32().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let fb = FrameBuffer::new(1, 1);
        assert!(fb.depth_test(0, 2.0));
        assert!(!fb.depth_test(0, 3.0));
        assert!(fb.depth_test(0, 1.0));
        assert!(!fb.depth_test(0, 1.0));
        assert_eq!(fb.get_depth_buffer_f32()[0], 1.0);
    }
}
