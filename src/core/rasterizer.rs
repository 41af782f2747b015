use crate::core::frame_buffer::FrameBuffer;
use crate::geometry::interpolation::{
    barycentric_coordinates, interpolate_color, interpolate_depth, is_inside_triangle,
    is_on_triangle_edge,
};
use crate::io::render_settings::RenderSettings;
use crate::utils::color_utils::Color;
use nalgebra::Point2;
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct VertexRenderData {
    pub pix: Point2<f32>,
    pub z_view: f32,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct TriangleData {
    pub vertices: [VertexRenderData; 3],
    pub is_perspective: bool,
}

impl TriangleData {
    pub fn screen_area(&self) -> f32 {
        let v0 = &self.vertices[0].pix;
        let v1 = &self.vertices[1].pix;
        let v2 = &self.vertices[2].pix;
        0.5 * ((v1.x - v0.x) * (v2.y - v0.y) - (v2.x - v0.x) * (v1.y - v0.y)).abs()
    }

    pub fn is_valid(&self) -> bool {
        self.screen_area() > 1e-6
    }
}

/// 光栅化的绘制内容
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RasterMode {
    /// 填充三角形，插值顶点颜色
    Faces,
    /// 单色三角形边，`depth_bias` 按深度比例将线条拉近相机，使其覆盖所在的面
    Wireframe {
        color: Color,
        line_width: f32,
        depth_bias: f32,
    },
}

#[derive(Debug, Clone, Copy)]
enum RenderStrategy {
    /// 少量大三角形：对每个三角形的像素并行
    PixelParallel,
    /// 大量小三角形：对三角形并行
    TriangleParallel,
}

fn choose_strategy(triangles: &[TriangleData]) -> RenderStrategy {
    let sample = triangles.len().min(50);
    if sample == 0 {
        return RenderStrategy::TriangleParallel;
    }
    let avg_area: f32 = triangles
        .iter()
        .take(sample)
        .map(TriangleData::screen_area)
        .sum::<f32>()
        / sample as f32;

    if triangles.len() < 100 || avg_area > 500.0 {
        RenderStrategy::PixelParallel
    } else {
        RenderStrategy::TriangleParallel
    }
}

pub fn rasterize_triangles(
    triangles: &[TriangleData],
    mode: &RasterMode,
    frame_buffer: &FrameBuffer,
    settings: &RenderSettings,
) {
    if triangles.is_empty() {
        return;
    }

    if !settings.use_multithreading {
        for triangle in triangles {
            rasterize_triangle(triangle, mode, frame_buffer, settings);
        }
        return;
    }

    match choose_strategy(triangles) {
        RenderStrategy::PixelParallel => {
            for triangle in triangles {
                rasterize_triangle_pixel_parallel(triangle, mode, frame_buffer, settings);
            }
        }
        RenderStrategy::TriangleParallel => {
            triangles.par_iter().for_each(|triangle| {
                rasterize_triangle(triangle, mode, frame_buffer, settings);
            });
        }
    }
}

fn compute_bounding_box(
    triangle: &TriangleData,
    width: usize,
    height: usize,
    padding: f32,
) -> (usize, usize, usize, usize) {
    let v0 = &triangle.vertices[0].pix;
    let v1 = &triangle.vertices[1].pix;
    let v2 = &triangle.vertices[2].pix;

    let min_x = (v0.x.min(v1.x).min(v2.x) - padding).floor().max(0.0) as usize;
    let min_y = (v0.y.min(v1.y).min(v2.y) - padding).floor().max(0.0) as usize;
    let max_x = (v0.x.max(v1.x).max(v2.x) + padding)
        .ceil()
        .clamp(0.0, width as f32) as usize;
    let max_y = (v0.y.max(v1.y).max(v2.y) + padding)
        .ceil()
        .clamp(0.0, height as f32) as usize;

    (min_x, min_y, max_x, max_y)
}

fn padding_for(mode: &RasterMode) -> f32 {
    match mode {
        RasterMode::Faces => 0.0,
        RasterMode::Wireframe { line_width, .. } => line_width * 0.5,
    }
}

pub fn rasterize_triangle(
    triangle: &TriangleData,
    mode: &RasterMode,
    frame_buffer: &FrameBuffer,
    settings: &RenderSettings,
) {
    if !triangle.is_valid() {
        return;
    }

    let (min_x, min_y, max_x, max_y) = compute_bounding_box(
        triangle,
        frame_buffer.width,
        frame_buffer.height,
        padding_for(mode),
    );
    if max_x <= min_x || max_y <= min_y {
        return;
    }

    for y in min_y..max_y {
        for x in min_x..max_x {
            process_pixel(triangle, mode, x, y, frame_buffer, settings);
        }
    }
}

fn rasterize_triangle_pixel_parallel(
    triangle: &TriangleData,
    mode: &RasterMode,
    frame_buffer: &FrameBuffer,
    settings: &RenderSettings,
) {
    if !triangle.is_valid() {
        return;
    }

    let (min_x, min_y, max_x, max_y) = compute_bounding_box(
        triangle,
        frame_buffer.width,
        frame_buffer.height,
        padding_for(mode),
    );
    if max_x <= min_x || max_y <= min_y {
        return;
    }

    (min_y..max_y).into_par_iter().for_each(|y| {
        for x in min_x..max_x {
            process_pixel(triangle, mode, x, y, frame_buffer, settings);
        }
    });
}

fn process_pixel(
    triangle: &TriangleData,
    mode: &RasterMode,
    x: usize,
    y: usize,
    frame_buffer: &FrameBuffer,
    settings: &RenderSettings,
) {
    let [a, b, c] = &triangle.vertices;
    let pixel_center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);

    let bary = match barycentric_coordinates(pixel_center, a.pix, b.pix, c.pix) {
        Some(bary) => bary,
        None => return,
    };

    let (bary, color, depth_scale) = match mode {
        RasterMode::Faces => {
            if !is_inside_triangle(bary) {
                return;
            }
            let color = interpolate_color(
                bary,
                [&a.color, &b.color, &c.color],
                [a.z_view, b.z_view, c.z_view],
                triangle.is_perspective,
            );
            (bary, color, 1.0)
        }
        RasterMode::Wireframe {
            color,
            line_width,
            depth_bias,
        } => {
            if !is_on_triangle_edge(pixel_center, a.pix, b.pix, c.pix, *line_width) {
                return;
            }
            // 线条会超出三角形半个线宽，取三角形内最近点的深度
            let clamped = bary.map(|w| w.max(0.0));
            let clamped = clamped / clamped.sum();
            (clamped, *color, 1.0 - depth_bias)
        }
    };

    let depth = interpolate_depth(
        bary,
        a.z_view,
        b.z_view,
        c.z_view,
        triangle.is_perspective,
    );
    if !depth.is_finite() {
        return;
    }
    let depth = depth * depth_scale;

    let pixel_index = y * frame_buffer.width + x;
    if settings.use_zbuffer && !frame_buffer.depth_test(pixel_index, depth) {
        return;
    }

    frame_buffer.write_pixel(pixel_index, &color, settings.use_gamma);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, z_view: f32, color: Color) -> VertexRenderData {
        VertexRenderData {
            pix: Point2::new(x, y),
            z_view,
            color,
        }
    }

    fn triangle(z_view: f32, color: Color) -> TriangleData {
        TriangleData {
            vertices: [
                vertex(0.0, 0.0, z_view, color),
                vertex(16.0, 0.0, z_view, color),
                vertex(0.0, 16.0, z_view, color),
            ],
            is_perspective: true,
        }
    }

    fn settings() -> RenderSettings {
        RenderSettings {
            use_gamma: false,
            ..RenderSettings::default()
        }
    }

    fn pixel(fb: &FrameBuffer, x: usize, y: usize) -> [u8; 3] {
        let bytes = fb.get_color_buffer_bytes();
        let i = (y * fb.width + x) * 3;
        [bytes[i], bytes[i + 1], bytes[i + 2]]
    }

    #[test]
    fn test_nearer_triangle_wins_regardless_of_order() {
        let settings = settings();
        let near = triangle(-1.0, Color::new(1.0, 0.0, 0.0));
        let far = triangle(-2.0, Color::new(0.0, 0.0, 1.0));

        for order in [[&near, &far], [&far, &near]] {
            let fb = FrameBuffer::new(16, 16);
            fb.clear(&Color::zeros(), false);
            for t in order {
                rasterize_triangle(t, &RasterMode::Faces, &fb, &settings);
            }
            assert_eq!(pixel(&fb, 2, 2), [255, 0, 0]);
            // 三角形外
            assert_eq!(pixel(&fb, 14, 14), [0, 0, 0]);
        }
    }

    #[test]
    fn test_wireframe_draws_edges_over_faces() {
        let settings = settings();
        let face = triangle(-1.0, Color::new(0.0, 0.0, 1.0));
        let fb = FrameBuffer::new(16, 16);
        fb.clear(&Color::zeros(), false);

        rasterize_triangles(
            std::slice::from_ref(&face),
            &RasterMode::Faces,
            &fb,
            &settings,
        );
        let wire = RasterMode::Wireframe {
            color: Color::new(1.0, 1.0, 1.0),
            line_width: 1.0,
            depth_bias: 0.01,
        };
        rasterize_triangles(std::slice::from_ref(&face), &wire, &fb, &settings);

        assert_eq!(pixel(&fb, 5, 0), [255, 255, 255]);
        assert_eq!(pixel(&fb, 4, 4), [0, 0, 255]);
    }

    #[test]
    fn test_triangle_behind_camera_is_skipped() {
        let settings = settings();
        let fb = FrameBuffer::new(16, 16);
        fb.clear(&Color::zeros(), false);
        rasterize_triangle(
            &triangle(1.0, Color::new(1.0, 1.0, 1.0)),
            &RasterMode::Faces,
            &fb,
            &settings,
        );
        assert_eq!(pixel(&fb, 2, 2), [0, 0, 0]);
    }
}
