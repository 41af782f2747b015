use crate::core::frame_buffer::FrameBuffer;
use crate::core::rasterizer::{RasterMode, TriangleData, VertexRenderData, rasterize_triangles};
use crate::fractal::TriangleBuffers;
use crate::geometry::camera::Camera;
use crate::geometry::transform::{transform_points, view_to_pixel};
use crate::io::render_settings::RenderSettings;
use crate::scene::scene::Scene;
use crate::scene::scene_object::SceneObject;
use log::debug;
use nalgebra::{Matrix4, Point2, Point3};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// 线框相对深度偏移，使线条位于面之上
const WIREFRAME_DEPTH_BIAS: f32 = 0.002;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    pub objects: usize,
    /// 场景缓冲区中的三角形数
    pub triangles: usize,
    /// 裁剪和剔除后送入填充阶段的三角形数
    pub faces_drawn: usize,
    /// 送入线框阶段的三角形数
    pub edges_drawn: usize,
    pub elapsed: Duration,
}

/// 物体在视图空间和像素空间中的顶点
struct ProjectedVertices {
    view: Vec<Point3<f32>>,
    pixel: Vec<Point3<f32>>,
}

pub struct Renderer {
    pub frame_buffer: FrameBuffer,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            frame_buffer: FrameBuffer::new(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.frame_buffer.width
    }

    pub fn height(&self) -> usize {
        self.frame_buffer.height
    }

    /// 尺寸变化时重新分配帧缓冲区
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.frame_buffer.width || height != self.frame_buffer.height {
            debug!("调整帧缓冲区尺寸为 {}x{}", width, height);
            self.frame_buffer = FrameBuffer::new(width, height);
        }
    }

    /// 绘制一帧：清屏，然后绘制所有物体的面，最后绘制线框
    pub fn render_scene(&self, scene: &Scene, settings: &RenderSettings) -> RenderStats {
        let start = Instant::now();
        self.frame_buffer
            .clear(&settings.get_background_color_vec(), settings.use_gamma);

        let camera = &scene.camera;
        let view_matrix = camera.view_matrix();
        let projection_matrix = camera.projection_matrix();

        let mut faces = Vec::new();
        let mut edges = Vec::new();
        let mut stats = RenderStats::default();

        for object in scene.objects() {
            stats.objects += 1;
            let buffers = object.buffers();
            stats.triangles += buffers.triangle_count();
            if !object.render_faces && !object.render_wireframe {
                continue;
            }

            let projected = self.project_object(object, &view_matrix, &projection_matrix);
            if object.render_faces {
                faces.extend(assemble_triangles(
                    buffers,
                    &projected,
                    camera,
                    settings.backface_culling,
                ));
            }
            if object.render_wireframe {
                edges.extend(assemble_triangles(buffers, &projected, camera, false));
            }
        }

        stats.faces_drawn = faces.len();
        stats.edges_drawn = edges.len();

        rasterize_triangles(&faces, &RasterMode::Faces, &self.frame_buffer, settings);
        let wireframe = RasterMode::Wireframe {
            color: settings.get_wireframe_color_vec(),
            line_width: settings.line_width,
            depth_bias: WIREFRAME_DEPTH_BIAS,
        };
        rasterize_triangles(&edges, &wireframe, &self.frame_buffer, settings);

        stats.elapsed = start.elapsed();
        debug!(
            "渲染了 {} 个物体: {} 个面，{} 个线框三角形，耗时 {:?}",
            stats.objects, stats.faces_drawn, stats.edges_drawn, stats.elapsed
        );
        stats
    }

    fn project_object(
        &self,
        object: &SceneObject,
        view_matrix: &Matrix4<f32>,
        projection_matrix: &Matrix4<f32>,
    ) -> ProjectedVertices {
        let model_view = view_matrix * object.model_matrix();
        let view = transform_points(&object.buffers().positions, &model_view);
        let pixel = view_to_pixel(
            &view,
            projection_matrix,
            self.frame_buffer.width as f32,
            self.frame_buffer.height as f32,
        );
        ProjectedVertices { view, pixel }
    }
}

/// 构建光栅三角形，丢弃跨越近平面、超出远平面或（可选）背向相机的三角形
fn assemble_triangles(
    buffers: &TriangleBuffers,
    projected: &ProjectedVertices,
    camera: &Camera,
    cull_backfaces: bool,
) -> Vec<TriangleData> {
    let is_perspective = camera.is_perspective();
    let near = camera.near;
    let far = camera.far;

    let indices: Vec<[usize; 3]> = buffers.triangles().collect();
    indices
        .par_iter()
        .filter_map(|&[i0, i1, i2]| {
            let view = [projected.view[i0], projected.view[i1], projected.view[i2]];

            if view.iter().any(|p| p.z > -near) || view.iter().all(|p| p.z < -far) {
                return None;
            }

            if cull_backfaces {
                let normal = (view[1] - view[0]).cross(&(view[2] - view[0]));
                let facing = if is_perspective {
                    normal.dot(&view[0].coords)
                } else {
                    -normal.z
                };
                if facing >= 0.0 {
                    return None;
                }
            }

            let vertex = |i: usize, p: &Point3<f32>| VertexRenderData {
                pix: Point2::new(projected.pixel[i].x, projected.pixel[i].y),
                z_view: p.z,
                color: buffers.colors[i],
            };

            Some(TriangleData {
                vertices: [
                    vertex(i0, &view[0]),
                    vertex(i1, &view[1]),
                    vertex(i2, &view[2]),
                ],
                is_perspective,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RenderSettings {
        RenderSettings {
            width: 64,
            height: 64,
            grid_size: 1,
            object_scale: 1.0,
            camera_position: "0,0,-3".to_string(),
            fractal_kind: "sponge".to_string(),
            ..RenderSettings::default()
        }
    }

    #[test]
    fn test_sponge_covers_center_pixel() {
        let settings = settings();
        let scene = Scene::from_settings(&settings).unwrap();
        let renderer = Renderer::new(settings.width, settings.height);

        let stats = renderer.render_scene(&scene, &settings);
        assert_eq!(stats.objects, 1);
        assert_eq!(stats.triangles, 12);
        assert!(stats.faces_drawn > 0);

        let depth = renderer.frame_buffer.get_depth_buffer_f32();
        let center = depth[32 * 64 + 32];
        // 单位立方体前表面位于 z = -0.5，距相机 2.5
        assert!((center - 2.5).abs() < 0.05, "center depth {}", center);
        assert!(depth[0].is_infinite());
    }

    #[test]
    fn test_backface_culling_keeps_front_face() {
        let mut settings = settings();
        settings.backface_culling = true;
        let scene = Scene::from_settings(&settings).unwrap();
        let renderer = Renderer::new(settings.width, settings.height);

        let stats = renderer.render_scene(&scene, &settings);
        // 只保留朝向相机的那个面的两个三角形
        assert_eq!(stats.faces_drawn, 2);
    }

    #[test]
    fn test_objects_behind_camera_are_clipped() {
        let mut settings = settings();
        settings.camera_position = "0,0,3".to_string();
        let scene = Scene::from_settings(&settings).unwrap();
        let renderer = Renderer::new(settings.width, settings.height);

        let stats = renderer.render_scene(&scene, &settings);
        assert_eq!(stats.faces_drawn, 0);
    }
}
