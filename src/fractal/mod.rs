pub mod displacement;
pub mod mesh;
pub mod palette;
pub mod primitives;
pub mod pyramid;
pub mod sponge;

use crate::utils::color_utils::Color;
use displacement::Displacement;
use mesh::FractalMesh;
use nalgebra::Point3;
use pyramid::SierpinskiPyramid;
use sponge::MengerSponge;

/// 可放入场景的分形类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FractalKind {
    #[default]
    Mesh,
    Pyramid,
    Sponge,
}

impl FractalKind {
    pub const ALL: [FractalKind; 3] = [FractalKind::Mesh, FractalKind::Pyramid, FractalKind::Sponge];

    pub fn from_str_name(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "mesh" => Ok(FractalKind::Mesh),
            "pyramid" => Ok(FractalKind::Pyramid),
            "sponge" => Ok(FractalKind::Sponge),
            other => Err(format!(
                "Unknown fractal kind '{}', expected mesh, pyramid or sponge",
                other
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FractalKind::Mesh => "mesh",
            FractalKind::Pyramid => "pyramid",
            FractalKind::Sponge => "sponge",
        }
    }

    /// 每次细分每个图元产生的子图元数
    pub fn branching(&self) -> usize {
        match self {
            FractalKind::Mesh | FractalKind::Pyramid => 4,
            FractalKind::Sponge => 20,
        }
    }

    /// 该类型允许的最大 `max_depth`
    pub fn depth_limit(&self) -> usize {
        match self {
            FractalKind::Mesh => 10,
            FractalKind::Pyramid => 9,
            FractalKind::Sponge => 4,
        }
    }
}

/// 场景中所有物体共享的构造参数
#[derive(Debug, Clone, PartialEq)]
pub struct FractalParams {
    pub kind: FractalKind,
    pub start_displacement: f32,
    pub roughness: f32,
    pub pyramid_displacement: f32,
    pub max_depth: usize,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            kind: FractalKind::Mesh,
            start_displacement: 1.2,
            roughness: 0.5,
            pyramid_displacement: 0.0,
            max_depth: 6,
        }
    }
}

/// 交给渲染器的展平几何数据
#[derive(Debug, Clone, Default)]
pub struct TriangleBuffers {
    pub positions: Vec<Point3<f32>>,
    pub colors: Vec<Color>,
    /// 每个三角形三个索引
    pub indices: Vec<u32>,
}

impl TriangleBuffers {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }
}

#[derive(Debug, Clone)]
pub enum Fractal {
    Mesh(FractalMesh),
    Pyramid(SierpinskiPyramid),
    Sponge(MengerSponge),
}

impl Fractal {
    pub fn new(params: &FractalParams, seed: u64) -> Self {
        match params.kind {
            FractalKind::Mesh => Fractal::Mesh(FractalMesh::new(
                seed,
                Displacement::new(params.start_displacement, params.roughness),
                params.max_depth,
            )),
            FractalKind::Pyramid => Fractal::Pyramid(SierpinskiPyramid::new(
                seed,
                params.pyramid_displacement,
                params.max_depth,
            )),
            FractalKind::Sponge => Fractal::Sponge(MengerSponge::new(params.max_depth)),
        }
    }

    pub fn kind(&self) -> FractalKind {
        match self {
            Fractal::Mesh(_) => FractalKind::Mesh,
            Fractal::Pyramid(_) => FractalKind::Pyramid,
            Fractal::Sponge(_) => FractalKind::Sponge,
        }
    }

    /// 执行一次细分，已达 `max_depth` 时返回 false
    pub fn fractalize(&mut self) -> bool {
        match self {
            Fractal::Mesh(m) => m.fractalize(),
            Fractal::Pyramid(p) => p.fractalize(),
            Fractal::Sponge(s) => s.fractalize(),
        }
    }

    /// 恢复到初始形状，海绵没有随机性，忽略 `seed`
    pub fn reset(&mut self, seed: u64) {
        match self {
            Fractal::Mesh(m) => m.reset(seed),
            Fractal::Pyramid(p) => p.reset(seed),
            Fractal::Sponge(s) => s.reset(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Fractal::Mesh(m) => m.depth(),
            Fractal::Pyramid(p) => p.depth(),
            Fractal::Sponge(s) => s.depth(),
        }
    }

    pub fn max_depth(&self) -> usize {
        match self {
            Fractal::Mesh(m) => m.max_depth(),
            Fractal::Pyramid(p) => p.max_depth(),
            Fractal::Sponge(s) => s.max_depth(),
        }
    }

    pub fn seed(&self) -> u64 {
        match self {
            Fractal::Mesh(m) => m.seed(),
            Fractal::Pyramid(p) => p.seed(),
            Fractal::Sponge(_) => 0,
        }
    }

    /// 下一次细分将使用的位移大小
    pub fn displacement_magnitude(&self) -> f32 {
        match self {
            Fractal::Mesh(m) => m.displacement().magnitude(),
            Fractal::Pyramid(p) => p.displacement().magnitude(),
            Fractal::Sponge(_) => 0.0,
        }
    }

    pub fn vertices(&self) -> &[Point3<f32>] {
        match self {
            Fractal::Mesh(m) => m.vertices(),
            Fractal::Pyramid(p) => p.vertices(),
            Fractal::Sponge(s) => s.vertices(),
        }
    }

    pub fn faces(&self) -> Vec<[usize; 3]> {
        match self {
            Fractal::Mesh(m) => m.faces(),
            Fractal::Pyramid(p) => p.faces(),
            Fractal::Sponge(s) => s.faces(),
        }
    }

    /// 三角形、四面体或立方体的数量，取决于类型
    pub fn primitive_count(&self) -> usize {
        match self {
            Fractal::Mesh(m) => m.triangles().len(),
            Fractal::Pyramid(p) => p.tetrahedra().len(),
            Fractal::Sponge(s) => s.cubes().len(),
        }
    }

    /// 用给定的顶点颜色展平当前形状
    pub fn build_buffers(&self, colors: Vec<Color>) -> TriangleBuffers {
        let indices = self
            .faces()
            .into_iter()
            .flat_map(|f| f.map(|i| i as u32))
            .collect();
        TriangleBuffers {
            positions: self.vertices().to_vec(),
            colors,
            indices,
        }
    }
}
