use crate::fractal::displacement::{Displacement, MidpointCache};
use crate::fractal::primitives::Tri;
use log::{debug, info, warn};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 随机位移分形三角形
///
/// 从 [-1, 1]^3 内的一个随机三角形开始，每次细分通过（位移后的）边中点
/// 将每个三角形分成四个，并按 roughness 比例减小位移
#[derive(Debug, Clone)]
pub struct FractalMesh {
    vertices: Vec<Point3<f32>>,
    triangles: Vec<Tri>,
    displacement: Displacement,
    rng: StdRng,
    seed: u64,
    depth: usize,
    max_depth: usize,
}

impl FractalMesh {
    pub fn new(seed: u64, displacement: Displacement, max_depth: usize) -> Self {
        let mut mesh = FractalMesh {
            vertices: Vec::new(),
            triangles: Vec::new(),
            displacement,
            rng: StdRng::seed_from_u64(seed),
            seed,
            depth: 0,
            max_depth,
        };
        mesh.reset(seed);
        mesh
    }

    /// 用新的随机三角形替换网格，并恢复初始位移
    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
        self.depth = 0;
        self.displacement.reset();

        self.vertices.clear();
        self.triangles.clear();
        for _ in 0..3 {
            let corner = Point3::new(
                self.rng.random_range(-1.0..=1.0),
                self.rng.random_range(-1.0..=1.0),
                self.rng.random_range(-1.0..=1.0),
            );
            self.vertices.push(corner);
        }
        self.triangles.push(Tri::new(0, 1, 2));

        info!("分形网格已重置，种子: {}", seed);
    }

    /// 执行一次细分，达到 `max_depth` 时返回 false
    pub fn fractalize(&mut self) -> bool {
        if self.depth >= self.max_depth {
            warn!(
                "分形网格已达到最大深度 {}，忽略细分",
                self.max_depth
            );
            return false;
        }

        let mut cache = MidpointCache::new();
        let mut children = Vec::with_capacity(self.triangles.len() * 4);

        //          c
        //      f       e
        //  a       d       b
        for tri in &self.triangles {
            let [a, b, c] = tri.vertices;
            let d = cache.midpoint(&mut self.vertices, a, b, &self.displacement, &mut self.rng);
            let e = cache.midpoint(&mut self.vertices, b, c, &self.displacement, &mut self.rng);
            let f = cache.midpoint(&mut self.vertices, c, a, &self.displacement, &mut self.rng);

            children.push(Tri::new(d, a, f));
            children.push(Tri::new(b, d, e));
            children.push(Tri::new(e, f, c));
            children.push(Tri::new(e, d, f));
        }

        self.triangles = children;
        self.displacement.decay();
        self.depth += 1;

        debug!(
            "分形网格深度 {}: {} 个三角形，{} 个顶点（新增 {}），下一层位移 {:.4}",
            self.depth,
            self.triangles.len(),
            self.vertices.len(),
            cache.len(),
            self.displacement.magnitude()
        );
        true
    }

    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Tri] {
        &self.triangles
    }

    pub fn faces(&self) -> Vec<[usize; 3]> {
        self.triangles.iter().map(|t| t.vertices).collect()
    }

    pub fn displacement(&self) -> &Displacement {
        &self.displacement
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
