use crate::fractal::displacement::{Displacement, MidpointCache};
use crate::fractal::primitives::Tetrahedron;
use log::{debug, info, warn};
use nalgebra::Point3;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// 谢尔宾斯基四面体
///
/// 每次细分将每个四面体替换为由一个角点及其三条边中点构成的四个角四面体
/// 开启位移时，各层位移大小保持不变
#[derive(Debug, Clone)]
pub struct SierpinskiPyramid {
    vertices: Vec<Point3<f32>>,
    tetrahedra: Vec<Tetrahedron>,
    displacement: Displacement,
    rng: StdRng,
    seed: u64,
    depth: usize,
    max_depth: usize,
}

/// 以原点为中心、边长为 2 的正四面体顶点
pub fn regular_tetrahedron() -> [Point3<f32>; 4] {
    let a = 1.0 / 3.0f32.sqrt();
    let b = 1.0 / 6.0f32.sqrt();
    [
        Point3::new(1.0, -a, -b),
        Point3::new(-1.0, -a, -b),
        Point3::new(0.0, 2.0 * a, -b),
        Point3::new(0.0, 0.0, 3.0 * b),
    ]
}

impl SierpinskiPyramid {
    /// `displacement` 为固定的中点位移大小（0 时为精确的谢尔宾斯基四面体）
    pub fn new(seed: u64, displacement: f32, max_depth: usize) -> Self {
        let mut pyramid = SierpinskiPyramid {
            vertices: Vec::new(),
            tetrahedra: Vec::new(),
            displacement: Displacement::new(displacement, 1.0),
            rng: StdRng::seed_from_u64(seed),
            seed,
            depth: 0,
            max_depth,
        };
        pyramid.reset(seed);
        pyramid
    }

    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
        self.depth = 0;
        self.displacement.reset();

        self.vertices.clear();
        self.vertices.extend_from_slice(&regular_tetrahedron());
        self.tetrahedra.clear();
        self.tetrahedra.push(Tetrahedron::new(0, 1, 2, 3));

        info!("谢尔宾斯基四面体已重置，种子: {}", seed);
    }

    /// 执行一次细分，达到 `max_depth` 时返回 false
    pub fn fractalize(&mut self) -> bool {
        if self.depth >= self.max_depth {
            warn!(
                "谢尔宾斯基四面体已达到最大深度 {}，忽略细分",
                self.max_depth
            );
            return false;
        }

        let mut cache = MidpointCache::new();
        let mut children = Vec::with_capacity(self.tetrahedra.len() * 4);

        for tet in &self.tetrahedra {
            let [v0, v1, v2, v3] = tet.vertices;
            let mut mid = |a: usize, b: usize| {
                cache.midpoint(&mut self.vertices, a, b, &self.displacement, &mut self.rng)
            };
            let m01 = mid(v0, v1);
            let m02 = mid(v0, v2);
            let m03 = mid(v0, v3);
            let m12 = mid(v1, v2);
            let m13 = mid(v1, v3);
            let m23 = mid(v2, v3);

            children.push(Tetrahedron::new(v0, m01, m02, m03));
            children.push(Tetrahedron::new(m01, v1, m12, m13));
            children.push(Tetrahedron::new(m02, m12, v2, m23));
            children.push(Tetrahedron::new(m03, m13, m23, v3));
        }

        self.tetrahedra = children;
        self.displacement.decay();
        self.depth += 1;

        debug!(
            "谢尔宾斯基四面体深度 {}: {} 个四面体，{} 个顶点（新增 {}）",
            self.depth,
            self.tetrahedra.len(),
            self.vertices.len(),
            cache.len()
        );
        true
    }

    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    pub fn tetrahedra(&self) -> &[Tetrahedron] {
        &self.tetrahedra
    }

    pub fn faces(&self) -> Vec<[usize; 3]> {
        self.tetrahedra.iter().flat_map(|t| t.faces()).collect()
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_regular_tetrahedron_edges_are_equal() {
        let corners = regular_tetrahedron();
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert!(((corners[i] - corners[j]).norm() - 2.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_tetrahedron_count_grows_by_four() {
        let mut pyramid = SierpinskiPyramid::new(1, 0.0, 5);
        for n in 0..5 {
            assert_eq!(pyramid.tetrahedra().len(), 4usize.pow(n));
            assert_eq!(pyramid.faces().len(), 4 * 4usize.pow(n));
            pyramid.fractalize();
        }
    }

    #[test]
    fn test_children_use_parent_corners_and_midpoints() {
        let mut pyramid = SierpinskiPyramid::new(1, 0.0, 5);
        pyramid.fractalize();

        let corners: HashSet<usize> = (0..4).collect();
        for (i, child) in pyramid.tetrahedra().iter().enumerate() {
            // 第 i 个子四面体只保留父四面体的第 i 个角点
            let kept: Vec<usize> = child
                .vertices
                .iter()
                .copied()
                .filter(|v| corners.contains(v))
                .collect();
            assert_eq!(kept, vec![i]);
            assert!(child.vertices.iter().all(|&v| v < pyramid.vertices().len()));
        }
        assert_eq!(pyramid.vertices().len(), 4 + 6);
    }

    #[test]
    fn test_exact_midpoints_without_displacement() {
        let mut pyramid = SierpinskiPyramid::new(9, 0.0, 5);
        pyramid.fractalize();
        let corners = regular_tetrahedron();
        let expected = Point3::from((corners[0].coords + corners[1].coords) * 0.5);
        let m01 = pyramid.tetrahedra()[0].vertices[1];
        assert!((pyramid.vertices()[m01] - expected).norm() < 1e-6);
    }

    #[test]
    fn test_displacement_does_not_decay() {
        let mut pyramid = SierpinskiPyramid::new(9, 0.1, 5);
        pyramid.fractalize();
        pyramid.fractalize();
        assert_eq!(pyramid.displacement().magnitude(), 0.1);
    }

    #[test]
    fn test_same_seed_same_displaced_vertices() {
        let mut a = SierpinskiPyramid::new(17, 0.2, 5);
        let mut b = SierpinskiPyramid::new(17, 0.2, 5);
        let mut c = SierpinskiPyramid::new(18, 0.2, 5);
        for _ in 0..3 {
            a.fractalize();
            b.fractalize();
            c.fractalize();
        }
        assert_eq!(a.vertices(), b.vertices());
        assert_ne!(a.vertices(), c.vertices());

        // 位移确实使中点偏离了精确中点
        let corners = regular_tetrahedron();
        let exact = Point3::from((corners[0].coords + corners[1].coords) * 0.5);
        let m01 = a.tetrahedra()[0].vertices[1];
        assert!((a.vertices()[m01] - exact).norm() > 0.0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut pyramid = SierpinskiPyramid::new(2, 0.05, 5);
        pyramid.fractalize();
        pyramid.fractalize();
        pyramid.reset(2);
        assert_eq!(pyramid.tetrahedra().len(), 1);
        assert_eq!(pyramid.vertices(), &regular_tetrahedron()[..]);
        assert_eq!(pyramid.depth(), 0);
    }
}
