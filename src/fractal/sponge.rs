use crate::fractal::primitives::{CUBE_CORNERS, Cube};
use log::{debug, info, warn};
use nalgebra::Point3;
use std::collections::HashMap;

/// 由原点处单位立方体生成的门格海绵
///
/// 顶点位于整数格点上，每次细分分辨率变为三倍
/// 格点坐标与位置一同保存，相邻立方体共享角点
#[derive(Debug, Clone)]
pub struct MengerSponge {
    vertices: Vec<Point3<f32>>,
    lattice: Vec<[i64; 3]>,
    cubes: Vec<Cube>,
    depth: usize,
    max_depth: usize,
}

impl MengerSponge {
    pub fn new(max_depth: usize) -> Self {
        let mut sponge = MengerSponge {
            vertices: Vec::new(),
            lattice: Vec::new(),
            cubes: Vec::new(),
            depth: 0,
            max_depth,
        };
        sponge.reset();
        sponge
    }

    pub fn reset(&mut self) {
        self.depth = 0;
        self.vertices.clear();
        self.lattice.clear();
        self.cubes.clear();

        for corner in CUBE_CORNERS {
            self.lattice.push(corner);
            self.vertices.push(Self::lattice_to_position(corner, 0));
        }
        self.cubes.push(Cube::new([0, 1, 2, 3, 4, 5, 6, 7]));

        info!("门格海绵已重置，立方体数: {}", self.cubes.len());
    }

    fn lattice_to_position(coord: [i64; 3], depth: usize) -> Point3<f32> {
        let step = 1.0 / 3f32.powi(depth as i32);
        Point3::new(
            coord[0] as f32 * step - 0.5,
            coord[1] as f32 * step - 0.5,
            coord[2] as f32 * step - 0.5,
        )
    }

    /// 3x3x3 划分中的子立方体 (x, y, z) 在两个及以上坐标位于中间层时被移除
    pub fn is_kept(x: i64, y: i64, z: i64) -> bool {
        [x, y, z].iter().filter(|&&c| c == 1).count() < 2
    }

    /// 执行一次细分，达到 `max_depth` 时返回 false
    pub fn fractalize(&mut self) -> bool {
        if self.depth >= self.max_depth {
            warn!(
                "门格海绵已达到最大深度 {}，忽略细分",
                self.max_depth
            );
            return false;
        }

        let depth = self.depth + 1;
        for coord in self.lattice.iter_mut() {
            for c in coord.iter_mut() {
                *c *= 3;
            }
        }
        let mut lookup: HashMap<[i64; 3], usize> = self
            .lattice
            .iter()
            .enumerate()
            .map(|(i, &coord)| (coord, i))
            .collect();

        let mut children = Vec::with_capacity(self.cubes.len() * 20);
        for cube in &self.cubes {
            let origin = self.lattice[cube.vertices[0]];
            for x in 0..3 {
                for y in 0..3 {
                    for z in 0..3 {
                        if !Self::is_kept(x, y, z) {
                            continue;
                        }
                        let mut corners = [0usize; 8];
                        for (slot, offset) in CUBE_CORNERS.iter().enumerate() {
                            let coord = [
                                origin[0] + x + offset[0],
                                origin[1] + y + offset[1],
                                origin[2] + z + offset[2],
                            ];
                            corners[slot] = *lookup.entry(coord).or_insert_with(|| {
                                self.lattice.push(coord);
                                self.vertices.push(Self::lattice_to_position(coord, depth));
                                self.vertices.len() - 1
                            });
                        }
                        children.push(Cube::new(corners));
                    }
                }
            }
        }

        self.cubes = children;
        self.depth = depth;

        debug!(
            "门格海绵深度 {}: {} 个边长 {:.4} 的立方体，{} 个顶点",
            self.depth,
            self.cubes.len(),
            self.cube_size(),
            self.vertices.len()
        );
        true
    }

    /// 当前深度下立方体的边长
    pub fn cube_size(&self) -> f32 {
        1.0 / 3f32.powi(self.depth as i32)
    }

    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    pub fn faces(&self) -> Vec<[usize; 3]> {
        self.cubes.iter().flat_map(|c| c.faces()).collect()
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
    use nalgebra::Vector3;

    #[test]
    fn test_twenty_of_twenty_seven_kept() {
        let mut kept = 0;
        for x in 0..3 {
            for y in 0..3 {
                for z in 0..3 {
                    if MengerSponge::is_kept(x, y, z) {
                        kept += 1;
                    }
                }
            }
        }
        assert_eq!(kept, 20);
        assert!(!MengerSponge::is_kept(1, 1, 1));
        assert!(!MengerSponge::is_kept(1, 1, 0));
        assert!(MengerSponge::is_kept(1, 0, 0));
    }

    #[test]
    fn test_cube_count_grows_by_twenty() {
        let mut sponge = MengerSponge::new(3);
        for n in 0..3 {
            assert_eq!(sponge.cubes().len(), 20usize.pow(n));
            assert!(sponge.fractalize());
        }
        assert_eq!(sponge.cubes().len(), 8000);
        assert!(!sponge.fractalize());
    }

    #[test]
    fn test_level_one_vertices_are_shared() {
        let mut sponge = MengerSponge::new(2);
        sponge.fractalize();
        // 4x4x4 格点中每个点都是某个保留立方体的角点
        assert_eq!(sponge.vertices().len(), 64);
    }

    #[test]
    fn test_cubes_have_expected_size() {
        let mut sponge = MengerSponge::new(2);
        sponge.fractalize();
        let size = sponge.cube_size();
        for cube in sponge.cubes() {
            let a = sponge.vertices()[cube.vertices[0]];
            let b = sponge.vertices()[cube.vertices[6]];
            assert!(((b - a) - Vector3::repeat(size)).norm() < 1e-5);
        }
    }

    #[test]
    fn test_children_lie_on_parent_lattice() {
        let mut sponge = MengerSponge::new(3);
        sponge.fractalize();

        // 第一层：每个角点都在父立方体的 4x4x4 格点上，每个子立方体都是轴对齐的
        let step = 1.0 / 3.0;
        let on_lattice = |c: f32| {
            let t = (c + 0.5) / step;
            (t - t.round()).abs() < 1e-4 && (-1e-4..=3.0 + 1e-4).contains(&t)
        };
        for cube in sponge.cubes() {
            assert!(cube.vertices.iter().all(|&v| v < sponge.vertices().len()));
            let origin = sponge.vertices()[cube.vertices[0]];
            for (slot, offset) in CUBE_CORNERS.iter().enumerate() {
                let p = sponge.vertices()[cube.vertices[slot]];
                assert!(on_lattice(p.x) && on_lattice(p.y) && on_lattice(p.z));
                let expected = origin
                    + Vector3::new(offset[0] as f32, offset[1] as f32, offset[2] as f32) * step;
                assert!((p - expected).norm() < 1e-5);
            }
        }

        sponge.fractalize();
        let count = sponge.vertices().len();
        for cube in sponge.cubes() {
            assert!(cube.vertices.iter().all(|&v| v < count));
            for &v in &cube.vertices {
                let p = sponge.vertices()[v];
                assert!(p.x.abs() <= 0.5 + 1e-5);
                assert!(p.y.abs() <= 0.5 + 1e-5);
                assert!(p.z.abs() <= 0.5 + 1e-5);
            }
        }
    }

    #[test]
    fn test_reset_restores_unit_cube() {
        let mut sponge = MengerSponge::new(2);
        sponge.fractalize();
        sponge.reset();
        assert_eq!(sponge.cubes().len(), 1);
        assert_eq!(sponge.vertices().len(), 8);
        assert_eq!(sponge.vertices()[6], Point3::new(0.5, 0.5, 0.5));
    }
}
