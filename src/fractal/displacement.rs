use nalgebra::{Point3, Vector3};
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::HashMap;

/// 带逐层衰减的随机中点位移
///
/// `roughness` 为每层之后乘到位移大小上的比例：0.5 每次减半，1.0 保持不变
#[derive(Debug, Clone, PartialEq)]
pub struct Displacement {
    start: f32,
    roughness: f32,
    current: f32,
}

impl Displacement {
    pub fn new(start: f32, roughness: f32) -> Self {
        Displacement {
            start,
            roughness,
            current: start,
        }
    }

    pub fn magnitude(&self) -> f32 {
        self.current
    }

    /// 进入下一层细节
    pub fn decay(&mut self) {
        self.current *= self.roughness;
    }

    pub fn reset(&mut self) {
        self.current = self.start;
    }

    /// `a`-`b` 的中点，每个轴偏移 `magnitude * (u - 0.5)`
    pub fn displaced_midpoint(
        &self,
        a: &Point3<f32>,
        b: &Point3<f32>,
        rng: &mut StdRng,
    ) -> Point3<f32> {
        let midpoint = Point3::from((a.coords + b.coords) * 0.5);
        if self.current == 0.0 {
            return midpoint;
        }

        let offset = Vector3::new(
            rng.random::<f32>() - 0.5,
            rng.random::<f32>() - 0.5,
            rng.random::<f32>() - 0.5,
        ) * self.current;
        midpoint + offset
    }
}

/// 一次细分中创建的边中点，以无序顶点对为键，相邻图元共享中点
#[derive(Debug, Default)]
pub struct MidpointCache {
    midpoints: HashMap<(usize, usize), usize>,
}

impl MidpointCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回边 `a`-`b` 中点的索引，首次遇到该边时追加新顶点
    pub fn midpoint(
        &mut self,
        vertices: &mut Vec<Point3<f32>>,
        a: usize,
        b: usize,
        displacement: &Displacement,
        rng: &mut StdRng,
    ) -> usize {
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&index) = self.midpoints.get(&key) {
            return index;
        }

        let point = displacement.displaced_midpoint(&vertices[key.0], &vertices[key.1], rng);
        vertices.push(point);
        let index = vertices.len() - 1;
        self.midpoints.insert(key, index);
        index
    }

    pub fn len(&self) -> usize {
        self.midpoints.len()
    }
}
