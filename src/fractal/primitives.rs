//! 基于索引的图元，每个图元保存共享顶点列表中的索引，
//! 并能拆分为朝外的三角形

/// 引用三个顶点的三角形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tri {
    pub vertices: [usize; 3],
}

impl Tri {
    pub fn new(v0: usize, v1: usize, v2: usize) -> Self {
        Tri {
            vertices: [v0, v1, v2],
        }
    }
}

/// 平面四边形，绘制为共享 v0-v2 对角线的两个三角形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quad {
    pub vertices: [usize; 4],
}

impl Quad {
    pub fn new(v0: usize, v1: usize, v2: usize, v3: usize) -> Self {
        Quad {
            vertices: [v0, v1, v2, v3],
        }
    }

    pub fn faces(&self) -> [[usize; 3]; 2] {
        let v = self.vertices;
        [[v[2], v[1], v[0]], [v[3], v[2], v[0]]]
    }
}

/// 立方体八个角点的偏移，顺序与 `Cube` 一致
pub const CUBE_CORNERS: [[i64; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
    [1, 0, 1],
];

/// 由八个角点给出的轴对齐立方体（见 `CUBE_CORNERS`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cube {
    pub vertices: [usize; 8],
}

impl Cube {
    pub fn new(vertices: [usize; 8]) -> Self {
        Cube { vertices }
    }

    pub fn quads(&self) -> [Quad; 6] {
        let v = self.vertices;
        [
            Quad::new(v[2], v[3], v[0], v[1]), // z = 0
            Quad::new(v[6], v[2], v[1], v[7]), // x = 1
            Quad::new(v[5], v[6], v[7], v[4]), // z = 1
            Quad::new(v[3], v[5], v[4], v[0]), // x = 0
            Quad::new(v[0], v[4], v[7], v[1]), // y = 0
            Quad::new(v[2], v[6], v[5], v[3]), // y = 1
        ]
    }

    pub fn faces(&self) -> [[usize; 3]; 12] {
        let mut faces = [[0; 3]; 12];
        for (i, quad) in self.quads().iter().enumerate() {
            let [a, b] = quad.faces();
            faces[i * 2] = a;
            faces[i * 2 + 1] = b;
        }
        faces
    }
}

/// 引用四个顶点的四面体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tetrahedron {
    pub vertices: [usize; 4],
}

impl Tetrahedron {
    pub fn new(v0: usize, v1: usize, v2: usize, v3: usize) -> Self {
        Tetrahedron {
            vertices: [v0, v1, v2, v3],
        }
    }

    pub fn faces(&self) -> [[usize; 3]; 4] {
        let v = self.vertices;
        [
            [v[0], v[1], v[2]],
            [v[3], v[2], v[1]],
            [v[0], v[2], v[3]],
            [v[0], v[3], v[1]],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn outward(points: &[Point3<f32>], face: [usize; 3], center: Point3<f32>) -> bool {
        let (a, b, c) = (points[face[0]], points[face[1]], points[face[2]]);
        let normal: Vector3<f32> = (b - a).cross(&(c - a));
        let face_center = Point3::from((a.coords + b.coords + c.coords) / 3.0);
        normal.dot(&(face_center - center)) > 0.0
    }

    #[test]
    fn test_cube_faces_wind_outward() {
        let points: Vec<Point3<f32>> = CUBE_CORNERS
            .iter()
            .map(|c| Point3::new(c[0] as f32, c[1] as f32, c[2] as f32))
            .collect();
        let cube = Cube::new([0, 1, 2, 3, 4, 5, 6, 7]);
        let center = Point3::new(0.5, 0.5, 0.5);
        for face in cube.faces() {
            assert!(outward(&points, face, center), "face {:?} faces inward", face);
        }
    }

    #[test]
    fn test_tetrahedron_faces_cover_every_vertex_three_times() {
        let tet = Tetrahedron::new(10, 11, 12, 13);
        let mut counts = [0; 4];
        for face in tet.faces() {
            for v in face {
                counts[v - 10] += 1;
            }
        }
        assert_eq!(counts, [3, 3, 3, 3]);
    }
}
