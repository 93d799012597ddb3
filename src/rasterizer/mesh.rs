//! Reference geometry and procedural textures

use super::math::Vector;
use super::types::{Color, ColorF, PixelFormat, TexCoord, Vertex};

const fn vertex(pos: [f32; 3], tc: [f32; 2], color: [f32; 3], normal: [f32; 3]) -> Vertex {
    Vertex::new(
        Vector::point(pos[0], pos[1], pos[2]),
        TexCoord::new(tc[0], tc[1]),
        ColorF::new(color[0], color[1], color[2]),
        Vector::direction(normal[0], normal[1], normal[2]),
    )
}

/// Unit cube: four vertices per face so each face has its own normal and UVs
#[rustfmt::skip]
pub const CUBE_VERTICES: [Vertex; 24] = [
    vertex([ 1.0, -1.0,  1.0], [0.0, 0.0], [1.0, 0.2, 0.2], [0.0, 0.0, 1.0]),
    vertex([-1.0, -1.0,  1.0], [0.0, 1.0], [0.2, 1.0, 0.2], [0.0, 0.0, 1.0]),
    vertex([-1.0,  1.0,  1.0], [1.0, 1.0], [0.2, 0.2, 1.0], [0.0, 0.0, 1.0]),
    vertex([ 1.0,  1.0,  1.0], [1.0, 0.0], [1.0, 0.2, 1.0], [0.0, 0.0, 1.0]),

    vertex([ 1.0, -1.0, -1.0], [0.0, 0.0], [1.0, 1.0, 0.2], [0.0, 0.0, -1.0]),
    vertex([ 1.0,  1.0, -1.0], [0.0, 1.0], [0.2, 1.0, 0.3], [0.0, 0.0, -1.0]),
    vertex([-1.0,  1.0, -1.0], [1.0, 1.0], [1.0, 0.3, 0.3], [0.0, 0.0, -1.0]),
    vertex([-1.0, -1.0, -1.0], [1.0, 0.0], [0.2, 1.0, 1.0], [0.0, 0.0, -1.0]),

    vertex([-1.0, -1.0,  1.0], [0.0, 0.0], [0.2, 1.0, 0.2], [-1.0, 0.0, 0.0]),
    vertex([-1.0, -1.0, -1.0], [0.0, 1.0], [0.2, 1.0, 1.0], [-1.0, 0.0, 0.0]),
    vertex([-1.0,  1.0, -1.0], [1.0, 1.0], [1.0, 0.3, 0.3], [-1.0, 0.0, 0.0]),
    vertex([-1.0,  1.0,  1.0], [1.0, 0.0], [0.2, 0.2, 1.0], [-1.0, 0.0, 0.0]),

    vertex([ 1.0,  1.0,  1.0], [0.0, 0.0], [1.0, 0.2, 1.0], [0.0, 1.0, 0.0]),
    vertex([-1.0,  1.0,  1.0], [0.0, 1.0], [0.2, 0.2, 1.0], [0.0, 1.0, 0.0]),
    vertex([-1.0,  1.0, -1.0], [1.0, 1.0], [1.0, 0.3, 0.3], [0.0, 1.0, 0.0]),
    vertex([ 1.0,  1.0, -1.0], [1.0, 0.0], [0.2, 1.0, 0.3], [0.0, 1.0, 0.0]),

    vertex([ 1.0, -1.0,  1.0], [0.0, 0.0], [1.0, 0.2, 0.2], [0.0, -1.0, 0.0]),
    vertex([ 1.0, -1.0, -1.0], [0.0, 1.0], [1.0, 1.0, 0.2], [0.0, -1.0, 0.0]),
    vertex([-1.0, -1.0, -1.0], [1.0, 1.0], [0.2, 1.0, 1.0], [0.0, -1.0, 0.0]),
    vertex([-1.0, -1.0,  1.0], [1.0, 0.0], [0.2, 1.0, 0.2], [0.0, -1.0, 0.0]),

    vertex([ 1.0,  1.0,  1.0], [0.0, 0.0], [1.0, 0.2, 1.0], [1.0, 0.0, 0.0]),
    vertex([ 1.0,  1.0, -1.0], [0.0, 1.0], [0.2, 1.0, 0.3], [1.0, 0.0, 0.0]),
    vertex([ 1.0, -1.0, -1.0], [1.0, 1.0], [1.0, 1.0, 0.2], [1.0, 0.0, 0.0]),
    vertex([ 1.0, -1.0,  1.0], [1.0, 0.0], [1.0, 0.2, 0.2], [1.0, 0.0, 0.0]),
];

/// Two triangles per quad of four consecutive vertices
pub fn quad_indices(faces: u32) -> Vec<u32> {
    (0..faces)
        .flat_map(|f| {
            let b = f * 4;
            [b, b + 1, b + 2, b + 2, b + 3, b]
        })
        .collect()
}

pub fn cube() -> (Vec<Vertex>, Vec<u32>) {
    (CUBE_VERTICES.to_vec(), quad_indices(6))
}

/// Square in the plane z = `height`, facing +z, spanning `[-half, half]`.
/// Wound like the cube's top face.
pub fn ground(half: f32, height: f32) -> (Vec<Vertex>, Vec<u32>) {
    let n = [0.0, 0.0, 1.0];
    let c = [0.8, 0.8, 0.8];
    let vertices = vec![
        vertex([half, -half, height], [0.0, 0.0], c, n),
        vertex([-half, -half, height], [0.0, 1.0], c, n),
        vertex([-half, half, height], [1.0, 1.0], c, n),
        vertex([half, half, height], [1.0, 0.0], c, n),
    ];
    (vertices, quad_indices(1))
}

/// Checkerboard of `cell`-sized squares, white and sky blue
pub fn checkerboard(size: usize, cell: usize, format: PixelFormat) -> Vec<u32> {
    let light = Color::new(0xff, 0xff, 0xff).pack(format);
    let dark = Color::new(0x3f, 0xbc, 0xef).pack(format);
    let mut texels = Vec::with_capacity(size * size);
    for j in 0..size {
        for i in 0..size {
            let odd = (i / cell + j / cell) & 1 == 1;
            texels.push(if odd { light } else { dark });
        }
    }
    texels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_layout() {
        let (vertices, indices) = cube();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert_eq!(&indices[..6], &[0, 1, 2, 2, 3, 0]);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    /// Every triangle turns clockwise about its vertex normal, which is the
    /// front-facing order under the left-handed view
    fn assert_front_winding(vertices: &[Vertex], indices: &[u32]) {
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|k| vertices[tri[k] as usize]);
            let face = (b.pos - a.pos).cross(c.pos - b.pos);
            assert!(face.dot(a.normal) < 0.0, "triangle {:?}", tri);
        }
    }

    #[test]
    fn test_consistent_winding() {
        let (vertices, indices) = cube();
        assert_front_winding(&vertices, &indices);
        let (vertices, indices) = ground(4.0, -2.0);
        assert_front_winding(&vertices, &indices);
    }

    #[test]
    fn test_checkerboard_cells() {
        let tex = checkerboard(64, 32, PixelFormat::Xrgb8888);
        assert_eq!(tex[0], 0x3fbcef);
        assert_eq!(tex[32], 0xffffff);
        assert_eq!(tex[32 * 64 + 32], 0x3fbcef);
    }
}
