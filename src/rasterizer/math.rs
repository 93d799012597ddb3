//! Vector and matrix math for the pipeline
//!
//! Row-vector convention throughout: a point is transformed as `y = x * M`,
//! so translation lives in the bottom row and `world * view * projection`
//! reads left to right in application order.

use std::ops::{Add, Mul, Sub};
use serde::{Serialize, Deserialize};

/// Clamp an integer into `[min, max]`
pub fn cmid(x: i32, min: i32, max: i32) -> i32 {
    if x < min {
        min
    } else if x > max {
        max
    } else {
        x
    }
}

/// Scalar linear interpolation
pub fn interp(x1: f32, x2: f32, t: f32) -> f32 {
    x1 + (x2 - x1) * t
}

/// Homogeneous 3D vector. `w = 1` for positions, `w = 0` for directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// Positions and directions share one representation
pub type Point = Vector;

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub const fn point(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 1.0 }
    }

    pub const fn direction(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 0.0 }
    }

    /// Length of the xyz part
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Dot product of the xyz parts
    pub fn dot(self, other: Vector) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product of the xyz parts, w = 1
    pub fn cross(self, other: Vector) -> Vector {
        Vector {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
            w: 1.0,
        }
    }

    /// Normalize the xyz part, leaving w untouched. Zero vectors stay zero.
    pub fn normalize(self) -> Vector {
        let l = self.length();
        if l == 0.0 {
            return self;
        }
        let inv = 1.0 / l;
        Vector {
            x: self.x * inv,
            y: self.y * inv,
            z: self.z * inv,
            w: self.w,
        }
    }

    pub fn scale(self, s: f32) -> Vector {
        Vector {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
            w: self.w * s,
        }
    }

    /// Componentwise interpolation, all four components
    pub fn interp(self, other: Vector, t: f32) -> Vector {
        Vector {
            x: interp(self.x, other.x, t),
            y: interp(self.y, other.y, t),
            z: interp(self.z, other.z, t),
            w: interp(self.w, other.w, t),
        }
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, other: Vector) -> Vector {
        Vector {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            w: self.w + other.w,
        }
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, other: Vector) -> Vector {
        Vector {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            w: self.w - other.w,
        }
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;
    fn mul(self, s: f32) -> Vector {
        self.scale(s)
    }
}

/// 4x4 matrix, `m[row][col]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub m: [[f32; 4]; 4],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub const fn zero() -> Self {
        Self { m: [[0.0; 4]; 4] }
    }

    pub const fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn scale(&self, f: f32) -> Matrix {
        let mut c = *self;
        for row in c.m.iter_mut() {
            for v in row.iter_mut() {
                *v *= f;
            }
        }
        c
    }

    /// `y = x * M`
    pub fn apply(&self, x: Vector) -> Vector {
        let m = &self.m;
        Vector {
            x: x.x * m[0][0] + x.y * m[1][0] + x.z * m[2][0] + x.w * m[3][0],
            y: x.x * m[0][1] + x.y * m[1][1] + x.z * m[2][1] + x.w * m[3][1],
            z: x.x * m[0][2] + x.y * m[1][2] + x.z * m[2][2] + x.w * m[3][2],
            w: x.x * m[0][3] + x.y * m[1][3] + x.z * m[2][3] + x.w * m[3][3],
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::zero();
        for i in 0..4 {
            for j in 0..4 {
                t.m[j][i] = self.m[i][j];
            }
        }
        t
    }

    /// Inverse via the adjugate. A singular input yields non-finite entries.
    pub fn inverse(&self) -> Matrix {
        let a = &self.m;
        let s0 = a[0][0] * a[1][1] - a[1][0] * a[0][1];
        let s1 = a[0][0] * a[1][2] - a[1][0] * a[0][2];
        let s2 = a[0][0] * a[1][3] - a[1][0] * a[0][3];
        let s3 = a[0][1] * a[1][2] - a[1][1] * a[0][2];
        let s4 = a[0][1] * a[1][3] - a[1][1] * a[0][3];
        let s5 = a[0][2] * a[1][3] - a[1][2] * a[0][3];

        let c5 = a[2][2] * a[3][3] - a[3][2] * a[2][3];
        let c4 = a[2][1] * a[3][3] - a[3][1] * a[2][3];
        let c3 = a[2][1] * a[3][2] - a[3][1] * a[2][2];
        let c2 = a[2][0] * a[3][3] - a[3][0] * a[2][3];
        let c1 = a[2][0] * a[3][2] - a[3][0] * a[2][2];
        let c0 = a[2][0] * a[3][1] - a[3][0] * a[2][1];

        let det = s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0;
        let inv_det = 1.0 / det;

        let mut b = Matrix::zero();
        b.m[0][0] = (a[1][1] * c5 - a[1][2] * c4 + a[1][3] * c3) * inv_det;
        b.m[0][1] = (-a[0][1] * c5 + a[0][2] * c4 - a[0][3] * c3) * inv_det;
        b.m[0][2] = (a[3][1] * s5 - a[3][2] * s4 + a[3][3] * s3) * inv_det;
        b.m[0][3] = (-a[2][1] * s5 + a[2][2] * s4 - a[2][3] * s3) * inv_det;

        b.m[1][0] = (-a[1][0] * c5 + a[1][2] * c2 - a[1][3] * c1) * inv_det;
        b.m[1][1] = (a[0][0] * c5 - a[0][2] * c2 + a[0][3] * c1) * inv_det;
        b.m[1][2] = (-a[3][0] * s5 + a[3][2] * s2 - a[3][3] * s1) * inv_det;
        b.m[1][3] = (a[2][0] * s5 - a[2][2] * s2 + a[2][3] * s1) * inv_det;

        b.m[2][0] = (a[1][0] * c4 - a[1][1] * c2 + a[1][3] * c0) * inv_det;
        b.m[2][1] = (-a[0][0] * c4 + a[0][1] * c2 - a[0][3] * c0) * inv_det;
        b.m[2][2] = (a[3][0] * s4 - a[3][1] * s2 + a[3][3] * s0) * inv_det;
        b.m[2][3] = (-a[2][0] * s4 + a[2][1] * s2 - a[2][3] * s0) * inv_det;

        b.m[3][0] = (-a[1][0] * c3 + a[1][1] * c1 - a[1][2] * c0) * inv_det;
        b.m[3][1] = (a[0][0] * c3 - a[0][1] * c1 + a[0][2] * c0) * inv_det;
        b.m[3][2] = (-a[3][0] * s3 + a[3][1] * s1 - a[3][2] * s0) * inv_det;
        b.m[3][3] = (a[2][0] * s3 - a[2][1] * s1 + a[2][2] * s0) * inv_det;

        b
    }

    pub fn translate(x: f32, y: f32, z: f32) -> Matrix {
        let mut m = Matrix::identity();
        m.m[3][0] = x;
        m.m[3][1] = y;
        m.m[3][2] = z;
        m
    }

    pub fn scaling(x: f32, y: f32, z: f32) -> Matrix {
        let mut m = Matrix::identity();
        m.m[0][0] = x;
        m.m[1][1] = y;
        m.m[2][2] = z;
        m
    }

    /// Rotation of `theta` radians about the axis (x, y, z), built from a
    /// unit quaternion
    pub fn rotate(x: f32, y: f32, z: f32, theta: f32) -> Matrix {
        let qsin = (theta * 0.5).sin();
        let qcos = (theta * 0.5).cos();
        let axis = Vector::direction(x, y, z).normalize();
        let w = qcos;
        let x = axis.x * qsin;
        let y = axis.y * qsin;
        let z = axis.z * qsin;

        let mut m = Matrix::identity();
        m.m[0][0] = 1.0 - 2.0 * y * y - 2.0 * z * z;
        m.m[1][0] = 2.0 * x * y - 2.0 * w * z;
        m.m[2][0] = 2.0 * x * z + 2.0 * w * y;
        m.m[0][1] = 2.0 * x * y + 2.0 * w * z;
        m.m[1][1] = 1.0 - 2.0 * x * x - 2.0 * z * z;
        m.m[2][1] = 2.0 * y * z - 2.0 * w * x;
        m.m[0][2] = 2.0 * x * z - 2.0 * w * y;
        m.m[1][2] = 2.0 * y * z + 2.0 * w * x;
        m.m[2][2] = 1.0 - 2.0 * x * x - 2.0 * y * y;
        m
    }

    /// Left-handed look-at view matrix (camera looks down +z)
    pub fn look_at(eye: Point, at: Point, up: Vector) -> Matrix {
        let zaxis = (at - eye).normalize();
        let xaxis = up.cross(zaxis).normalize();
        let yaxis = zaxis.cross(xaxis);

        let mut m = Matrix::zero();
        m.m[0][0] = xaxis.x;
        m.m[1][0] = xaxis.y;
        m.m[2][0] = xaxis.z;
        m.m[3][0] = -xaxis.dot(eye);

        m.m[0][1] = yaxis.x;
        m.m[1][1] = yaxis.y;
        m.m[2][1] = yaxis.z;
        m.m[3][1] = -yaxis.dot(eye);

        m.m[0][2] = zaxis.x;
        m.m[1][2] = zaxis.y;
        m.m[2][2] = zaxis.z;
        m.m[3][2] = -zaxis.dot(eye);

        m.m[3][3] = 1.0;
        m
    }

    /// Left-handed perspective projection (D3DXMatrixPerspectiveFovLH).
    /// Maps view z in `[zn, zf]` to clip z in `[0, w]`.
    pub fn perspective(fovy: f32, aspect: f32, zn: f32, zf: f32) -> Matrix {
        let fax = 1.0 / (fovy * 0.5).tan();
        let mut m = Matrix::zero();
        m.m[0][0] = fax / aspect;
        m.m[1][1] = fax;
        m.m[2][2] = zf / (zf - zn);
        m.m[3][2] = -zn * zf / (zf - zn);
        m.m[2][3] = 1.0;
        m
    }
}

impl Add for Matrix {
    type Output = Matrix;
    fn add(self, other: Matrix) -> Matrix {
        let mut c = Matrix::zero();
        for i in 0..4 {
            for j in 0..4 {
                c.m[i][j] = self.m[i][j] + other.m[i][j];
            }
        }
        c
    }
}

impl Sub for Matrix {
    type Output = Matrix;
    fn sub(self, other: Matrix) -> Matrix {
        let mut c = Matrix::zero();
        for i in 0..4 {
            for j in 0..4 {
                c.m[i][j] = self.m[i][j] - other.m[i][j];
            }
        }
        c
    }
}

impl Mul for Matrix {
    type Output = Matrix;
    fn mul(self, other: Matrix) -> Matrix {
        let mut c = Matrix::zero();
        for i in 0..4 {
            for j in 0..4 {
                c.m[j][i] = self.m[j][0] * other.m[0][i]
                    + self.m[j][1] * other.m[1][i]
                    + self.m[j][2] * other.m[2][i]
                    + self.m[j][3] * other.m[3][i];
            }
        }
        c
    }
}
