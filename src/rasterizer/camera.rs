//! Look-at camera

use serde::{Deserialize, Serialize};

use super::device::Device;
use super::math::{Matrix, Point, Vector};
use super::shader::UNIFORM_EYE;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub eye: Point,
    pub at: Point,
    pub up: Vector,
}

impl Camera {
    /// Camera on the diagonal (d, d, d) looking at the origin, z up
    pub fn orbit(distance: f32) -> Self {
        Self {
            eye: Vector::point(distance, distance, distance),
            at: Vector::point(0.0, 0.0, 0.0),
            up: Vector::direction(0.0, 0.0, 1.0),
        }
    }

    pub fn view_matrix(&self) -> Matrix {
        Matrix::look_at(self.eye, self.at, self.up)
    }

    /// Install the view matrix and eye position on the device
    pub fn apply(&self, device: &mut Device) {
        device.transform.view = self.view_matrix();
        device.transform.update();
        device.set_uniform_vector(UNIFORM_EYE, self.eye);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::orbit(5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::types::PixelFormat;

    #[test]
    fn test_apply_sets_view_and_eye() {
        let mut device = Device::new(32, 32, None, PixelFormat::Rgba8888);
        let camera = Camera::orbit(3.0);
        camera.apply(&mut device);

        assert_eq!(device.uniforms().vectors[UNIFORM_EYE], camera.eye);
        let target = device.transform.view.apply(camera.at);
        assert!(target.x.abs() < 1e-5 && target.y.abs() < 1e-5);
        assert!((target.z - 27.0f32.sqrt()).abs() < 1e-4);
    }
}
