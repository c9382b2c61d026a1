//! Fixed perspective camera looking at the sphere.

use glam::{Mat4, Vec3};

use crate::params::RenderConfig;

/// View and projection for one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
}

impl CameraMatrices {
    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Camera on the +Z axis, always looking at the origin
pub struct CameraSystem {
    eye: Vec3,
    target: Vec3,
    fov_degrees: f32,
    near_plane: f32,
    far_plane: f32,
    aspect_ratio: f32,
}

impl CameraSystem {
    /// Create camera from render configuration
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, config.camera_distance),
            target: Vec3::ZERO,
            fov_degrees: config.fov_degrees,
            near_plane: config.near_plane,
            far_plane: config.far_plane,
            aspect_ratio: config.aspect_ratio(),
        }
    }

    /// Recompute the projection aspect for a new viewport size.
    ///
    /// Zero-sized viewports (minimized windows) keep the previous aspect.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// Point the camera at `target` (the sphere's position)
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Create view and projection matrices for rendering
    pub fn matrices(&self) -> CameraMatrices {
        // Always keep Y as up vector (camera never rolls)
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::Y);
        let projection = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect_ratio,
            self.near_plane,
            self.far_plane,
        );

        CameraMatrices { view, projection }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_proj_matrix_generation() {
        let camera = CameraSystem::new(&RenderConfig::default());
        let matrices = camera.matrices();

        // Matrix should not be identity or zero
        assert_ne!(matrices.view_proj(), Mat4::IDENTITY);
        assert_ne!(matrices.view_proj(), Mat4::ZERO);
        assert!(matrices.view_proj().is_finite());
    }

    #[test]
    fn test_origin_is_in_front_of_camera() {
        let camera = CameraSystem::new(&RenderConfig::default());
        let view_space = camera.matrices().view.transform_point3(Vec3::ZERO);

        // Right-handed view space looks down -Z
        assert!((view_space.z + 4.0).abs() < 1e-5);
        assert!(view_space.x.abs() < 1e-6 && view_space.y.abs() < 1e-6);
    }

    #[test]
    fn test_viewport_resize_updates_aspect() {
        let mut camera = CameraSystem::new(&RenderConfig::default());
        camera.set_viewport(800, 800);
        assert_eq!(camera.aspect_ratio(), 1.0);

        // Minimized window keeps the last aspect
        camera.set_viewport(0, 0);
        assert_eq!(camera.aspect_ratio(), 1.0);
    }
}
