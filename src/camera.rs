//! Look-at camera, perspective projection and the camera uniform.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A camera at `position` that re-orients toward `target` once per frame.
///
/// `target` is the camera target other components may move at any time;
/// the cached view matrix only follows it when [`Camera::look_at_target`]
/// runs.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    view: Matrix4<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, T: Into<Point3<f32>>>(position: P, target: T) -> Self {
        let mut camera = Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
            view: Matrix4::from_scale(1.0),
        };
        camera.look_at_target();
        camera
    }

    /// Recomputes the view matrix from the current position and target.
    ///
    /// A target on top of the camera keeps the previous orientation.
    pub fn look_at_target(&mut self) {
        let dir = self.target - self.position;
        if dir.magnitude2() <= f32::EPSILON {
            return;
        }
        self.view = Matrix4::look_at_rh(self.position, self.target, self.up);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.position).normalize()
    }
}

#[derive(Debug, Clone)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
    matrix: Matrix4<f32>,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        let fovy = fovy.into();
        let aspect = width as f32 / height as f32;
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Self {
            aspect,
            fovy,
            znear,
            zfar,
            matrix: OPENGL_TO_WGPU_MATRIX * perspective(fovy, aspect, znear, zfar),
        }
    }

    /// Records the new aspect ratio and rebuilds the matrix.
    ///
    /// Returns `false` for a degenerate size, in which case the previous
    /// matrix stays in place.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.aspect = width as f32 / height as f32;
        if !self.aspect.is_finite() || self.aspect <= 0.0 {
            return false;
        }
        self.matrix =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        true
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        self.matrix
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.matrix() * camera.view_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
