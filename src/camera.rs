//! Camera types, orbit controller and uniforms for view/projection.
//!
//! The camera orbits a target point. [`OrbitController`] owns the spherical
//! coordinates (yaw, pitch, distance) plus the damped input velocities and
//! writes the camera position each frame; the camera itself only knows where
//! it sits and what it looks at.

use instant::Duration;
use wgpu::util::DeviceExt;
use winit::event::{MouseScrollDelta, WindowEvent};

use cgmath::{InnerSpace, Point3, Rad, Vector3};

/// Converts the OpenGL clip-space z range [-1, 1] to WGPU's [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// The viewer camera: a position looking at a target.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P) -> Self {
        Self {
            position: position.into(),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

/// Perspective projection parameters.
#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Track a viewport change. The aspect ratio becomes exactly
    /// width / height.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Orbit-style camera controller with inertial damping.
///
/// Mouse drags add angular velocity, the scroll wheel adds zoom velocity,
/// and both decay exponentially so releasing the mouse lets the camera
/// glide to a stop. Auto-rotate adds a constant yaw drift, one orbit every
/// `60 / auto_rotate_speed` seconds.
#[derive(Clone, Debug)]
pub struct OrbitController {
    target: Point3<f32>,
    distance: f32,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
    rotate_speed: f32,
    damping: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
}

impl OrbitController {
    const MIN_DISTANCE: f32 = 0.5;
    // Keep the camera off the poles so `up` stays well defined.
    const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.05;

    pub fn new(distance: f32, rotate_speed: f32, damping: f32) -> Self {
        Self {
            target: Point3::new(0.0, 0.0, 0.0),
            distance: distance.max(Self::MIN_DISTANCE),
            yaw: Rad(std::f32::consts::FRAC_PI_2),
            pitch: Rad(0.0),
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
            rotate_speed,
            damping,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
        }
    }

    /// Re-aim the orbit at a new world-space point.
    ///
    /// The distance to the target is preserved; the camera swings, it does
    /// not jump.
    pub fn set_target<P: Into<Point3<f32>>>(&mut self, target: P) {
        self.target = target.into();
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Feed a mouse drag delta (pixels).
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.yaw_velocity -= dx as f32 * self.rotate_speed;
        self.pitch_velocity += dy as f32 * self.rotate_speed;
    }

    /// React to scroll events; everything else is ignored.
    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            let scroll = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(position) => position.y as f32 / 50.0,
            };
            self.zoom_velocity -= scroll;
        }
    }

    /// Advance damping and write the camera's new position.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let dt = dt.as_secs_f32();

        if self.auto_rotate {
            // Matches the "one orbit every 60/speed seconds" convention.
            self.yaw += Rad(self.auto_rotate_speed * std::f32::consts::TAU / 60.0 * dt);
        }

        self.yaw += Rad(self.yaw_velocity * dt);
        self.pitch += Rad(self.pitch_velocity * dt);
        self.distance *= 1.0 + self.zoom_velocity * dt;

        self.pitch.0 = self.pitch.0.clamp(-Self::MAX_PITCH, Self::MAX_PITCH);
        self.distance = self.distance.max(Self::MIN_DISTANCE);

        // Exponential decay towards rest
        let decay = (-self.damping * dt).exp();
        self.yaw_velocity *= decay;
        self.pitch_velocity *= decay;
        self.zoom_velocity *= decay;

        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let offset = Vector3::new(
            cos_yaw * cos_pitch,
            sin_pitch,
            sin_yaw * cos_pitch,
        ) * self.distance;

        camera.target = self.target;
        camera.position = self.target + offset;
    }
}

/// The camera data as laid out for the shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view: [[f32; 4]; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view: cgmath::Matrix4::identity().into(),
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    /// The view matrix rides along so the sprite shader can recover the
    /// camera's right/up axes for billboarding.
    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        let view = camera.calc_matrix();
        self.view_position = camera.position.to_homogeneous().into();
        self.view = view.into();
        self.view_proj = (projection.calc_matrix() * view).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the renderer needs to bind the camera.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: Camera, controller: OrbitController) -> Self {
        let uniform = CameraUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });
        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn controller() -> OrbitController {
        OrbitController::new(20.0, 0.005, 6.0)
    }

    #[test]
    fn resize_sets_the_exact_aspect_ratio() {
        let mut projection = Projection::new(800, 600, cgmath::Deg(45.0), 0.1, 100.0);
        projection.resize(1920, 1080);
        assert_eq!(projection.aspect(), 1920.0 / 1080.0);
        projection.resize(333, 777);
        assert_eq!(projection.aspect(), 333.0 / 777.0);
    }

    #[test]
    fn update_keeps_the_orbit_distance() {
        let mut camera = Camera::new((0.0, 0.0, 20.0));
        let mut controller = controller();
        controller.auto_rotate = true;
        controller.auto_rotate_speed = 5.0;

        for _ in 0..100 {
            controller.update(&mut camera, Duration::from_millis(16));
            let distance = (camera.position - camera.target).magnitude();
            assert!((distance - 20.0).abs() < EPS);
        }
    }

    #[test]
    fn auto_rotate_moves_the_camera() {
        let mut camera = Camera::new((0.0, 0.0, 20.0));
        let mut controller = controller();
        controller.auto_rotate = true;
        controller.update(&mut camera, Duration::from_millis(500));
        let before = camera.position;
        controller.update(&mut camera, Duration::from_millis(500));
        assert!((camera.position - before).magnitude() > EPS);
    }

    #[test]
    fn drag_velocity_decays_to_rest() {
        let mut camera = Camera::new((0.0, 0.0, 20.0));
        let mut controller = controller();
        controller.handle_mouse(100.0, 0.0);
        // Let the damping run for a while
        for _ in 0..600 {
            controller.update(&mut camera, Duration::from_millis(16));
        }
        let before = camera.position;
        controller.update(&mut camera, Duration::from_millis(16));
        assert!((camera.position - before).magnitude() < 1e-3);
    }

    #[test]
    fn pitch_is_clamped_off_the_poles() {
        let mut camera = Camera::new((0.0, 0.0, 20.0));
        let mut controller = controller();
        // A drag violent enough to flip over the top without the clamp
        controller.handle_mouse(0.0, 1.0e6);
        for _ in 0..60 {
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert!(camera.position.y < 20.0);
        let planar = cgmath::Vector2::new(
            camera.position.x - camera.target.x,
            camera.position.z - camera.target.z,
        );
        assert!(planar.magnitude() > EPS, "camera collapsed onto the pole");
    }

    #[test]
    fn retargeting_preserves_distance() {
        let mut camera = Camera::new((0.0, 0.0, 20.0));
        let mut controller = controller();
        controller.update(&mut camera, Duration::from_millis(16));
        controller.set_target(Point3::new(5.0, 1.0, -2.0));
        controller.update(&mut camera, Duration::from_millis(16));
        let distance = (camera.position - Point3::new(5.0, 1.0, -2.0)).magnitude();
        assert!((distance - 20.0).abs() < EPS);
        assert_eq!(camera.target, Point3::new(5.0, 1.0, -2.0));
    }
}
