//! Perspective camera, orbit controls and the camera uniform shared by all pipelines.

use std::{collections::HashMap, f32::consts::PI};

use cgmath::{
    Deg, InnerSpace, Matrix, Matrix3, Matrix4, Point3, Rad, SquareMatrix, Vector2,
    Vector3, perspective,
};
use wgpu::util::DeviceExt;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

use crate::config::{CameraConfig, ControlsConfig};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the polar angle off the poles where the view matrix degenerates.
const EPS: f32 = 1e-6;
/// Closest the camera may get to its target, whatever `min_distance` says.
/// Dollying below this would collapse the offset and lose the orbit.
const MIN_RADIUS: f32 = 1e-4;
/// Farthest the camera may get, keeping squared distances finite in f32.
const MAX_RADIUS: f32 = 1e15;
/// Pixels per line for wheels reporting whole lines.
const LINE_HEIGHT: f32 = 40.0;

#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fovy: Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self {
            position: Point3::from(config.position),
            target: Point3::from(config.target),
            up: Vector3::unit_y(),
            fovy: Deg(config.fov),
            aspect,
            znear: config.near,
            zfar: config.far,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Takes effect once [`Self::update_projection_matrix`] runs.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    /// Maps clip space back to world space directions, ignoring the camera position.
    pub fn sky_matrix(&self) -> Matrix4<f32> {
        let view = self.view_matrix();
        let rotation = Matrix4::from(Matrix3::from_cols(
            view.x.truncate(),
            view.y.truncate(),
            view.z.truncate(),
        ));
        (self.projection * rotation)
            .invert()
            .unwrap_or_else(Matrix4::identity)
    }
}

/// Spherical coordinates around the y axis: `phi` from +y, `theta` around it from +z.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vector3<f32>) -> Self {
        let radius = v.magnitude();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
            theta: v.x.atan2(v.z),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let s = self.phi.sin() * self.radius;
        Vector3::new(s * self.theta.sin(), self.phi.cos() * self.radius, s * self.theta.cos())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    None,
    Rotate,
    Dolly,
    Pan,
    TouchRotate,
    TouchDollyPan,
}

/// Orbits the camera around its target.
///
/// Input only accumulates deltas; [`OrbitControls::update`] applies them once
/// per frame, decaying them over several frames when damping is enabled.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enabled: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vector3<f32>,
    /// Pan in pixels, converted to world units against the camera in `update`.
    pending_pan: Vector2<f32>,
    gesture: Gesture,
    pointer: Option<Vector2<f32>>,
    touches: HashMap<u64, Vector2<f32>>,
    viewport_height: f32,
    /// Orbit after the last update, used when the offset degenerates.
    last: Spherical,
}

impl OrbitControls {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            enabled: true,
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
            pending_pan: Vector2::new(0.0, 0.0),
            gesture: Gesture::None,
            pointer: None,
            touches: HashMap::new(),
            viewport_height: 1.0,
            last: Spherical {
                radius: MIN_RADIUS,
                phi: PI * 0.5,
                theta: 0.0,
            },
        }
    }

    /// Logical height of the canvas, the reference for pixel to angle conversion.
    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(1.0);
    }

    fn zoom_scale(&self) -> f32 {
        0.95_f32.powf(self.zoom_speed)
    }

    fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    fn dolly_in(&mut self, scale: f32) {
        self.scale *= scale;
    }

    fn dolly_out(&mut self, scale: f32) {
        self.scale /= scale;
    }

    fn rotate_by_pixels(&mut self, delta: Vector2<f32>) {
        let full_turn = 2.0 * PI * self.rotate_speed / self.viewport_height;
        self.rotate_left(delta.x * full_turn);
        self.rotate_up(delta.y * full_turn);
    }

    fn pan_by_pixels(&mut self, delta: Vector2<f32>) {
        self.pending_pan += delta * self.pan_speed;
    }

    pub fn pointer_down(&mut self, button: MouseButton) {
        if !self.enabled {
            return;
        }
        self.gesture = match button {
            MouseButton::Left => Gesture::Rotate,
            MouseButton::Middle => Gesture::Dolly,
            MouseButton::Right => Gesture::Pan,
            _ => Gesture::None,
        };
    }

    pub fn pointer_up(&mut self) {
        if matches!(self.gesture, Gesture::Rotate | Gesture::Dolly | Gesture::Pan) {
            self.gesture = Gesture::None;
        }
    }

    pub fn pointer_move(&mut self, position: Vector2<f32>) {
        let previous = self.pointer.replace(position);
        let Some(previous) = previous else { return };
        if !self.enabled {
            return;
        }
        let delta = position - previous;
        match self.gesture {
            Gesture::Rotate => self.rotate_by_pixels(delta),
            Gesture::Pan => self.pan_by_pixels(delta),
            Gesture::Dolly => {
                if delta.y > 0.0 {
                    self.dolly_out(self.zoom_scale());
                } else if delta.y < 0.0 {
                    self.dolly_in(self.zoom_scale());
                }
            }
            _ => {}
        }
    }

    /// Positive `lines` scroll away from the user and move the camera closer.
    pub fn wheel(&mut self, lines: f32) {
        if !self.enabled {
            return;
        }
        if lines > 0.0 {
            self.dolly_in(self.zoom_scale());
        } else if lines < 0.0 {
            self.dolly_out(self.zoom_scale());
        }
    }

    pub fn touch_start(&mut self, id: u64, position: Vector2<f32>) {
        self.touches.insert(id, position);
        self.gesture = match self.touches.len() {
            1 => Gesture::TouchRotate,
            2 => Gesture::TouchDollyPan,
            _ => Gesture::None,
        };
    }

    pub fn touch_move(&mut self, id: u64, position: Vector2<f32>) {
        let before = self.two_finger_span();
        let Some(previous) = self.touches.insert(id, position) else {
            return;
        };
        if !self.enabled {
            return;
        }
        match self.gesture {
            Gesture::TouchRotate => self.rotate_by_pixels(position - previous),
            Gesture::TouchDollyPan => {
                if let (Some((d0, m0)), Some((d1, m1))) = (before, self.two_finger_span()) {
                    if d0 > 0.0 && d1 > 0.0 {
                        self.dolly_out((d1 / d0).powf(self.zoom_speed));
                    }
                    self.pan_by_pixels(m1 - m0);
                }
            }
            _ => {}
        }
    }

    pub fn touch_end(&mut self, id: u64) {
        self.touches.remove(&id);
        self.gesture = match self.touches.len() {
            1 => Gesture::TouchRotate,
            _ => Gesture::None,
        };
    }

    /// Finger distance and midpoint while exactly two fingers are down.
    fn two_finger_span(&self) -> Option<(f32, Vector2<f32>)> {
        if self.touches.len() != 2 {
            return None;
        }
        let mut points = self.touches.values();
        let (a, b) = (*points.next()?, *points.next()?);
        Some(((a - b).magnitude(), (a + b) * 0.5))
    }

    /// Route a window event. Returns true when the event was consumed.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_move(Vector2::new(position.x as f32, position.y as f32));
                self.gesture != Gesture::None
            }
            WindowEvent::MouseInput { state, button, .. } => {
                match state {
                    ElementState::Pressed => self.pointer_down(*button),
                    ElementState::Released => self.pointer_up(),
                }
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / LINE_HEIGHT,
                };
                self.wheel(lines);
                true
            }
            WindowEvent::Touch(touch) => {
                let position = Vector2::new(touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started => self.touch_start(touch.id, position),
                    TouchPhase::Moved => self.touch_move(touch.id, position),
                    TouchPhase::Ended | TouchPhase::Cancelled => self.touch_end(touch.id),
                }
                true
            }
            _ => false,
        }
    }

    /// Apply pending input to `camera`. Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - camera.target;
        let mut spherical = match Spherical::from_offset(offset) {
            s if s.radius > 0.0 => s,
            // camera sits on its target, keep the previous orbit
            _ => self.last,
        };

        if self.pending_pan != Vector2::new(0.0, 0.0) {
            self.resolve_pan(camera, offset.magnitude());
        }

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.spherical_delta.theta * step;
        spherical.phi += self.spherical_delta.phi * step;
        spherical.phi = spherical
            .phi
            .max(self.min_polar_angle)
            .min(self.max_polar_angle)
            .clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale)
            .max(self.min_distance.max(MIN_RADIUS))
            .min(self.max_distance.min(MAX_RADIUS));
        self.last = spherical;

        let target = camera.target + self.pan_offset * step;
        let position = target + spherical.to_offset();

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vector3::new(0.0, 0.0, 0.0);
        }
        self.scale = 1.0;

        let moved = (position - camera.position).magnitude2() > EPS
            || (target - camera.target).magnitude2() > EPS;
        camera.position = position;
        camera.target = target;
        moved
    }

    /// Convert pixel pan into a world space offset along the camera's screen axes.
    fn resolve_pan(&mut self, camera: &PerspectiveCamera, distance: f32) {
        let view = camera.view_matrix().transpose();
        let right = view.x.truncate();
        let up = view.y.truncate();
        let half_fov = Rad::from(camera.fovy).0 * 0.5;
        let world_per_pixel = 2.0 * distance * half_fov.tan() / self.viewport_height;
        self.pan_offset += (-right * self.pending_pan.x + up * self.pending_pan.y) * world_per_pixel;
        self.pending_pan = Vector2::new(0.0, 0.0);
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// Inverse of the rotation-only view projection, for the environment lookup.
    pub sky: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            view: Matrix4::identity().into(),
            sky: Matrix4::identity().into(),
            eye: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn update_view_proj(&mut self, camera: &PerspectiveCamera) {
        self.view_proj = camera.view_projection().into();
        self.view = camera.view_matrix().into();
        self.sky = camera.sky_matrix().into();
        self.eye = camera.position.to_homogeneous().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera, controls and the GPU side of the camera uniform.
#[derive(Debug)]
pub struct CameraRig {
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

pub fn camera_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
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
    })
}

impl CameraRig {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        camera: &CameraConfig,
        controls: &ControlsConfig,
        aspect: f32,
    ) -> Self {
        let camera = PerspectiveCamera::new(camera, aspect);
        let controls = OrbitControls::new(controls);

        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controls,
            uniform,
            buffer,
            bind_group,
        }
    }

    /// Run the controls and upload the resulting matrices.
    pub fn update(&mut self, queue: &wgpu::Queue) {
        self.controls.update(&mut self.camera);
        self.uniform.update_view_proj(&self.camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{EuclideanSpace, Vector4};

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(&CameraConfig::default(), 1.5)
    }

    fn undamped() -> OrbitControls {
        OrbitControls::new(&ControlsConfig {
            enable_damping: false,
            ..Default::default()
        })
    }

    fn distance(camera: &PerspectiveCamera) -> f32 {
        (camera.position - camera.target).magnitude()
    }

    #[test]
    fn projection_changes_only_after_update() {
        let mut camera = camera();
        let before = camera.projection_matrix();
        camera.set_aspect(0.5);
        assert_eq!(camera.projection_matrix(), before);
        camera.update_projection_matrix();
        assert_ne!(camera.projection_matrix(), before);
        assert_eq!(camera.aspect, 0.5);
    }

    #[test]
    fn target_projects_to_the_center_of_the_screen() {
        let camera = camera();
        let clip = camera.view_projection() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn spherical_round_trip_preserves_offset() {
        let offset = Vector3::new(1.0, 1.0, 2.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).magnitude() < 1e-5);
    }

    #[test]
    fn update_without_input_keeps_the_camera() {
        let mut camera = camera();
        let start = camera.position;
        let mut controls = OrbitControls::new(&ControlsConfig::default());
        assert!(!controls.update(&mut camera));
        assert!((camera.position - start).magnitude() < 1e-5);
    }

    #[test]
    fn dragging_orbits_at_constant_distance() {
        let mut camera = camera();
        let radius = distance(&camera);
        let mut controls = undamped();
        controls.set_viewport_height(600.0);
        controls.pointer_move(Vector2::new(100.0, 100.0));
        controls.pointer_down(MouseButton::Left);
        controls.pointer_move(Vector2::new(250.0, 100.0));
        controls.pointer_up();

        let start = camera.position;
        assert!(controls.update(&mut camera));
        assert!((distance(&camera) - radius).abs() < 1e-4);
        assert!((camera.position.y - start.y).abs() < 1e-4);
        // the delta is consumed in one step without damping
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(&ControlsConfig::default());
        controls.set_viewport_height(600.0);
        controls.pointer_move(Vector2::new(0.0, 0.0));
        controls.pointer_down(MouseButton::Left);
        controls.pointer_move(Vector2::new(300.0, 0.0));
        controls.pointer_up();

        let theta = |c: &PerspectiveCamera| Spherical::from_offset(c.position - c.target).theta;
        let start = theta(&camera);
        controls.update(&mut camera);
        let first = (theta(&camera) - start).abs();
        // rotate_left(pi) scaled by the damping factor
        assert!((first - PI * 0.05).abs() < 1e-4);
        controls.update(&mut camera);
        let second = (theta(&camera) - start).abs() - first;
        assert!((second - first * 0.95).abs() < 1e-4);
    }

    #[test]
    fn wheel_dollies_and_respects_distance_limits() {
        let mut camera = camera();
        let radius = distance(&camera);
        let mut controls = undamped();
        controls.wheel(1.0);
        controls.update(&mut camera);
        assert!((distance(&camera) - radius * 0.95).abs() < 1e-4);

        controls.max_distance = 3.0;
        for _ in 0..50 {
            controls.wheel(-1.0);
            controls.update(&mut camera);
        }
        assert!((distance(&camera) - 3.0).abs() < 1e-4);
    }

    #[test]
    fn zooming_out_recovers_after_zooming_all_the_way_in() {
        let mut camera = camera();
        let radius = distance(&camera);
        let mut controls = undamped();
        for _ in 0..2000 {
            controls.wheel(1.0);
            controls.update(&mut camera);
        }
        assert!(distance(&camera) > 0.0);

        for _ in 0..2200 {
            controls.wheel(-1.0);
            controls.update(&mut camera);
        }
        assert!(distance(&camera) > radius);
        assert!(camera.view_matrix().x.x.is_finite());
    }

    #[test]
    fn camera_on_its_target_keeps_the_last_orbit() {
        let mut camera = camera();
        let mut controls = undamped();
        controls.update(&mut camera);
        camera.position = camera.target;
        controls.wheel(-1.0);
        controls.update(&mut camera);
        assert!(distance(&camera) > 0.0);
    }

    #[test]
    fn polar_angle_never_reaches_the_pole() {
        let mut camera = camera();
        let mut controls = undamped();
        controls.set_viewport_height(100.0);
        controls.pointer_move(Vector2::new(0.0, 0.0));
        controls.pointer_down(MouseButton::Left);
        controls.pointer_move(Vector2::new(0.0, 1000.0));
        controls.update(&mut camera);
        let offset = camera.position - camera.target;
        assert!(offset.x.abs() + offset.z.abs() > 0.0);
        assert!(camera.view_matrix().x.x.is_finite());
    }

    #[test]
    fn right_drag_pans_the_target() {
        let mut camera = camera();
        let radius = distance(&camera);
        let mut controls = undamped();
        controls.set_viewport_height(600.0);
        controls.pointer_move(Vector2::new(0.0, 0.0));
        controls.pointer_down(MouseButton::Right);
        controls.pointer_move(Vector2::new(50.0, 0.0));
        assert!(controls.update(&mut camera));
        assert!(camera.target.to_vec().magnitude() > 0.0);
        assert!((distance(&camera) - radius).abs() < 1e-4);
    }

    #[test]
    fn pinching_out_moves_closer() {
        let mut camera = camera();
        let radius = distance(&camera);
        let mut controls = undamped();
        controls.touch_start(1, Vector2::new(100.0, 100.0));
        controls.touch_start(2, Vector2::new(200.0, 100.0));
        controls.touch_move(2, Vector2::new(300.0, 100.0));
        controls.touch_end(2);
        controls.touch_end(1);
        controls.update(&mut camera);
        assert!(distance(&camera) < radius);
    }

    #[test]
    fn sky_matrix_maps_screen_center_to_view_direction() {
        let camera = camera();
        let far = camera.sky_matrix() * Vector4::new(0.0, 0.0, 1.0, 1.0);
        let dir = (far.truncate() / far.w).normalize();
        let forward = (camera.target - camera.position).normalize();
        assert!((dir - forward).magnitude() < 1e-3);
    }
}
