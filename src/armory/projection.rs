use bevy::math::{Mat4, Vec2, Vec3, Vec4};

use super::parts::slot::SlotKind;

// ── Camera ──────────────────────────────────────────────────────────

/// Perspective camera used to place slot markers over the rendered model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraModel {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraModel {
    /// Camera looking along `forward` from `position`, e.g. from a `GlobalTransform`.
    pub fn looking(position: Vec3, forward: Vec3, up: Vec3, fov_y: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: position + forward,
            up,
            fov_y,
            near,
            far,
        }
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh_gl(self.fov_y.to_radians(), aspect, self.near, self.far);
        let view = Mat4::look_at_rh(self.position, self.target, self.up);
        proj * view
    }
}

// ── Surfaces ────────────────────────────────────────────────────────

/// Pixel bounds of the render surface inside the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Surface {
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// Window size in pixels. Anchors outside it are hidden.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenAnchor {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
}

impl ScreenAnchor {
    pub const HIDDEN: Self = Self {
        x: 0.0,
        y: 0.0,
        visible: false,
    };
}

// ── Projection ──────────────────────────────────────────────────────

/// World point to surface pixels (origin top-left). `None` when the point is
/// behind the camera or the surface has no area.
pub fn project_point(point: Vec3, camera: &CameraModel, surface: &Surface) -> Option<Vec2> {
    if surface.width <= 0.0 || surface.height <= 0.0 {
        return None;
    }
    let clip = camera.view_projection(surface.aspect()) * Vec4::new(point.x, point.y, point.z, 1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(Vec2::new(
        (ndc.x + 1.0) / 2.0 * surface.width + surface.left,
        (1.0 - ndc.y) / 2.0 * surface.height + surface.top,
    ))
}

/// Marker anchor for a slot: the projected point nudged by the slot type's pixel
/// offset. Out-of-viewport anchors are hidden, never clamped.
pub fn project_slot(
    point: Vec3,
    camera: &CameraModel,
    surface: &Surface,
    viewport: &Viewport,
    slot_id: &str,
) -> ScreenAnchor {
    let Some(p) = project_point(point, camera, surface) else {
        return ScreenAnchor::HIDDEN;
    };
    let (dx, dy) = SlotKind::from_slot_id(slot_id).pixel_offset();
    let x = p.x + dx;
    let y = p.y + dy;
    ScreenAnchor {
        x,
        y,
        visible: x > 0.0 && x < viewport.width && y > 0.0 && y < viewport.height,
    }
}
