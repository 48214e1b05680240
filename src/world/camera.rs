use glam::{Vec2, Vec3, vec2};

/// Near-plane distance in map units.
const NEAR_PLANE: f32 = 0.05;

/// Player view-point in world space.
///
/// * Only **yaw** (heading) is simulated – no pitch or roll.
/// * `z` holds eye height above the floor of the camera's sector, not
///   absolute altitude.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub pos: Vec3, // x,y in map-units; z = eye height above floor
    pub yaw: f32,  // radians (0 = +x, counter-clockwise)
    pub fov: f32,  // horizontal FoV (radians)
}

impl Camera {
    /// Create a new camera at `pos`, facing `yaw`, with horizontal FoV `fov`.
    pub fn new(pos: Vec3, yaw: f32, fov: f32) -> Self {
        Self { pos, yaw, fov }
    }

    #[inline]
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    /// Transform a map point `p` into view space:
    ///  .x = lateral offset (+ right)
    ///  .y = depth along the forward axis
    #[inline]
    pub fn to_view(&self, p: Vec2) -> Vec2 {
        let d = p - self.pos.truncate();
        vec2(d.dot(self.right()), d.dot(self.forward()))
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit vector pointing where the camera looks on the map plane.
    #[inline(always)]
    pub fn forward(self) -> Vec2 {
        let (s, c) = self.yaw.sin_cos();
        Vec2::new(c, s)
    }

    /// Unit vector pointing to the camera's right (clockwise from forward).
    #[inline(always)]
    pub fn right(self) -> Vec2 {
        -self.forward().perp()
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Move by `forward` units and `side` (strafe, + right), preserving eye-height.
    pub fn step(&mut self, forward: f32, side: f32) {
        let delta = self.forward() * forward + self.right() * side;
        self.pos.x += delta.x;
        self.pos.y += delta.y;
    }

    /// Rotate around the vertical axis (positive = turn left).
    pub fn turn(&mut self, delta_yaw: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
    }

    /*───────────────── projection / frustum helpers ─────────────────*/

    /// Pixel-per-map-unit scale for viewport width `w`.
    ///
    /// ```text
    /// focal = w / (2 * tan(fov/2))
    /// ```
    #[inline]
    pub fn screen_scale(self, w: usize) -> f32 {
        (w as f32) * 0.5 / (self.fov * 0.5).tan()
    }

    #[inline(always)]
    pub fn near(self) -> f32 {
        NEAR_PLANE
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn forward_and_right_are_orthonormal() {
        let cam = Camera::new(Vec3::ZERO, 0.3, 1.57);
        let f = cam.forward();
        let r = cam.right();
        assert!((f.length() - 1.0).abs() < 1e-5);
        assert!((r.length() - 1.0).abs() < 1e-5);
        assert!((f.dot(r)).abs() < 1e-5);
    }

    #[test]
    fn screen_scale_at_90_deg() {
        let cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_2);
        assert!((cam.screen_scale(640) - 320.0).abs() < 1e-3);
    }

    #[test]
    fn to_view_axes_align() {
        let cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_2);
        // straight ahead at (10, 0) → (lateral=0, depth=10)
        assert!((cam.to_view(vec2(10.0, 0.0)) - vec2(0.0, 10.0)).length() < 1e-5);
        // facing +x, the point (0, -5) is on the right
        assert!((cam.to_view(vec2(0.0, -5.0)) - vec2(5.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn to_view_rotated_yaw() {
        let cam = Camera::new(Vec3::new(1.0, 1.0, 0.0), FRAC_PI_2, FRAC_PI_2);
        // yaw = 90°: forward is +y
        assert!((cam.to_view(vec2(1.0, 11.0)) - vec2(0.0, 10.0)).length() < 1e-5);
        assert!((cam.to_view(vec2(3.0, 1.0)) - vec2(2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn step_and_turn() {
        let mut cam = Camera::new(Vec3::new(0.0, 0.0, 4.0), 0.0, FRAC_PI_2);
        cam.step(2.0, 1.0);
        assert!((cam.pos.truncate() - vec2(2.0, -1.0)).length() < 1e-5);
        assert_eq!(cam.pos.z, 4.0);
        cam.turn(-FRAC_PI_2);
        assert!((cam.yaw - 3.0 * FRAC_PI_2).abs() < 1e-5);
    }
}
