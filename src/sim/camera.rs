/// Follow camera.
///
/// Each frame the camera moves a fixed fraction of the way toward
/// `target + offset`, which gives exponential smoothing and a slightly
/// lagging follow. The look-at point is the raw target, never smoothed.
///
/// `focus` is the camera position with the offset taken back out: the
/// ground point the smoothed camera hovers over. A top-down view centers
/// on it, so the lag shows on screen.

use crate::config::CameraConfig;
use crate::domain::math::Vec3;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Always `position - offset`.
    pub focus: Vec3,
}

#[derive(Clone, Debug)]
pub struct CameraRig {
    pose: CameraPose,
    offset: Vec3,
    blend: f32,
}

impl CameraRig {
    /// Camera already resting at its follow position for `target`.
    pub fn new(cfg: &CameraConfig, target: Vec3) -> Self {
        let mut rig = CameraRig {
            pose: CameraPose { position: Vec3::zeros(), look_at: target, focus: target },
            offset: cfg.offset,
            blend: cfg.blend,
        };
        rig.snap_to(target);
        rig
    }

    pub fn desired_position(&self, target: Vec3) -> Vec3 {
        target + self.offset
    }

    /// One smoothing step. Runs every frame whatever the session state.
    pub fn follow(&mut self, target: Vec3) -> CameraPose {
        let desired = self.desired_position(target);
        self.pose.position = self.pose.position.lerp(&desired, self.blend);
        self.pose.look_at = target;
        self.pose.focus = self.pose.position - self.offset;
        self.pose
    }

    /// Jump straight to the follow position, no smoothing.
    pub fn snap_to(&mut self, target: Vec3) {
        self.pose.position = self.desired_position(target);
        self.pose.look_at = target;
        self.pose.focus = target;
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::math::vec3;
    use approx::assert_relative_eq;

    fn rig_at(target: Vec3) -> CameraRig {
        CameraRig::new(&CameraConfig::default(), target)
    }

    #[test]
    fn starts_at_offset_from_target() {
        let rig = rig_at(vec3(-3.0, 0.5, 0.0));
        assert_relative_eq!(rig.pose().position, vec3(-3.0, 10.5, 10.0));
        assert_relative_eq!(rig.pose().look_at, vec3(-3.0, 0.5, 0.0));
    }

    #[test]
    fn one_step_covers_blend_fraction_of_gap() {
        let mut rig = rig_at(vec3(0.0, 0.0, 0.0));
        let pose = rig.follow(vec3(10.0, 0.0, 0.0));
        // desired x = 10, start x = 0, blend 0.1
        assert_relative_eq!(pose.position, vec3(1.0, 10.0, 10.0), epsilon = 1e-5);
    }

    #[test]
    fn look_at_is_not_smoothed() {
        let mut rig = rig_at(vec3(0.0, 0.0, 0.0));
        let pose = rig.follow(vec3(4.0, 0.5, -2.0));
        assert_eq!(pose.look_at, vec3(4.0, 0.5, -2.0));
    }

    #[test]
    fn converges_on_a_still_target() {
        let mut rig = rig_at(vec3(0.0, 0.0, 0.0));
        let target = vec3(5.0, 0.5, -5.0);
        for _ in 0..200 {
            rig.follow(target);
        }
        assert_relative_eq!(rig.pose().position, target + vec3(0.0, 10.0, 10.0), epsilon = 1e-3);
    }

    #[test]
    fn lags_behind_a_moving_target() {
        let mut rig = rig_at(vec3(0.0, 0.5, 0.0));
        let mut x = 0.0;
        for _ in 0..30 {
            x += 0.15;
            rig.follow(vec3(x, 0.5, 0.0));
        }
        let cam_x = rig.pose().position.x;
        assert!(cam_x > 0.0 && cam_x < x);
    }

    #[test]
    fn focus_trails_the_target_on_the_ground() {
        let mut rig = rig_at(vec3(0.0, 0.5, 0.0));
        assert_eq!(rig.pose().focus, vec3(0.0, 0.5, 0.0));

        let pose = rig.follow(vec3(2.0, 0.5, 0.0));
        assert_relative_eq!(pose.focus, vec3(0.2, 0.5, 0.0), epsilon = 1e-5);
        assert_relative_eq!(pose.focus, pose.position - vec3(0.0, 10.0, 10.0), epsilon = 1e-5);
        assert!(pose.focus.x < pose.look_at.x);
    }

    #[test]
    fn blend_of_one_is_rigid() {
        let cfg = CameraConfig { blend: 1.0, ..CameraConfig::default() };
        let mut rig = CameraRig::new(&cfg, vec3(0.0, 0.0, 0.0));
        let pose = rig.follow(vec3(3.0, 0.0, 3.0));
        assert_relative_eq!(pose.position, vec3(3.0, 10.0, 13.0));
    }
}
