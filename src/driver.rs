//! Frame driver: owns the avatar, its pose and the animators, and advances
//! them once per rendered frame.
//!
//! Also exposes the pose control surface. Every control is guarded on the
//! avatar being loaded; before that (or after a failed load) calls are
//! warned no-ops.

use glam::Vec3;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::animation::{Blink, Breathing, Smile};
use crate::config::Config;
use crate::error::{AvatarError, LoadError};
use crate::pose::PoseSettings;
use crate::skeleton::{classify, Rig, Role, RoleAssignment, Side};

/// A loaded rig together with its classified roles.
#[derive(Debug, Clone)]
pub struct Avatar {
    rig: Rig,
    roles: RoleAssignment,
}

impl Avatar {
    /// Classify the rig's joints.
    pub fn new(rig: Rig) -> Self {
        let roles = classify(&rig);
        Self { rig, roles }
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn roles(&self) -> &RoleAssignment {
        &self.roles
    }

    /// Local Euler rotation (radians) of the joint bound to `role`.
    pub fn euler(&self, role: Role) -> Option<Vec3> {
        self.roles.get(role).map(|id| self.rig.joint(id).euler())
    }
}

/// Outcome of the one-time avatar load.
#[derive(Debug, Clone)]
pub enum LoadState {
    Pending,
    Loaded(Avatar),
    Failed(LoadError),
}

/// Values produced by the last frame, for logging and inspection.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub blink_state: f32,
    pub breath_amount: f32,
    pub smile: f32,
    /// Vertical scale of the [left, right] eye bones
    pub eye_scale_y: Option<[f32; 2]>,
    /// Bound role → local Euler rotation in degrees
    pub joints: BTreeMap<String, [f32; 3]>,
}

pub struct FrameDriver {
    state: LoadState,
    pose: PoseSettings,
    blink: Blink,
    breathing: Breathing,
    smile: Smile,
    frames: u64,
}

fn loaded<'a>(state: &'a mut LoadState, op: &str) -> Result<&'a mut Avatar, AvatarError> {
    match state {
        LoadState::Loaded(avatar) => Ok(avatar),
        _ => {
            tracing::warn!("{}: model is not loaded yet", op);
            Err(AvatarError::NotLoaded)
        }
    }
}

impl FrameDriver {
    pub fn new(config: &Config) -> Self {
        Self::with_blink(config, Blink::new(&config.blink))
    }

    /// Create with a specific blink animator (seeded in tests).
    pub fn with_blink(config: &Config, blink: Blink) -> Self {
        Self {
            state: LoadState::Pending,
            pose: PoseSettings::from_config(&config.pose),
            blink,
            breathing: Breathing::new(&config.breathing),
            smile: Smile::new(&config.smile),
            frames: 0,
        }
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }

    pub fn avatar(&self) -> Option<&Avatar> {
        match &self.state {
            LoadState::Loaded(avatar) => Some(avatar),
            _ => None,
        }
    }

    pub fn pose_settings(&self) -> &PoseSettings {
        &self.pose
    }

    pub fn blink(&self) -> &Blink {
        &self.blink
    }

    pub fn breathing(&self) -> &Breathing {
        &self.breathing
    }

    pub fn smile(&self) -> &Smile {
        &self.smile
    }

    /// Frames animated so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Take ownership of a freshly loaded rig: classify it and apply the static pose.
    pub fn on_loaded(&mut self, rig: Rig) {
        tracing::info!("Setting up pose system...");
        let mut avatar = Avatar::new(rig);
        self.pose.apply_static(&mut avatar.rig, &avatar.roles);
        self.state = LoadState::Loaded(avatar);
        tracing::info!("Pose system initialized: {}", self.pose);
    }

    /// Record a terminal load failure. The driver never animates afterwards.
    pub fn on_load_failed(&mut self, error: LoadError) {
        tracing::error!("Failed to load VRM: {}", error);
        self.state = LoadState::Failed(error);
    }

    /// Advance every animator by `dt` seconds. Does nothing until loaded.
    pub fn tick(&mut self, dt: f32, is_typing: bool) {
        let LoadState::Loaded(avatar) = &mut self.state else {
            return;
        };
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        self.blink.update(dt, &mut avatar.rig, &avatar.roles);
        self.breathing
            .update(dt, &mut avatar.rig, &avatar.roles, self.pose.upper_arm_down);
        self.smile.update(is_typing, avatar.rig.face_mut());
        self.frames += 1;
    }

    /// Re-apply the whole static pose from the current settings.
    pub fn apply_static_pose(&mut self) -> Result<(), AvatarError> {
        let avatar = loaded(&mut self.state, "apply_static_pose")?;
        self.pose.apply_static(&mut avatar.rig, &avatar.roles);
        Ok(())
    }

    /// Set both upper arms: `down` degrees around X, `forward` degrees around Z
    /// (mirrored on the right side).
    pub fn set_upper_arm_pose(&mut self, down_deg: f32, forward_deg: f32) -> Result<(), AvatarError> {
        let avatar = loaded(&mut self.state, "set_upper_arm_pose")?;
        self.pose.upper_arm_down = down_deg.to_radians();
        self.pose.upper_arm_forward = forward_deg.to_radians();
        self.pose.apply_upper_arms(&mut avatar.rig, &avatar.roles);
        tracing::debug!("Upper arm: {}° down, {}° forward", down_deg, forward_deg);
        tracing::info!("Pose: {}", self.pose);
        Ok(())
    }

    pub fn set_lower_arm_rotation(
        &mut self,
        side: Side,
        x_deg: f32,
        y_deg: f32,
        z_deg: f32,
    ) -> Result<(), AvatarError> {
        let avatar = loaded(&mut self.state, "set_lower_arm_rotation")?;
        *self.pose.lower_arm_mut(side) =
            Vec3::new(x_deg.to_radians(), y_deg.to_radians(), z_deg.to_radians());
        self.pose.apply_lower_arm(side, &mut avatar.rig, &avatar.roles);
        tracing::debug!("{} lower arm: X={}° Y={}° Z={}°", side, x_deg, y_deg, z_deg);
        tracing::info!("Pose: {}", self.pose);
        Ok(())
    }

    pub fn set_hand_direction(
        &mut self,
        side: Side,
        x_deg: f32,
        y_deg: f32,
        z_deg: f32,
    ) -> Result<(), AvatarError> {
        let avatar = loaded(&mut self.state, "set_hand_direction")?;
        *self.pose.hand_mut(side) =
            Vec3::new(x_deg.to_radians(), y_deg.to_radians(), z_deg.to_radians());
        self.pose.apply_hand(side, &mut avatar.rig, &avatar.roles);
        tracing::debug!("{} hand: X={}° Y={}° Z={}°", side, x_deg, y_deg, z_deg);
        tracing::info!("Pose: {}", self.pose);
        Ok(())
    }

    /// Re-run every pose control with the current settings.
    pub fn update_all_poses(&mut self) -> Result<(), AvatarError> {
        if !self.is_loaded() {
            return loaded(&mut self.state, "update_all_poses").map(|_| ());
        }

        let pose = self.pose.clone();
        self.set_upper_arm_pose(
            pose.upper_arm_down.to_degrees(),
            pose.upper_arm_forward.to_degrees(),
        )?;
        for side in Side::BOTH {
            let lower = pose.lower_arm(side);
            self.set_lower_arm_rotation(
                side,
                lower.x.to_degrees(),
                lower.y.to_degrees(),
                lower.z.to_degrees(),
            )?;
            let hand = pose.hand(side);
            self.set_hand_direction(
                side,
                hand.x.to_degrees(),
                hand.y.to_degrees(),
                hand.z.to_degrees(),
            )?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let mut joints = BTreeMap::new();
        let mut eye_scale_y = None;

        if let Some(avatar) = self.avatar() {
            for (role, binding) in avatar.roles.iter() {
                let e = avatar.rig.joint(binding.joint).euler();
                joints.insert(
                    role.to_string(),
                    [e.x.to_degrees(), e.y.to_degrees(), e.z.to_degrees()],
                );
            }
            if let (Some(l), Some(r)) = (
                avatar.roles.get(Role::LeftEye),
                avatar.roles.get(Role::RightEye),
            ) {
                eye_scale_y = Some([
                    avatar.rig.joint(l).scale().y,
                    avatar.rig.joint(r).scale().y,
                ]);
            }
        }

        FrameSnapshot {
            frame: self.frames,
            blink_state: self.blink.state(),
            breath_amount: self.breathing.amount(),
            smile: self.smile.current(),
            eye_scale_y,
            joints,
        }
    }
}

/// Measures the time between successive frames.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call; 0 on the first call.
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self
            .last
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::MorphTargets;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPS: f32 = 1e-3;

    fn driver() -> FrameDriver {
        let config = Config::default();
        let blink = Blink::with_rng(&config.blink, StdRng::seed_from_u64(42));
        FrameDriver::with_blink(&config, blink)
    }

    fn scenario_rig() -> Rig {
        let mut rig = Rig::new();
        let hips = rig.add_joint("mixamorig:Hips", None);
        let spine = rig.add_joint("mixamorig:Spine", Some(hips));
        let neck = rig.add_joint("mixamorig:Neck", Some(spine));
        let head = rig.add_joint("mixamorig:Head", Some(neck));
        rig.add_joint("LeftEye", Some(head));
        rig.add_joint("RightEye", Some(head));
        rig.add_joint("mixamorig:LeftUpperArm", Some(spine));
        rig.add_joint("mixamorig:RightUpperArm", Some(spine));
        rig.set_face(MorphTargets::new(
            "Face",
            vec!["Joy".to_string(), "Fcl_EYE_Close".to_string()],
        ));
        rig
    }

    fn assert_deg(actual: f32, expected_deg: f32) {
        assert!(
            (actual.to_degrees() - expected_deg).abs() < EPS,
            "expected {expected_deg}°, got {}°",
            actual.to_degrees()
        );
    }

    #[test]
    fn test_upper_arm_scenario() {
        let mut driver = driver();
        driver.on_loaded(scenario_rig());

        let avatar = driver.avatar().unwrap();
        for role in [
            Role::LeftEye,
            Role::RightEye,
            Role::LeftUpperArm,
            Role::RightUpperArm,
        ] {
            assert!(avatar.roles().contains(role), "{role} missing");
        }

        driver.set_upper_arm_pose(125.0, 79.0).unwrap();

        let avatar = driver.avatar().unwrap();
        let left = avatar.euler(Role::LeftUpperArm).unwrap();
        let right = avatar.euler(Role::RightUpperArm).unwrap();
        assert_deg(left.x, 125.0);
        assert_deg(left.z, 79.0);
        assert_deg(right.x, 125.0);
        assert_deg(right.z, -79.0);
    }

    #[test]
    fn test_static_pose_applied_on_load() {
        let mut driver = driver();
        driver.on_loaded(scenario_rig());

        let left = driver.avatar().unwrap().euler(Role::LeftUpperArm).unwrap();
        assert_deg(left.x, 120.0);
        assert_deg(left.z, 77.0);
    }

    #[test]
    fn test_pose_controls_before_load_are_noops() {
        let mut driver = driver();
        let before = driver.pose_settings().clone();

        assert_eq!(driver.set_upper_arm_pose(90.0, 10.0), Err(AvatarError::NotLoaded));
        assert_eq!(
            driver.set_lower_arm_rotation(Side::Left, 1.0, 2.0, 3.0),
            Err(AvatarError::NotLoaded)
        );
        assert_eq!(
            driver.set_hand_direction(Side::Right, 1.0, 2.0, 3.0),
            Err(AvatarError::NotLoaded)
        );
        assert_eq!(driver.apply_static_pose(), Err(AvatarError::NotLoaded));
        assert_eq!(driver.update_all_poses(), Err(AvatarError::NotLoaded));
        assert_eq!(driver.pose_settings(), &before);
    }

    #[test]
    fn test_failed_load_never_animates() {
        let mut driver = driver();
        driver.on_load_failed(LoadError::Parse("truncated GLB".to_string()));
        for _ in 0..100 {
            driver.tick(0.016, true);
        }
        assert!(matches!(driver.load_state(), LoadState::Failed(_)));
        assert_eq!(driver.frames(), 0);
        assert_eq!(driver.smile().current(), 0.0);
    }

    #[test]
    fn test_lower_arm_and_hand_touch_only_their_side() {
        let mut rig = scenario_rig();
        let spine = rig.find("mixamorig:Spine").unwrap();
        for side in ["Left", "Right"] {
            let fore = rig.add_joint(&format!("mixamorig:{side}ForeArm"), Some(spine));
            rig.add_joint(&format!("mixamorig:{side}Hand"), Some(fore));
        }
        let mut driver = driver();
        driver.on_loaded(rig);

        driver.set_lower_arm_rotation(Side::Left, 10.0, 20.0, 30.0).unwrap();
        driver.set_hand_direction(Side::Right, 0.0, 45.0, 0.0).unwrap();

        let avatar = driver.avatar().unwrap();
        let lower_left = avatar.euler(Role::LeftLowerArm).unwrap();
        assert_deg(lower_left.x, 10.0);
        assert_deg(lower_left.y, 20.0);
        assert_deg(lower_left.z, 30.0);
        assert_eq!(avatar.euler(Role::RightLowerArm).unwrap(), Vec3::ZERO);

        let hand_right = avatar.euler(Role::RightHand).unwrap();
        assert_deg(hand_right.y, 45.0);
        assert_deg(avatar.euler(Role::LeftHand).unwrap().z, 180.0);
    }

    #[test]
    fn test_update_all_poses_resyncs() {
        let mut driver = driver();
        driver.on_loaded(scenario_rig());
        driver.set_upper_arm_pose(100.0, 30.0).unwrap();
        for _ in 0..30 {
            driver.tick(0.016, false);
        }

        driver.update_all_poses().unwrap();

        let left = driver.avatar().unwrap().euler(Role::LeftUpperArm).unwrap();
        assert_deg(left.x, 100.0);
        assert_deg(left.z, 30.0);
    }

    #[test]
    fn test_breathing_overrides_posed_arm_x() {
        let mut driver = driver();
        driver.on_loaded(scenario_rig());
        driver.tick(0.5, false);

        let amount = driver.breathing().amount();
        assert!(amount != 0.0);
        let left = driver.avatar().unwrap().euler(Role::LeftUpperArm).unwrap();
        let expected = 120f32.to_radians() + amount * 0.02;
        assert!((left.x - expected).abs() < 1e-6);
        assert_deg(left.z, 77.0);
    }

    #[test]
    fn test_missing_eyes_leave_other_animations_running() {
        let mut rig = Rig::new();
        let hips = rig.add_joint("Hips", None);
        let spine = rig.add_joint("Spine", Some(hips));
        rig.add_joint("Head", Some(spine));
        rig.set_face(MorphTargets::new("Face", vec!["Joy".to_string()]));

        let mut driver = driver();
        driver.on_loaded(rig);
        for _ in 0..600 {
            driver.tick(0.016, true);
        }

        assert_eq!(driver.blink().state(), 0.0);
        assert_eq!(driver.blink().timer(), 0.0);
        assert!(driver.breathing().phase() > 0.0);
        assert!(driver.smile().current() > 0.7);

        let snapshot = driver.snapshot();
        assert!(snapshot.eye_scale_y.is_none());
        assert!(snapshot.joints.contains_key("spine"));
    }

    #[test]
    fn test_typing_flip_scenario() {
        let mut driver = driver();
        driver.on_loaded(scenario_rig());

        let mut last = driver.smile().current();
        for frame in 0..200 {
            let typing = !(70..140).contains(&frame);
            driver.tick(0.016, typing);
            let value = driver.smile().current();

            assert!((0.0..=0.75).contains(&value), "frame {frame}: {value}");
            if typing {
                assert!(value >= last, "frame {frame}: {value} < {last}");
            } else {
                assert!(value <= last, "frame {frame}: {value} > {last}");
            }
            last = value;
        }

        let joy = driver.avatar().unwrap().rig().face().unwrap().weight("Joy").unwrap();
        assert!(joy > 0.0 && joy <= 0.75);
    }

    #[test]
    fn test_blink_runs_within_driver() {
        let mut driver = driver();
        driver.on_loaded(scenario_rig());

        let mut blinked = false;
        // Six seconds always cover at least one blink
        for _ in 0..375 {
            driver.tick(0.016, false);
            if let Some([l, _]) = driver.snapshot().eye_scale_y {
                blinked |= l < 1.0;
            }
        }
        assert!(blinked);
    }

    #[test]
    fn test_non_finite_delta_is_ignored() {
        let mut driver = driver();
        driver.on_loaded(scenario_rig());
        driver.tick(f32::NAN, false);
        driver.tick(-1.0, false);
        assert_eq!(driver.breathing().phase(), 0.0);
        assert_eq!(driver.frames(), 2);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut driver = driver();
        driver.on_loaded(scenario_rig());
        driver.tick(0.016, false);

        let json = serde_json::to_string(&driver.snapshot()).unwrap();
        assert!(json.contains("\"left-upper-arm\""));
        assert!(json.contains("\"frame\":1"));
    }

    #[test]
    fn test_frame_clock() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta(), 0.0);
        assert!(clock.delta() >= 0.0);
    }
}
