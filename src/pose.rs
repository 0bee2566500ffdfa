//! Static idle pose.
//!
//! Holds the target orientations for arms, hands and spine and writes them to
//! the classified joints. Limb and spine rotations are composed from full XYZ
//! Euler triples; chest, neck and head are zeroed axis by axis.

use glam::Vec3;
use std::fmt;

use crate::config::PoseConfig;
use crate::skeleton::{Axis, Rig, Role, RoleAssignment, Side};

/// Current pose targets, in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSettings {
    /// Upper arm X rotation, shared by both sides
    pub upper_arm_down: f32,
    /// Upper arm Z rotation, mirrored on the right side
    pub upper_arm_forward: f32,
    pub lower_arm_left: Vec3,
    pub lower_arm_right: Vec3,
    pub hand_left: Vec3,
    pub hand_right: Vec3,
    pub spine_forward: f32,
}

impl Default for PoseSettings {
    fn default() -> Self {
        Self::from_config(&PoseConfig::default())
    }
}

fn deg_to_rad(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0].to_radians(), v[1].to_radians(), v[2].to_radians())
}

impl PoseSettings {
    pub fn from_config(config: &PoseConfig) -> Self {
        Self {
            upper_arm_down: config.upper_arm_down_deg.to_radians(),
            upper_arm_forward: config.upper_arm_forward_deg.to_radians(),
            lower_arm_left: deg_to_rad(config.lower_arm_left_deg),
            lower_arm_right: deg_to_rad(config.lower_arm_right_deg),
            hand_left: deg_to_rad(config.hand_left_deg),
            hand_right: deg_to_rad(config.hand_right_deg),
            spine_forward: config.spine_forward_deg.to_radians(),
        }
    }

    /// Upper arm Euler triple: `(down, 0, forward)` on the left,
    /// `(down, 0, -forward)` on the right.
    pub fn upper_arm_euler(&self, side: Side) -> Vec3 {
        let forward = match side {
            Side::Left => self.upper_arm_forward,
            Side::Right => -self.upper_arm_forward,
        };
        Vec3::new(self.upper_arm_down, 0.0, forward)
    }

    pub fn lower_arm(&self, side: Side) -> Vec3 {
        match side {
            Side::Left => self.lower_arm_left,
            Side::Right => self.lower_arm_right,
        }
    }

    pub fn lower_arm_mut(&mut self, side: Side) -> &mut Vec3 {
        match side {
            Side::Left => &mut self.lower_arm_left,
            Side::Right => &mut self.lower_arm_right,
        }
    }

    pub fn hand(&self, side: Side) -> Vec3 {
        match side {
            Side::Left => self.hand_left,
            Side::Right => self.hand_right,
        }
    }

    pub fn hand_mut(&mut self, side: Side) -> &mut Vec3 {
        match side {
            Side::Left => &mut self.hand_left,
            Side::Right => &mut self.hand_right,
        }
    }

    /// Write every pose target to its bound joint in one pass.
    pub fn apply_static(&self, rig: &mut Rig, roles: &RoleAssignment) {
        self.apply_upper_arms(rig, roles);
        for side in Side::BOTH {
            self.apply_lower_arm(side, rig, roles);
            self.apply_hand(side, rig, roles);
        }

        set_euler(rig, roles, Role::Spine, Vec3::new(self.spine_forward, 0.0, 0.0));

        for role in [Role::Chest, Role::Neck, Role::Head] {
            if let Some(id) = roles.get(role) {
                let joint = rig.joint_mut(id);
                joint.set_rotation_axis(Axis::X, 0.0);
                joint.set_rotation_axis(Axis::Y, 0.0);
                joint.set_rotation_axis(Axis::Z, 0.0);
            }
        }

        tracing::debug!("Static pose applied: {}", self);
    }

    pub fn apply_upper_arms(&self, rig: &mut Rig, roles: &RoleAssignment) {
        for side in Side::BOTH {
            set_euler(rig, roles, Role::upper_arm(side), self.upper_arm_euler(side));
        }
    }

    pub fn apply_lower_arm(&self, side: Side, rig: &mut Rig, roles: &RoleAssignment) {
        set_euler(rig, roles, Role::lower_arm(side), self.lower_arm(side));
    }

    pub fn apply_hand(&self, side: Side, rig: &mut Rig, roles: &RoleAssignment) {
        set_euler(rig, roles, Role::hand(side), self.hand(side));
    }
}

fn set_euler(rig: &mut Rig, roles: &RoleAssignment, role: Role, euler: Vec3) {
    if let Some(id) = roles.get(role) {
        rig.joint_mut(id).set_rotation_euler(euler);
    }
}

impl fmt::Display for PoseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "upper arms {:.0}° down / {:.0}° forward, hands {:.0}° / {:.0}°, spine {:.0}°",
            self.upper_arm_down.to_degrees(),
            self.upper_arm_forward.to_degrees(),
            self.hand_left.z.to_degrees(),
            self.hand_right.z.to_degrees(),
            self.spine_forward.to_degrees(),
        )
    }
}
