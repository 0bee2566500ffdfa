//! Idle breathing: a slow sine wave tilting spine, chest and upper arms.

use std::f32::consts::TAU;

use crate::config::BreathingConfig;
use crate::skeleton::{Axis, Rig, Role, RoleAssignment, Side};

pub struct Breathing {
    /// Sine phase, kept in [0, TAU)
    phase: f32,
    amount: f32,
    config: BreathingConfig,
}

impl Breathing {
    pub fn new(config: &BreathingConfig) -> Self {
        Self {
            phase: 0.0,
            amount: 0.0,
            config: config.clone(),
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Breath offset computed on the last update, within `±amplitude`.
    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// Advance by `dt` seconds and overwrite the X rotation of spine, chest
    /// and upper arms. `upper_arm_down` is the posed upper arm X angle.
    ///
    /// Does nothing when neither spine nor chest is bound.
    pub fn update(&mut self, dt: f32, rig: &mut Rig, roles: &RoleAssignment, upper_arm_down: f32) {
        if !roles.contains(Role::Spine) && !roles.contains(Role::Chest) {
            return;
        }

        // Wrapped so long sessions keep full sine precision
        self.phase = (self.phase + dt * self.config.rate).rem_euclid(TAU);
        self.amount = self.phase.sin() * self.config.amplitude;
        let c = &self.config;

        if let Some(id) = roles.get(Role::Spine) {
            rig.joint_mut(id)
                .set_rotation_axis(Axis::X, c.spine_offset + self.amount * c.spine_gain);
        }

        if let Some(id) = roles.get(Role::Chest) {
            rig.joint_mut(id)
                .set_rotation_axis(Axis::X, c.chest_offset + self.amount * c.chest_gain);
        }

        for side in Side::BOTH {
            if let Some(id) = roles.get(Role::upper_arm(side)) {
                rig.joint_mut(id)
                    .set_rotation_axis(Axis::X, upper_arm_down + self.amount * c.arm_gain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::classify;
    use proptest::prelude::*;

    fn torso() -> (Rig, RoleAssignment) {
        let mut rig = Rig::new();
        let hips = rig.add_joint("Hips", None);
        let spine = rig.add_joint("Spine", Some(hips));
        let chest = rig.add_joint("Chest", Some(spine));
        rig.add_joint("LeftUpperArm", Some(chest));
        rig.add_joint("RightUpperArm", Some(chest));
        let roles = classify(&rig);
        (rig, roles)
    }

    #[test]
    fn test_writes_x_axis_only() {
        let (mut rig, roles) = torso();
        let arm = roles.get(Role::LeftUpperArm).unwrap();
        rig.joint_mut(arm)
            .set_rotation_euler(glam::Vec3::new(2.0, 0.0, 1.3));

        let mut breathing = Breathing::new(&BreathingConfig::default());
        breathing.update(0.5, &mut rig, &roles, 2.0);

        let amount = breathing.amount();
        assert!((amount - (0.75f32).sin() * 0.005).abs() < 1e-7);

        let spine = rig.joint(roles.get(Role::Spine).unwrap()).euler();
        assert!((spine.x - (0.02 + amount * 0.05)).abs() < 1e-7);

        let chest = rig.joint(roles.get(Role::Chest).unwrap()).euler();
        assert!((chest.x - (0.01 + amount * 0.03)).abs() < 1e-7);

        let arm = rig.joint(arm).euler();
        assert!((arm.x - (2.0 + amount * 0.02)).abs() < 1e-6);
        assert_eq!(arm.z, 1.3);
    }

    #[test]
    fn test_inert_without_spine_and_chest() {
        let mut rig = Rig::new();
        let root = rig.add_joint("Root", None);
        let arm = rig.add_joint("LeftUpperArm", Some(root));
        let roles = classify(&rig);

        let mut breathing = Breathing::new(&BreathingConfig::default());
        breathing.update(1.0, &mut rig, &roles, 2.0);

        assert_eq!(breathing.phase(), 0.0);
        assert_eq!(rig.joint(arm).euler().x, 0.0);
    }

    #[test]
    fn test_chest_alone_is_enough() {
        let mut rig = Rig::new();
        let chest = rig.add_joint("Chest", None);
        let roles = classify(&rig);

        let mut breathing = Breathing::new(&BreathingConfig::default());
        breathing.update(0.0, &mut rig, &roles, 0.0);
        assert!((rig.joint(chest).euler().x - 0.01).abs() < 1e-7);
    }

    #[test]
    fn test_phase_wraps_over_long_sessions() {
        let (mut rig, roles) = torso();
        let mut breathing = Breathing::new(&BreathingConfig::default());
        // Roughly 28 hours of phase in one-second steps
        for _ in 0..100_000 {
            breathing.update(1.0, &mut rig, &roles, 0.0);
        }
        assert!(breathing.phase() >= 0.0 && breathing.phase() < TAU);
    }

    proptest! {
        #[test]
        fn prop_amount_bounded(steps in proptest::collection::vec(0.0f32..5.0, 1..200)) {
            let (mut rig, roles) = torso();
            let mut breathing = Breathing::new(&BreathingConfig::default());
            for dt in steps {
                breathing.update(dt, &mut rig, &roles, 0.0);
                prop_assert!(breathing.amount().abs() <= 0.005);
            }
        }
    }
}
