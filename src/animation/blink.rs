//! Procedural eye blinking.
//!
//! Eyes stay open for a random idle period, then run one close/open cycle by
//! squashing the eye bones vertically. Cycles never overlap: the idle timer
//! only runs while no cycle is active.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::BlinkConfig;
use crate::skeleton::{Rig, Role, RoleAssignment};

/// Value `state` takes when a cycle starts.
const CYCLE_START: f32 = 0.1;

/// Triangular blink curve: 0 at the ends of the cycle, 1 at its middle.
pub fn progress(state: f32) -> f32 {
    let p = if state < 0.5 {
        state * 2.0
    } else {
        (1.0 - state) * 2.0
    };
    p.clamp(0.0, 1.0)
}

pub struct Blink {
    /// Seconds spent idle since the last cycle
    timer: f32,
    /// 0 when idle, otherwise progress through the current cycle
    state: f32,
    /// Idle time before the next cycle starts
    threshold: f32,
    config: BlinkConfig,
    rng: StdRng,
}

impl Blink {
    pub fn new(config: &BlinkConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create with an explicit random source (seeded in tests).
    pub fn with_rng(config: &BlinkConfig, rng: StdRng) -> Self {
        let mut blink = Self {
            timer: 0.0,
            state: 0.0,
            threshold: config.min_interval_secs,
            config: config.clone(),
            rng,
        };
        blink.threshold = blink.next_threshold();
        blink
    }

    pub fn state(&self) -> f32 {
        self.state
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_active(&self) -> bool {
        self.state > 0.0
    }

    /// Eye height multiplier for the current state (1.0 = fully open).
    pub fn eye_scale(&self) -> f32 {
        if self.is_active() {
            1.0 - progress(self.state) * self.config.close_amount
        } else {
            1.0
        }
    }

    fn next_threshold(&mut self) -> f32 {
        let (min, max) = (self.config.min_interval_secs, self.config.max_interval_secs);
        if min.is_finite() && max.is_finite() && max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// Advance by `dt` seconds and write eye scales. Does nothing unless both
    /// eye roles are bound.
    pub fn update(&mut self, dt: f32, rig: &mut Rig, roles: &RoleAssignment) {
        let (Some(left), Some(right)) = (roles.binding(Role::LeftEye), roles.binding(Role::RightEye))
        else {
            return;
        };

        if !self.is_active() {
            self.timer += dt;
            if self.timer > self.threshold {
                self.state = CYCLE_START;
                self.timer = 0.0;
            }
        }

        if !self.is_active() {
            return;
        }

        self.state += dt * self.config.speed;

        if self.state > 1.0 {
            self.state = 0.0;
            self.threshold = self.next_threshold();
            rig.joint_mut(left.joint).set_scale_y(left.rest_scale_y);
            rig.joint_mut(right.joint).set_scale_y(right.rest_scale_y);
            return;
        }

        let scale = self.eye_scale();
        rig.joint_mut(left.joint).set_scale_y(scale * left.rest_scale_y);
        rig.joint_mut(right.joint).set_scale_y(scale * right.rest_scale_y);
    }
}
