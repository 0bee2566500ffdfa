//! Typing smile.
//!
//! While the user is typing the smile value eases toward the configured target,
//! otherwise back toward zero. The value is then eased into every matching face
//! morph target, so two one-pole filters run in cascade.

use crate::config::SmileConfig;
use crate::skeleton::MorphTargets;

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

pub struct Smile {
    current: f32,
    config: SmileConfig,
    warned_no_face: bool,
    warned_no_morph: bool,
}

impl Smile {
    pub fn new(config: &SmileConfig) -> Self {
        Self {
            current: 0.0,
            config: config.clone(),
            warned_no_face: false,
            warned_no_morph: false,
        }
    }

    /// Smoothed smile value, within `[0, target]`.
    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target_for(&self, is_typing: bool) -> f32 {
        if is_typing {
            self.config.target
        } else {
            0.0
        }
    }

    /// Advance one frame and write the smile into the face morphs.
    ///
    /// A missing face mesh or missing smile morphs only log a warning, once.
    pub fn update(&mut self, is_typing: bool, face: Option<&mut MorphTargets>) -> f32 {
        let target = self.target_for(is_typing);
        self.current = lerp(self.current, target, self.config.follow_factor)
            .min(self.config.target)
            .max(0.0);

        match face {
            Some(face) => {
                if !self.write(face) && !self.warned_no_morph {
                    tracing::warn!(
                        "No smile morph target found on mesh {:?} (looked for {:?})",
                        face.mesh_name(),
                        self.config.morph_names
                    );
                    self.warned_no_morph = true;
                }
            }
            None => {
                if !self.warned_no_face {
                    tracing::warn!("Avatar has no face mesh with morph targets, smile disabled");
                    self.warned_no_face = true;
                }
            }
        }

        self.current
    }

    /// Ease every candidate morph toward the current value. Returns whether
    /// any candidate exists on the mesh.
    fn write(&self, face: &mut MorphTargets) -> bool {
        let mut applied = false;
        for name in &self.config.morph_names {
            if let Some(index) = face.index_of(name) {
                let weight = lerp(face.weight_at(index), self.current, self.config.write_factor);
                face.set_weight_at(index, weight);
                applied = true;
            }
        }
        applied
    }
}
