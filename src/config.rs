//! Configuration parsing and management for vrm-idle

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, VrmIdleError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub avatar: AvatarConfig,
    pub pose: PoseConfig,
    pub blink: BlinkConfig,
    pub breathing: BreathingConfig,
    pub smile: SmileConfig,
    pub frame: FrameConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VrmIdleError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, VrmIdleError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, VrmIdleError> {
        // Try config paths in order
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        // Fall back to defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), VrmIdleError> {
        if self.avatar.model_path.trim().is_empty() {
            return Err(invalid("avatar.model_path", "Model path must not be empty"));
        }

        // Reject inf and nan before the range checks
        for (field, value) in self.float_fields() {
            if !value.is_finite() {
                return Err(invalid(field, "Value must be a finite number"));
            }
        }

        if self.blink.min_interval_secs <= 0.0
            || self.blink.max_interval_secs < self.blink.min_interval_secs
        {
            return Err(invalid(
                "blink.min_interval_secs",
                "Blink interval must be positive and min <= max",
            ));
        }

        if self.blink.speed <= 0.0 {
            return Err(invalid("blink.speed", "Blink speed must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.blink.close_amount) {
            return Err(invalid(
                "blink.close_amount",
                "Close amount must be between 0.0 and 1.0",
            ));
        }

        if self.breathing.rate < 0.0 {
            return Err(invalid("breathing.rate", "Breathing rate must not be negative"));
        }

        if !(0.0..=1.0).contains(&self.smile.target) {
            return Err(invalid("smile.target", "Smile target must be between 0.0 and 1.0"));
        }

        for (field, factor) in [
            ("smile.follow_factor", self.smile.follow_factor),
            ("smile.write_factor", self.smile.write_factor),
        ] {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(invalid(field, "Smoothing factor must be in (0.0, 1.0]"));
            }
        }

        if self.smile.morph_names.is_empty() {
            tracing::warn!("smile.morph_names is empty, the smile will never be visible");
        }

        if self.frame.fps == 0 {
            return Err(invalid("frame.fps", "Frame rate must be greater than 0"));
        }

        Ok(())
    }
}

impl Config {
    fn float_fields(&self) -> Vec<(&'static str, f32)> {
        let (p, b, br, s) = (&self.pose, &self.blink, &self.breathing, &self.smile);
        let mut fields = vec![
            ("pose.upper_arm_down_deg", p.upper_arm_down_deg),
            ("pose.upper_arm_forward_deg", p.upper_arm_forward_deg),
            ("pose.spine_forward_deg", p.spine_forward_deg),
            ("blink.min_interval_secs", b.min_interval_secs),
            ("blink.max_interval_secs", b.max_interval_secs),
            ("blink.speed", b.speed),
            ("blink.close_amount", b.close_amount),
            ("breathing.rate", br.rate),
            ("breathing.amplitude", br.amplitude),
            ("breathing.spine_offset", br.spine_offset),
            ("breathing.spine_gain", br.spine_gain),
            ("breathing.chest_offset", br.chest_offset),
            ("breathing.chest_gain", br.chest_gain),
            ("breathing.arm_gain", br.arm_gain),
            ("smile.target", s.target),
            ("smile.follow_factor", s.follow_factor),
            ("smile.write_factor", s.write_factor),
        ];
        for (field, angles) in [
            ("pose.lower_arm_left_deg", p.lower_arm_left_deg),
            ("pose.lower_arm_right_deg", p.lower_arm_right_deg),
            ("pose.hand_left_deg", p.hand_left_deg),
            ("pose.hand_right_deg", p.hand_right_deg),
        ] {
            fields.extend(angles.iter().map(|&a| (field, a)));
        }
        fields
    }
}

fn invalid(field: &str, message: &str) -> VrmIdleError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Avatar asset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Path to the VRM/GLB model file
    pub model_path: String,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            model_path: "saka.vrm".to_string(),
        }
    }
}

/// Static pose defaults, in degrees
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// Upper arm rotation around X (shared by both sides)
    pub upper_arm_down_deg: f32,
    /// Upper arm rotation around Z (negated on the right side)
    pub upper_arm_forward_deg: f32,
    /// Left forearm Euler angles (x, y, z)
    pub lower_arm_left_deg: [f32; 3],
    /// Right forearm Euler angles (x, y, z)
    pub lower_arm_right_deg: [f32; 3],
    /// Left hand Euler angles (x, y, z)
    pub hand_left_deg: [f32; 3],
    /// Right hand Euler angles (x, y, z)
    pub hand_right_deg: [f32; 3],
    /// Spine forward tilt
    pub spine_forward_deg: f32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            upper_arm_down_deg: 120.0,
            upper_arm_forward_deg: 77.0,
            lower_arm_left_deg: [0.0, 0.0, 0.0],
            lower_arm_right_deg: [0.0, 0.0, 0.0],
            // Palms turned backwards
            hand_left_deg: [0.0, 0.0, 180.0],
            hand_right_deg: [0.0, 0.0, -180.0],
            spine_forward_deg: 0.0,
        }
    }
}

/// Procedural blink tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Shortest idle time between blinks (seconds)
    pub min_interval_secs: f32,
    /// Longest idle time between blinks (seconds, exclusive)
    pub max_interval_secs: f32,
    /// Blink cycle advance per second
    pub speed: f32,
    /// Fraction of eye height removed at the peak of a blink
    pub close_amount: f32,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 3.0,
            max_interval_secs: 5.0,
            speed: 12.0,
            close_amount: 0.8,
        }
    }
}

/// Idle breathing tuning (radians)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathingConfig {
    /// Phase advance per second
    pub rate: f32,
    /// Peak breath amount
    pub amplitude: f32,
    pub spine_offset: f32,
    pub spine_gain: f32,
    pub chest_offset: f32,
    pub chest_gain: f32,
    /// Upper arm gain on top of the posed down angle
    pub arm_gain: f32,
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            rate: 1.5,
            amplitude: 0.005,
            spine_offset: 0.02,
            spine_gain: 0.05,
            chest_offset: 0.01,
            chest_gain: 0.03,
            arm_gain: 0.02,
        }
    }
}

/// Typing smile tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmileConfig {
    /// Smile strength while typing (0.0 - 1.0)
    pub target: f32,
    /// Per-frame factor pulling the smile toward its target
    pub follow_factor: f32,
    /// Per-frame factor pulling each morph weight toward the smile
    pub write_factor: f32,
    /// Candidate morph target names, matched case-sensitively
    pub morph_names: Vec<String>,
}

impl Default for SmileConfig {
    fn default() -> Self {
        Self {
            target: 0.75,
            follow_factor: 0.12,
            write_factor: 0.18,
            morph_names: ["Joy", "Happy", "smile", "Smile", "joy", "A"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Frame loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Target frames per second
    pub fps: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("vrm-idle");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/vrm-idle");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/vrm-idle");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("vrm-idle");
        }
    }

    PathBuf::from(".")
}
