use pantilt_common::{MotionConfig, Preset};
use serde::Deserialize;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Simulator settings, read from a JSON file. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// installation whose travel limits replace the ones in `motion`
    pub preset: Option<Preset>,
    pub motion: MotionConfig,
    /// scheduler iterations after the startup calibration
    pub iterations: u32,
    /// seed for the random source; taken from the clock when absent
    pub seed: Option<u64>,
    /// sleep for real instead of only advancing the simulated clock
    pub realtime: bool,
    pub trace_csv: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            preset: None,
            motion: MotionConfig::default(),
            iterations: 20,
            seed: None,
            realtime: false,
            trace_csv: None,
        }
    }
}

impl HostConfig {
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("reading {}: {}", path.display(), e))?;
        Self::from_json(&json)
    }

    pub fn motion_config(&self) -> MotionConfig {
        let mut motion = self.motion;
        if let Some(preset) = self.preset {
            (motion.horizontal, motion.vertical) = preset.ranges();
        }
        motion
    }
}
