//! Scene configuration, read from an optional JSON file.
//!
//! Every field has a default, so `{}` is a valid config.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nalgebra::Vector3;
use serde::Deserialize;

use crate::anim::Easing;
use crate::error::SceneResult;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Directory that model paths in the data file are relative to
    pub asset_root: PathBuf,
    /// Appended to model paths that have no extension, e.g. "obj"
    pub asset_extension: Option<String>,
    pub label_anchor: LabelAnchor,
    pub label_height: f32,
    /// Scene units per unit of orbital distance
    pub distance_scale: f32,
    pub bob: BobConfig,
    pub showcase: ShowcaseConfig,
    pub gear: Option<GearConfig>,
    pub orbits: OrbitConfig,
    pub debug_attach_delay_ms: u64,
}

/// Where a label's offsets are measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelAnchor {
    /// Offsets are used as-is, relative to the orbital position.
    Absolute,
    /// The vertical offset is measured from the top of the scaled model.
    BodyRelative,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BobConfig {
    pub interval_ms: u64,
    /// Vertical distance moved per tick
    pub step: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShowcaseConfig {
    pub lids: Vec<LidConfig>,
    pub popup_model: String,
    pub popup_position: [f32; 3],
    pub popup_scale: f32,
    pub open_secs: f32,
    pub close_delay_secs: f32,
    pub easing: Easing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LidConfig {
    pub name: String,
    pub position: [f32; 3],
    pub size: [f32; 3],
    /// Height the lid rises to when the box opens. It rests at `position[1]`.
    pub open_y: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GearConfig {
    /// Key of the body that gets the gear treatment
    pub body: String,
    pub motion: GearMotion,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GearMotion {
    /// Continuous rotation about the forward axis, one turn per period.
    Spin { period_secs: f32 },
    /// Rocks back and forth by `step_degrees` per tick, up to `limit` steps
    /// either side.
    Oscillate {
        step_degrees: f32,
        interval_ms: u64,
        limit: u32,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub enabled: bool,
    /// Simulated days per real second
    pub time_scale: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            asset_root: PathBuf::from("assets"),
            asset_extension: None,
            label_anchor: LabelAnchor::Absolute,
            label_height: 0.1,
            distance_scale: 1.0,
            bob: BobConfig::default(),
            showcase: ShowcaseConfig::default(),
            gear: Some(GearConfig {
                body: String::from("gear"),
                motion: GearMotion::Spin { period_secs: 4.0 },
            }),
            orbits: OrbitConfig::default(),
            debug_attach_delay_ms: 1000,
        }
    }
}

impl Default for BobConfig {
    fn default() -> Self {
        BobConfig {
            interval_ms: 100,
            step: 0.01,
        }
    }
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        ShowcaseConfig {
            lids: vec![
                LidConfig {
                    name: String::from("box-lid-left"),
                    position: [-0.15, 0.5, 2.0],
                    size: [0.3, 0.05, 0.6],
                    open_y: 0.9,
                },
                LidConfig {
                    name: String::from("box-lid-right"),
                    position: [0.15, 0.5, 2.0],
                    size: [0.3, 0.05, 0.6],
                    open_y: 0.9,
                },
            ],
            popup_model: String::from("popup.obj"),
            popup_position: [0.0, 0.6, 2.0],
            popup_scale: 0.5,
            open_secs: 1.0,
            close_delay_secs: 3.0,
            easing: Easing::EaseOutCubic,
        }
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        OrbitConfig {
            enabled: false,
            time_scale: 1.0,
        }
    }
}

impl SceneConfig {
    pub fn read_file(path: impl AsRef<Path>) -> SceneResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Resolves a model reference from the data file to a loadable path.
    pub fn asset_path(&self, model: &str) -> PathBuf {
        let mut path = self.asset_root.join(model);
        if let Some(extension) = &self.asset_extension {
            if path.extension().is_none() {
                path.set_extension(extension.trim_start_matches('.'));
            }
        }
        path
    }

    pub fn bob_interval(&self) -> Duration {
        Duration::from_millis(self.bob.interval_ms)
    }

    pub fn debug_attach_delay(&self) -> Duration {
        Duration::from_millis(self.debug_attach_delay_ms)
    }
}

/// Longest duration a config value turns into.
pub const MAX_CONFIG_DURATION: Duration = Duration::from_secs(u32::MAX as u64);

/// Converts a configured number of seconds. Negative and NaN values become
/// zero; values too large for a timer saturate at `MAX_CONFIG_DURATION`.
pub fn seconds(secs: f32) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    match Duration::try_from_secs_f32(secs) {
        Ok(duration) => duration.min(MAX_CONFIG_DURATION),
        Err(_) => {
            tracing::warn!(secs, "duration out of range, saturating");
            MAX_CONFIG_DURATION
        }
    }
}

impl ShowcaseConfig {
    pub fn open_duration(&self) -> Duration {
        seconds(self.open_secs)
    }

    pub fn close_delay(&self) -> Duration {
        seconds(self.close_delay_secs)
    }

    pub fn popup_position(&self) -> Vector3<f32> {
        Vector3::from(self.popup_position)
    }
}

impl LidConfig {
    pub fn rest_position(&self) -> Vector3<f32> {
        Vector3::from(self.position)
    }

    pub fn open_position(&self) -> Vector3<f32> {
        Vector3::new(self.position[0], self.open_y, self.position[2])
    }
}
