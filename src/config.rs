use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{OrganoidError, Result};
use crate::image_utils::Calibration;
use crate::threshold::ThresholdMethod;

/// Number of channels every input stack must provide
pub const REQUIRED_CHANNELS: usize = 3;

/// Configuration for OrganoidQuant
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub input_path: Option<String>,

    #[serde(default = "default_output_base_dir")]
    pub output_base_dir: String,

    #[serde(default)]
    pub calibration: Calibration,

    /// 1-based z position the analysed plane came from
    #[serde(default = "default_slice")]
    pub slice: usize,

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,

    /// Write the rendered overlay PNG next to the results table
    #[serde(default = "default_render_overlay")]
    pub render_overlay: bool,

    #[serde(default = "default_organoid_recipe")]
    pub organoid: ChannelRecipe,

    #[serde(default = "default_marker_a_recipe")]
    pub marker_a: ChannelRecipe,

    #[serde(default = "default_marker_b_recipe")]
    pub marker_b: ChannelRecipe,
}

/// Which signal a channel carries
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRole {
    /// Brightfield organoid bodies
    Organoid,
    /// Punctate fluorescent reporter (GFP-like)
    MarkerA,
    /// Diffuse fluorescent reporter (Tomato-like)
    MarkerB,
}

impl ChannelRole {
    pub const ALL: [ChannelRole; 3] = [ChannelRole::Organoid, ChannelRole::MarkerA, ChannelRole::MarkerB];

    pub fn name(&self) -> &'static str {
        match self {
            ChannelRole::Organoid => "organoid",
            ChannelRole::MarkerA => "marker-A",
            ChannelRole::MarkerB => "marker-B",
        }
    }
}

/// One preprocessing operation in a channel recipe
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PreprocessStep {
    /// Local variance over a circular neighbourhood
    Variance { radius: f64 },
    /// Gaussian smoothing
    Gaussian { sigma: f64 },
    /// Gaussian(low_sigma) minus Gaussian(high_sigma), clipped at zero
    BandPass { low_sigma: f64, high_sigma: f64 },
}

/// How one channel is segmented and filtered
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChannelRecipe {
    /// 1-based channel index in the stack
    pub channel: usize,
    /// 1-based channel whose raw intensities are measured inside regions
    pub measure_channel: usize,
    pub preprocess: Vec<PreprocessStep>,
    pub threshold: ThresholdMethod,
    /// Minimum region area in calibrated units
    pub min_area: f64,
}

fn default_output_base_dir() -> String {
    "./output".to_string()
}

fn default_slice() -> usize {
    1
}

fn default_parallel() -> bool {
    true
}

fn default_render_overlay() -> bool {
    true
}

fn default_organoid_recipe() -> ChannelRecipe {
    ChannelRecipe {
        channel: 2,
        measure_channel: 2,
        preprocess: vec![
            PreprocessStep::Variance { radius: 1.0 },
            PreprocessStep::Gaussian { sigma: 5.0 },
        ],
        threshold: ThresholdMethod::Triangle,
        min_area: 2500.0,
    }
}

fn default_marker_a_recipe() -> ChannelRecipe {
    ChannelRecipe {
        channel: 1,
        measure_channel: 1,
        preprocess: vec![PreprocessStep::Gaussian { sigma: 4.0 }],
        threshold: ThresholdMethod::Otsu,
        min_area: 500.0,
    }
}

fn default_marker_b_recipe() -> ChannelRecipe {
    ChannelRecipe {
        channel: 3,
        measure_channel: 3,
        preprocess: vec![PreprocessStep::BandPass { low_sigma: 5.0, high_sigma: 20.0 }],
        threshold: ThresholdMethod::MaxEntropy,
        min_area: 100.0,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: None,
            output_base_dir: default_output_base_dir(),
            calibration: Calibration::default(),
            slice: default_slice(),
            use_parallel: default_parallel(),
            render_overlay: default_render_overlay(),
            organoid: default_organoid_recipe(),
            marker_a: default_marker_a_recipe(),
            marker_b: default_marker_b_recipe(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            OrganoidError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|source| OrganoidError::ConfigLoad {
            source,
            path: path.to_path_buf(),
        })
    }

    /// Load from file when it exists, otherwise fall back to the built-in recipes
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            log::info!("No config at {}, using built-in recipes", path.display());
            Ok(Self::default())
        }
    }

    pub fn recipe(&self, role: ChannelRole) -> &ChannelRecipe {
        match role {
            ChannelRole::Organoid => &self.organoid,
            ChannelRole::MarkerA => &self.marker_a,
            ChannelRole::MarkerB => &self.marker_b,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.calibration.validate()?;

        if self.slice == 0 {
            return Err(OrganoidError::Config("slice is 1-based and must be >= 1".to_string()));
        }

        for role in ChannelRole::ALL {
            self.recipe(role).validate(role)?;
        }

        let mut channels: Vec<usize> = ChannelRole::ALL.iter().map(|&r| self.recipe(r).channel).collect();
        channels.sort_unstable();
        channels.dedup();
        if channels.len() != ChannelRole::ALL.len() {
            return Err(OrganoidError::Config(
                "organoid, marker_a and marker_b must read distinct channels".to_string(),
            ));
        }

        Ok(())
    }
}

impl ChannelRecipe {
    fn validate(&self, role: ChannelRole) -> Result<()> {
        let name = role.name();
        for (field, index) in [("channel", self.channel), ("measure_channel", self.measure_channel)] {
            if index == 0 || index > REQUIRED_CHANNELS {
                return Err(OrganoidError::Config(format!(
                    "{} {} must be between 1 and {}, got {}",
                    name, field, REQUIRED_CHANNELS, index
                )));
            }
        }

        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(OrganoidError::Config(format!("{} min_area must be >= 0", name)));
        }

        for step in &self.preprocess {
            let ok = match *step {
                PreprocessStep::Variance { radius } => radius.is_finite() && radius >= 0.0,
                PreprocessStep::Gaussian { sigma } => sigma.is_finite() && sigma > 0.0,
                PreprocessStep::BandPass { low_sigma, high_sigma } => {
                    low_sigma.is_finite() && high_sigma.is_finite() && low_sigma > 0.0 && high_sigma > low_sigma
                }
            };
            if !ok {
                return Err(OrganoidError::Config(format!(
                    "{} has an invalid preprocessing step: {:?}", name, step
                )));
            }
        }

        Ok(())
    }
}
