// src/lib.rs - Library interface for OrganoidQuant

pub mod area_filter;
pub mod config;
pub mod containment;
pub mod errors;
pub mod filters;
pub mod font;
pub mod image_io;
pub mod image_utils;
pub mod labels;
pub mod measurement;
pub mod morphology;
pub mod output;
pub mod overlay;
pub mod pipeline;
pub mod regions;
pub mod threshold;

// Re-export commonly used types and functions
pub use errors::{OrganoidError, Result};
pub use config::{ChannelRecipe, ChannelRole, Config, PreprocessStep};
pub use image_io::{ChannelStack, load_stack, load_channel_files};
pub use image_utils::{Calibration, FloatImage, UnitName};
pub use pipeline::{analyze_slice, process_stack, SliceAnalysis};

// Re-export the segmentation stages
pub use morphology::{build_mask, fill_holes, apply_opening, select_threshold};
pub use regions::{extract_regions, BoundingBox, Region};
pub use area_filter::filter_by_area;
pub use threshold::ThresholdMethod;

// Re-export matching and measurement
pub use containment::{match_organoid, ChannelTotals, ContainmentTotals};
pub use measurement::{aggregate, OrganoidRecord};
pub use labels::organoid_label;
pub use overlay::{OverlayItem, OverlayRole};
