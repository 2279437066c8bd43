// src/pipeline.rs - Single-slice segmentation, matching and reporting

use std::path::{Path, PathBuf};

use image::GrayImage;

use crate::area_filter::filter_by_area;
use crate::config::{ChannelRole, Config};
use crate::containment::match_organoid;
use crate::errors::Result;
use crate::image_io::{save_mask, save_overlay_image, ChannelStack};
use crate::measurement::{aggregate, OrganoidRecord};
use crate::morphology::build_mask;
use crate::output::{result_stem, write_overlay_json, write_results_csv};
use crate::overlay::{render_overlay, OverlayItem};
use crate::regions::{extract_regions, Region};

/// Mask and accepted regions of one channel
#[derive(Debug, Clone)]
pub struct ChannelSegmentation {
    pub role: ChannelRole,
    pub mask: GrayImage,
    /// Regions extracted before the area filter
    pub candidate_count: usize,
    /// Regions that passed the area filter, in extraction order
    pub regions: Vec<Region>,
}

/// Everything produced for one plane
#[derive(Debug, Clone)]
pub struct SliceAnalysis {
    pub slice: usize,
    pub records: Vec<OrganoidRecord>,
    pub overlay: Vec<OverlayItem>,
    pub organoid: ChannelSegmentation,
    pub marker_a: ChannelSegmentation,
    pub marker_b: ChannelSegmentation,
}

/// Files written by `process_stack`
#[derive(Debug, Clone, Default)]
pub struct WrittenOutputs {
    pub results_csv: PathBuf,
    pub overlay_json: PathBuf,
    pub overlay_png: Option<PathBuf>,
    pub masks: Vec<PathBuf>,
}

/// Mask, extract and area-filter one channel according to its recipe
pub fn segment_channel(stack: &ChannelStack, config: &Config, role: ChannelRole) -> Result<ChannelSegmentation> {
    let recipe = config.recipe(role);
    let source = stack.channel(recipe.channel)?;
    let measure = stack.channel(recipe.measure_channel)?;

    let mask = build_mask(source, recipe);
    let candidates = extract_regions(&mask, measure, role);
    let candidate_count = candidates.len();
    let regions = filter_by_area(candidates, &stack.calibration, recipe.min_area);

    log::info!(
        "{}: {} of {} regions >= {} {}²",
        role.name(),
        regions.len(),
        candidate_count,
        recipe.min_area,
        stack.calibration.unit.as_str()
    );

    Ok(ChannelSegmentation {
        role,
        mask,
        candidate_count,
        regions,
    })
}

/// Segment all three channels, in parallel when configured
fn segment_all(
    stack: &ChannelStack,
    config: &Config,
) -> Result<(ChannelSegmentation, ChannelSegmentation, ChannelSegmentation)> {
    if config.use_parallel {
        let (organoid, (marker_a, marker_b)) = rayon::join(
            || segment_channel(stack, config, ChannelRole::Organoid),
            || {
                rayon::join(
                    || segment_channel(stack, config, ChannelRole::MarkerA),
                    || segment_channel(stack, config, ChannelRole::MarkerB),
                )
            },
        );
        Ok((organoid?, marker_a?, marker_b?))
    } else {
        Ok((
            segment_channel(stack, config, ChannelRole::Organoid)?,
            segment_channel(stack, config, ChannelRole::MarkerA)?,
            segment_channel(stack, config, ChannelRole::MarkerB)?,
        ))
    }
}

/// Match marker regions to organoids and build the table rows and overlay.
///
/// Labels restart at "A" on every call.
pub fn measure_organoids(
    organoids: &[Region],
    marker_a: &[Region],
    marker_b: &[Region],
    stack: &ChannelStack,
) -> (Vec<OrganoidRecord>, Vec<OverlayItem>) {
    let calibration = &stack.calibration;
    let mut records = Vec::with_capacity(organoids.len());
    let mut overlay = Vec::new();

    for (ordinal, organoid) in organoids.iter().enumerate() {
        let totals = match_organoid(organoid, marker_a, marker_b, calibration);

        overlay.push(OverlayItem::outline(organoid, stack.slice));
        for &idx in &totals.marker_a.contained {
            overlay.push(OverlayItem::outline(&marker_a[idx], stack.slice));
        }
        for &idx in &totals.marker_b.contained {
            overlay.push(OverlayItem::outline(&marker_b[idx], stack.slice));
        }

        let record = aggregate(ordinal, organoid, &totals, calibration);
        overlay.push(OverlayItem::label(&record.label, record.pixel_centroid, stack.slice));

        log::debug!(
            "Organoid {}: area {:.1}, marker-A {:.1} ({} regions), marker-B {:.1} ({} regions, mean {:.2})",
            record.label,
            record.area,
            record.marker_a_area,
            totals.marker_a.contained.len(),
            record.marker_b_area,
            totals.marker_b.contained.len(),
            record.marker_b_mean
        );
        records.push(record);
    }

    (records, overlay)
}

/// Analyse one plane of a stack
pub fn analyze_slice(stack: &ChannelStack, config: &Config) -> Result<SliceAnalysis> {
    let (organoid, marker_a, marker_b) = segment_all(stack, config)?;

    let (records, overlay) = measure_organoids(&organoid.regions, &marker_a.regions, &marker_b.regions, stack);

    if records.is_empty() {
        log::warn!("No organoid passed the area filter on slice {}", stack.slice);
    } else {
        log::info!("Measured {} organoids on slice {}", records.len(), stack.slice);
    }

    Ok(SliceAnalysis {
        slice: stack.slice,
        records,
        overlay,
        organoid,
        marker_a,
        marker_b,
    })
}

/// Analyse a plane and write results table, overlay export and, optionally,
/// the rendered overlay and the three channel masks.
pub fn process_stack(stack: &ChannelStack, config: &Config, debug: bool) -> Result<(SliceAnalysis, WrittenOutputs)> {
    let analysis = analyze_slice(stack, config)?;
    let output_dir = Path::new(&config.output_base_dir);

    let mut written = WrittenOutputs {
        results_csv: write_results_csv(&analysis.records, output_dir, &stack.title, stack.slice)?,
        overlay_json: write_overlay_json(&analysis.overlay, output_dir, &stack.title, stack.slice)?,
        ..Default::default()
    };

    let stem = result_stem(&stack.title, stack.slice);

    if config.render_overlay {
        let base = stack.channel(config.organoid.channel)?;
        let rendered = render_overlay(base, &analysis.overlay);
        let path = output_dir.join(format!("{}_Overlay.png", stem));
        save_overlay_image(&rendered, &path)?;
        written.overlay_png = Some(path);
    }

    if debug {
        let debug_dir = output_dir.join("debug");
        std::fs::create_dir_all(&debug_dir)?;
        for seg in [&analysis.organoid, &analysis.marker_a, &analysis.marker_b] {
            let path = debug_dir.join(format!("{}_{}_mask.png", stem, seg.role.name()));
            save_mask(&seg.mask, &path)?;
            written.masks.push(path);
        }
    }

    Ok((analysis, written))
}
