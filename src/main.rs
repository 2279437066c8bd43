use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;

use organoid_quant_lib::image_io::{load_channel_files, load_stack};
use organoid_quant_lib::{process_stack, Config};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "OrganoidQuant - organoid segmentation and reporter quantification")]
struct Args {
    /// Composite image whose R, G, B planes are channels 1, 2, 3
    #[clap(short, long)]
    input: Option<String>,

    /// One single-channel image per channel, in stack order (instead of --input)
    #[clap(long, num_args = 3, value_names = ["MARKER_A", "ORGANOID", "MARKER_B"])]
    channel_files: Option<Vec<PathBuf>>,

    /// Path to output directory
    #[clap(short, long)]
    output: Option<String>,

    /// Path to configuration file
    #[clap(short, long, default_value = "config.toml")]
    config: String,

    /// 1-based z-slice the plane was taken from (overwrites config)
    #[clap(short = 'z', long)]
    slice: Option<usize>,

    /// Physical pixel width (overwrites config)
    #[clap(long)]
    pixel_width: Option<f64>,

    /// Physical pixel height (overwrites config)
    #[clap(long)]
    pixel_height: Option<f64>,

    /// Segment channels one after another instead of in parallel
    #[clap(long)]
    sequential: bool,

    /// Skip writing the rendered overlay PNG
    #[clap(long)]
    no_overlay: bool,

    /// Enable debug mode (save channel masks and log more detail)
    #[clap(short, long)]
    debug: bool,
}

/// Main function
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    // Load configuration
    let mut config = Config::from_file_or_default(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config))?;

    // Override config with command-line arguments
    if let Some(input) = args.input.clone() {
        config.input_path = Some(input);
    }
    if let Some(output) = args.output.clone() {
        config.output_base_dir = output;
    }
    if let Some(slice) = args.slice {
        config.slice = slice;
    }
    if let Some(width) = args.pixel_width {
        config.calibration.pixel_width = width;
    }
    if let Some(height) = args.pixel_height {
        config.calibration.pixel_height = height;
    }
    if args.sequential {
        config.use_parallel = false;
    }
    if args.no_overlay {
        config.render_overlay = false;
    }

    // Validate configuration
    config.validate().context("invalid configuration")?;

    let start_time = Instant::now();

    let stack = match (&args.channel_files, &config.input_path) {
        (Some(files), _) => load_channel_files(files, config.calibration, config.slice)
            .context("loading channel files")?,
        (None, Some(input)) => load_stack(input, config.calibration, config.slice)
            .with_context(|| format!("loading {}", input))?,
        (None, None) => bail!("no input: pass --input or --channel-files, or set input_path in the config"),
    };

    let (width, height) = stack.dimensions();
    log::info!("Analysing {} slice {} ({}x{})", stack.title, stack.slice, width, height);

    let (analysis, written) = process_stack(&stack, &config, args.debug)?;

    log::info!(
        "{} organoids written to {}",
        analysis.records.len(),
        written.results_csv.display()
    );
    log::info!("Overlay exported to {}", written.overlay_json.display());
    if let Some(png) = &written.overlay_png {
        log::info!("Overlay rendered to {}", png.display());
    }

    // Report elapsed time
    log::info!("Processing completed in {:.2} seconds", start_time.elapsed().as_secs_f64());

    Ok(())
}
