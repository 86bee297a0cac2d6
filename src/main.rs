use clap::{Parser, Subcommand};
use emo_check::batch::{self, BatchSummary, BoostJob};
use emo_check::imaging::{OutputFormat, StampFont};
use emo_check::service::{FilterKind, Toolkit};
use emo_check::{config, logger, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "emo-check")]
#[command(about = "Dominant colors, pixel art and Y2K film looks for photos")]
#[command(long_about = "\
Dominant colors, pixel art and Y2K film looks for photos

Inputs can be image files or directories. Directories are walked
recursively for supported image types (jpg, png, tiff, webp, bmp, gif,
plus heic/heif when built with the `heic` feature).

Filters:
  pixel   downscale by the cell size, reduce to a small palette with
          k-means, scale back up with hard block edges
  y2k     saturation and warmth boost, film grain, vignette and an
          orange '25 01 15 style date stamp

Run 'emo-check gen-config' to generate a documented emo-check.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Log at debug level, including per-image timings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the dominant colors of each input
    Palette {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Print a JSON array instead of text
        #[arg(long)]
        json: bool,
    },
    /// Apply a filter and write one image per input
    Boost {
        /// Filter to apply: pixel or y2k
        #[arg(long, short)]
        filter: String,

        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the filtered images
        #[arg(long, default_value = "boosted")]
        out_dir: PathBuf,

        /// Output encoding: png, tiff or bmp
        #[arg(long, default_value = "png")]
        format: String,

        /// Write base64 text files (.b64) instead of raw image files
        #[arg(long)]
        base64: bool,
    },
    /// Print a stock emo-check.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    logger::init(cli.verbose);
    let app_config = config::load_config(&cli.config)?;
    init_thread_pool(&app_config.processing);

    let events = match cli.command {
        Command::Palette { inputs, json } => {
            let inputs = batch::collect_inputs(&inputs)?;
            info!("Extracting palettes from {} images", inputs.len());
            // Palettes never draw a stamp, so skip font resolution.
            let toolkit = Toolkit::with_font(app_config, StampFont::builtin());
            let events = batch::run_palettes(&inputs, &toolkit);
            if json {
                let reports = batch::palette_reports(&events);
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                output::print_batch(&events);
            }
            events
        }
        Command::Boost {
            filter,
            inputs,
            out_dir,
            format,
            base64,
        } => {
            let filter = FilterKind::parse(&filter)?;
            let format = OutputFormat::from_name(&format)?;
            let inputs = batch::collect_inputs(&inputs)?;
            info!("Applying {} to {} images", filter, inputs.len());
            let toolkit = Toolkit::new(app_config);
            let job = BoostJob {
                filter,
                out_dir,
                format,
                base64,
            };
            let events = batch::run_boost(&inputs, &job, &toolkit)?;
            output::print_batch(&events);
            events
        }
        Command::GenConfig => Vec::new(),
    };

    if BatchSummary::from_events(&events).failed > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
