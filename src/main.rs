use cellpix::cache::{CacheStats, ResizeCache};
use cellpix::config::{self, RenderConfig};
use cellpix::dimensions::Dimensions;
use cellpix::imaging::{Accelerator, RustBackend};
use cellpix::pipeline::{LoadError, Pipeline, PreparedImage};
use cellpix::types::{Backend, Scaler};
use cellpix::{output, sources};
use clap::{ArgAction, Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Box used when neither cells nor pixels are given: a classic 80x24 terminal.
const DEFAULT_COLS: u32 = 80;
const DEFAULT_ROWS: u32 = 24;

#[derive(Parser)]
#[command(name = "cellpix")]
#[command(version)]
#[command(about = "Prepare images for terminal graphics backends")]
#[command(long_about = "\
Prepare images for terminal graphics backends

Each image is decoded, turned upright according to its EXIF orientation,
fitted into the target box with an area filter, and converted to the pixel
layout its backend consumes:

  x11, wayland, chafa   BGRA, premultiplied alpha
  kitty                 RGB or RGBA, premultiplied alpha
  sixel                 RGB

Resized images are cached under $XDG_CACHE_HOME/cellpix, so showing the same
file again at the same size only decodes a small PNG.

Logging goes to stderr; set RUST_LOG (e.g. RUST_LOG=cellpix=debug) or pass -v.

Run 'cellpix gen-config' to generate a documented config.toml.")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/cellpix/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prepare images and report the resulting pixel buffers
    Prepare(PrepareArgs),
    /// Print the cache file location for an image
    CachePath {
        /// Source image
        path: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct PrepareArgs {
    /// Image files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Display backend (overrides config)
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Target box width in terminal cells
    #[arg(long, conflicts_with = "max_width")]
    max_cols: Option<u32>,

    /// Target box height in terminal cells
    #[arg(long, conflicts_with = "max_height")]
    max_rows: Option<u32>,

    /// Target box width in pixels
    #[arg(long)]
    max_width: Option<u32>,

    /// Target box height in pixels
    #[arg(long)]
    max_height: Option<u32>,

    /// Origin column in cells
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    x: i32,

    /// Origin row in cells
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    y: i32,

    /// Fitting strategy (overrides config)
    #[arg(long, value_enum)]
    scaler: Option<Scaler>,

    /// Center the image on its origin
    #[arg(long)]
    center: bool,

    /// Neither read nor write the resize cache
    #[arg(long)]
    no_cache: bool,

    /// Print one JSON object per image instead of text
    #[arg(long)]
    json: bool,

    /// Write each final pixel buffer to this directory
    #[arg(long)]
    raw_dir: Option<PathBuf>,
}

impl PrepareArgs {
    /// Fold command-line overrides into the loaded config.
    fn apply(&self, config: &mut RenderConfig) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(scaler) = self.scaler {
            config.terminal.scaler = scaler;
        }
        if self.center {
            config.origin_center = true;
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
    }

    fn dimensions(&self, config: &RenderConfig) -> Dimensions {
        let cell = config.terminal.cell();
        let width = self
            .max_width
            .unwrap_or_else(|| self.max_cols.unwrap_or(DEFAULT_COLS).saturating_mul(cell.width));
        let height = self
            .max_height
            .unwrap_or_else(|| self.max_rows.unwrap_or(DEFAULT_ROWS).saturating_mul(cell.height));
        Dimensions::new(self.x, self.y, width, height, config.terminal.scaler, cell)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Prepare(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            args.apply(&mut config);
            config.validate()?;
            init_thread_pool(&config.processing);
            prepare(&args, &config)?;
        }
        Command::CachePath { path } => {
            let config = load_config(cli.config.as_deref())?;
            let cache = ResizeCache::new(config.cache.resolved_dir());
            let source = sources::collect_sources(&[path])
                .into_iter()
                .next()
                .ok_or("no source path given")?;
            println!("{}", cache.path_for(&source).display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn prepare(args: &PrepareArgs, config: &RenderConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sources = sources::collect_sources(&args.paths);
    if sources.is_empty() {
        return Err("no supported images found".into());
    }
    if let Some(dir) = &args.raw_dir {
        std::fs::create_dir_all(dir)?;
    }

    let backend = RustBackend::new();
    let accelerator = if config.accelerator {
        Accelerator::detect()
    } else {
        Accelerator::unavailable()
    };
    let dims = args.dimensions(config);

    // One independent pipeline per image; results keep input order.
    let results: Vec<(&PathBuf, Result<PreparedImage, LoadError>)> = sources
        .par_iter()
        .map(|source| {
            let pipeline = Pipeline::new(&backend, config, &accelerator);
            (source, pipeline.open(source, dims.clone()))
        })
        .collect();

    let mut stats = CacheStats::default();
    let mut failed = 0;
    for (index, (source, result)) in results.iter().enumerate() {
        let index = index + 1;
        match result {
            Ok(image) => {
                if image.from_cache() {
                    stats.hit();
                } else {
                    stats.miss();
                }
                if args.json {
                    println!("{}", output::format_json(image, config.backend)?);
                } else {
                    output::print_prepared(index, image, config.backend);
                }
                if let Some(dir) = &args.raw_dir {
                    write_raw(dir, image, config.backend)?;
                }
            }
            Err(e) => {
                failed += 1;
                if args.json {
                    eprintln!("{}: {}", source.display(), e);
                } else {
                    output::print_failure(index, source, e);
                }
            }
        }
    }

    if !args.json {
        println!();
        println!("{}", output::format_totals(results.len() - failed, failed, &stats));
    }
    if failed > 0 {
        return Err(format!("{} of {} images failed", failed, results.len()).into());
    }
    Ok(())
}

/// Write the final buffer as `<stem>.<width>x<height>.<layout>` in `dir`.
fn write_raw(dir: &Path, image: &PreparedImage, backend: Backend) -> std::io::Result<()> {
    let stem = image
        .source()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let name = format!(
        "{}.{}x{}.{}",
        stem,
        image.width(),
        image.height(),
        backend.layout().name()
    );
    std::fs::write(dir.join(name), image.data())
}

/// Load `--config FILE`, else the default config location, else stock defaults.
fn load_config(path: Option<&Path>) -> Result<RenderConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => match config::default_config_dir() {
            Some(dir) => config::load_config(&dir),
            None => config::resolve_config(None),
        },
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "cellpix=warn",
        1 => "cellpix=info",
        _ => "cellpix=debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
