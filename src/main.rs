use clap::{Parser, Subcommand};
use cropstage::config::{self, Slot};
use cropstage::imaging::{self, CropRect, ImageBackend, RustBackend};
use cropstage::intake;
use cropstage::output::{self, CropEvent};
use cropstage::preview::PreviewRegistry;
use cropstage::submission::{self, GameDraft};
use cropstage::types::CandidateFile;
use cropstage::uploader::ImageUploader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cropstage")]
#[command(about = "Crop and select images for a game submission")]
#[command(long_about = "\
Crop and select images for a game submission

Each file goes through the same stages the submission form uses:

  intake     size ceiling and type filter (config: file_size_limit_kb)
  staging    crop rectangle, either explicit or from pan and zoom
  rasterize  the region is resampled and encoded in the source format
  selection  a bounded list per slot; the oldest image is evicted first

Slots:
  cover        one image, 3:4 by default
  screenshots  up to five images, 16:9 by default

Run 'cropstage gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Log pipeline decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run intake checks on files without cropping
    Check {
        files: Vec<PathBuf>,
        #[arg(long, value_enum, default_value = "cover")]
        slot: Slot,
    },
    /// Crop files into a slot and write the final selection
    Crop(CropArgs),
    /// Validate an "add game" draft stored as JSON
    ValidateGame { draft: PathBuf },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct CropArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[arg(long, value_enum)]
    slot: Slot,

    /// Crop origin x (pixels in display space)
    #[arg(long, requires_all = ["y", "width", "height"], conflicts_with_all = ["zoom", "pan_x", "pan_y"])]
    x: Option<f64>,
    #[arg(long, requires = "x")]
    y: Option<f64>,
    #[arg(long, requires = "x")]
    width: Option<f64>,
    #[arg(long, requires = "x")]
    height: Option<f64>,

    /// Zoom factor, clamped to 1..=3
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,
    /// Horizontal pan offset
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pan_x: f64,
    /// Vertical pan offset
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pan_y: f64,

    /// Width the image is displayed at; defaults to its natural width
    #[arg(long, requires = "display_height")]
    display_width: Option<f64>,
    #[arg(long, requires = "display_width")]
    display_height: Option<f64>,

    /// Device pixel ratio, overriding config
    #[arg(long)]
    dpr: Option<f64>,

    /// Output directory for the final selection
    #[arg(long)]
    out: PathBuf,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "cropstage=debug"
    } else {
        "cropstage=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Check { files, slot } => {
            let config = config::load_config(&cli.config)?;
            let limit_kb = config.slot(slot).file_size_limit_kb;
            let mut results = Vec::with_capacity(files.len());
            for path in &files {
                let file = CandidateFile::from_path(path)?;
                let verdict = intake::check(&file, limit_kb);
                results.push((file, verdict));
            }
            output::print_check_output(limit_kb, &results);
        }
        Command::Crop(args) => {
            let config = config::load_config(&cli.config)?;
            run_crop(&config, args)?;
        }
        Command::ValidateGame { draft } => {
            let content = std::fs::read_to_string(&draft)?;
            let draft: GameDraft = serde_json::from_str(&content)?;
            let report = submission::validate_draft(&draft);
            output::print_validation_report(&report);
            if !report.is_valid() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_crop(
    config: &config::UploaderConfig,
    args: CropArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut props = config.uploader_props(args.slot);
    if let Some(dpr) = args.dpr {
        props.metrics = props.metrics.with_pixel_ratio(dpr);
    }
    if let (Some(w), Some(h)) = (args.display_width, args.display_height) {
        props.metrics = props.metrics.with_display_size(w, h);
    }
    let aspect = props.crop_aspect;
    let display_size = props.metrics.display_size;

    let backend: Arc<dyn ImageBackend> = Arc::new(RustBackend::new());
    let registry = PreviewRegistry::new();
    let on_select = |files: &[CandidateFile]| {
        debug!(count = files.len(), "selection changed");
    };
    let mut uploader = ImageUploader::new(props, Arc::clone(&backend), registry, on_select);

    let explicit = match (args.x, args.y, args.width, args.height) {
        (Some(x), Some(y), Some(w), Some(h)) => Some(CropRect::new(x, y, w, h)),
        _ => None,
    };
    let view = View {
        explicit,
        display_size,
        aspect,
        zoom: args.zoom,
        pan: (args.pan_x, args.pan_y),
    };

    for (i, path) in args.files.iter().enumerate() {
        let index = i + 1;
        let file = CandidateFile::from_path(path)?;
        let name = file.name.clone();

        if let Err(e) = uploader.drop_files(vec![file]) {
            output::print_crop_event(&CropEvent::Rejected {
                index,
                name,
                message: e.to_string(),
            });
            continue;
        }

        let rect = match crop_rect(&mut uploader, backend.as_ref(), &view) {
            Ok(rect) => rect,
            Err(e) => {
                uploader.cancel_crop()?;
                output::print_crop_event(&CropEvent::Failed {
                    index,
                    name,
                    rect: None,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if uploader.confirm_crop()? {
            let size = uploader
                .selection()
                .files()
                .last()
                .map(CandidateFile::size)
                .unwrap_or_default();
            output::print_crop_event(&CropEvent::Accepted {
                index,
                name,
                rect,
                size,
            });
        } else {
            let message = uploader.error().unwrap_or_default().to_string();
            uploader.cancel_crop()?;
            output::print_crop_event(&CropEvent::Failed {
                index,
                name,
                rect: Some(rect),
                message,
            });
        }
    }

    let files = uploader.selection().files();
    write_selection(&files, &args.out)?;
    output::print_selection(&files, uploader.selection().max_count(), &args.out);
    Ok(())
}

/// Crop inputs from the command line, shared by every file of a run.
struct View {
    explicit: Option<CropRect>,
    display_size: Option<(f64, f64)>,
    aspect: Option<f64>,
    zoom: f64,
    pan: (f64, f64),
}

/// Set the session's crop rectangle from the command line.
///
/// Without an explicit rectangle the window comes from pan and zoom over the
/// displayed image.
fn crop_rect(
    uploader: &mut ImageUploader,
    backend: &dyn ImageBackend,
    view: &View,
) -> Result<CropRect, Box<dyn std::error::Error>> {
    let session = uploader.session_mut().ok_or("no crop session is open")?;

    if let Some(rect) = view.explicit {
        session.on_crop_change(rect);
        return Ok(rect);
    }

    let display = match view.display_size {
        Some(size) => size,
        None => {
            let (w, h) = imaging::get_dimensions(backend, session.file())?;
            (w as f64, h as f64)
        }
    };
    session.on_zoom_change(view.zoom);
    session.on_position_change(view.pan.0, view.pan.1);
    Ok(session.apply_view(display, view.aspect))
}

/// Write the selection in order, each file prefixed with its position.
fn write_selection(files: &[CandidateFile], out_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(out_dir)?;
    for (i, file) in files.iter().enumerate() {
        let path = out_dir.join(output::selection_file_name(i + 1, &file.name));
        std::fs::write(path, &file.bytes)?;
    }
    Ok(())
}
