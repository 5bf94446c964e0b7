use clap::{Parser, Subcommand};
use fitcrop::collection::load_collections;
use fitcrop::config::{self, ServiceConfig};
use fitcrop::imaging::{AxisPreference, RustCodec};
use fitcrop::service::{ImageService, Rendered, ServiceError};
use rayon::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fitcrop")]
#[command(about = "Deterministic image renditions for named collections")]
#[command(long_about = "\
Deterministic image renditions for named collections

Originals are turned upright from their EXIF orientation, then either
fit-and-cropped to an exact size or capped on one axis. Renditions are stored
next to the originals using the collection's path templates and reused on the
next request.

Collections file (see `collections` in the config):

  {
    \"products\": {
      \"resized\":  \"products/{width}x{height}/{name}\",
      \"capped\":   \"products/cap{cap}/{name}\",
      \"width\":    \"products/width{cap}/{name}\",
      \"height\":   \"products/height{cap}/{name}\",
      \"original\": \"products/original/{name}\"
    }
  }

Run 'fitcrop gen-config' to generate a documented fitcrop.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "fitcrop.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Shared flags for commands that render images.
#[derive(clap::Args, Clone)]
struct RenderArgs {
    /// Ignore stored renditions and render again from the original
    #[arg(long)]
    force: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fit-and-crop images to exactly WIDTH x HEIGHT
    Resize {
        collection: String,
        width: u32,
        height: u32,
        #[arg(required = true)]
        names: Vec<String>,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Scale images so one axis equals DIMENSION
    Cap {
        collection: String,
        dimension: u32,
        #[arg(required = true)]
        names: Vec<String>,
        /// Axis to cap: cap (longest side), width or height
        #[arg(long, default_value = "cap")]
        axis: AxisPreference,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Print the stored path of each original
    Original {
        collection: String,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Print a stock fitcrop.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fitcrop=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.config)?;
    init_thread_pool(&config);
    let collections = load_collections(&config.collections)?;
    let service = ImageService::new(RustCodec::new(), config, collections);

    let failures = match cli.command {
        Command::Resize {
            collection,
            width,
            height,
            names,
            render,
        } => render_all(&names, |name| {
            service.resize(&collection, name, width, height, render.force)
        }),
        Command::Cap {
            collection,
            dimension,
            names,
            axis,
            render,
        } => render_all(&names, |name| {
            service.cap(&collection, name, dimension, axis, render.force)
        }),
        Command::Original { collection, names } => {
            render_all(&names, |name| service.original(&collection, name))
        }
        Command::GenConfig => 0,
    };

    if failures > 0 {
        return Err(format!("{failures} image(s) failed").into());
    }
    Ok(())
}

/// Render every name in parallel, print one line per result, and return the
/// number of failures.
fn render_all<F>(names: &[String], render: F) -> usize
where
    F: Fn(&str) -> Result<Rendered, ServiceError> + Sync,
{
    let results: Vec<_> = names
        .par_iter()
        .map(|name| (name, render(name)))
        .collect();

    let mut failures = 0;
    for (name, result) in results {
        match result {
            Ok(r) => {
                let source = if r.cached { "stored" } else { "rendered" };
                println!("{name}: {} ({} bytes, {source})", r.path.display(), r.bytes.len());
            }
            Err(e) => {
                eprintln!("{name}: {e}");
                failures += 1;
            }
        }
    }
    failures
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(config: &ServiceConfig) {
    let threads = config::effective_threads(&config.processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
