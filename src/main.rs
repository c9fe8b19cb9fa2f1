//! Carousel Studio CLI
//!
//! Usage:
//!   carousel-studio [OPTIONS] <DECK>
//!
//! Options:
//!   -o, --out-dir <DIR>    Directory the slides are written to
//!   -t, --theme <FILE>     Theme file (TOML format)
//!   --font-dir <DIR>       Extra font directory (repeatable)
//!   --svg                  Also write the SVG scene of every slide
//!   -q, --quality <N>      JPEG quality, 1-100
//!   -v, --verbose          Debug logging
//!   -h, --help             Print help

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use carousel_studio::renderer::DEFAULT_JPEG_QUALITY;
use carousel_studio::{
    load_fonts, CarouselComposer, ComposerConfig, Deck, DeckError, RasterConfig, Theme,
    ThemeError,
};

#[derive(Parser)]
#[command(name = "carousel-studio")]
#[command(about = "Render a carousel deck to square JPEG slides")]
struct Cli {
    /// Deck file (TOML format)
    deck: PathBuf,

    /// Directory the slides are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Theme file for colors and font family (TOML format)
    #[arg(short, long)]
    theme: Option<PathBuf>,

    /// Extra directory to load fonts from
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    /// Also write slide-<id>.svg next to each JPEG
    #[arg(long)]
    svg: bool,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value_t = DEFAULT_JPEG_QUALITY)]
    quality: u8,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("theme '{}': {source}", path.display())]
    Theme { path: PathBuf, source: ThemeError },

    #[error("deck '{}': {source}", path.display())]
    Deck { path: PathBuf, source: DeckError },

    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let theme = match &cli.theme {
        Some(path) => Theme::from_file(path).map_err(|source| CliError::Theme {
            path: path.clone(),
            source,
        })?,
        None => Theme::default(),
    };

    let raster = cli
        .font_dirs
        .iter()
        .fold(RasterConfig::default(), |config, dir| config.with_font_dir(dir))
        .with_jpeg_quality(cli.quality);

    let deck_error = |source| CliError::Deck {
        path: cli.deck.clone(),
        source,
    };
    let store = Deck::from_file(&cli.deck)
        .and_then(Deck::into_store)
        .map_err(deck_error)?;

    let config = ComposerConfig::new().with_theme(theme).with_raster(raster);
    let fonts = load_fonts(&config.raster);
    let composer = CarouselComposer::with_store(config, fonts, store);

    if composer.store().is_empty() {
        warn!(deck = %cli.deck.display(), "deck has no slides");
        return Ok(());
    }

    fs::create_dir_all(&cli.out_dir).map_err(|source| CliError::Write {
        path: cli.out_dir.clone(),
        source,
    })?;

    if cli.svg {
        let snapshot = composer.snapshot();
        for (index, slide) in snapshot.slides().iter().enumerate() {
            if let Some(scene) = composer.scene(index) {
                let path = cli.out_dir.join(format!("slide-{}.svg", slide.id));
                write_file(&path, scene.as_bytes())?;
            }
        }
    }

    let batch = composer.export_all().await;
    for link in batch.downloads() {
        let path = cli.out_dir.join(&link.file_name);
        write_file(&path, link.artifact.bytes())?;
        info!(slide_id = %link.id, path = %path.display(), "slide written");
    }

    let skipped = batch.failed();
    if !skipped.is_empty() {
        warn!(count = skipped.len(), slides = ?skipped, "slides skipped");
    }

    Ok(())
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}
