use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use image_to_palette_card::{
    ColorSpace, Config, FileSource, PaletteCardPipeline, PaletteError, ResponseSink, handle_request,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Space {
    Rgb,
    Lab,
}

/// Extract a color palette from images and render it as a palette card.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of palette colors
    #[arg(short = 'k', long)]
    n_colors: Option<usize>,

    /// JSON configuration file (missing keys use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Color space to cluster in
    #[arg(long, value_enum)]
    space: Option<Space>,

    /// Seed for reproducible palettes
    #[arg(long)]
    seed: Option<u64>,

    /// Font file for the title and labels
    #[arg(long)]
    font: Option<PathBuf>,

    /// Card width in pixels
    #[arg(short, long)]
    width: Option<u32>,

    /// Output directory
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,

    /// Output filename prefix (ignored when --out-dir supplied)
    #[arg(short = 'p', long, default_value = "palette_")]
    prefix: String,

    /// Print the palette as JSON instead of the caption
    #[arg(long)]
    json: bool,
}

/// Writes the card next to the input (or into `--out-dir`) and prints the
/// caption.
struct FileSink {
    out_path: PathBuf,
    print_caption: bool,
}

impl ResponseSink for FileSink {
    fn send(&mut self, png: &[u8], caption: &str) -> image_to_palette_card::Result<()> {
        if let Some(parent) = self.out_path.parent() {
            fs::create_dir_all(parent).map_err(PaletteError::TransientIo)?;
        }
        fs::write(&self.out_path, png).map_err(PaletteError::TransientIo)?;
        if self.print_caption {
            println!("{caption}");
        }
        Ok(())
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).context("loading configuration")?,
        None => Config::default(),
    };
    if let Some(k) = args.n_colors {
        config.palette_size = k;
    }
    if let Some(space) = args.space {
        config.color_space = match space {
            Space::Rgb => ColorSpace::Rgb,
            Space::Lab => ColorSpace::Lab,
        };
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(font) = &args.font {
        config.font_path = Some(font.clone());
    }
    if let Some(width) = args.width {
        config.display_width = width;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn output_path(args: &Args, input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    match &args.out_dir {
        Some(dir) => dir.join(format!("{stem}.png")),
        None => PathBuf::from(format!("{}{stem}.png", args.prefix)),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_to_palette_card=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let pipeline = PaletteCardPipeline::new(config)?;
    let scratch = std::env::temp_dir();

    for (i, input) in args.inputs.iter().enumerate() {
        let out_path = output_path(&args, input);
        let mut sink = FileSink {
            out_path: out_path.clone(),
            print_caption: !args.json,
        };
        let card = handle_request(
            &mut FileSource::new(input),
            &mut sink,
            &pipeline,
            &scratch,
            &format!("cli-{}-{i}", std::process::id()),
        )
        .with_context(|| format!("palette card for {} failed", input.display()))?;

        if args.json {
            let colors: Vec<_> = card
                .palette
                .iter()
                .enumerate()
                .map(|(idx, c)| {
                    serde_json::json!({
                        "hex": c.to_hex(),
                        "rgb": [c.r, c.g, c.b],
                        "share": card.palette.share(idx),
                    })
                })
                .collect();
            let doc = serde_json::json!({
                "input": input.display().to_string(),
                "output": out_path.display().to_string(),
                "palette": colors,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        eprintln!("Saved → {}", out_path.display());
    }

    Ok(())
}
