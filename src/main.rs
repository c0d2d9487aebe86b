//! `adain` CLI - apply the style of one image to others.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ::image::DynamicImage;
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adain::{image, Config, ModelLocator, OnnxBackend, Outcome, Stylizer};

/// Apply the style of one image to content images using AdaIN.
#[derive(Parser, Debug)]
#[command(name = "adain")]
#[command(version, about, long_about = None)]
struct Args {
    /// Style image path.
    #[arg(value_name = "STYLE")]
    style: PathBuf,

    /// Content image paths.
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for stylized images.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    output_dir: PathBuf,

    /// Style strength (0.0-1.0).
    #[arg(short, long, default_value = "1.0", value_name = "FLOAT")]
    alpha: f32,

    /// Directory holding vgg_normalised.onnx and decoder.onnx. Searched before the defaults.
    #[arg(long, value_name = "DIR")]
    models: Option<PathBuf>,

    /// Longest side processed by the network; larger images are downscaled and restored.
    #[arg(long, default_value = "1024", value_name = "INT")]
    max_dimension: u32,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Suffix appended to each output file stem.
    #[arg(long, default_value = "_stylized", value_name = "TEXT")]
    suffix: String,

    /// Fail instead of writing unstylized images.
    #[arg(long)]
    strict: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("adain={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    for input in &args.inputs {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }
    }

    let config = Config {
        alpha: args.alpha,
        max_dimension: args.max_dimension,
        output_quality: args.quality,
    };
    config.validate().context("Invalid configuration")?;

    let backend = match OnnxBackend::discover(&ModelLocator::new(args.models.clone())) {
        Ok(backend) => Some(backend),
        Err(err) if args.strict => {
            return Err(err).context("Failed to load style transfer models");
        }
        Err(err) => {
            tracing::warn!("{err}");
            None
        }
    };

    let style = image::load_image(&args.style).context("Failed to load style image")?;
    let mut stylizer = Stylizer::new(backend, style, config).context("Failed to bind style")?;

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory {}", args.output_dir.display())
    })?;

    let pb = ProgressBar::new(args.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Stylizing [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let mut styled_count = 0usize;
    for input in &args.inputs {
        pb.set_message(input.display().to_string());

        let Some(content) = load_content(input, args.strict)? else {
            pb.inc(1);
            continue;
        };
        let (result, outcome) = stylizer.apply_with_outcome(&content);

        match outcome {
            Outcome::Styled => styled_count += 1,
            Outcome::Skipped(err) | Outcome::Failed(err) if args.strict => {
                pb.abandon();
                return Err(err).with_context(|| format!("Failed to stylize {}", input.display()));
            }
            Outcome::Skipped(_) | Outcome::Failed(_) => {}
        }

        let output = output_path(input, &args.output_dir, &args.suffix);
        image::save_image(&result, &output, stylizer.config().output_quality)
            .with_context(|| format!("Failed to save {}", output.display()))?;

        pb.inc(1);
    }

    pb.finish_with_message("done");

    println!(
        "Stylized {styled_count} of {} images into {}",
        args.inputs.len(),
        args.output_dir.display()
    );

    Ok(())
}

/// Load one content image. Unreadable inputs are skipped unless `strict`.
fn load_content(input: &Path, strict: bool) -> Result<Option<DynamicImage>> {
    match image::load_image(input) {
        Ok(content) => Ok(Some(content)),
        Err(err) if strict => {
            Err(err).with_context(|| format!("Failed to load content image {}", input.display()))
        }
        Err(err) => {
            tracing::warn!("Skipping {}: {err}", input.display());
            Ok(None)
        }
    }
}

/// `DIR/<stem><suffix>.<ext>`, defaulting to PNG when the input has no extension.
fn output_path(input: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |s| s.to_string_lossy());
    let extension = input
        .extension()
        .map_or_else(|| "png".into(), |e| e.to_string_lossy());

    output_dir.join(format!("{stem}{suffix}.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_keeps_extension() {
        let path = output_path(Path::new("photos/cat.jpg"), Path::new("out"), "_stylized");

        assert_eq!(path, PathBuf::from("out/cat_stylized.jpg"));
    }

    #[test]
    fn test_output_path_defaults_to_png() {
        let path = output_path(Path::new("scan"), Path::new("."), "-x");

        assert_eq!(path, PathBuf::from("./scan-x.png"));
    }

    #[test]
    fn test_unreadable_input_skipped_unless_strict() {
        let path = std::env::temp_dir().join(format!("adain-cli-{}-broken.png", std::process::id()));
        std::fs::write(&path, b"not an image").unwrap();

        let lenient = load_content(&path, false);
        let strict = load_content(&path, true);
        std::fs::remove_file(&path).ok();

        assert!(lenient.unwrap().is_none());
        let err = strict.unwrap_err();
        assert!(format!("{err:#}").starts_with("Failed to load content image"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["adain", "style.png", "a.png", "b.jpg", "-a", "0.6"]).unwrap();

        assert_eq!(args.inputs.len(), 2);
        assert!((args.alpha - 0.6).abs() < f32::EPSILON);
        assert_eq!(args.max_dimension, 1024);
    }
}
