//! `tensorstyle` CLI - run a style graph over an image file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tensorstyle::image::{load_pixels, save_pixels};
use tensorstyle::{Config, DirAssetStore, ImageSize, OnnxEngine, RunRequest, TensorRunner};

/// Run an image-to-image graph over an image, the way the Android bridge does.
#[derive(Parser, Debug)]
#[command(name = "tensorstyle")]
#[command(version, about, long_about = None)]
struct Args {
    /// Graph path, relative to the asset directory.
    #[arg(value_name = "GRAPH")]
    graph: String,

    /// Input image path.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output image path.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Directory the graph path is resolved against.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    assets: PathBuf,

    /// Output height. Zero or unset keeps the input height.
    #[arg(long, value_name = "INT")]
    out_height: Option<usize>,

    /// Output width. Zero or unset keeps the input width.
    #[arg(long, value_name = "INT")]
    out_width: Option<usize>,

    /// Name of the image input tensor.
    #[arg(long, default_value = "input")]
    input_name: String,

    /// Name of the shape input tensor.
    #[arg(long, default_value = "input_shape")]
    shape_input_name: String,

    /// Name of the output tensor.
    #[arg(long, default_value = "output")]
    output_name: String,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT",
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

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
                .unwrap_or_else(|_| format!("tensorstyle={log_level}").into()),
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
    let config = Config {
        input_name: args.input_name.clone(),
        shape_input_name: args.shape_input_name.clone(),
        output_name: args.output_name.clone(),
        ..Config::default()
    };

    let runner = TensorRunner::new(OnnxEngine, config).context("Invalid configuration")?;
    runner
        .initialize(&DirAssetStore::new(&args.assets), &args.graph)
        .with_context(|| format!("Failed to load graph {}", args.graph))?;

    let (pixels, size) = load_pixels(&args.input).context("Failed to read input image")?;

    let output = ImageSize::new(
        args.out_height.filter(|&h| h > 0).unwrap_or(size.height),
        args.out_width.filter(|&w| w > 0).unwrap_or(size.width),
    );
    let request = RunRequest::new(size).with_output(output);

    let styled = runner
        .run(&pixels, request)
        .context("Failed to run graph")?;

    save_pixels(&styled, output, &args.output, args.quality)
        .context("Failed to write output image")?;

    println!(
        "Successfully processed {} -> {} ({output})",
        args.input.display(),
        args.output.display()
    );

    Ok(())
}
