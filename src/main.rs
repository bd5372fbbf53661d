use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use layerfont::Layerizer;
use log::{info, warn};

/// Build a COLR/CPAL color font from a directory of per-codepoint SVG files
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Source directories, each holding `<hex>.svg` files and an info.json
    #[arg(required = true)]
    source_dirs: Vec<PathBuf>,

    /// Directory for intermediate files and the finished font
    #[arg(long, default_value = "build")]
    build_dir: PathBuf,

    /// FontForge executable used to import layer outlines
    #[arg(long, default_value = "fontforge")]
    fontforge: String,

    /// fontTools ttx executable used to compile the font
    #[arg(long, default_value = "ttx")]
    ttx: String,

    /// Stop after writing out.ttx
    #[arg(long)]
    skip_compile: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let layerizer = Layerizer::builder()
        .build_dir(&args.build_dir)
        .fontforge(args.fontforge)
        .ttx(args.ttx)
        .compile_font(!args.skip_compile)
        .build()
        .context("invalid configuration")?;

    for dir in &args.source_dirs {
        let output = layerizer
            .run(dir)
            .with_context(|| format!("failed to build font from {}", dir.display()))?;
        for paint in output.report.unresolved() {
            warn!(
                "u{}: {} unresolved paint reference(s): {}",
                paint.character,
                paint.count,
                paint.references.join(", ")
            );
        }
        match &output.font_path {
            Some(path) => info!("{} -> {}", dir.display(), path.display()),
            None => info!("{} -> {}", dir.display(), output.ttx_path.display()),
        }
    }
    Ok(())
}
