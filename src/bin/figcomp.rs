use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "figcomp", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remove the background of a single image and write it as PNG.
    Strip(StripArgs),
    /// Render a saved collection to a PNG.
    Compose(ComposeArgs),
}

#[derive(Parser, Debug)]
struct StripArgs {
    /// Input image (PNG, JPEG, GIF or WebP).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Distance below which a pixel becomes fully transparent.
    #[arg(long, default_value_t = figcomp::TRANSPARENT_DISTANCE)]
    transparent_distance: f64,

    /// Distance above which a pixel stays fully opaque.
    #[arg(long, default_value_t = figcomp::OPAQUE_DISTANCE)]
    opaque_distance: f64,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Collection JSON (as written by the collection store).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path. A directory gets `minifig-composition.png` appended.
    #[arg(long)]
    out: PathBuf,

    /// Draw the original catalog images instead of background-stripped ones.
    #[arg(long)]
    original: bool,

    /// Root for relative image paths; defaults to the collection's directory.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Image proxy endpoint for catalog CDN images.
    #[arg(long)]
    proxy: Option<String>,

    /// How long to wait for background removal before exporting, in milliseconds.
    #[arg(long)]
    settle_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Strip(args) => cmd_strip(args),
        Command::Compose(args) => cmd_compose(args),
    }
}

fn cmd_strip(args: StripArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let mut img = figcomp::decode_rgba(&bytes)
        .with_context(|| format!("decode image '{}'", args.in_path.display()))?;

    let params = figcomp::RemovalParams {
        transparent_distance: args.transparent_distance,
        opaque_distance: args.opaque_distance,
        ..figcomp::RemovalParams::default()
    };
    figcomp::strip_background(&mut img, &params)?;

    let png = figcomp::encode_image_png(&img)?;
    write_output(&args.out, &png)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn read_collection(path: &Path) -> anyhow::Result<figcomp::Collection> {
    let f = File::open(path).with_context(|| format!("open collection '{}'", path.display()))?;
    let r = BufReader::new(f);
    let collection: figcomp::Collection =
        serde_json::from_reader(r).with_context(|| "parse collection JSON")?;
    Ok(collection)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let collection = read_collection(&args.in_path)?;

    let mut config = figcomp::ComposerConfig::from_env();
    config.fetch.assets_root = match args.root {
        Some(root) => root,
        None => args
            .in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    if let Some(proxy) = args.proxy {
        config.fetch.proxy_base = Some(proxy);
    }
    if let Some(ms) = args.settle_ms {
        config.settle = Duration::from_millis(ms);
    }
    if args.original {
        config.export.view = figcomp::ViewMode::Original;
    }

    let mut composer = figcomp::Composer::from_config(config);
    let jobs = composer.load_collection(&collection);
    tracing::info!(
        title = %collection.title,
        parts = collection.parts.len(),
        jobs,
        "composing collection"
    );
    let png = composer.export_png()?;

    let out = if args.out.is_dir() {
        args.out.join(figcomp::EXPORT_FILE_NAME)
    } else {
        args.out
    };
    write_output(&out, &png)?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
