use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "typereel", version)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite the overlays at one point in time and write a PNG.
    Frame(FrameArgs),
    /// Play a source in real time, capture the composited frames and save the encoding
    /// (requires `ffmpeg` on PATH).
    Capture(CaptureArgs),
    /// Load an overlay document and report overlays that will never show.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct BaseArgs {
    /// Video file providing the base frames (requires the `media-ffmpeg` feature).
    #[arg(long)]
    video: Option<PathBuf>,

    /// Width of the generated base when no video is given.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Height of the generated base when no video is given.
    #[arg(long, default_value_t = 720)]
    height: u32,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Overlay document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Playback time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Draw the positioning guides.
    #[arg(long)]
    diagnostics: bool,

    #[command(flatten)]
    base: BaseArgs,
}

#[derive(Parser, Debug)]
struct CaptureArgs {
    /// Overlay document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output file. Defaults to `processed_video.<ext>` in the current directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output container.
    #[arg(long, value_enum, default_value_t = ContainerChoice::Webm)]
    container: ContainerChoice,

    /// Capture rate in frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Length of the generated base when no video is given.
    #[arg(long, default_value_t = 3.0)]
    duration: f64,

    /// Give up when the source is not ready after this many seconds.
    #[arg(long, default_value_t = 5.0)]
    priming_timeout: f64,

    /// Refuse to replace an existing output file.
    #[arg(long)]
    no_overwrite: bool,

    /// Draw the positioning guides into the capture.
    #[arg(long)]
    diagnostics: bool,

    #[command(flatten)]
    base: BaseArgs,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Overlay document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ContainerChoice {
    Webm,
    Mp4,
}

impl From<ContainerChoice> for typereel::Container {
    fn from(c: ContainerChoice) -> Self {
        match c {
            ContainerChoice::Webm => typereel::Container::WebM,
            ContainerChoice::Mp4 => typereel::Container::Mp4,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    typereel::logging::init_logging(&typereel::logging::LoggingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Capture(args) => cmd_capture(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn read_document(path: &Path) -> anyhow::Result<typereel::OverlayDocument> {
    typereel::OverlayDocument::from_path(path)
        .with_context(|| format!("load overlay document '{}'", path.display()))
}

fn open_source(
    base: &BaseArgs,
    duration_secs: f64,
    clock: Arc<dyn typereel::Clock>,
) -> anyhow::Result<Box<dyn typereel::FrameSource>> {
    match &base.video {
        Some(path) => open_video(path, clock),
        None => {
            let canvas = typereel::Canvas {
                width: base.width,
                height: base.height,
            };
            Ok(Box::new(typereel::SyntheticSource::new(
                canvas,
                duration_secs,
                clock,
            )))
        }
    }
}

#[cfg(feature = "media-ffmpeg")]
fn open_video(
    path: &Path,
    clock: Arc<dyn typereel::Clock>,
) -> anyhow::Result<Box<dyn typereel::FrameSource>> {
    let source = typereel::capture::ffmpeg_source::FfmpegSource::open(path, clock)
        .with_context(|| format!("open video '{}'", path.display()))?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "media-ffmpeg"))]
fn open_video(
    path: &Path,
    _clock: Arc<dyn typereel::Clock>,
) -> anyhow::Result<Box<dyn typereel::FrameSource>> {
    anyhow::bail!(
        "cannot open '{}': video sources need the `media-ffmpeg` feature",
        path.display()
    )
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.time.is_finite() && args.time >= 0.0,
        "--time must be a non-negative number of seconds"
    );
    let doc = read_document(&args.in_path)?;
    let assets = Arc::new(typereel::OverlayAssets::load(&doc));

    // Position the source with a manual clock instead of playing it in real time.
    let clock = Arc::new(typereel::ManualClock::new());
    let mut source = open_source(&args.base, args.time + 1.0, clock.clone())?;
    source.rewind()?;
    anyhow::ensure!(source.is_ready(), "source did not become ready");
    source.play();
    clock.advance(Duration::from_secs_f64(args.time));

    let mut compositor = typereel::CpuCompositor::new(source.canvas(), assets)?;
    let base = source.current_frame()?;
    let frame = compositor.composite_frame(base, &doc.overlays, args.time, args.diagnostics)?;
    let rgba = straight_alpha(frame);

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &rgba,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_capture(args: CaptureArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.priming_timeout.is_finite() && args.priming_timeout >= 0.0,
        "--priming-timeout must be a non-negative number of seconds"
    );
    let doc = read_document(&args.in_path)?;
    for (_, problem) in doc.overlays.diagnose() {
        tracing::warn!(error = %problem, "overlay will be sanitized");
    }
    let assets = Arc::new(typereel::OverlayAssets::load(&doc));

    let container: typereel::Container = args.container.into();
    let opts = typereel::CaptureOpts {
        fps: typereel::Fps::new(args.fps, 1)?,
        priming_timeout: Duration::from_secs_f64(args.priming_timeout),
        container,
        overwrite: !args.no_overwrite,
        ..typereel::CaptureOpts::default()
    };
    let out = args.out.unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}.{}",
            opts.artifact_stem,
            container.extension()
        ))
    });

    let clock: Arc<dyn typereel::Clock> = Arc::new(typereel::SystemClock::new());
    let source = open_source(&args.base, args.duration, clock.clone())?;
    let overlays = typereel::LiveOverlays::new(doc.overlays.clone());
    overlays.set_diagnostics(args.diagnostics);

    let output = Box::new(opts.file_output(&out));
    let controller = typereel::CaptureController::new(assets, clock, opts);
    let job = typereel::CaptureJob::new(source, Arc::new(overlays), output);
    let handle = controller.start_capture(job)?;
    let artifact = handle
        .wait()
        .with_context(|| format!("capture into '{}'", out.display()))?;

    eprintln!(
        "wrote {} ({} bytes, {})",
        out.display(),
        artifact.bytes.len(),
        artifact.mime
    );
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    let assets = typereel::OverlayAssets::load(&doc);

    println!("titles: {}", doc.overlays.titles.len());
    for (i, t) in doc.overlays.titles.iter().enumerate() {
        let text: String = t.segments.iter().map(|s| s.text.as_str()).collect();
        println!(
            "  [{i}] {:.2}s..{:.2}s {:?} \"{}\"",
            t.start_time, t.end_time, t.style.family, text
        );
    }
    match &doc.overlays.image {
        Some(img) => {
            let loaded = if assets.image(&img.url).is_some() {
                "loaded"
            } else {
                "missing"
            };
            println!(
                "image: {} ({loaded}) {:.2}s..{:.2}s",
                img.url, img.start_time, img.end_time
            );
        }
        None => println!("image: none"),
    }
    let families: Vec<&str> = assets.fonts().iter().map(|f| f.family.as_str()).collect();
    println!("fonts: {}", families.join(", "));

    let problems = doc.overlays.diagnose();
    if problems.is_empty() {
        println!("ok");
        return Ok(());
    }
    for (who, problem) in &problems {
        println!("warning: {who:?}: {problem}");
    }
    println!("{} overlay problem(s)", problems.len());
    Ok(())
}

/// Un-premultiply a composited frame for PNG output.
fn straight_alpha(frame: &typereel::FrameRGBA) -> Vec<u8> {
    let mut out = frame.data.clone();
    if !frame.premultiplied {
        return out;
    }
    for px in out.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    out
}
