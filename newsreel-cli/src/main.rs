use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "newsreel", version)]
struct Cli {
    /// Configuration JSON. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read one `{"url": ...}` request from stdin and write the JSON response to stdout.
    Process,
    /// Narrate a summary and render it as a word-reveal MP4 (requires `ffmpeg`).
    Video(VideoArgs),
    /// Render a captioned post image as PNG.
    Post(PostArgs),
    /// Render a single captioned video frame as PNG.
    Frame(FrameArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Frames,
    Pipe,
}

#[derive(Parser, Debug)]
struct VideoArgs {
    /// Text to narrate and reveal.
    #[arg(long)]
    summary: String,

    /// Background image URL or path.
    #[arg(long)]
    image: String,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// How frames reach ffmpeg.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Composite distinct frames on this many threads.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct PostArgs {
    #[arg(long)]
    summary: String,

    /// Background image URL or path. Falls back to the placeholder, then black.
    #[arg(long)]
    image: Option<String>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[arg(long)]
    summary: String,

    /// Background image URL or path.
    #[arg(long)]
    image: String,

    /// Visible word count; all words when omitted.
    #[arg(long)]
    words: Option<usize>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd.unwrap_or(Command::Process) {
        Command::Process => cmd_process(cli.config.as_deref()),
        Command::Video(args) => report(cmd_video(cli.config.as_deref(), args)),
        Command::Post(args) => report(cmd_post(cli.config.as_deref(), args)),
        Command::Frame(args) => report(cmd_frame(cli.config.as_deref(), args)),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<newsreel::Config> {
    let mut cfg = match path {
        Some(p) => newsreel::Config::from_path(p)?,
        None => newsreel::Config::default(),
    };
    cfg.apply_env()?;
    Ok(cfg)
}

fn build_pipeline(cfg: newsreel::Config) -> anyhow::Result<newsreel::NewsPipeline> {
    let services = newsreel::Services::from_config(&cfg).context("build services")?;
    Ok(newsreel::NewsPipeline::new(services, cfg)?)
}

/// Always writes exactly one JSON response to stdout. Exits non-zero when the request
/// could not be processed at all.
fn cmd_process(config: Option<&Path>) -> ExitCode {
    let (resp, code) = match run_process(config) {
        Ok(resp) => (resp, ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!("request failed: {e:#}");
            (newsreel::Response::failure(format!("{e:#}")), ExitCode::FAILURE)
        }
    };
    match write_response(&resp) {
        Ok(()) => code,
        Err(e) => {
            eprintln!("error: write response: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_process(config: Option<&Path>) -> anyhow::Result<newsreel::Response> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("read request from stdin")?;
    let req: newsreel::Request =
        serde_json::from_str(&input).context("invalid request JSON")?;

    let pipeline = build_pipeline(load_config(config)?)?;
    Ok(pipeline.process(&req)?)
}

fn write_response(resp: &newsreel::Response) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, resp).context("serialize response")?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn cmd_video(config: Option<&Path>, args: VideoArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(config)?;
    if let Some(mode) = args.mode {
        cfg.encoder.mode = match mode {
            ModeArg::Frames => newsreel::EncodeMode::Frames,
            ModeArg::Pipe => newsreel::EncodeMode::Pipe,
        };
    }
    if let Some(n) = args.threads {
        cfg.video.frames.parallel = n > 1;
        cfg.video.frames.threads = Some(n);
    }

    let pipeline = build_pipeline(cfg)?;
    let image = newsreel::ImageSource::parse(&args.image);
    let artifact = pipeline
        .video()
        .generate_to(&args.summary, &image, &args.out)?;

    eprintln!(
        "wrote {} ({:.2}s, {} frames, {} composited)",
        artifact.path.display(),
        artifact.duration_secs,
        artifact.stats.frames_total,
        artifact.stats.frames_rendered
    );
    Ok(())
}

fn cmd_post(config: Option<&Path>, args: PostArgs) -> anyhow::Result<()> {
    let pipeline = build_pipeline(load_config(config)?)?;
    let image = args.image.as_deref().map(newsreel::ImageSource::parse);
    let artifact = pipeline
        .post()
        .generate_to(&args.summary, image.as_ref(), &args.out)?;
    eprintln!(
        "wrote {} (background: {:?})",
        artifact.path.display(),
        artifact.background
    );
    Ok(())
}

fn cmd_frame(config: Option<&Path>, args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(config)?;
    cfg.validate()?;

    let preparer = newsreel::ImagePreparer::new(&cfg.services.http)?;
    let base = preparer.prepare(
        &newsreel::ImageSource::parse(&args.image),
        cfg.video.size,
        cfg.video.blur,
    )?;

    let words: Vec<&str> = args.summary.split_whitespace().collect();
    let visible = args.words.unwrap_or(words.len()).min(words.len());
    let text = words[..visible].join(" ");

    let font = newsreel::FontSource::discover(cfg.font_path.as_deref());
    let mut compositor = newsreel::Compositor::new(newsreel::glyph_renderer_for(font.as_ref()));
    let frame = compositor.compose(&base, &text, &cfg.video.caption)?;

    newsreel::ensure_parent_dir(&args.out)?;
    frame.save_png(&args.out)?;
    eprintln!(
        "wrote {} ({visible} of {} words, glyphs: {})",
        args.out.display(),
        words.len(),
        compositor.glyph_renderer_name()
    );
    Ok(())
}
