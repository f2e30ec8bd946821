use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use stillreel::{CancelToken, EngineConfig, StyleMetadata, VideoAssemblyEngine, VideoRequest};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stillreel", version)]
struct Cli {
    /// Engine configuration JSON; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the encoder binary from the configuration.
    #[arg(long, global = true)]
    encoder: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected encoder capabilities as JSON.
    Probe,
    /// Print the timeline, filter graph and encoder arguments without rendering.
    Plan(RequestArgs),
    /// Assemble a video (requires `ffmpeg` on PATH).
    Assemble(RequestArgs),
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Scene image, in playback order (repeatable).
    #[arg(long = "image", required = true)]
    images: Vec<PathBuf>,

    /// Narration track.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Script word count used to estimate the video length.
    #[arg(long)]
    words: Option<u32>,

    /// Style template name.
    #[arg(long, default_value = "documentary")]
    style: String,

    /// Image style hint, logged only.
    #[arg(long)]
    hint: Option<String>,

    /// Output format (720p, 1080p, 1440p, 4k).
    #[arg(long, default_value = "1080p")]
    format: String,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,
}

impl RequestArgs {
    fn into_request(self) -> anyhow::Result<VideoRequest> {
        let style = StyleMetadata::parse(&self.style, self.hint)?;
        Ok(VideoRequest {
            images: self.images,
            audio: self.audio,
            script_word_count: self.words,
            style,
            output_format: self.format,
            output_path: self.out,
        })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = make_engine(cli.config.as_ref(), cli.encoder)?;
    match cli.cmd {
        Command::Probe => cmd_probe(&engine),
        Command::Plan(args) => cmd_plan(&engine, args),
        Command::Assemble(args) => cmd_assemble(&engine, args),
    }
}

fn make_engine(
    config: Option<&PathBuf>,
    encoder: Option<PathBuf>,
) -> anyhow::Result<VideoAssemblyEngine> {
    let mut cfg = match config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    if let Some(encoder) = encoder {
        cfg.encoder_path = encoder;
    }
    Ok(VideoAssemblyEngine::with_ffmpeg(cfg)?)
}

fn cmd_probe(engine: &VideoAssemblyEngine) -> anyhow::Result<()> {
    let caps = engine.detect_capabilities()?;
    print_json(&caps)
}

fn cmd_plan(engine: &VideoAssemblyEngine, args: RequestArgs) -> anyhow::Result<()> {
    let plan = engine.plan(&args.into_request()?)?;
    print_json(&plan)
}

fn cmd_assemble(engine: &VideoAssemblyEngine, args: RequestArgs) -> anyhow::Result<()> {
    let req = args.into_request()?;
    let out = engine
        .create_video(&req, &CancelToken::new())
        .with_context(|| format!("assemble '{}'", req.output_path.display()))?;
    print_json(&out)?;
    eprintln!("wrote {}", out.path.display());
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), value).context("write JSON to stdout")?;
    println!();
    Ok(())
}
