use crate::compile::PIXEL_FORMAT;
use crate::config::EngineConfig;
use crate::format::OutputFormat;
use crate::foundation::core::fmt_secs;
use crate::foundation::error::AssemblyResult;
use crate::process::{CancelToken, EncoderRunner};
use crate::render::encode_to_path;
use crate::timeline::Timeline;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Solid-color placeholder of the timeline's duration at the requested resolution.
///
/// Always software-encoded and silent; it only has to exist, play, and measure right.
pub struct FallbackRenderer<'a> {
    runner: &'a dyn EncoderRunner,
    cfg: &'a EngineConfig,
}

impl<'a> FallbackRenderer<'a> {
    pub fn new(runner: &'a dyn EncoderRunner, cfg: &'a EngineConfig) -> Self {
        Self { runner, cfg }
    }

    #[tracing::instrument(skip_all, fields(out = %output_path.display(), duration = timeline.total_duration))]
    pub fn render_fallback(
        &self,
        timeline: &Timeline,
        format: OutputFormat,
        output_path: &Path,
        cancel: &CancelToken,
    ) -> AssemblyResult<PathBuf> {
        let args = fallback_args(timeline.total_duration, format, self.cfg);
        encode_to_path(
            self.runner,
            args,
            output_path,
            self.cfg.min_output_bytes,
            cancel,
        )
    }
}

/// Argument vector of the placeholder render, minus the output path.
pub fn fallback_args(total_duration: f64, format: OutputFormat, cfg: &EngineConfig) -> Vec<OsString> {
    let duration = fmt_secs(total_duration);
    let fps = cfg.fps.to_string();
    let source = format!(
        "color=c={}:s={}:r={}:d={duration}",
        cfg.fallback_color,
        format.resolution().size_arg(),
        fps
    );
    let mut args = vec![
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
        "-f",
        "lavfi",
        "-i",
        source.as_str(),
        "-an",
        "-c:v",
        cfg.software_encoder.as_str(),
    ];
    let preset = cfg.fallback_preset.trim();
    if !preset.is_empty() {
        args.extend(["-preset", preset]);
    }
    args.extend([
        "-pix_fmt",
        PIXEL_FORMAT,
        "-r",
        fps.as_str(),
        "-t",
        duration.as_str(),
        "-movflags",
        "+faststart",
    ]);
    args.into_iter().map(OsString::from).collect()
}
